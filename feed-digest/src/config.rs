//! Run configuration.
//!
//! Read from a YAML file (`config.yaml` in the working directory unless `-c` points
//! elsewhere). A commented default file is generated on first run. Feed entries are
//! `"<url> [limit]"` strings; the limit defaults to 20.

use crate::enrichment::EnrichSettings;
use crate::llm_adapter::{DEFAULT_ANALYST_MODEL, DEFAULT_SUMMARY_MODEL};
use crate::pipeline::DEFAULT_MAX_CONCURRENCY;
use crate::types::{DigestError, Result, SourceSpec};
use interfaces::DEFAULT_ITEM_LIMIT;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "config.yaml";
const KEYWORD_FEED_LIMIT: usize = 15;
const GOOGLE_NEWS_SEARCH: &str =
    "https://news.google.com/rss/search?hl=en-US&gl=US&ceid=US%3Aen&oc=11&q=";

pub const DEFAULT_CONFIG: &str = r#"markdown_dir_path:
feeds:
  - http://hnrss.org/best 10
  - https://waitbutwhy.com/feed
  - http://tonsky.me/blog/atom.xml
  - http://www.joelonsoftware.com/rss.xml
google_news_keywords: George Hotz,ChatGPT,Copenhagen
instapaper: true
terminal_mode: false
markdown_file_prefix:
markdown_file_suffix:
reading_time: false
show_images: false
openai_api_key:
openai_base_url:
openai_model:
summary_feeds:
summary_article_length_limit: 5000
analyst_feeds:
  - https://feeds.bbci.co.uk/news/business/rss.xml
analyst_prompt:
analyst_model:
database_file_path:
max_concurrency: 16
item_timeout_seconds:
extraction_timeout_seconds: 30
"#;

// Empty YAML keys (`feeds:`) deserialize as null; treat them as the default value.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Raw config file schema (matches the YAML keys).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub markdown_dir_path: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub feeds: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub summary_feeds: Vec<String>,
    pub google_news_keywords: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub instapaper: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub terminal_mode: bool,
    pub opml_file_path: Option<String>,
    pub markdown_file_prefix: Option<String>,
    pub markdown_file_suffix: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub reading_time: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub show_images: bool,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub openai_model: Option<String>,
    #[serde(alias = "summary_article_lenght_limit")]
    pub summary_article_length_limit: Option<usize>,
    #[serde(deserialize_with = "null_as_default")]
    pub analyst_feeds: Vec<String>,
    pub analyst_prompt: Option<String>,
    pub analyst_model: Option<String>,
    pub database_file_path: Option<String>,
    pub max_concurrency: Option<usize>,
    pub item_timeout_seconds: Option<u64>,
    pub extraction_timeout_seconds: Option<u64>,
}

/// Resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub markdown_dir: PathBuf,
    pub feeds: Vec<SourceSpec>,
    pub summary_feeds: Vec<SourceSpec>,
    pub keyword_feeds: Vec<SourceSpec>,
    pub outline_feeds: Vec<SourceSpec>,
    pub terminal_mode: bool,
    pub instapaper: bool,
    pub reading_time: bool,
    pub show_images: bool,
    pub file_prefix: String,
    pub file_suffix: String,
    pub openai_api_key: String,
    pub openai_base_url: Option<String>,
    pub summary_model: String,
    pub summary_length_limit: usize,
    pub analyst_feeds: Vec<String>,
    pub analyst_prompt: Option<String>,
    pub analyst_model: String,
    pub database_path: PathBuf,
    pub max_concurrency: usize,
    pub item_timeout: Option<Duration>,
    pub extraction_timeout: Duration,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Splits `"<url> [limit]"`. A limit token that is not a number is an error.
pub fn parse_feed_entry(entry: &str) -> Result<(String, usize)> {
    let mut parts = entry.split_whitespace();
    let url = parts
        .next()
        .ok_or_else(|| DigestError::Config("empty feed entry".to_string()))?;
    let limit = match parts.next() {
        Some(token) => token.parse::<usize>().map_err(|e| {
            DigestError::Config(format!("invalid limit '{}' for feed {}: {}", token, url, e))
        })?,
        None => DEFAULT_ITEM_LIMIT,
    };
    Ok((url.to_string(), limit))
}

/// One Google News search feed covering every comma-separated keyword.
pub fn google_news_source(keywords: &str) -> Option<SourceSpec> {
    let escaped: String = url::form_urlencoded::byte_serialize(keywords.as_bytes()).collect();
    if escaped.is_empty() {
        return None;
    }
    let query = escaped.split("%2C").collect::<Vec<_>>().join("%20%7C%20");
    Some(SourceSpec::new(
        format!("{}{}", GOOGLE_NEWS_SEARCH, query),
        KEYWORD_FEED_LIMIT,
    ))
}

fn default_database_path() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join("feed-digest").join("ledger.db"),
        None => PathBuf::from("ledger.db"),
    }
}

impl Config {
    /// Resolves a parsed file; relative paths stay relative to `base_dir`.
    pub fn from_file(file: ConfigFile, base_dir: &Path) -> Result<Self> {
        let feeds = file
            .feeds
            .iter()
            .map(|entry| parse_feed_entry(entry).map(|(url, limit)| SourceSpec::new(url, limit)))
            .collect::<Result<Vec<_>>>()?;

        let summary_feeds = file
            .summary_feeds
            .iter()
            .map(|entry| {
                parse_feed_entry(entry).map(|(url, limit)| SourceSpec::new(url, limit).summarized())
            })
            .collect::<Result<Vec<_>>>()?;

        let keyword_feeds = non_empty(file.google_news_keywords)
            .and_then(|k| google_news_source(&k))
            .into_iter()
            .collect();

        if let Some(opml) = non_empty(file.opml_file_path) {
            warn!("Outline import is not supported, ignoring {}", opml);
        }

        let markdown_dir = non_empty(file.markdown_dir_path)
            .map(|p| base_dir.join(p))
            .unwrap_or_else(|| base_dir.to_path_buf());

        let database_path = non_empty(file.database_file_path)
            .map(|p| base_dir.join(p))
            .unwrap_or_else(default_database_path);

        Ok(Self {
            markdown_dir,
            feeds,
            summary_feeds,
            keyword_feeds,
            outline_feeds: Vec::new(),
            terminal_mode: file.terminal_mode,
            instapaper: file.instapaper,
            reading_time: file.reading_time,
            show_images: file.show_images,
            file_prefix: non_empty(file.markdown_file_prefix).unwrap_or_default(),
            file_suffix: non_empty(file.markdown_file_suffix).unwrap_or_default(),
            openai_api_key: non_empty(file.openai_api_key).unwrap_or_default(),
            openai_base_url: non_empty(file.openai_base_url),
            summary_model: non_empty(file.openai_model)
                .unwrap_or_else(|| DEFAULT_SUMMARY_MODEL.to_string()),
            summary_length_limit: file.summary_article_length_limit.unwrap_or(5000),
            analyst_feeds: file.analyst_feeds,
            analyst_prompt: non_empty(file.analyst_prompt),
            analyst_model: non_empty(file.analyst_model)
                .unwrap_or_else(|| DEFAULT_ANALYST_MODEL.to_string()),
            database_path,
            max_concurrency: file.max_concurrency.unwrap_or(DEFAULT_MAX_CONCURRENCY).max(1),
            item_timeout: file.item_timeout_seconds.map(Duration::from_secs),
            extraction_timeout: Duration::from_secs(file.extraction_timeout_seconds.unwrap_or(30)),
        })
    }

    pub fn from_yaml(text: &str, base_dir: &Path) -> Result<Self> {
        let file: ConfigFile = if text.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(text)?
        };
        Self::from_file(file, base_dir)
    }

    pub fn load(path: &Path, base_dir: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DigestError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&text, base_dir)
    }

    /// Primary, summary, keyword-search and outline sources, in that order.
    pub fn all_sources(&self) -> Vec<SourceSpec> {
        self.feeds
            .iter()
            .chain(&self.summary_feeds)
            .chain(&self.keyword_feeds)
            .chain(&self.outline_feeds)
            .cloned()
            .collect()
    }

    pub fn analyst_enabled(&self) -> bool {
        !self.analyst_feeds.is_empty() && self.analyst_prompt.is_some()
    }

    pub fn enrich_settings(&self) -> EnrichSettings {
        EnrichSettings {
            instapaper: self.instapaper,
            reading_time: self.reading_time,
            show_images: self.show_images,
            summary_length_limit: self.summary_length_limit,
            summary_model: self.summary_model.clone(),
            extraction_timeout: self.extraction_timeout,
            key_variant: String::new(),
        }
    }
}

/// Writes the default config into `dir` unless one already exists.
pub fn ensure_default_config(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        std::fs::write(&path, DEFAULT_CONFIG)?;
        info!("Generated default configuration at {}", path.display());
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_entries_with_and_without_limit() {
        assert_eq!(
            parse_feed_entry("http://hnrss.org/best 10").unwrap(),
            ("http://hnrss.org/best".to_string(), 10)
        );
        assert_eq!(
            parse_feed_entry("https://waitbutwhy.com/feed").unwrap().1,
            DEFAULT_ITEM_LIMIT
        );
        assert!(matches!(
            parse_feed_entry("https://x.example/feed ten"),
            Err(DigestError::Config(_))
        ));
    }

    #[test]
    fn default_config_parses() {
        let cfg = Config::from_yaml(DEFAULT_CONFIG, Path::new("/tmp/run")).unwrap();
        assert_eq!(cfg.feeds.len(), 4);
        assert_eq!(cfg.feeds[0].limit, 10);
        assert!(cfg.summary_feeds.is_empty());
        assert_eq!(cfg.keyword_feeds.len(), 1);
        assert_eq!(cfg.markdown_dir, PathBuf::from("/tmp/run"));
        assert!(!cfg.analyst_enabled());
        assert_eq!(cfg.summary_model, DEFAULT_SUMMARY_MODEL);
        assert_eq!(cfg.max_concurrency, 16);
        assert_eq!(cfg.item_timeout, None);
    }

    #[test]
    fn all_sources_keep_priority_order() {
        let yaml = "feeds:\n  - https://a.example/rss\nsummary_feeds:\n  - https://b.example/rss 3\n\
                    google_news_keywords: Rust\n";
        let cfg = Config::from_yaml(yaml, Path::new(".")).unwrap();
        let sources = cfg.all_sources();
        assert_eq!(sources.len(), 3);
        assert_eq!(sources[0].address, "https://a.example/rss");
        assert!(!sources[0].summarize);
        assert_eq!(sources[1].address, "https://b.example/rss");
        assert!(sources[1].summarize);
        assert_eq!(sources[1].limit, 3);
        assert!(sources[2].address.starts_with("https://news.google.com/rss/search"));
        assert_eq!(sources[2].limit, 15);
    }

    #[test]
    fn google_news_query_joins_keywords() {
        let source = google_news_source("George Hotz,ChatGPT").unwrap();
        assert!(source.address.ends_with("q=George+Hotz%20%7C%20ChatGPT"));
        assert!(google_news_source("").is_none());
    }

    #[test]
    fn legacy_length_key_is_accepted() {
        let cfg = Config::from_yaml("summary_article_lenght_limit: 1200\n", Path::new(".")).unwrap();
        assert_eq!(cfg.summary_length_limit, 1200);
    }

    #[test]
    fn default_config_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = ensure_default_config(dir.path()).unwrap();
        std::fs::write(&path, "feeds:\n").unwrap();
        ensure_default_config(dir.path()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "feeds:\n");
    }
}
