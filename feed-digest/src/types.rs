use chrono::{Local, NaiveDate};
use std::time::Duration;

pub use interfaces::defs::{
    Extracted, FeedInfo, Item, LedgerKey, LedgerRecord, ParsedFeed, SeenStatus, SourceSpec,
};

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("feed-digest/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_seconds: 30,
            max_redirects: 5,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Values fixed for the lifetime of one run and threaded into the ledger and writer.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub today: NaiveDate,
    pub file_prefix: String,
    pub file_suffix: String,
}

impl RunContext {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            file_prefix: String::new(),
            file_suffix: String::new(),
        }
    }

    pub fn for_today() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn with_file_affixes(mut self, prefix: &str, suffix: &str) -> Self {
        self.file_prefix = prefix.to_string();
        self.file_suffix = suffix.to_string();
        self
    }

    pub fn iso_date(&self) -> String {
        self.today.format("%Y-%m-%d").to_string()
    }

    /// `<prefix><YYYY-MM-DD><suffix>.md`
    pub fn document_name(&self) -> String {
        format!("{}{}{}.md", self.file_prefix, self.iso_date(), self.file_suffix)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, DigestError>;
