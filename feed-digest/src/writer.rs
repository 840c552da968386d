//! Output sinks for the assembled digest.
//!
//! Both sinks render the same content; they differ in destination (stdout vs. a
//! dated markdown document) and markup.

use crate::types::{FeedInfo, Result, RunContext};
use crate::utils::{is_discussion_feed, DEFAULT_FAVICON, HACKER_NEWS_FAVICON};
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

pub trait Writer: Send + Sync {
    /// Emits raw text to the destination.
    fn write(&self, body: &str) -> Result<()>;

    fn link(&self, title: &str, url: &str, newline: bool, reading_time: &str) -> String;

    fn summary(&self, content: &str, newline: bool) -> String;

    fn favicon(&self, feed: &FeedInfo) -> String;

    /// Whether the sink can show images and bookmarking links.
    fn is_interactive(&self) -> bool;
}

pub struct TerminalWriter;

impl Writer for TerminalWriter {
    fn write(&self, body: &str) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(body.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }

    fn link(&self, title: &str, url: &str, newline: bool, reading_time: &str) -> String {
        let mut content = title.to_string();
        if !reading_time.is_empty() {
            content.push_str(&format!(" ({})", reading_time));
        }
        if !url.is_empty() {
            content.push_str(&format!(" {}", url));
        }
        if newline {
            content.push('\n');
        }
        content
    }

    fn summary(&self, content: &str, newline: bool) -> String {
        if content.is_empty() {
            return String::new();
        }
        let mut block = content.to_string();
        if newline {
            block.push_str("\n\n");
        }
        block
    }

    /// Text stand-in for the favicon: the feed's host, or the tea cup without a link.
    fn favicon(&self, feed: &FeedInfo) -> String {
        feed.link
            .as_deref()
            .and_then(|link| Url::parse(link).ok())
            .and_then(|url| url.host_str().map(|host| format!("[{}]", host)))
            .unwrap_or_else(|| DEFAULT_FAVICON.to_string())
    }

    fn is_interactive(&self) -> bool {
        true
    }
}

/// Appends everything to `<dir>/<prefix><date><suffix>.md`.
pub struct MarkdownWriter {
    path: PathBuf,
    lock: Mutex<()>,
}

impl MarkdownWriter {
    /// Removes any document already written for this date so the run recreates it.
    pub fn create(dir: &Path, run: &RunContext) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(run.document_name());
        match std::fs::remove_file(&path) {
            Ok(()) => debug!("Removed stale digest {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Writer for MarkdownWriter {
    fn write(&self, body: &str) -> Result<()> {
        // Appends from concurrent callers must not interleave.
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(body.as_bytes())?;
        Ok(())
    }

    fn link(&self, title: &str, url: &str, newline: bool, reading_time: &str) -> String {
        let mut content = if url.is_empty() {
            title.to_string()
        } else {
            format!("[{}]({})", title, url)
        };
        if !reading_time.is_empty() {
            content.push_str(&format!(" ({})", reading_time));
        }
        if newline {
            content.push('\n');
        }
        content
    }

    fn summary(&self, content: &str, newline: bool) -> String {
        if content.is_empty() {
            return String::new();
        }
        let mut block = content.to_string();
        if newline {
            block.push_str("  \n\n");
        }
        block
    }

    fn favicon(&self, feed: &FeedInfo) -> String {
        let Some(link) = feed.link.as_deref().filter(|l| !l.is_empty()) else {
            return DEFAULT_FAVICON.to_string();
        };

        let src = if is_discussion_feed(feed) {
            HACKER_NEWS_FAVICON.to_string()
        } else {
            match Url::parse(link) {
                Ok(url) => format!(
                    "https://www.google.com/s2/favicons?sz=32&domain={}",
                    url.host_str().unwrap_or_default()
                ),
                Err(e) => {
                    warn!("Cannot parse feed link {}: {}", link, e);
                    return DEFAULT_FAVICON.to_string();
                }
            }
        };

        format!("<img src=\"{}\" width=\"32\" height=\"32\" />", src)
    }

    fn is_interactive(&self) -> bool {
        false
    }
}
