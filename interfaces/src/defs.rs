use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// Items taken from a source when no inline limit is configured.
pub const DEFAULT_ITEM_LIMIT: usize = 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceSpec {
    pub address: String,
    pub limit: usize,
    pub summarize: bool,
}

impl SourceSpec {
    pub fn new(address: impl Into<String>, limit: usize) -> Self {
        Self {
            address: address.into(),
            limit,
            summarize: false,
        }
    }

    pub fn summarized(mut self) -> Self {
        self.summarize = true;
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct Item {
    pub title: String,
    // Canonical identity of the item, also the ledger key.
    pub link: String,
    pub description: String,
    pub content: String,
    pub published: Option<DateTime<Utc>>,
}

/// Feed-level context shared by every item of one source.
#[derive(Clone, Debug, Default)]
pub struct FeedInfo {
    pub title: String,
    pub link: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ParsedFeed {
    pub info: FeedInfo,
    pub items: Vec<Item>,
}

impl ParsedFeed {
    /// Keeps the first `limit` items in source order.
    pub fn truncate(&mut self, limit: usize) {
        self.items.truncate(limit);
    }
}

/// Ledger identity: the item link plus an optional variant suffix such as `#analyst`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LedgerKey(String);

impl LedgerKey {
    pub fn new(link: &str) -> Self {
        Self(link.to_owned())
    }

    pub fn with_variant(link: &str, variant: &str) -> Self {
        Self(format!("{link}{variant}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerRecord {
    pub key: LedgerKey,
    pub date: NaiveDate,
    pub summary: Option<String>,
}

/// Answer to "has this key been shown, and when".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeenStatus {
    pub seen_before: bool,
    pub seen_today: bool,
    pub cached_summary: Option<String>,
}

impl SeenStatus {
    pub fn unseen() -> Self {
        Self::default()
    }

    pub fn from_record(record: &LedgerRecord, today: NaiveDate) -> Self {
        Self {
            seen_before: record.date < today,
            seen_today: record.date == today,
            cached_summary: record.summary.clone().filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Extracted {
    pub text: String,
}

impl Extracted {
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

// Collaborators are shared across the enrichment tasks of one source, so every
// implementation must be usable behind an `Arc` from several tasks at once.

#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Retrieves and parses one source, keeping at most `limit` items.
    async fn fetch(&self, address: &str, limit: usize) -> Result<ParsedFeed>;
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarizes text the caller has already truncated. Short inputs never reach here.
    async fn summarize(&self, text: &str, model: &str) -> Result<String>;

    /// Free-form completion used by the analyst pass.
    async fn complete(&self, prompt: &str, model: &str) -> Result<String>;
}

#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, url: &str, timeout: Duration) -> Result<Extracted>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn variant_keys_are_distinct() {
        let plain = LedgerKey::new("https://example.com/a");
        let analyst = LedgerKey::with_variant("https://example.com/a", "#analyst");
        assert_ne!(plain, analyst);
        assert_eq!(analyst.as_str(), "https://example.com/a#analyst");
    }

    #[test]
    fn seen_status_follows_record_date() {
        let record = LedgerRecord {
            key: LedgerKey::new("k"),
            date: day(3),
            summary: Some("cached".to_owned()),
        };

        let earlier = SeenStatus::from_record(&record, day(4));
        assert!(earlier.seen_before);
        assert!(!earlier.seen_today);
        assert_eq!(earlier.cached_summary.as_deref(), Some("cached"));

        let same_day = SeenStatus::from_record(&record, day(3));
        assert!(!same_day.seen_before);
        assert!(same_day.seen_today);

        // A record dated after "today" is neither.
        let future = SeenStatus::from_record(&record, day(2));
        assert!(!future.seen_before);
        assert!(!future.seen_today);
    }

    #[test]
    fn empty_cached_summary_is_none() {
        let record = LedgerRecord {
            key: LedgerKey::new("k"),
            date: day(1),
            summary: Some(String::new()),
        };
        assert_eq!(SeenStatus::from_record(&record, day(2)).cached_summary, None);
    }
}
