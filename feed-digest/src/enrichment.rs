//! Turns one feed item into a rendered fragment.
//!
//! The enricher consults the seen ledger first: items already shown today render as
//! an empty fragment. Everything else is rendered and recorded, reusing a cached
//! summary when the item was seen on an earlier day.

use crate::ledger::SeenLedger;
use crate::llm_adapter::DEFAULT_SUMMARY_MODEL;
use crate::types::{Extracted, FeedInfo, Item, LedgerKey, SourceSpec};
use crate::utils::{
    extract_image_tag, instapaper_link, is_discussion_feed, parse_comments_info, reading_time,
    strip_html, summary_input,
};
use crate::writer::Writer;
use interfaces::{Extractor, Summarizer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct EnrichSettings {
    pub instapaper: bool,
    pub reading_time: bool,
    pub show_images: bool,
    pub summary_length_limit: usize,
    pub summary_model: String,
    pub extraction_timeout: Duration,
    /// Appended to item links to form ledger keys; empty for the regular digest.
    pub key_variant: String,
}

impl Default for EnrichSettings {
    fn default() -> Self {
        Self {
            instapaper: false,
            reading_time: false,
            show_images: false,
            summary_length_limit: 5000,
            summary_model: DEFAULT_SUMMARY_MODEL.to_string(),
            extraction_timeout: Duration::from_secs(30),
            key_variant: String::new(),
        }
    }
}

pub struct ItemEnricher {
    ledger: Arc<SeenLedger>,
    summarizer: Arc<dyn Summarizer>,
    extractor: Arc<dyn Extractor>,
    writer: Arc<dyn Writer>,
    settings: EnrichSettings,
}

impl ItemEnricher {
    pub fn new(
        ledger: Arc<SeenLedger>,
        summarizer: Arc<dyn Summarizer>,
        extractor: Arc<dyn Extractor>,
        writer: Arc<dyn Writer>,
        settings: EnrichSettings,
    ) -> Self {
        Self {
            ledger,
            summarizer,
            extractor,
            writer,
            settings,
        }
    }

    pub fn ledger_key(&self, item: &Item) -> LedgerKey {
        LedgerKey::with_variant(&item.link, &self.settings.key_variant)
    }

    /// Renders `item`, or returns an empty fragment when it was already shown today.
    pub async fn enrich(&self, item: &Item, source: &SourceSpec, feed: &FeedInfo) -> String {
        let key = self.ledger_key(item);
        let status = self.ledger.lookup(&key).await;
        if status.seen_today {
            debug!("Suppressing {} (already shown today)", key);
            return String::new();
        }

        let cached = status.cached_summary.filter(|_| status.seen_before);
        let needs_text = (source.summarize && cached.is_none()) || self.settings.reading_time;
        let extracted = if needs_text {
            self.extract(&item.link).await
        } else {
            None
        };

        let summary = match cached {
            Some(summary) => {
                debug!("Reusing cached summary for {}", key);
                summary
            }
            None if source.summarize => self.summarize(item, extracted.as_ref()).await,
            None => String::new(),
        };

        let fragment = self.compose(item, source, feed, &summary, extracted.as_ref());

        // Concurrent tasks may race here on the same key; the ledger upserts.
        if let Err(e) = self.ledger.record(&key, &summary).await {
            warn!("Failed to record {} in the ledger: {}", key, e);
        }

        fragment
    }

    async fn extract(&self, link: &str) -> Option<Extracted> {
        match self
            .extractor
            .extract(link, self.settings.extraction_timeout)
            .await
        {
            Ok(extracted) => Some(extracted),
            Err(e) => {
                warn!("Failed to extract {}: {}", link, e);
                None
            }
        }
    }

    async fn summarize(&self, item: &Item, extracted: Option<&Extracted>) -> String {
        let text = match extracted {
            Some(e) if !e.text.trim().is_empty() => e.text.clone(),
            _ => strip_html(&item.description),
        };

        let Some(input) = summary_input(&text, self.settings.summary_length_limit) else {
            debug!("Text for {} is too short to summarize", item.link);
            return String::new();
        };

        match self
            .summarizer
            .summarize(&input, &self.settings.summary_model)
            .await
        {
            Ok(summary) => summary.trim().to_string(),
            Err(e) => {
                warn!("Summarization failed for {}: {}", item.link, e);
                String::new()
            }
        }
    }

    fn compose(
        &self,
        item: &Item,
        source: &SourceSpec,
        feed: &FeedInfo,
        summary: &str,
        extracted: Option<&Extracted>,
    ) -> String {
        let w = &self.writer;
        let mut fragment = String::new();

        if is_discussion_feed(feed) {
            let comments = parse_comments_info(&item.description);
            match comments.link.as_deref() {
                Some(link) => fragment.push_str(&w.link(comments.marker(), link, false, "")),
                None => fragment.push_str(comments.marker()),
            }
        }

        if self.settings.instapaper && !w.is_interactive() {
            fragment.push_str(&instapaper_link(&item.link));
        }

        // Title-less feeds (Mastodon and the like) carry the text in the description.
        let title = if item.title.trim().is_empty() {
            strip_html(&item.description)
        } else {
            item.title.clone()
        };

        let minutes = if self.settings.reading_time {
            extracted
                .and_then(|e| reading_time(e.word_count()))
                .unwrap_or_default()
        } else {
            String::new()
        };

        fragment.push_str(&w.link(&title, &item.link, true, &minutes));

        if source.summarize {
            fragment.push_str(&w.summary(summary, true));
        }

        if self.settings.show_images && !w.is_interactive() {
            let img = extract_image_tag(&item.content);
            if !img.is_empty() {
                fragment.push_str(&img);
                fragment.push('\n');
            }
        }

        fragment
    }
}
