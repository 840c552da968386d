use crate::ledger::SeenLedger;
use crate::types::{LedgerKey, Result};
use crate::writer::Writer;
use interfaces::{SourceFetcher, Summarizer, DEFAULT_ITEM_LIMIT};
use std::sync::Arc;
use tracing::{info, warn};

/// Ledger key variant that keeps analyst sightings apart from the digest's.
pub const ANALYST_KEY_VARIANT: &str = "#analyst";

/// Collects unseen headlines from the analyst feeds and asks the LLM for one
/// analysis block, written ahead of the digest sections.
pub struct Analyst {
    fetcher: Arc<dyn SourceFetcher>,
    ledger: Arc<SeenLedger>,
    summarizer: Arc<dyn Summarizer>,
    writer: Arc<dyn Writer>,
}

impl Analyst {
    pub fn new(
        fetcher: Arc<dyn SourceFetcher>,
        ledger: Arc<SeenLedger>,
        summarizer: Arc<dyn Summarizer>,
        writer: Arc<dyn Writer>,
    ) -> Self {
        Self {
            fetcher,
            ledger,
            summarizer,
            writer,
        }
    }

    /// Returns the headlines that went into the prompt.
    pub async fn collect_headlines(&self, feeds: &[String]) -> Vec<String> {
        let mut headlines = Vec::new();

        for feed_url in feeds {
            let feed = match self.fetcher.fetch(feed_url, DEFAULT_ITEM_LIMIT).await {
                Ok(feed) => feed,
                Err(e) => {
                    warn!("Skipping analyst feed {}: {}", feed_url, e);
                    continue;
                }
            };

            for item in &feed.items {
                let key = LedgerKey::with_variant(&item.link, ANALYST_KEY_VARIANT);
                let status = self.ledger.lookup(&key).await;
                if status.seen_before {
                    continue;
                }
                headlines.push(format!("{}:  {}", item.title, item.description));
                if !status.seen_today {
                    if let Err(e) = self.ledger.record(&key, "").await {
                        warn!("Failed to record {} in the ledger: {}", key, e);
                    }
                }
            }
        }

        headlines
    }

    /// Writes the analysis block; returns whether one was written.
    pub async fn run(&self, feeds: &[String], prompt: &str, model: &str) -> Result<bool> {
        let headlines = self.collect_headlines(feeds).await;
        if headlines.is_empty() {
            return Ok(false);
        }

        info!("Requesting analysis of {} headlines", headlines.len());
        let request = format!("{}\n\n{}", prompt, headlines.join("\n"));
        let analysis = match self.summarizer.complete(&request, model).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!("Analysis request failed: {}", e);
                return Ok(false);
            }
        };

        if analysis.trim().is_empty() {
            return Ok(false);
        }

        self.writer.write("\n## Daily Analysis:\n")?;
        self.writer.write(&format!("{}\n", analysis))?;
        Ok(true)
    }
}
