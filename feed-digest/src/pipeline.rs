use crate::enrichment::ItemEnricher;
use crate::types::{ParsedFeed, SourceSpec};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// Enriches every item of one source in parallel and hands the fragments back in
/// source order, whatever order the tasks finished in.
pub struct FanOut {
    enricher: Arc<ItemEnricher>,
    max_concurrency: usize,
    item_timeout: Option<Duration>,
}

impl FanOut {
    pub fn new(enricher: Arc<ItemEnricher>) -> Self {
        Self {
            enricher,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            item_timeout: None,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_item_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.item_timeout = timeout;
        self
    }

    /// Slot `i` of the result always holds the fragment for item `i`.
    pub async fn run(&self, feed: &ParsedFeed, source: &SourceSpec) -> Vec<String> {
        let permits = Arc::new(Semaphore::new(self.max_concurrency));
        let info = Arc::new(feed.info.clone());
        let source = Arc::new(source.clone());
        let mut tasks = JoinSet::new();

        for (idx, item) in feed.items.iter().cloned().enumerate() {
            let permits = permits.clone();
            let enricher = self.enricher.clone();
            let info = info.clone();
            let source = source.clone();
            let item_timeout = self.item_timeout;

            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                debug!("Item: {}", item.title);

                let work = enricher.enrich(&item, &source, &info);
                let fragment = match item_timeout {
                    Some(limit) => match tokio::time::timeout(limit, work).await {
                        Ok(fragment) => fragment,
                        Err(_) => {
                            warn!("Item {} timed out after {:?}", item.link, limit);
                            String::new()
                        }
                    },
                    None => work.await,
                };
                (idx, fragment)
            });
        }

        let mut slots = vec![String::new(); feed.items.len()];
        // Barrier: nothing is assembled until every task has joined.
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, fragment)) => slots[idx] = fragment,
                Err(e) => warn!("Enrichment task failed: {}", e),
            }
        }
        slots
    }
}
