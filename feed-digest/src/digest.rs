use crate::pipeline::FanOut;
use crate::types::{FeedInfo, Result, SourceSpec};
use crate::writer::Writer;
use interfaces::SourceFetcher;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestReport {
    pub sources: usize,
    pub failed_sources: usize,
    pub sections_written: usize,
    pub items_rendered: usize,
}

/// Builds a source section, or `None` when every fragment was suppressed.
pub fn assemble_section(writer: &dyn Writer, feed: &FeedInfo, fragments: &[String]) -> Option<String> {
    let items: String = fragments.concat();
    if items.is_empty() {
        return None;
    }
    Some(format!("\n### {}  {}\n{}", writer.favicon(feed), feed.title, items))
}

/// Walks the configured sources one at a time and writes each non-empty section.
pub struct DigestAssembler {
    fetcher: Arc<dyn SourceFetcher>,
    fan_out: FanOut,
    writer: Arc<dyn Writer>,
}

impl DigestAssembler {
    pub fn new(fetcher: Arc<dyn SourceFetcher>, fan_out: FanOut, writer: Arc<dyn Writer>) -> Self {
        Self {
            fetcher,
            fan_out,
            writer,
        }
    }

    pub async fn run(&self, sources: &[SourceSpec]) -> Result<DigestReport> {
        let mut report = DigestReport {
            sources: sources.len(),
            ..Default::default()
        };

        for (i, source) in sources.iter().enumerate() {
            info!("[{}/{}] Feed: {}", i + 1, sources.len(), source.address);

            let feed = match self.fetcher.fetch(&source.address, source.limit).await {
                Ok(feed) => feed,
                Err(e) => {
                    warn!("Error parsing {}: {}", source.address, e);
                    report.failed_sources += 1;
                    continue;
                }
            };

            info!("Items: {}", feed.items.len());

            let fragments = self.fan_out.run(&feed, source).await;
            let rendered = fragments.iter().filter(|f| !f.is_empty()).count();

            if let Some(section) = assemble_section(self.writer.as_ref(), &feed.info, &fragments) {
                self.writer.write(&section)?;
                report.sections_written += 1;
                report.items_rendered += rendered;
            }
        }

        info!(
            "All feeds processed: {} sections, {} items, {} failed sources",
            report.sections_written, report.items_rendered, report.failed_sources
        );
        Ok(report)
    }
}
