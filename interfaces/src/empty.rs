use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::defs::Extracted;
use crate::defs::Extractor;
use crate::defs::Summarizer;

/// Summarizer used when no LLM endpoint is configured.
pub struct EmptySummarizer;

#[async_trait]
impl Summarizer for EmptySummarizer {
    async fn summarize(&self, _text: &str, _model: &str) -> Result<String> {
        // Nothing configured, the ideal summary is empty.
        Ok(String::new())
    }

    async fn complete(&self, _prompt: &str, _model: &str) -> Result<String> {
        Ok(String::new())
    }
}

/// Extractor that never reaches the network; callers fall back to the feed description.
pub struct EmptyExtractor;

#[async_trait]
impl Extractor for EmptyExtractor {
    async fn extract(&self, url: &str, _timeout: Duration) -> Result<Extracted> {
        Err(anyhow!("extraction disabled for {url}"))
    }
}
