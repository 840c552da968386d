use crate::types::{DigestError, Extracted, Result};
use crate::utils::page_text;
use async_trait::async_trait;
use interfaces::Extractor;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Fetches an article page and keeps its readable paragraph text.
pub struct HttpExtractor {
    client: Client,
}

impl HttpExtractor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn extract_text(&self, url: &str, timeout: Duration) -> Result<Extracted> {
        debug!("Extracting full text from: {}", url);

        let response = self.client.get(url).timeout(timeout).send().await?;
        if !response.status().is_success() {
            return Err(DigestError::General(format!(
                "HTTP {}: {}",
                response.status(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        let html = response.text().await?;
        Ok(Extracted {
            text: page_text(&html),
        })
    }
}

#[async_trait]
impl Extractor for HttpExtractor {
    async fn extract(&self, url: &str, timeout: Duration) -> anyhow::Result<Extracted> {
        Ok(self.extract_text(url, timeout).await?)
    }
}
