use crate::parser::FeedParser;
use crate::types::{DigestError, FetchConfig, ParsedFeed, Result};
use async_trait::async_trait;
use interfaces::SourceFetcher;
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, info};
use url::Url;

/// Fetches a source over HTTP and parses it. No retries: a failed source is skipped.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn fetch_content(&self, url: &str) -> Result<Vec<u8>> {
        Url::parse(url)?;
        let start_time = Instant::now();

        debug!("Fetching feed: {} (timeout {}s)", url, self.config.timeout_seconds);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DigestError::General(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let content = response.bytes().await?;
        info!(
            "Fetched feed: {} ({} bytes in {}ms)",
            url,
            content.len(),
            start_time.elapsed().as_millis()
        );
        Ok(content.to_vec())
    }

    pub async fn fetch_feed(&self, url: &str, limit: usize) -> Result<ParsedFeed> {
        let content = self.fetch_content(url).await?;
        FeedParser::parse_limited(&content, limit)
    }
}

#[async_trait]
impl SourceFetcher for Fetcher {
    async fn fetch(&self, address: &str, limit: usize) -> anyhow::Result<ParsedFeed> {
        Ok(self.fetch_feed(address, limit).await?)
    }
}
