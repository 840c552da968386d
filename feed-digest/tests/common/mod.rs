#![allow(dead_code)]

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::NaiveDate;
use feed_digest::types::{Extracted, FeedInfo, ParsedFeed};
use feed_digest::{
    DigestAssembler, EnrichSettings, FanOut, FeedParser, ItemEnricher, SeenLedger, Writer,
};
use interfaces::{Extractor, SourceFetcher, Summarizer};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

pub async fn open_ledger(dir: &Path, today: NaiveDate) -> Arc<SeenLedger> {
    Arc::new(SeenLedger::open(&dir.join("ledger.db"), today).await.unwrap())
}

pub struct TestItem<'a> {
    pub title: &'a str,
    pub link: &'a str,
    pub description: &'a str,
    pub content: &'a str,
}

impl<'a> TestItem<'a> {
    pub fn new(title: &'a str, link: &'a str) -> Self {
        Self {
            title,
            link,
            description: "",
            content: "",
        }
    }
}

pub fn rss(title: &str, link: &str, items: &[TestItem<'_>]) -> String {
    let body: String = items
        .iter()
        .map(|item| {
            let content = if item.content.is_empty() {
                String::new()
            } else {
                format!("<content:encoded><![CDATA[{}]]></content:encoded>", item.content)
            };
            format!(
                "<item><title>{}</title><link>{}</link><description><![CDATA[{}]]></description>{}</item>",
                item.title, item.link, item.description, content
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\"?><rss version=\"2.0\" xmlns:content=\"http://purl.org/rss/1.0/modules/content/\">\
         <channel><title>{}</title><link>{}</link><description>test</description>{}</channel></rss>",
        title, link, body
    )
}

pub fn numbered_items(prefix: &str, count: usize) -> Vec<(String, String)> {
    (0..count)
        .map(|i| (format!("{} {}", prefix, i), format!("https://{}.example/{}", prefix, i)))
        .collect()
}

pub fn rss_numbered(title: &str, link: &str, items: &[(String, String)]) -> String {
    let items: Vec<TestItem<'_>> = items.iter().map(|(t, l)| TestItem::new(t, l)).collect();
    rss(title, link, &items)
}

/// Serves canned feed documents; unknown addresses fail like a dead host.
#[derive(Default)]
pub struct StubFetcher {
    feeds: HashMap<String, String>,
}

impl StubFetcher {
    pub fn with_feed(mut self, address: &str, xml: String) -> Self {
        self.feeds.insert(address.to_string(), xml);
        self
    }
}

#[async_trait]
impl SourceFetcher for StubFetcher {
    async fn fetch(&self, address: &str, limit: usize) -> anyhow::Result<ParsedFeed> {
        let xml = self
            .feeds
            .get(address)
            .ok_or_else(|| anyhow!("connection refused: {}", address))?;
        Ok(FeedParser::parse_limited(xml.as_bytes(), limit)?)
    }
}

pub struct CountingSummarizer {
    pub calls: AtomicUsize,
    reply: String,
}

impl CountingSummarizer {
    pub fn new(reply: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            reply: reply.to_string(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarizer for CountingSummarizer {
    async fn summarize(&self, _text: &str, _model: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }

    async fn complete(&self, prompt: &str, _model: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{} ({} prompt lines)", self.reply, prompt.lines().count()))
    }
}

/// Returns fixed text after a per-link delay, so tests control completion order.
#[derive(Default)]
pub struct StubExtractor {
    text: String,
    delays_ms: HashMap<String, u64>,
    failing: bool,
    panics_on: Option<String>,
}

impl StubExtractor {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, link: &str, ms: u64) -> Self {
        self.delays_ms.insert(link.to_string(), ms);
        self
    }

    pub fn panicking_on(mut self, link: &str) -> Self {
        self.panics_on = Some(link.to_string());
        self
    }
}

#[async_trait]
impl Extractor for StubExtractor {
    async fn extract(&self, url: &str, _timeout: Duration) -> anyhow::Result<Extracted> {
        if let Some(ms) = self.delays_ms.get(url) {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
        if self.panics_on.as_deref() == Some(url) {
            panic!("extractor blew up on {}", url);
        }
        if self.failing {
            return Err(anyhow!("readability failed for {}", url));
        }
        Ok(Extracted {
            text: self.text.clone(),
        })
    }
}

/// Markdown-style sink that keeps the document in memory.
#[derive(Default)]
pub struct BufferWriter {
    body: Mutex<String>,
}

impl BufferWriter {
    pub fn contents(&self) -> String {
        self.body.lock().unwrap().clone()
    }
}

impl Writer for BufferWriter {
    fn write(&self, body: &str) -> feed_digest::Result<()> {
        self.body.lock().unwrap().push_str(body);
        Ok(())
    }

    fn link(&self, title: &str, url: &str, newline: bool, reading_time: &str) -> String {
        let mut content = format!("[{}]({})", title, url);
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
        if newline {
            format!("> {}\n\n", content)
        } else {
            format!("> {}", content)
        }
    }

    fn favicon(&self, _feed: &FeedInfo) -> String {
        "*".to_string()
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

pub struct Harness {
    pub ledger: Arc<SeenLedger>,
    pub summarizer: Arc<CountingSummarizer>,
    pub writer: Arc<BufferWriter>,
    pub assembler: DigestAssembler,
    pub enricher: Arc<ItemEnricher>,
}

pub fn harness(
    ledger: Arc<SeenLedger>,
    fetcher: StubFetcher,
    extractor: StubExtractor,
    settings: EnrichSettings,
) -> Harness {
    let summarizer = Arc::new(CountingSummarizer::new("A short summary."));
    let writer = Arc::new(BufferWriter::default());
    let enricher = Arc::new(ItemEnricher::new(
        ledger.clone(),
        summarizer.clone(),
        Arc::new(extractor),
        writer.clone(),
        settings,
    ));
    let fan_out = FanOut::new(enricher.clone()).with_max_concurrency(8);
    let assembler = DigestAssembler::new(Arc::new(fetcher), fan_out, writer.clone());
    Harness {
        ledger,
        summarizer,
        writer,
        assembler,
        enricher,
    }
}
