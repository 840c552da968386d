use crate::types::{DigestError, FeedInfo, Item, ParsedFeed, Result};
use feed_rs::parser;
use tracing::debug;

pub struct FeedParser;

impl FeedParser {
    /// Parses RSS, Atom or JSON Feed content, preserving the source's item order.
    pub fn parse_feed(content: &[u8]) -> Result<ParsedFeed> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content)
            .map_err(|e| DigestError::Parse(format!("Failed to parse feed: {}", e)))?;

        let title = feed.title.map(|t| t.content).unwrap_or_default();

        // Prefer the site link over the feed's self reference.
        let link = feed
            .links
            .iter()
            .find(|l| l.rel.as_deref() != Some("self"))
            .or_else(|| feed.links.first())
            .map(|l| l.href.clone());

        let items: Vec<Item> = feed.entries.into_iter().filter_map(Self::parse_entry).collect();

        debug!("Parsed feed '{}' with {} entries", title, items.len());

        Ok(ParsedFeed {
            info: FeedInfo { title, link },
            items,
        })
    }

    /// Parses and keeps only the first `limit` entries.
    pub fn parse_limited(content: &[u8], limit: usize) -> Result<ParsedFeed> {
        let mut feed = Self::parse_feed(content)?;
        feed.truncate(limit);
        Ok(feed)
    }

    fn parse_entry(entry: feed_rs::model::Entry) -> Option<Item> {
        // An entry without a link has no identity for the ledger.
        let link = entry.links.first()?.href.clone();

        let title = entry.title.map(|t| t.content).unwrap_or_default();
        let description = entry.summary.map(|s| s.content).unwrap_or_default();
        let content = entry
            .content
            .and_then(|c| c.body)
            .unwrap_or_default();

        Some(Item {
            title,
            link,
            description,
            content,
            published: entry.published.or(entry.updated),
        })
    }
}
