pub mod defs;
pub mod empty;

pub use defs::{
    Extracted, Extractor, FeedInfo, Item, LedgerKey, LedgerRecord, ParsedFeed, SeenStatus,
    SourceFetcher, SourceSpec, Summarizer, DEFAULT_ITEM_LIMIT,
};
pub use empty::{EmptyExtractor, EmptySummarizer};
