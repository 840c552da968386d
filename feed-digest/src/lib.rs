pub mod types;
pub mod config;
pub mod parser;
pub mod fetcher;
pub mod extractor;
pub mod llm_adapter;
pub mod ledger;
pub mod utils;
pub mod writer;
pub mod enrichment;
pub mod pipeline;
pub mod digest;
pub mod analyst;

pub use types::*;
pub use config::Config;
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use ledger::SeenLedger;
pub use enrichment::{EnrichSettings, ItemEnricher};
pub use pipeline::FanOut;
pub use digest::{DigestAssembler, DigestReport};
pub use analyst::Analyst;
pub use writer::{MarkdownWriter, TerminalWriter, Writer};
