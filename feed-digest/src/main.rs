use anyhow::Context;
use clap::Parser;
use feed_digest::config::{ensure_default_config, Config};
use feed_digest::extractor::HttpExtractor;
use feed_digest::llm_adapter::build_summarizer;
use feed_digest::{
    Analyst, DigestAssembler, FanOut, FetchConfig, Fetcher, ItemEnricher, MarkdownWriter,
    RunContext, SeenLedger, TerminalWriter, Writer,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "feed-digest", about = "Daily digest of your feeds, without the repeats")]
struct Cli {
    /// Print the digest to the terminal instead of writing a markdown file
    #[arg(short = 't', long = "terminal")]
    terminal: bool,

    /// Config file path (defaults to ./config.yaml, generated when missing)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// API key for the summarization endpoint, overrides the config file
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so terminal mode keeps stdout for the digest itself.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let current_dir = std::env::current_dir().context("cannot read the working directory")?;

    let config_path = match cli.config {
        Some(path) => path,
        None => ensure_default_config(&current_dir)?,
    };
    let mut config = Config::load(&config_path, &current_dir)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    if cli.terminal {
        config.terminal_mode = true;
    }
    if let Some(key) = cli.openai_api_key.filter(|k| !k.is_empty()) {
        config.openai_api_key = key;
    }

    let run = RunContext::for_today().with_file_affixes(&config.file_prefix, &config.file_suffix);

    let ledger = match SeenLedger::open(&config.database_path, run.today).await {
        Ok(ledger) => Arc::new(ledger),
        Err(e) => {
            error!("Failed to open ledger {}: {}", config.database_path.display(), e);
            return Err(e.into());
        }
    };

    let writer: Arc<dyn Writer> = if config.terminal_mode {
        Arc::new(TerminalWriter)
    } else {
        let writer = MarkdownWriter::create(&config.markdown_dir, &run)?;
        info!("Writing digest to {}", writer.path().display());
        Arc::new(writer)
    };

    let fetcher = Arc::new(Fetcher::new(FetchConfig::default())?);
    let summarizer = build_summarizer(
        fetcher.client().clone(),
        &config.openai_api_key,
        config.openai_base_url.as_deref(),
    );
    let extractor = Arc::new(HttpExtractor::new(fetcher.client().clone()));

    if config.analyst_enabled() {
        let analyst = Analyst::new(fetcher.clone(), ledger.clone(), summarizer.clone(), writer.clone());
        let prompt = config.analyst_prompt.clone().unwrap_or_default();
        analyst
            .run(&config.analyst_feeds, &prompt, &config.analyst_model)
            .await?;
    }

    let enricher = Arc::new(ItemEnricher::new(
        ledger.clone(),
        summarizer,
        extractor,
        writer.clone(),
        config.enrich_settings(),
    ));
    let fan_out = FanOut::new(enricher)
        .with_max_concurrency(config.max_concurrency)
        .with_item_timeout(config.item_timeout);

    let report = DigestAssembler::new(fetcher, fan_out, writer)
        .run(&config.all_sources())
        .await?;

    info!(
        "Digest for {} done: {}/{} sources rendered",
        run.iso_date(),
        report.sections_written,
        report.sources
    );

    ledger.close().await;
    Ok(())
}
