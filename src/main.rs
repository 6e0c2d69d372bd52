//! Document Ingestor main entry point
//!
//! This is the command-line interface for the cache-aware document fetcher.

use anyhow::Context;
use clap::Parser;
use document_ingestor::config::{load_config_with_hash, Config};
use document_ingestor::output::{
    generate_markdown_summary, print_statistics, print_store, summary_path_for, CrawlSummary,
};
use document_ingestor::{Coordinator, MetadataStore};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Document Ingestor: a cache-aware document fetcher
///
/// Fetches every seed URL with conditional requests, stores fresh content
/// under content-addressed paths, and keeps per-URL metadata between runs.
#[derive(Parser, Debug)]
#[command(name = "document-ingestor")]
#[command(version)]
#[command(about = "A cache-aware document fetcher", long_about = None)]
struct Cli {
    /// Path to TOML (or .json) configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be fetched without fetching
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show the records in the metadata store and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Write a markdown summary next to the metadata file after the run
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    summary: bool,

    /// Extract plain text from fetched documents for this run
    #[arg(long)]
    extract_text: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.extract_text {
        config.transform.enabled = true;
    }

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config).await?;
    } else if cli.stats {
        handle_stats(&config).await?;
    } else {
        handle_run(&config, &config_hash, cli.summary).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("document_ingestor=info,warn"),
            1 => EnvFilter::new("document_ingestor=debug,info"),
            2 => EnvFilter::new("document_ingestor=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be fetched
async fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Document Ingestor Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Output directory: {}", config.crawler.output_dir.display());
    println!("  Metadata file: {}", config.crawler.metadata_path.display());
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_secs
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nText Extraction:");
    if config.transform.enabled {
        println!("  Enabled ({})", config.transform.text_dir.display());
    } else {
        println!("  Disabled");
    }

    let store = MetadataStore::load(&config.crawler.metadata_path)
        .await
        .context("failed to load metadata store")?;

    println!("\nSeed URLs ({}):", config.crawler.seed_urls.len());
    for url in &config.crawler.seed_urls {
        let plan = match store.get(url) {
            Some(record) if !record.validators.is_empty() => "conditional (has validators)",
            Some(_) => "unconditional (record without validators)",
            None => "unconditional (no prior record)",
        };
        println!("  - {} [{}]", url, plan);
    }

    println!("\n✓ Configuration is valid");
    println!("\nRun without --dry-run to start fetching.");

    Ok(())
}

/// Handles the --stats mode: shows the metadata store contents
async fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let store = MetadataStore::load(&config.crawler.metadata_path)
        .await
        .context("failed to load metadata store")?;

    print_store(&store);

    Ok(())
}

/// Handles the main run: fetches every seed and reports the outcome
async fn handle_run(config: &Config, config_hash: &str, write_summary: bool) -> anyhow::Result<()> {
    println!("=== Starting Document Ingestor ===\n");
    println!("Seed URLs: {}", config.crawler.seed_urls.len());
    println!("Output directory: {}", config.crawler.output_dir.display());
    println!();

    let started_at = chrono::Utc::now();

    let mut store = MetadataStore::load(&config.crawler.metadata_path)
        .await
        .context("failed to load metadata store")?;
    let coordinator = Coordinator::new(config).context("failed to build HTTP client")?;

    let cancel = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling remaining fetches");
            cancel.cancel();
        }
    });

    let results = coordinator
        .run(config.crawler.seed_urls.iter().cloned(), &mut store)
        .await
        .context("run failed")?;

    let summary =
        CrawlSummary::new(started_at, chrono::Utc::now(), &results).with_config_hash(config_hash);

    println!();
    print_statistics(&summary.statistics);

    if write_summary {
        let path = summary_path_for(&config.crawler.metadata_path);
        generate_markdown_summary(&summary, &path)
            .with_context(|| format!("failed to write summary {}", path.display()))?;
        println!("\nSummary written to: {}", path.display());
    }

    Ok(())
}
