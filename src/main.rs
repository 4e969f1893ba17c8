//! Market-Harvest main entry point
//!
//! This is the command-line interface for the Market-Harvest crawler.

use clap::Parser;
use market_harvest::config::{load_config_with_hash, validate, Config};
use market_harvest::crawler::{HttpFetcher, MarketExtractor};
use market_harvest::output::{print_statistics, JsonLinesWriter, RecordSink};
use market_harvest::{CrawlEngine, EngineOptions, NextResult};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Market-Harvest: a concurrent marketplace harvester
///
/// Crawls the app marketplace from a seed page and writes one JSON object per
/// discovered app to the output file, one per line.
#[derive(Parser, Debug)]
#[command(name = "market-harvest")]
#[command(version)]
#[command(about = "A concurrent marketplace harvester", long_about = None)]
struct Cli {
    /// Destination file for line-delimited JSON records
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Maximum number of concurrent fetches (overrides the config file)
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Seed URL to start from (overrides the config file)
    #[arg(long, value_name = "URL")]
    seed: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => Config::default(),
    };

    if let Some(concurrency) = cli.concurrency {
        config.crawler.concurrency = concurrency;
    }
    if let Some(seed) = cli.seed {
        config.crawler.seed_url = seed;
    }
    validate(&config)?;

    handle_crawl(config, &cli.output).await?;
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; the record stream only ever goes to the output file.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("market_harvest=info,warn"),
            1 => EnvFilter::new("market_harvest=debug,info"),
            2 => EnvFilter::new("market_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Runs the crawl, writing every record as it arrives
async fn handle_crawl(config: Config, output: &Path) -> market_harvest::Result<()> {
    let mut sink = JsonLinesWriter::create(output)?;

    let base_url = config.crawler.effective_base_url();
    let mut engine = CrawlEngine::new(
        &config.crawler.seed_url,
        EngineOptions::from_config(&config.crawler),
        HttpFetcher::new(&config)?,
        MarketExtractor::new(&base_url)?,
    )?;

    let start_time = Instant::now();

    loop {
        match engine.next_result().await {
            NextResult::Record(record) => {
                sink.write_record(&record)?;

                // Progress reporting every 100 records
                let written = sink.records_written();
                if written % 100 == 0 {
                    tracing::info!(
                        "Progress: {} records, {} queued, {} active",
                        written,
                        engine.frontier_len(),
                        engine.active_workers()
                    );
                }
            }
            NextResult::Failed(e) => {
                tracing::error!("Worker failed: {}", e);
            }
            NextResult::Completed => break,
        }
    }

    sink.finish()?;

    tracing::info!(
        "Crawl completed: {} records written to {}",
        sink.records_written(),
        output.display()
    );
    print_statistics(&engine.stats(), start_time.elapsed());

    Ok(())
}
