//! Tender-Sweep main entry point
//!
//! This is the command-line interface for the Tender-Sweep ingestion service.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tender_sweep::config::{load_config_with_hash, Config};
use tender_sweep::crawler::{build_refresher, Scheduler};
use tender_sweep::output::{load_statistics, print_statistics, RECENT_RUNS};
use tender_sweep::storage::open_store;
use tracing_subscriber::EnvFilter;

/// Tender-Sweep: incremental procurement tender ingestion
///
/// Tender-Sweep walks the configured listing pages, enriches every tender
/// with its detail page, and stores the ones it has not seen before.
#[derive(Parser, Debug)]
#[command(name = "tender-sweep")]
#[command(version = "1.0.0")]
#[command(about = "Incremental procurement tender ingestion", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate and print the configuration, then exit
    #[arg(long, conflicts_with_all = ["once", "stats"])]
    check: bool,

    /// Run a single refresh, print its summary as JSON, then exit
    #[arg(long, conflicts_with_all = ["check", "stats"])]
    once: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["check", "once"])]
    stats: bool,

    /// Compute results without touching the store
    #[arg(long, conflicts_with = "live")]
    dry_run: bool,

    /// Write new tenders to the store
    #[arg(long, conflicts_with = "dry_run")]
    live: bool,
}

impl Cli {
    /// Dry-run mode after applying the command-line override
    fn dry_run(&self, config: &Config) -> bool {
        if self.dry_run {
            true
        } else if self.live {
            false
        } else {
            config.scheduler.dry_run
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    config.scheduler.dry_run = cli.dry_run(&config);

    if cli.check {
        handle_check(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.once {
        handle_once(config, config_hash).await?;
    } else {
        handle_schedule(config, config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tender_sweep=info,warn"),
            1 => EnvFilter::new("tender_sweep=debug,info"),
            2 => EnvFilter::new("tender_sweep=trace,debug"),
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

/// Handles the --check mode: prints the validated configuration
fn handle_check(config: &Config) {
    println!("=== Tender-Sweep Configuration ===\n");

    println!("Source:");
    println!("  Listing URL template: {}", config.source.listing_url_template);
    println!("  Pages: {:?}", config.source.pages);
    println!("  Detail suffix: {}", config.source.detail_suffix);
    println!("  Delay between pages: {}ms", config.source.page_delay_ms);

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Accept-Language: {}", config.http.accept_language);
    println!(
        "  Timeouts: listing {}s, detail {}s",
        config.http.listing_timeout_secs, config.http.detail_timeout_secs
    );

    println!("\nRetry:");
    println!("  Attempts: {}", config.retry.max_retries);
    println!(
        "  Backoff: {}ms base, {}-{}ms jitter",
        config.retry.base_delay_ms, config.retry.jitter_min_ms, config.retry.jitter_max_ms
    );

    println!("\nEnrichment:");
    println!("  Concurrency: {}", config.enrichment.concurrency);
    println!(
        "  Pre-fetch delay: {}-{}ms",
        config.enrichment.min_delay_ms, config.enrichment.max_delay_ms
    );

    println!("\nScheduler:");
    println!("  Interval: {}s", config.scheduler.interval_secs);
    println!(
        "  Mode: {}",
        if config.scheduler.dry_run { "dry run" } else { "live" }
    );

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let store = open_store(Path::new(&config.storage.database_path))
        .context("failed to open the tender database")?;
    let stats = load_statistics(&store, RECENT_RUNS)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --once mode: one refresh, summary printed as JSON
async fn handle_once(config: Config, config_hash: String) -> anyhow::Result<()> {
    let dry_run = config.scheduler.dry_run;
    let store = open_store(Path::new(&config.storage.database_path))
        .context("failed to open the tender database")?;
    let refresher = build_refresher(config, Arc::new(Mutex::new(store)), config_hash)?;

    let summary = refresher.refresh_once(dry_run).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

/// Handles the default mode: refresh forever on the configured interval
async fn handle_schedule(config: Config, config_hash: String) -> anyhow::Result<()> {
    let scheduler_config = config.scheduler.clone();
    let store = open_store(Path::new(&config.storage.database_path))
        .context("failed to open the tender database")?;
    let refresher = build_refresher(config, Arc::new(Mutex::new(store)), config_hash)?;

    Scheduler::new(refresher, &scheduler_config).run().await;
    Ok(())
}
