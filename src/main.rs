//! Reelmine main entry point
//!
//! This is the command-line interface for the Reelmine film-page harvester.

use anyhow::Context;
use clap::Parser;
use reelmine::config::{load_config_with_hash, Config};
use reelmine::crawler::{build_queue, crawl, load_targets, Dataset};
use reelmine::output::{load_statistics, print_statistics};
use reelmine::storage::{open_existing_storage, Storage};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// How many queued ids the dry run lists
const DRY_RUN_PREVIEW: usize = 10;

/// Reelmine: a resumable film-page harvester
///
/// Reelmine fetches film pages through Tor, rotating to a fresh circuit
/// whenever a request times out or is blocked, and appends every scraped
/// film to the dataset immediately so that interrupted runs resume where
/// they stopped.
#[derive(Parser, Debug)]
#[command(name = "reelmine")]
#[command(version = "1.0.0")]
#[command(about = "A resumable film-page harvester", long_about = None)]
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

    /// Validate config and show what would be fetched without fetching
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics for the dataset and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e).context("invalid configuration");
        }
    };

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("reelmine=info,warn"),
            1 => EnvFilter::new("reelmine=debug,info"),
            2 => EnvFilter::new("reelmine=trace,debug"),
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

/// Handles the --dry-run mode: shows the configuration and the pending queue
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Reelmine Dry Run ===\n");

    println!("Target:");
    println!("  URL template: {}", config.target.url_template);
    println!("  Id list: {}", config.target.ids_path);

    println!("\nNetwork:");
    println!(
        "  Proxy: {}",
        config.network.proxy.as_deref().unwrap_or("(direct)")
    );
    println!("  Isolated circuits: {}", config.network.isolate_circuits);
    println!("  Request timeout: {}ms", config.network.request_timeout_ms);
    println!(
        "  Headers: {}",
        if config.network.headers.is_some() {
            "custom"
        } else {
            "built-in browser set"
        }
    );

    println!("\nRetry:");
    match config.retry.attempt_limit() {
        Some(limit) => println!("  Max attempts per film: {}", limit),
        None => println!("  Max attempts per film: unlimited"),
    }
    println!("  Rotation delay: {}ms", config.retry.rotation_delay_ms);

    println!("\nOutput:");
    println!("  Dataset: {}", config.output.dataset_path);
    println!("  Format: {:?}", config.output.format);

    let candidates = load_targets(Path::new(&config.target.ids_path))?;
    let dataset = match open_existing_storage(&config.output)? {
        Some(storage) => Dataset::from_rows(storage.load_records()?),
        None => Dataset::default(),
    };
    let queue = build_queue(&candidates, &dataset);

    println!("\n✓ Configuration is valid");
    println!(
        "✓ {} candidates, {} already scraped, {} would be fetched",
        candidates.len(),
        dataset.len(),
        queue.len()
    );
    for id in queue.iter().take(DRY_RUN_PREVIEW) {
        println!("  - {}", id);
    }
    if queue.len() > DRY_RUN_PREVIEW {
        println!("  ... and {} more", queue.len() - DRY_RUN_PREVIEW);
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics for the dataset
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Dataset: {}\n", config.output.dataset_path);

    let Some(storage) = open_existing_storage(&config.output)
        .with_context(|| format!("cannot open dataset {}", config.output.dataset_path))?
    else {
        println!("No dataset yet.");
        return Ok(());
    };
    let stats = load_statistics(storage.as_ref())?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: &str) -> anyhow::Result<()> {
    tracing::info!(
        "Fetching {} into {}",
        config.target.url_template,
        config.output.dataset_path
    );

    match crawl(config, config_hash).await {
        Ok(stats) => {
            tracing::info!(
                attempts = stats.attempts,
                circuits = stats.circuits_acquired,
                soft_bans = stats.soft_bans,
                transient_failures = stats.transient_failures,
                "Crawl completed: {} films saved, {} skipped",
                stats.persisted,
                stats.skipped
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
