//! Tidewalk main entry point
//!
//! This is the command-line interface for the Tidewalk crawl engine.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tidewalk::config::{load_config_with_hash, Config};
use tidewalk::crawler::{Host, StartOptions, StepOutcome};
use tidewalk::output::{load_last_report, print_progress, print_report};
use tidewalk::storage::{open_storage, StateStore};
use tracing_subscriber::EnvFilter;

/// Tidewalk: a crawl engine that survives every navigation
///
/// Tidewalk visits a list of locations one at a time, extracting one record
/// per location. Progress is persisted before every navigation, so an
/// interrupted crawl picks up where it left off on the next invocation.
#[derive(Parser, Debug)]
#[command(name = "tidewalk")]
#[command(version = "1.0.0")]
#[command(about = "A crawl engine that survives every navigation", long_about = None)]
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

    /// Start a new crawl over the locations in FILE (one per line)
    #[arg(long, value_name = "FILE", conflicts_with_all = ["cancel", "status", "sweep"])]
    start: Option<PathBuf>,

    /// Run a single process lifetime and exit
    #[arg(long)]
    single_step: bool,

    /// Cancel the active crawl, keeping its partial results
    #[arg(long, conflicts_with_all = ["start", "status", "sweep"])]
    cancel: bool,

    /// Show the progress of the active crawl and exit
    #[arg(long, conflicts_with_all = ["start", "cancel", "sweep"])]
    status: bool,

    /// Abandon the active crawl if it stopped making progress
    #[arg(long, conflicts_with_all = ["start", "cancel", "status"])]
    sweep: bool,

    /// Override the maximum number of locations for a new crawl
    #[arg(long, requires = "start")]
    max_items: Option<usize>,

    /// Override the item number offset for a new crawl
    #[arg(long, requires = "start")]
    skip_offset: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::debug!("Configuration hash: {}", config_hash);

    let store: Arc<dyn StateStore> = Arc::new(
        open_storage(Path::new(&config.storage.database_path))
            .with_context(|| format!("Failed to open {}", config.storage.database_path))?,
    );
    let host = Host::new(config, Some(config_hash), store).context("Failed to set up host")?;

    if cli.status {
        handle_status(&host).await
    } else if cli.cancel {
        handle_cancel(&host).await
    } else if cli.sweep {
        handle_sweep(&host).await
    } else {
        if let Some(path) = &cli.start {
            let options = StartOptions {
                max_items: cli.max_items,
                skip_offset: cli.skip_offset,
            };
            handle_start(&host, path, options).await?;
        }
        handle_crawl(&host, cli.single_step).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tidewalk=info,warn"),
            1 => EnvFilter::new("tidewalk=debug,info"),
            2 => EnvFilter::new("tidewalk=trace,debug"),
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

/// Reads locations from a file, one per line
async fn read_locations(path: &Path) -> Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read locations from {}", path.display()))?;
    Ok(content.lines().map(str::to_string).collect())
}

async fn handle_start(host: &Host, path: &Path, options: StartOptions) -> Result<()> {
    let locations = read_locations(path).await?;
    let accepted = host
        .start(&locations, options)
        .await
        .context("Failed to start crawl")?;
    println!("Queued {} of {} locations", accepted, locations.len());
    Ok(())
}

/// Drives lifetimes for the active crawl, if there is one
async fn handle_crawl(host: &Host, single_step: bool) -> Result<()> {
    let max_lifetimes = single_step.then_some(1);
    let outcome = host.drive(max_lifetimes).await.context("Crawl step failed")?;

    match outcome {
        StepOutcome::NotCrawling => println!("No crawl in progress"),
        StepOutcome::Retrying { location, attempt } => {
            println!("Attempt {} at {} failed; run again to retry", attempt, location)
        }
        StepOutcome::Advanced { next, cursor } => {
            println!("Step done ({} processed); next location: {}", cursor, next)
        }
        StepOutcome::Renavigated { location } => println!("Next location: {}", location),
        StepOutcome::Completed(summary) | StepOutcome::Expired(summary) => {
            match load_last_report(&host.cache()).await {
                Ok(Some(report)) if report.plan_id == summary.plan_id => print_report(&report),
                _ => println!("Crawl finished: {}", summary),
            }
            print_output_location(host.config());
        }
    }

    Ok(())
}

async fn handle_status(host: &Host) -> Result<()> {
    match host.orchestrator().status().await? {
        Some(progress) => print_progress(&progress),
        None => match load_last_report(&host.cache()).await? {
            Some(report) => {
                println!("No crawl in progress. Last report:\n");
                print_report(&report);
            }
            None => println!("No crawl in progress"),
        },
    }
    Ok(())
}

async fn handle_cancel(host: &Host) -> Result<()> {
    if host.orchestrator().cancel().await? {
        println!("Crawl cancelled; it finishes with partial results on the next run");
    } else {
        println!("No crawl in progress");
    }
    Ok(())
}

async fn handle_sweep(host: &Host) -> Result<()> {
    match host.orchestrator().sweep_stale().await? {
        Some(summary) => println!("Abandoned stale crawl: {}", summary),
        None => println!("Nothing to sweep"),
    }
    Ok(())
}

fn print_output_location(config: &Config) {
    if let Some(path) = &config.output.results_path {
        println!("\nResults written to: {}", path);
    }
}
