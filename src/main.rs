//! Resolution-Harvest main entry point
//!
//! This is the command-line interface for the Resolution-Harvest PDF harvester.

use anyhow::Context;
use clap::Parser;
use resolution_harvest::config::{parse_config, validate, Config};
use resolution_harvest::output::{print_summary, BarProgress};
use resolution_harvest::Coordinator;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Resolution-Harvest: a polite, resumable PDF harvester
///
/// Walks the paginated resolution catalog, follows each entry to its PDF
/// and saves it into the output directory. Progress is kept in a state
/// file so an interrupted run can continue with --resume.
#[derive(Parser, Debug)]
#[command(name = "resolution-harvest")]
#[command(version)]
#[command(about = "A polite, resumable PDF harvester", long_about = None)]
struct Cli {
    /// Optional TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output directory for PDFs and the state file
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Seconds to wait between requests
    #[arg(long, value_name = "SECS")]
    delay: Option<f64>,

    /// Maximum listing pages to process in this run (0 = no limit)
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Continue from the saved state and skip files already on disk
    #[arg(long)]
    resume: bool,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<f64>,

    /// First listing page of the catalog
    #[arg(long, value_name = "URL")]
    start_url: Option<String>,

    /// Attempts per request before giving up on transient failures
    #[arg(long, value_name = "N")]
    max_attempts: Option<u32>,

    /// Do not fetch or obey robots.txt
    #[arg(long)]
    ignore_robots: bool,

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

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {:#}", e);
            return Err(e.into());
        }
    };

    tracing::info!(
        "Harvesting {} into {} (delay {}s, max pages {}, resume {})",
        config.crawler.start_url,
        config.output.directory.display(),
        config.crawler.delay,
        config.crawler.max_pages,
        config.crawler.resume
    );

    let mut coordinator = Coordinator::new(config)?;
    if !cli.quiet {
        coordinator = coordinator.with_progress(Arc::new(BarProgress::new()));
    }

    tokio::select! {
        result = coordinator.run() => match result {
            Ok(report) => {
                if !cli.quiet {
                    println!();
                    print_summary(&report.stats, report.pages, &report.stop_reason.to_string());
                }
                Ok(())
            }
            Err(e) => {
                tracing::error!("Harvest failed: {}", e);
                Err(e.into())
            }
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted; state is saved up to the last finished page");
            std::process::exit(130);
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("resolution_harvest=info,warn"),
            1 => EnvFilter::new("resolution_harvest=debug,info"),
            2 => EnvFilter::new("resolution_harvest=trace,debug"),
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

/// Layers defaults, the optional config file and CLI flags, then validates
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            parse_config(&content).with_context(|| format!("parsing {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(out) = &cli.out {
        config.output.directory = out.clone();
    }
    if let Some(delay) = cli.delay {
        config.crawler.delay = delay;
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(timeout) = cli.timeout {
        config.crawler.timeout = timeout;
    }
    if let Some(start_url) = &cli.start_url {
        config.crawler.start_url = start_url.clone();
    }
    if let Some(max_attempts) = cli.max_attempts {
        config.crawler.max_attempts = max_attempts;
    }
    if cli.resume {
        config.crawler.resume = true;
    }
    if cli.ignore_robots {
        config.crawler.respect_robots = false;
    }

    validate(&config)?;
    Ok(config)
}
