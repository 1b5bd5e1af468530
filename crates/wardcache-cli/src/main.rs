//! wardcache - browse the public healthcare facility list from the terminal.
//!
//! Loads the list through the core cache store, then prints pages, search
//! results, a single province or region, or summary statistics.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wardcache_core::utils::truncate_string;
use wardcache_core::{CacheStore, Config, DataSource, Facility, FacilityApi, FacilityFeed};

// ============================================================================
// Constants
// ============================================================================

/// Width of the name column before truncation
const NAME_WIDTH: usize = 60;

const ENV_HELP: &str = "\
Environment:
  RUST_LOG                      Log filter (default: warn)
  WARDCACHE_BASE_URL            Endpoint base URL
  WARDCACHE_FRESHNESS_MINUTES   Cache freshness window";

#[derive(Parser, Debug)]
#[command(
    name = "wardcache",
    version,
    about = "Browse the public healthcare facility list",
    after_help = ENV_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Print the first page plus <PAGES> more pages.
    List {
        #[arg(long, default_value_t = 0)]
        pages: usize,
    },

    /// Search every cached facility by name, address, region or province.
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Print every facility in a province.
    Province {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },

    /// Print every facility whose region contains the given text.
    Region {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },

    /// Print facility counts per province.
    Stats,
}

/// Initialize the tracing subscriber for logging.
/// Logs go to stderr unless a log file is given.
fn init_tracing(log_file: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path.file_name().unwrap_or_else(|| OsStr::new("wardcache.log"));
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let _log_guard = init_tracing(cli.log_file.as_deref());
    info!("wardcache starting");

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            let mut config = Config::default();
            config.apply_overrides(|key| std::env::var(key).ok());
            config
        }
    };

    let api = FacilityApi::with_options(&config.base_url, config.request_timeout())?;
    let store = Arc::new(CacheStore::with_config(api, config.store_config()));
    let feed = FacilityFeed::new(store);

    run(cli.command, &feed).await
}

async fn run<S: DataSource>(command: Command, feed: &FacilityFeed<S>) -> Result<()> {
    feed.load().await;
    if let Some(message) = feed.snapshot().error_message {
        bail!("{}", message);
    }

    match command {
        Command::List { pages } => {
            for _ in 0..pages {
                feed.load_more().await;
            }
            let state = feed.snapshot();
            if let Some(message) = state.error_message {
                bail!("{}", message);
            }
            print_facilities(&state.items);
            println!(
                "\nShowing {} of {} facilities (cached {})",
                state.items.len(),
                state.total_count,
                feed.store().cache_age().unwrap_or_else(|| "never".to_string())
            );
            if state.has_more {
                println!("Use --pages <n> to load more.");
            }
        }
        Command::Search { query } => {
            let query = query.join(" ");
            let results = feed.store().search_local(&query);
            print_facilities(&results);
            println!("\n{} match(es) for \"{}\"", results.len(), query);
        }
        Command::Province { name } => {
            let name = name.join(" ");
            let results = feed.store().filter_by_province(&name);
            print_facilities(&results);
            println!("\n{} facilities in {}", results.len(), name);
        }
        Command::Region { name } => {
            let name = name.join(" ");
            let results = feed.store().filter_by_region(&name);
            print_facilities(&results);
            println!("\n{} facilities in regions matching \"{}\"", results.len(), name);
        }
        Command::Stats => {
            let all = feed.store().search_local("");
            for (province, count) in province_counts(&all) {
                println!("{:<40} {:>4}", province, count);
            }
            let referral = all.iter().filter(|f| f.is_referral_center()).count();
            println!("\n{} facilities, {} national referral centers", all.len(), referral);
        }
    }

    Ok(())
}

fn province_counts(facilities: &[Facility]) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for facility in facilities {
        *counts.entry(facility.province.as_str()).or_insert(0) += 1;
    }
    counts
}

fn print_facilities(facilities: &[Facility]) {
    for facility in facilities {
        let marker = if facility.is_referral_center() { " [national referral]" } else { "" };
        println!("{}{}", truncate_string(&facility.name, NAME_WIDTH), marker);
        println!("    {}", facility.address);
        println!(
            "    {} | {} | {}",
            facility.region,
            facility.province,
            facility.thumbnail_key().as_str()
        );
        println!("    {}", facility.display_phone());
    }
}
