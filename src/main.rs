//! Profile Harvester main entry point
//!
//! This is the command-line interface for the profile harvester.

use chrono::NaiveDate;
use clap::{ArgGroup, Parser};
use profile_harvester::config::{load_config_with_hash, Config};
use profile_harvester::crawler::crawl;
use profile_harvester::input::read_accounts;
use profile_harvester::output::{print_report, write_delimited};
use profile_harvester::{DateRange, FieldSchema};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Profile Harvester: collect post data from public profiles
///
/// Pages through each profile's feed back to the start date, fetches every
/// post in parallel and writes the posts published within the date range to
/// a delimited file.
#[derive(Parser, Debug)]
#[command(name = "profile-harvester")]
#[command(version)]
#[command(about = "Collect post data from public profiles", long_about = None)]
#[command(group(
    ArgGroup::new("accounts")
        .required(true)
        .args(["usernames", "accounts_file"])
))]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Username of an account to crawl (repeatable)
    #[arg(short, long = "username", value_name = "NAME")]
    usernames: Vec<String>,

    /// Delimited file listing the accounts to crawl, instead of -u
    #[arg(long, value_name = "PATH", requires = "column")]
    accounts_file: Option<PathBuf>,

    /// Header of the accounts file column holding the usernames
    #[arg(long, value_name = "NAME", requires = "accounts_file")]
    column: Option<String>,

    /// First publish date to keep (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    start: NaiveDate,

    /// Last publish date to keep (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    end: NaiveDate,

    /// Number of parallel workers per profile (overrides the config)
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..=64))]
    procs: Option<u16>,

    /// Output file
    #[arg(short, long, value_name = "FILE", default_value = "posts.csv")]
    output: PathBuf,

    /// Stop at the first profile that fails instead of moving on
    #[arg(long)]
    halt_on_error: bool,

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

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
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
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    let range = DateRange::new(cli.start, cli.end)?;
    let concurrency = cli.procs.map_or(config.crawler.concurrency, usize::from);
    let schema = FieldSchema::new(config.output.columns.iter().cloned())?;

    let usernames = match (&cli.accounts_file, &cli.column) {
        (Some(path), Some(column)) => read_accounts(path, column, config.output.delimiter)?,
        _ => cli.usernames.clone(),
    };
    if usernames.is_empty() {
        return Err("no accounts to crawl".into());
    }

    tracing::info!(
        "Crawling {} profiles for posts in {} with {} workers",
        usernames.len(),
        range,
        concurrency
    );

    let report = crawl(&config, &usernames, range, concurrency, cli.halt_on_error).await?;

    write_delimited(&cli.output, &schema, &report.records, config.output.delimiter)?;

    if !cli.quiet {
        print_report(&report);
    }

    if report.succeeded() == 0 && !report.profiles.is_empty() {
        return Err("no profile was crawled successfully".into());
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("profile_harvester=info,warn"),
            1 => EnvFilter::new("profile_harvester=debug,info"),
            2 => EnvFilter::new("profile_harvester=trace,debug"),
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
