//! Crawler module for feed pagination and post harvesting
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with randomized retry backoff
//! - The browser seam and its plain-HTTP implementation
//! - Date-bounded pagination of a profile feed
//! - Parallel harvesting of detail pages
//! - Per-profile and per-run orchestration

mod browser;
mod coordinator;
mod fetcher;
mod harvester;
mod paginator;
mod retry;

pub use browser::{Browser, HttpFeedBrowser};
pub use coordinator::{crawl_profiles, ProfileCrawler, ProfileOutcome, ProfileReport, RunReport};
pub use fetcher::{build_http_client, FetchError, HttpFetcher, PageFetcher};
pub use harvester::{partition, HarvestOutcome, Harvester, ItemFailure};
pub use paginator::{Paginator, PaginatorSettings, LOAD_MORE_THRESHOLD};
pub use retry::{fetch_with_retry, RetryPolicy};

use crate::config::Config;
use crate::model::{DateRange, FieldSchema};
use crate::HarvestError;
use std::sync::Arc;

/// Crawls a list of profiles over plain HTTP
///
/// This is the main entry point for a run. It will:
/// 1. Build the HTTP client and feed browser from `config`
/// 2. Crawl each profile in turn
/// 3. Return every harvested record with a per-profile report
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `profiles` - Profile handles to crawl
/// * `range` - Publish dates to keep
/// * `concurrency` - Number of parallel harvest workers
/// * `halt_on_error` - Stop at the first failed profile
///
/// # Example
///
/// ```no_run
/// use chrono::NaiveDate;
/// use profile_harvester::config::Config;
/// use profile_harvester::crawler::crawl;
/// use profile_harvester::DateRange;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let range = DateRange::new(
///     NaiveDate::from_ymd_opt(2018, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2018, 3, 31).unwrap(),
/// )?;
/// let report = crawl(&Config::default(), &["someone".to_string()], range, 5, false).await?;
/// println!("{} posts", report.records.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(
    config: &Config,
    profiles: &[String],
    range: DateRange,
    concurrency: usize,
    halt_on_error: bool,
) -> Result<RunReport, HarvestError> {
    let schema = Arc::new(FieldSchema::new(config.output.columns.iter().cloned())?);
    let browser = HttpFeedBrowser::new(build_http_client(&config.client)?);
    let mut crawler = ProfileCrawler::from_config(config, browser)?;

    Ok(crawl_profiles(&mut crawler, profiles, range, &schema, concurrency, halt_on_error).await)
}
