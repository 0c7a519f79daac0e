//! Profile crawl orchestration
//!
//! This module sequences the crawl of a profile:
//! - Loading the profile page and reading its snapshot
//! - Refusing private profiles
//! - Paginating the feed down to the start date
//! - Harvesting the collected posts in parallel
//!
//! It also runs a list of profiles one after another, keeping the output of
//! every profile that finished even when a later one fails.

use crate::config::Config;
use crate::crawler::browser::Browser;
use crate::crawler::fetcher::{build_http_client, HttpFetcher, PageFetcher};
use crate::crawler::harvester::{HarvestOutcome, Harvester};
use crate::crawler::paginator::{Paginator, PaginatorSettings};
use crate::crawler::retry::RetryPolicy;
use crate::extract::{parse_profile_page, Extractor};
use crate::model::{DateRange, FieldSchema, PostRecord, ProfileSnapshot};
use crate::{ConfigError, HarvestError};
use chrono::FixedOffset;
use std::sync::Arc;
use url::Url;

/// Crawls single profiles through a [`Browser`]
pub struct ProfileCrawler<B: Browser> {
    browser: B,
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<Extractor>,
    base_url: Url,
    retry: RetryPolicy,
    settings: PaginatorSettings,
}

impl<B: Browser> ProfileCrawler<B> {
    /// Creates a crawler from its parts
    pub fn new(
        browser: B,
        fetcher: Arc<dyn PageFetcher>,
        extractor: Extractor,
        base_url: Url,
        retry: RetryPolicy,
        settings: PaginatorSettings,
    ) -> Self {
        Self {
            browser,
            fetcher,
            extractor: Arc::new(extractor),
            base_url,
            retry,
            settings,
        }
    }

    /// Creates a crawler fetching detail pages over HTTP as configured
    ///
    /// # Errors
    ///
    /// * `HarvestError::Config` - Invalid base URL or timezone offset
    /// * `HarvestError::Http` - The HTTP client could not be built
    pub fn from_config(config: &Config, browser: B) -> Result<Self, HarvestError> {
        let base_url = Url::parse(&config.client.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;
        let offset = FixedOffset::east_opt(config.crawler.utc_offset_hours * 3600).ok_or_else(|| {
            ConfigError::Validation(format!(
                "utc_offset_hours {} is out of range",
                config.crawler.utc_offset_hours
            ))
        })?;
        let client = build_http_client(&config.client)?;

        Ok(Self::new(
            browser,
            Arc::new(HttpFetcher::new(client)),
            Extractor::new(offset),
            base_url,
            RetryPolicy::from(&config.crawler),
            PaginatorSettings::from(&config.crawler),
        ))
    }

    /// URL of a profile's page
    pub fn profile_url(&self, profile: &str) -> Result<Url, HarvestError> {
        self.base_url
            .join(&format!("{}/", profile.trim_matches('/')))
            .map_err(|e| HarvestError::Browser {
                stage: "load",
                message: format!("cannot build profile URL for {}: {}", profile, e),
            })
    }

    /// Loads a profile page and reads its snapshot
    ///
    /// The profile page stays loaded in the browser afterwards.
    pub async fn snapshot(&mut self, profile: &str) -> Result<ProfileSnapshot, HarvestError> {
        let url = self.profile_url(profile)?;
        self.browser.load(url.as_str()).await?;
        let payload = self.browser.read_embedded_payload().await?;
        let page = parse_profile_page(&payload).map_err(|source| HarvestError::ProfilePage {
            profile: profile.to_string(),
            source,
        })?;
        Ok(page.snapshot)
    }

    /// Crawls one profile
    ///
    /// # Errors
    ///
    /// * `HarvestError::PrivateProfile` - The profile is private
    /// * `HarvestError::PaginationStalled` - The feed stopped growing
    /// * any error of loading the profile page or probing post dates
    ///
    /// Failures of individual posts are not errors; they are listed in the
    /// returned outcome.
    pub async fn crawl(
        &mut self,
        profile: &str,
        range: DateRange,
        schema: &Arc<FieldSchema>,
        concurrency: usize,
    ) -> Result<HarvestOutcome, HarvestError> {
        tracing::info!("Crawling {}'s profile", profile);

        let snapshot = self.snapshot(profile).await?;
        if snapshot.is_private {
            return Err(HarvestError::PrivateProfile {
                profile: profile.to_string(),
            });
        }
        tracing::debug!("{} reports {} posts", profile, snapshot.post_count);

        let identifiers = Paginator::new(
            &mut self.browser,
            self.fetcher.as_ref(),
            &self.extractor,
            self.retry,
            self.settings,
        )
        .collect(profile, range.start(), &snapshot)
        .await?;

        let harvester = Harvester::new(
            Arc::clone(&self.fetcher),
            Arc::clone(&self.extractor),
            self.retry,
        );
        let outcome = harvester
            .harvest(&identifiers, range, schema, concurrency)
            .await;

        tracing::info!("Pulled {} posts for {}", outcome.records.len(), profile);
        Ok(outcome)
    }
}

/// How one profile of a run ended
#[derive(Debug)]
pub enum ProfileOutcome {
    Harvested {
        records: usize,
        failures: usize,
        out_of_range: usize,
    },
    Failed(HarvestError),
}

/// Result of crawling one profile within a run
#[derive(Debug)]
pub struct ProfileReport {
    pub profile: String,
    pub outcome: ProfileOutcome,
}

/// Records and per-profile results of a run
#[derive(Debug, Default)]
pub struct RunReport {
    pub records: Vec<PostRecord>,
    pub profiles: Vec<ProfileReport>,
    /// True if the run stopped before crawling every profile
    pub halted: bool,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.profiles
            .iter()
            .filter(|p| matches!(p.outcome, ProfileOutcome::Harvested { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.profiles.len() - self.succeeded()
    }
}

/// Crawls profiles one after another
///
/// Records of a finished profile are kept whatever happens to later ones.
/// A failed profile is logged and recorded; with `halt_on_error` the run
/// stops there, otherwise it moves on to the next profile.
pub async fn crawl_profiles<B: Browser>(
    crawler: &mut ProfileCrawler<B>,
    profiles: &[String],
    range: DateRange,
    schema: &Arc<FieldSchema>,
    concurrency: usize,
    halt_on_error: bool,
) -> RunReport {
    let mut report = RunReport::default();

    for profile in profiles {
        match crawler.crawl(profile, range, schema, concurrency).await {
            Ok(mut outcome) => {
                report.profiles.push(ProfileReport {
                    profile: profile.clone(),
                    outcome: ProfileOutcome::Harvested {
                        records: outcome.records.len(),
                        failures: outcome.failures.len(),
                        out_of_range: outcome.out_of_range,
                    },
                });
                report.records.append(&mut outcome.records);
            }
            Err(e) => {
                tracing::error!("Crawl of {} failed: {}", profile, e);
                report.profiles.push(ProfileReport {
                    profile: profile.clone(),
                    outcome: ProfileOutcome::Failed(e),
                });
                if halt_on_error {
                    report.halted = true;
                    break;
                }
            }
        }
    }

    report
}
