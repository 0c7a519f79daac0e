//! Date-bounded feed pagination
//!
//! The feed is newest first. The paginator keeps asking it for more posts
//! until either every post of the profile is listed or the oldest listed post
//! predates the requested start date.

use crate::config::CrawlerConfig;
use crate::crawler::browser::Browser;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::retry::{fetch_with_retry, RetryPolicy};
use crate::extract::Extractor;
use crate::model::{PostIdentifier, ProfileSnapshot};
use crate::{HarvestError, ItemError};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

/// Feeds showing fewer items than this by default have nothing to load
pub const LOAD_MORE_THRESHOLD: usize = 12;

/// Timing of the "wait for more items" step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginatorSettings {
    /// How long the feed may take to grow before it counts as stalled
    pub more_items_timeout: Duration,
    /// How often the rendered items are re-read while waiting
    pub poll_interval: Duration,
}

impl From<&CrawlerConfig> for PaginatorSettings {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            more_items_timeout: Duration::from_secs(config.more_items_timeout_secs),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }
}

impl Default for PaginatorSettings {
    fn default() -> Self {
        Self::from(&CrawlerConfig::default())
    }
}

/// Drives a [`Browser`] through a profile feed
pub struct Paginator<'a> {
    browser: &'a mut dyn Browser,
    fetcher: &'a dyn PageFetcher,
    extractor: &'a Extractor,
    retry: RetryPolicy,
    settings: PaginatorSettings,
}

impl<'a> Paginator<'a> {
    pub fn new(
        browser: &'a mut dyn Browser,
        fetcher: &'a dyn PageFetcher,
        extractor: &'a Extractor,
        retry: RetryPolicy,
        settings: PaginatorSettings,
    ) -> Self {
        Self {
            browser,
            fetcher,
            extractor,
            retry,
            settings,
        }
    }

    /// Collects post identifiers of the loaded feed, newest first
    ///
    /// The browser must already show the profile's feed. The loop:
    /// 1. Merges newly rendered identifiers, keeping display order
    /// 2. Stops once `snapshot.post_count` identifiers are known
    /// 3. Stops once the oldest known post predates `start_date`
    /// 4. Otherwise asks for more items and waits for the feed to grow
    ///
    /// The result may end with posts older than `start_date`; the harvester
    /// filters them out.
    ///
    /// # Errors
    ///
    /// * `HarvestError::PaginationStalled` - The feed did not grow in time
    /// * `HarvestError::Probe` - The oldest post's date could not be read
    /// * `HarvestError::Browser` - The browser failed
    pub async fn collect(
        &mut self,
        profile: &str,
        start_date: NaiveDate,
        snapshot: &ProfileSnapshot,
    ) -> Result<Vec<PostIdentifier>, HarvestError> {
        tracing::info!("Retrieving post URLs for {}", profile);

        let mut rng = StdRng::from_os_rng();
        let mut result: Vec<PostIdentifier> = Vec::new();
        let mut known: HashSet<PostIdentifier> = HashSet::new();
        let mut load_more_attempted = false;

        loop {
            let visible = self.browser.read_visible_items().await?;
            let visible_count = visible.len();
            for item in visible {
                if known.insert(item.clone()) {
                    result.push(item);
                }
            }

            if result.len() >= snapshot.post_count {
                tracing::debug!(
                    "All {} posts of {} are listed",
                    snapshot.post_count,
                    profile
                );
                break;
            }

            let Some(oldest) = result.last() else {
                tracing::debug!("Feed of {} shows no posts", profile);
                break;
            };

            let oldest_date = self.probe_date(oldest, &mut rng).await?;
            tracing::debug!("Last post date: {}", oldest_date.date_naive());
            if oldest_date.date_naive() < start_date {
                break;
            }

            let clicked = if !load_more_attempted && visible_count >= LOAD_MORE_THRESHOLD {
                load_more_attempted = true;
                self.browser.click_load_more().await?
            } else {
                false
            };
            if !clicked {
                self.browser.trigger_more().await?;
            }

            self.wait_for_growth(profile, visible_count, &result).await?;
        }

        tracing::info!("Collected {} post URLs for {}", result.len(), profile);
        Ok(result)
    }

    /// Reads the publish date of a post from its detail page
    async fn probe_date(
        &self,
        post: &PostIdentifier,
        rng: &mut StdRng,
    ) -> Result<chrono::DateTime<chrono::FixedOffset>, HarvestError> {
        let probe_error = |source: ItemError| HarvestError::Probe {
            url: post.to_string(),
            source,
        };

        let page = fetch_with_retry(self.fetcher, post.as_str(), &self.retry, rng)
            .await
            .map_err(|e| probe_error(e.into()))?;
        self.extractor
            .publish_date(&page)
            .map_err(|e| probe_error(e.into()))
    }

    /// Waits until more than `before` items are rendered
    async fn wait_for_growth(
        &mut self,
        profile: &str,
        before: usize,
        collected: &[PostIdentifier],
    ) -> Result<(), HarvestError> {
        let deadline = Instant::now() + self.settings.more_items_timeout;

        loop {
            let visible = self.browser.read_visible_items().await?.len();
            if visible > before {
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::error!(
                    "Hung loading more posts for {} ({} visible)",
                    profile,
                    visible
                );
                return Err(HarvestError::PaginationStalled {
                    profile: profile.to_string(),
                    visible,
                    collected: collected.to_vec(),
                });
            }

            tokio::time::sleep(self.settings.poll_interval.min(deadline - now)).await;
        }
    }
}
