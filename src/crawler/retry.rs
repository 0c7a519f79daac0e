//! Retrying page fetches with randomized backoff
//!
//! A detail page is attempted up to `max_attempts` times. Between attempts the
//! caller's own random source picks a wait in `[backoff_min, backoff_max]`.
//! Permanent failures (a missing page) are returned without retrying, and
//! running out of attempts yields [`FetchError::Exhausted`].

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchError, PageFetcher};
use rand::Rng;
use std::time::Duration;

/// How often and how patiently a page is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_min: Duration,
    pub backoff_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&CrawlerConfig::default())
    }
}

impl From<&CrawlerConfig> for RetryPolicy {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_attempts: config.max_fetch_attempts,
            backoff_min: Duration::from_secs(config.backoff_min_secs),
            backoff_max: Duration::from_secs(config.backoff_max_secs),
        }
    }
}

impl RetryPolicy {
    /// Picks the wait before the next attempt
    pub fn backoff<R: Rng>(&self, rng: &mut R) -> Duration {
        let min = self.backoff_min.as_millis() as u64;
        let max = self.backoff_max.as_millis() as u64;
        if max <= min {
            return self.backoff_min;
        }
        Duration::from_millis(rng.random_range(min..=max))
    }
}

/// Fetches `url`, retrying transient failures according to `policy`
///
/// # Returns
///
/// * `Ok(String)` - Body of the first successful attempt
/// * `Err(FetchError::NotFound)` - Permanent failure, not retried
/// * `Err(FetchError::Exhausted)` - Every attempt failed
pub async fn fetch_with_retry<R: Rng>(
    fetcher: &dyn PageFetcher,
    url: &str,
    policy: &RetryPolicy,
    rng: &mut R,
) -> Result<String, FetchError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let err = match fetcher.fetch(url).await {
            Ok(body) => return Ok(body),
            Err(err) if !err.is_retriable() => return Err(err),
            Err(err) => err,
        };

        if attempt >= max_attempts {
            return Err(FetchError::Exhausted {
                url: url.to_string(),
                attempts: attempt,
                last_error: err.to_string(),
            });
        }

        let delay = policy.backoff(rng);
        tracing::warn!(
            url,
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Error loading page, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
