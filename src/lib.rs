//! Profile Harvester: a date-bounded crawler for public profile feeds
//!
//! This crate paginates through a profile's post feed until a requested start
//! date is crossed, fetches every post's detail page in parallel batches and
//! turns the embedded page payloads into tabular post records.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod input;
pub mod model;
pub mod output;

use thiserror::Error;

/// Main error type for per-profile failures
///
/// Everything in here aborts the crawl of one profile. Failures of a single
/// post are contained by the harvester and reported as [`ItemError`]s instead.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Profile {profile} is private")]
    PrivateProfile { profile: String },

    #[error("Feed of {profile} stalled at {visible} visible posts ({} collected)", .collected.len())]
    PaginationStalled {
        profile: String,
        visible: usize,
        collected: Vec<model::PostIdentifier>,
    },

    #[error("Date probe failed for {url}: {source}")]
    Probe {
        url: String,
        #[source]
        source: ItemError,
    },

    #[error("Browser error during {stage}: {message}")]
    Browser { stage: &'static str, message: String },

    #[error("Profile page of {profile} is unusable: {source}")]
    ProfilePage {
        profile: String,
        #[source]
        source: extract::ExtractError,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single post, either while fetching or while extracting
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("extraction failed: {0}")]
    Extract(#[from] extract::ExtractError),
}

impl ItemError {
    /// Name of the pipeline stage that failed, used in log lines
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch",
            Self::Extract(_) => "extract",
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for per-profile operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl_profiles, HarvestOutcome, ProfileCrawler, RunReport};
pub use model::{DateRange, FieldSchema, FieldValue, PostIdentifier, PostRecord, ProfileSnapshot};
