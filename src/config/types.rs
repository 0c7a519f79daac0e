use serde::Deserialize;

/// Main configuration structure for Profile Harvester
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Default number of parallel harvest workers
    pub concurrency: usize,

    /// How long to wait for the feed to grow after asking for more posts (seconds)
    pub more_items_timeout_secs: u64,

    /// How often the feed is re-read while waiting for it to grow (milliseconds)
    pub poll_interval_ms: u64,

    /// Attempts per detail page before giving up
    pub max_fetch_attempts: u32,

    /// Lower bound of the randomized wait between attempts (seconds)
    pub backoff_min_secs: u64,

    /// Upper bound of the randomized wait between attempts (seconds)
    pub backoff_max_secs: u64,

    /// Offset of the platform's timezone from UTC, used for publish dates
    pub utc_offset_hours: i32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            more_items_timeout_secs: 30,
            poll_interval_ms: 500,
            max_fetch_attempts: 5,
            backoff_min_secs: 10,
            backoff_max_secs: 30,
            utc_offset_hours: 0,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClientConfig {
    /// Root URL that profile handles are appended to
    pub base_url: String,

    /// User agent sent with every request
    pub user_agent: String,

    /// Per-request timeout (seconds)
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.instagram.com".to_string(),
            user_agent: format!("profile-harvester/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: 30,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// Cell delimiter of the output file
    pub delimiter: char,

    /// Ordered output columns
    pub columns: Vec<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            columns: crate::model::DEFAULT_COLUMNS
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}
