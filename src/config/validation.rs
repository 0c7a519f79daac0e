use crate::config::types::{ClientConfig, Config, CrawlerConfig, OutputConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_client_config(&config.client)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 64 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 64, got {}",
            config.concurrency
        )));
    }

    if config.more_items_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "more_items_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.poll_interval_ms < 10 {
        return Err(ConfigError::Validation(format!(
            "poll_interval_ms must be >= 10ms, got {}ms",
            config.poll_interval_ms
        )));
    }

    if config.max_fetch_attempts < 1 {
        return Err(ConfigError::Validation(
            "max_fetch_attempts must be >= 1".to_string(),
        ));
    }

    if config.backoff_min_secs > config.backoff_max_secs {
        return Err(ConfigError::Validation(format!(
            "backoff_min_secs ({}) must not exceed backoff_max_secs ({})",
            config.backoff_min_secs, config.backoff_max_secs
        )));
    }

    if config.utc_offset_hours.abs() > 14 {
        return Err(ConfigError::Validation(format!(
            "utc_offset_hours must be within -14..=14, got {}",
            config.utc_offset_hours
        )));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_client_config(config: &ClientConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if matches!(config.delimiter, '"' | '\n' | '\r') {
        return Err(ConfigError::Validation(format!(
            "delimiter {:?} cannot be used",
            config.delimiter
        )));
    }

    if config.columns.is_empty() {
        return Err(ConfigError::Validation(
            "columns must name at least one field".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for column in &config.columns {
        if column.trim().is_empty() {
            return Err(ConfigError::Validation(
                "column names cannot be empty".to_string(),
            ));
        }
        if !seen.insert(column.as_str()) {
            return Err(ConfigError::Validation(format!(
                "column '{}' is listed twice",
                column
            )));
        }
    }

    Ok(())
}
