#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HTML table scraping with bounded HTTP retry.
//!
//! [`html_table::HtmlTableScraper`] pulls paired column values out of an
//! HTML page (for example a date column and a count column), either from a
//! live URL or from HTML already on disk. [`retry`] wraps every request in
//! exponential backoff for transient failures.
//!
//! This crate knows nothing about what the values mean. Callers parse the
//! returned strings into their own types.

pub mod html_table;
pub mod retry;

use std::collections::BTreeMap;
use std::time::Duration;

pub use html_table::HtmlTableScraper;

/// Errors that can occur during scraping operations.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// An HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a status that will not be retried, or kept
    /// answering with a retryable one.
    #[error("HTTP status: {message}")]
    Status {
        /// Status line and context.
        message: String,
    },

    /// Parsing the response body or a selector failed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Request settings shared by every fetch.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Additional HTTP headers to include in requests.
    pub headers: BTreeMap<String, String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            headers: BTreeMap::new(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

impl ScrapeConfig {
    /// Sets the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the number of retries for transient failures.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Adds an HTTP header to include in requests.
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Builds a [`reqwest::Client`] with the configured headers and
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Parse`] if a header is invalid, or
    /// [`ScrapeError::Http`] if the client cannot be built.
    pub fn build_client(&self) -> Result<reqwest::Client, ScrapeError> {
        let mut header_map = reqwest::header::HeaderMap::new();
        for (key, value) in &self.headers {
            let name = reqwest::header::HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| ScrapeError::Parse(format!("invalid header name '{key}': {e}")))?;
            let val = reqwest::header::HeaderValue::from_str(value)
                .map_err(|e| ScrapeError::Parse(format!("invalid header value '{value}': {e}")))?;
            header_map.insert(name, val);
        }
        reqwest::Client::builder()
            .default_headers(header_map)
            .timeout(self.timeout)
            .build()
            .map_err(ScrapeError::Http)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_retries_three_times_with_thirty_second_timeout() {
        let config = ScrapeConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn invalid_header_name_is_rejected() {
        let config = ScrapeConfig::default().with_header("bad header", "x");
        assert!(matches!(config.build_client(), Err(ScrapeError::Parse(_))));
    }
}
