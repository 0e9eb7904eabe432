//! HTTP retry helpers for transient errors.
//!
//! Every fetch goes through [`send_text`] instead of calling
//! `reqwest::RequestBuilder::send()` directly, so each request gets
//! exponential backoff on timeouts, connection resets, server errors and
//! rate limiting.
//!
//! ```ignore
//! let html = retry::send_text(|| client.get(&url), config.max_retries).await?;
//! ```

use std::time::Duration;

use crate::ScrapeError;

/// Sends an HTTP request and returns the response body as a `String`.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`] (builders are consumed by `.send()`).
///
/// Retries up to `max_retries` times with exponential backoff (1s, 2s,
/// 4s, ...) on connection errors, timeouts, HTTP 429 and HTTP 5xx. Other
/// 4xx statuses are permanent and returned immediately.
///
/// # Errors
///
/// Returns [`ScrapeError`] if the request fails after all retries, the
/// server returns a non-retryable status, or the body cannot be read.
#[allow(clippy::future_not_send)]
pub async fn send_text<F>(build_request: F, max_retries: u32) -> Result<String, ScrapeError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = send_inner(&build_request, max_retries).await?;
    let url = response.url().to_string();
    let status = response.status();

    response.text().await.map_err(|e| {
        log::error!("Body read failed for {url} (status {status}): {e}");
        ScrapeError::Http(e)
    })
}

/// Core retry loop.
///
/// Returns the successful [`reqwest::Response`] (status 2xx or 3xx).
#[allow(clippy::future_not_send)]
async fn send_inner<F>(build_request: &F, max_retries: u32) -> Result<reqwest::Response, ScrapeError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_error: Option<ScrapeError> = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = backoff(attempt);
            log::warn!("  retry {attempt}/{max_retries} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                if is_transient(&e) && attempt < max_retries {
                    log::warn!("  transient error: {e}");
                    last_error = Some(ScrapeError::Http(e));
                    continue;
                }
                return Err(ScrapeError::Http(e));
            }
            Ok(response) => {
                let status = response.status();

                if is_retryable_status(status) {
                    if attempt < max_retries {
                        log::warn!("  HTTP {status} from {}", response.url());
                        last_error = Some(ScrapeError::Status {
                            message: format!("HTTP {status}"),
                        });
                        continue;
                    }
                    return Err(ScrapeError::Status {
                        message: format!("HTTP {status} after {max_retries} retries"),
                    });
                }

                if status.is_client_error() {
                    return Err(ScrapeError::Status {
                        message: format!("HTTP {status} from {}", response.url()),
                    });
                }

                return Ok(response);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| ScrapeError::Status {
        message: "request failed after all retries".to_string(),
    }))
}

/// Delay before retry number `attempt` (1-based).
fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << (attempt - 1).min(6))
}

/// 429 and 5xx are worth another attempt.
fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}
