//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests of the pipeline, including:
//! - Building the shared HTTP client with browser-like headers
//! - GET requests with a per-request timeout
//! - Exponential backoff with jitter for transient failures
//! - Error classification (retryable vs terminal)

use crate::config::{HttpConfig, RetryConfig};
use crate::ConfigError;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// A fetch that did not produce markup
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a status that retrying cannot fix
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Every attempt failed with a retryable condition
    #[error("Gave up on {url} after {attempts} attempts: {reason}")]
    Exhausted {
        url: String,
        attempts: u32,
        reason: String,
    },
}

/// How often and how patiently a URL is retried
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_retries: u32,
    /// Backoff after the first failed attempt
    pub base_delay: Duration,
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            jitter_min_ms: config.jitter_min_ms,
            jitter_max_ms: config.jitter_max_ms,
        }
    }

    /// Delay after failed attempt number `attempt` (1-based)
    ///
    /// `base * 2^(attempt - 1)` plus a uniformly drawn jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor) + self.jitter()
    }

    fn jitter(&self) -> Duration {
        if self.jitter_max_ms <= self.jitter_min_ms {
            return Duration::from_millis(self.jitter_min_ms);
        }
        let ms = rand::rng().random_range(self.jitter_min_ms..=self.jitter_max_ms);
        Duration::from_millis(ms)
    }
}

/// Returns true for statuses worth another attempt
pub fn is_retryable(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Builds the shared HTTP client
///
/// Only idle connections are capped here, at the enrichment concurrency.
/// The number of open connections is bounded by the enricher's semaphore,
/// not by the client.
///
/// # Arguments
///
/// * `config` - Header and timeout configuration
/// * `pool_size` - Maximum idle connections kept per host
pub fn build_http_client(config: &HttpConfig, pool_size: usize) -> crate::Result<Client> {
    let mut headers = HeaderMap::new();
    let accept_language = HeaderValue::from_str(&config.accept_language).map_err(|e| {
        ConfigError::Validation(format!(
            "accept_language is not a valid header value: {}",
            e
        ))
    })?;
    headers.insert(ACCEPT_LANGUAGE, accept_language);
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );

    let client = Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(pool_size)
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// GET with timeout and bounded retry
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | 2xx | Return body |
/// | 429, 500, 502, 503, 504 | Retry with backoff |
/// | Timeout / connection error | Retry with backoff |
/// | Body read error | Retry with backoff |
/// | Any other status | Immediate `FetchError::Status` |
/// | Attempts exhausted | `FetchError::Exhausted` |
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl PageFetcher {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Fetches `url`, returning the response body
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL to fetch
    /// * `timeout` - Bound on each individual attempt
    pub async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let max_attempts = self.retry.max_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            tracing::debug!("GET {} (attempt {}/{})", url, attempt, max_attempts);

            let reason = match self.client.get(url).timeout(timeout).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        match response.text().await {
                            Ok(body) => return Ok(body),
                            Err(e) => format!("failed to read body: {}", e),
                        }
                    } else if is_retryable(status) {
                        format!("HTTP {}", status.as_u16())
                    } else {
                        return Err(FetchError::Status {
                            url: url.to_string(),
                            status: status.as_u16(),
                        });
                    }
                }
                Err(e) => describe_transport_error(&e),
            };

            if attempt >= max_attempts {
                return Err(FetchError::Exhausted {
                    url: url.to_string(),
                    attempts: attempt,
                    reason,
                });
            }

            let delay = self.retry.backoff(attempt);
            tracing::warn!(
                "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                attempt,
                max_attempts,
                url,
                reason,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else {
        error.to_string()
    }
}
