//! Outbound HTTP client for the metadata provider.
//!
//! One pooled `reqwest::Client` is shared by the whole process. Each call makes
//! at most `max_attempts` attempts across every retry reason:
//!
//! * connection failure: fixed `connect_backoff`
//! * timeout: fixed `timeout_backoff`
//! * 502/503/504: exponential backoff (`backoff_factor`, doubled per attempt)
//! * 429: the provider's `Retry-After` (or `default_retry_after`)
//!
//! Any other status, 4xx included, is handed back to the caller untouched.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use tokio::time::sleep;

use crate::error::{AppError, AppResult, TransportError};

use super::rate_limit::RateBudget;

/// Timeout for primary resource fetches
pub const PRIMARY_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for auxiliary fetches such as credits
pub const AUXILIARY_TIMEOUT: Duration = Duration::from_secs(3);

const POOL_SIZE: usize = 10;
const USER_AGENT: &str = concat!("movie-rec-api/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// First delay of the 5xx backoff sequence
    pub backoff_factor: Duration,
    pub timeout_backoff: Duration,
    pub connect_backoff: Duration,
    pub default_retry_after: Duration,
    /// Upper bound on a provider-requested wait
    pub max_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_factor: Duration::from_millis(300), // 0.3s, 0.6s, 1.2s
            timeout_backoff: Duration::from_secs(1),
            connect_backoff: Duration::from_secs(2),
            default_retry_after: Duration::from_secs(2),
            max_retry_after: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay after the `attempt`-th (1-based) retryable 5xx response
    pub fn status_backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.backoff_factor.saturating_mul(1 << exponent)
    }

    fn retry_after(&self, headers: &HeaderMap) -> Duration {
        headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after)
            .unwrap_or(self.default_retry_after)
            .min(self.max_retry_after)
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Parses a `Retry-After` value given in seconds
///
/// HTTP-date values are not interpreted; callers fall back to their default.
/// Values too large for a `Duration` saturate to `Duration::MAX`.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
}

/// Final provider answer after the retry loop
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: String,
    /// Attempts spent, including the one that produced this response
    pub attempts: u32,
}

impl UpstreamResponse {
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> AppResult<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| AppError::ExternalApi(format!("Malformed provider response: {}", e)))
    }
}

#[derive(Clone)]
pub struct UpstreamClient {
    http_client: reqwest::Client,
    api_url: String,
    api_key: String,
    retry: RetryPolicy,
    budget: Arc<RateBudget>,
}

impl UpstreamClient {
    pub fn new(api_url: String, api_key: String, budget: Arc<RateBudget>) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(POOL_SIZE)
            .build()?;

        Ok(Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            retry: RetryPolicy::default(),
            budget,
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sends `method path?query` to the provider, retrying transient failures
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<UpstreamResponse, TransportError> {
        let url = format!("{}{}", self.api_url, path);
        let max_attempts = self.retry.max_attempts.max(1);
        let mut last_error = TransportError::Exhausted {
            attempts: 0,
            last_status: None,
        };

        for attempt in 1..=max_attempts {
            self.budget.acquire().await;

            let result = self
                .http_client
                .request(method.clone(), &url)
                .query(&[("api_key", self.api_key.as_str())])
                .query(query)
                .timeout(timeout)
                .send()
                .await;

            let delay = match result {
                Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                    self.budget.on_rate_limited();
                    let wait = self.retry.retry_after(response.headers());
                    tracing::warn!(
                        path = %path,
                        attempt,
                        retry_after_ms = wait.as_millis() as u64,
                        "Provider rate limit hit"
                    );
                    last_error = TransportError::Exhausted {
                        attempts: attempt,
                        last_status: Some(StatusCode::TOO_MANY_REQUESTS.as_u16()),
                    };
                    wait
                }
                Ok(response) if is_retryable_status(response.status()) => {
                    let status = response.status();
                    tracing::warn!(path = %path, attempt, status = status.as_u16(), "Provider unavailable");
                    last_error = TransportError::Exhausted {
                        attempts: attempt,
                        last_status: Some(status.as_u16()),
                    };
                    self.retry.status_backoff(attempt)
                }
                Ok(response) => {
                    let status = response.status();
                    // The per-call timeout also covers reading the body.
                    match response.text().await {
                        Ok(body) => {
                            if attempt > 1 {
                                tracing::debug!(path = %path, attempt, "Provider call succeeded after retry");
                            }
                            return Ok(UpstreamResponse {
                                status,
                                body,
                                attempts: attempt,
                            });
                        }
                        Err(e) => self.failure_backoff(path, attempt, e, &mut last_error)?,
                    }
                }
                Err(e) => self.failure_backoff(path, attempt, e, &mut last_error)?,
            };

            if attempt < max_attempts {
                sleep(delay).await;
            }
        }

        tracing::error!(path = %path, attempts = max_attempts, error = %last_error, "Provider retries exhausted");
        Err(last_error)
    }

    /// Delay before retrying a transport failure, or the error if it is not retryable
    fn failure_backoff(
        &self,
        path: &str,
        attempt: u32,
        error: reqwest::Error,
        last_error: &mut TransportError,
    ) -> Result<Duration, TransportError> {
        if error.is_timeout() {
            tracing::warn!(path = %path, attempt, "Provider request timed out");
            *last_error = TransportError::Timeout;
            Ok(self.retry.timeout_backoff)
        } else if error.is_connect() {
            tracing::warn!(path = %path, attempt, error = %error, "Provider connection failed");
            *last_error = TransportError::Connect(error.to_string());
            Ok(self.retry.connect_backoff)
        } else {
            tracing::error!(path = %path, attempt, error = %error, "Provider request failed");
            Err(error.into())
        }
    }
}
