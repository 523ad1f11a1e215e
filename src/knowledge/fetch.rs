//! HTTP fetching with bounded retries.
//!
//! Only transport-level failures (connection errors, timeouts) are retried.
//! A response with a non-success status is final for that request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::config::FetchConfig;

/// Result of a fetch. Never an error: failures are reported in-band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// Whether the body was obtained.
    pub success: bool,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    /// Description of the failure.
    pub message: Option<String>,
    /// Response body on success.
    pub data: Option<String>,
}

impl FetchResult {
    fn ok(status: u16, data: String) -> Self {
        Self {
            success: true,
            status: Some(status),
            message: None,
            data: Some(data),
        }
    }

    fn failed(status: Option<u16>, message: String) -> Self {
        Self {
            success: false,
            status,
            message: Some(message),
            data: None,
        }
    }
}

/// A response received from the remote side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Canonical reason phrase for the status, if any.
    pub reason: String,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A transport-level failure. These are the only failures that get retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else {
            Self::Other(e.to_string())
        }
    }
}

/// Something that can perform a plain HTTP GET.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Fetch `url`, returning the response or a transport failure.
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// [`HttpTransport`] backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with the given timeouts.
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialised.
    #[must_use]
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to build HTTP client");
        Self { client }
    }

    /// Create a transport from fetch configuration.
    #[must_use]
    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(config.connect_timeout(), config.request_timeout())
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let reason = status.canonical_reason().unwrap_or_default().to_string();
        let body = if status.is_success() {
            response.text().await?
        } else {
            String::new()
        };
        Ok(HttpResponse {
            status: status.as_u16(),
            reason,
            body,
        })
    }
}

/// How many attempts to make and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_retries: u32,
    /// Base delay; attempt `n` (1-indexed) waits `retry_delay * n` afterwards.
    pub retry_delay: Duration,
}

impl RetryPolicy {
    /// Create a retry policy.
    #[must_use]
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries,
            retry_delay,
        }
    }

    /// Delay to wait after the given failed attempt (1-indexed).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.retry_delay * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

/// GET `url`, retrying transport failures with linear backoff.
pub async fn fetch_with_retry(
    transport: &dyn HttpTransport,
    url: &str,
    policy: &RetryPolicy,
) -> FetchResult {
    let attempts = policy.max_retries.max(1);
    let mut last_error: Option<TransportError> = None;

    for attempt in 1..=attempts {
        match transport.get(url).await {
            Ok(response) if response.is_success() => {
                return FetchResult::ok(response.status, response.body);
            }
            Ok(response) => {
                return FetchResult::failed(
                    Some(response.status),
                    format!(
                        "Server responded with status {}: {}",
                        response.status, response.reason
                    ),
                );
            }
            Err(e) => {
                tracing::debug!(url = %url, attempt, error = %e, "Fetch attempt failed");
                last_error = Some(e);
                if attempt < attempts {
                    tokio::time::sleep(policy.backoff(attempt)).await;
                }
            }
        }
    }

    let reason = last_error.map_or_else(|| "Unknown error".to_string(), |e| e.to_string());
    FetchResult::failed(
        None,
        format!("Request failed after {attempts} attempts: {reason}"),
    )
}
