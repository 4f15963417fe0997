//! Listing fetcher implementation
//!
//! This module handles all HTTP requests for the census, including:
//! - Building the HTTP client with a proper user agent and timeout
//! - The transport seam that lets tests script responses
//! - Outcome classification (listing, absent, retryable)
//! - Applying the retry policy and per-request delay

use crate::config::Config;
use crate::crawler::retry::{Attempt, RetryPolicy};
use crate::state::WorkItem;
use crate::CensusError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Raw response from one GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// One GET against the listing host
///
/// `Err` carries a transport-level failure (connect, timeout, body read)
/// as a human-readable reason; all such failures are retryable.
#[async_trait]
pub trait ListingTransport: Send + Sync {
    async fn get(&self, path: &str) -> Result<TransportResponse, String>;
}

/// Successful classification of a listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// HTTP 200 with the listing body
    Listing(String),

    /// HTTP 404: the directory does not exist
    Absent,
}

/// Terminal failure for a single listing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Giving up on {path} after {attempts} attempts: {reason}")]
    Terminal {
        path: String,
        attempts: u32,
        reason: String,
    },
}

impl FetchError {
    /// Last observed failure reason
    pub fn reason(&self) -> &str {
        match self {
            Self::Terminal { reason, .. } => reason,
        }
    }
}

/// Builds the HTTP client used for listing requests
///
/// # Arguments
///
/// * `config` - The census configuration (timeout and user agent)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.crawler.request_timeout_secs);

    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// `reqwest`-backed transport rooted at the configured base URL
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, CensusError> {
        let client = build_http_client(config)?;
        let base_url = directory_base(&config.crawler.base_url)?;
        Ok(Self { client, base_url })
    }

    /// Absolute URL of a listing path
    pub fn url_for(&self, path: &str) -> Result<Url, String> {
        self.base_url
            .join(path)
            .map_err(|e| format!("Invalid listing path {}: {}", path, e))
    }
}

/// Parses the base URL, making sure relative joins land beneath it
fn directory_base(base_url: &str) -> Result<Url, CensusError> {
    let mut base = base_url.to_string();
    if !base.ends_with('/') {
        base.push('/');
    }

    Url::parse(&base)
        .map_err(|e| crate::ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)).into())
}

#[async_trait]
impl ListingTransport for HttpTransport {
    async fn get(&self, path: &str) -> Result<TransportResponse, String> {
        let url = self.url_for(path)?;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                format!("Connection failed: {}", e)
            } else {
                e.to_string()
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read body: {}", e))?;

        Ok(TransportResponse { status, body })
    }
}

/// Fetches one listing per work item, applying delay, classification and retries
///
/// # Classification
///
/// | Response | Outcome |
/// |----------|---------|
/// | HTTP 200 | `Listing(body)` |
/// | HTTP 404 | `Absent` (not retried) |
/// | Any other status | retried |
/// | Transport failure / timeout | retried |
///
/// Once the retry budget is spent the last reason is returned as
/// [`FetchError::Terminal`].
#[derive(Debug)]
pub struct ListingFetcher<T> {
    transport: T,
    policy: RetryPolicy,
    request_delay: Duration,
}

impl<T: ListingTransport> ListingFetcher<T> {
    pub fn new(transport: T, policy: RetryPolicy, request_delay: Duration) -> Self {
        Self {
            transport,
            policy,
            request_delay,
        }
    }

    /// Builds a fetcher from the crawler section of the configuration
    pub fn from_config(transport: T, config: &Config) -> Self {
        let policy = RetryPolicy::new(
            config.crawler.max_retries,
            Duration::from_millis(config.crawler.retry_backoff_ms),
        );
        Self::new(
            transport,
            policy,
            Duration::from_millis(config.crawler.request_delay_ms),
        )
    }

    /// Fetches the listing for `item`
    pub async fn fetch(&self, item: &WorkItem) -> Result<FetchOutcome, FetchError> {
        let path = item.listing_path();
        let path_ref = path.as_str();
        let max_attempts = self.policy.max_attempts;

        let result = self
            .policy
            .run(move |attempt| async move {
                if !self.request_delay.is_zero() {
                    tokio::time::sleep(self.request_delay).await;
                }

                let classified = match self.transport.get(path_ref).await {
                    Ok(response) => classify(response),
                    Err(reason) => Attempt::Retry(reason),
                };

                if let Attempt::Retry(reason) = &classified {
                    tracing::warn!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt,
                        max_attempts,
                        path_ref,
                        reason
                    );
                }

                classified
            })
            .await;

        result.map_err(|exhausted| FetchError::Terminal {
            path,
            attempts: exhausted.attempts,
            reason: exhausted.last_reason,
        })
    }
}

fn classify(response: TransportResponse) -> Attempt<FetchOutcome> {
    match response.status {
        200 => Attempt::Done(FetchOutcome::Listing(response.body)),
        404 => Attempt::Done(FetchOutcome::Absent),
        status => Attempt::Retry(format!("HTTP {}", status)),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Scripted, ScriptedTransport};
    use super::*;

    fn fetcher(transport: ScriptedTransport) -> ListingFetcher<ScriptedTransport> {
        ListingFetcher::new(
            transport,
            RetryPolicy::new(3, Duration::from_millis(1)),
            Duration::ZERO,
        )
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&Config::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_url_construction() {
        let mut config = Config::default();
        config.crawler.base_url = "https://static.case.law".to_string();
        let transport = HttpTransport::new(&config).unwrap();

        let url = transport
            .url_for(&WorkItem::new("us", "372").listing_path())
            .unwrap();
        assert_eq!(url.as_str(), "https://static.case.law/us/372/cases/");
    }

    #[test]
    fn test_url_construction_with_base_path() {
        let mut config = Config::default();
        config.crawler.base_url = "http://localhost:9000/mirror".to_string();
        let transport = HttpTransport::new(&config).unwrap();

        let url = transport.url_for("cal/50/cases/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/mirror/cal/50/cases/");
    }

    #[tokio::test]
    async fn test_success_returns_body() {
        let transport = ScriptedTransport::new().script(
            "us/1/cases/",
            vec![Scripted::Status(200, "<table></table>".to_string())],
        );
        let fetcher = fetcher(transport);

        let outcome = fetcher.fetch(&WorkItem::new("us", "1")).await;
        assert_eq!(outcome, Ok(FetchOutcome::Listing("<table></table>".to_string())));
    }

    #[tokio::test]
    async fn test_not_found_is_absent_without_retry() {
        let transport =
            ScriptedTransport::new().script("us/2/cases/", vec![Scripted::Status(404, String::new())]);
        let fetcher = fetcher(transport);

        let outcome = fetcher.fetch(&WorkItem::new("us", "2")).await;
        assert_eq!(outcome, Ok(FetchOutcome::Absent));
        assert_eq!(fetcher.transport.calls("us/2/cases/"), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_then_success() {
        let transport = ScriptedTransport::new().script(
            "us/3/cases/",
            vec![
                Scripted::Failure("Request timeout".to_string()),
                Scripted::Status(503, String::new()),
                Scripted::Status(200, "ok".to_string()),
            ],
        );
        let fetcher = fetcher(transport);

        let outcome = fetcher.fetch(&WorkItem::new("us", "3")).await;
        assert_eq!(outcome, Ok(FetchOutcome::Listing("ok".to_string())));
        assert_eq!(fetcher.transport.calls("us/3/cases/"), 3);
    }

    #[tokio::test]
    async fn test_exhausted_budget_is_terminal() {
        let transport =
            ScriptedTransport::new().script("us/4/cases/", vec![Scripted::Status(500, String::new())]);
        let fetcher = fetcher(transport);

        let err = fetcher.fetch(&WorkItem::new("us", "4")).await.unwrap_err();
        assert_eq!(
            err,
            FetchError::Terminal {
                path: "us/4/cases/".to_string(),
                attempts: 3,
                reason: "HTTP 500".to_string(),
            }
        );
        assert_eq!(err.reason(), "HTTP 500");
        assert_eq!(fetcher.transport.calls("us/4/cases/"), 3);
    }

    #[tokio::test]
    async fn test_other_success_codes_are_retried() {
        let transport = ScriptedTransport::new().script(
            "us/5/cases/",
            vec![
                Scripted::Status(204, String::new()),
                Scripted::Status(200, "late".to_string()),
            ],
        );
        let fetcher = fetcher(transport);

        let outcome = fetcher.fetch(&WorkItem::new("us", "5")).await;
        assert_eq!(outcome, Ok(FetchOutcome::Listing("late".to_string())));
    }
}
