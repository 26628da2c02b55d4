//! HTTP fetcher implementation
//!
//! This module handles every outbound request the harvester makes:
//! - Building HTTP clients with the configured identifying user agent
//! - GET requests with an explicit per-request timeout
//! - Error classification into [`FetchError`]
//!
//! Fetchers never retry. A failed fetch is reported once and the caller
//! decides what it means for the crawl.

use crate::HarvestError;
use async_trait::async_trait;
use reqwest::Client;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// A failed fetch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection refused, DNS failure, TLS error, body read failure, etc.
    #[error("{url} is unreachable: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("{url} returned HTTP {status}")]
    NonSuccessStatus { url: String, status: u16 },

    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
}

impl FetchError {
    /// The URL whose fetch failed
    pub fn url(&self) -> &str {
        match self {
            Self::Unreachable { url, .. }
            | Self::NonSuccessStatus { url, .. }
            | Self::Timeout { url, .. } => url,
        }
    }

    /// Short label used in exported failure columns
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Unreachable { .. } => "unreachable",
            Self::NonSuccessStatus { .. } => "non_success_status",
            Self::Timeout { .. } => "timeout",
        }
    }
}

/// Raw content of a successful fetch
#[derive(Debug, Clone)]
pub struct RawContent {
    /// HTTP status code
    pub status_code: u16,

    /// Response body
    pub bytes: Vec<u8>,
}

impl RawContent {
    /// The body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

/// Fetches a single URL
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Performs one request for `url`, giving up after `timeout`
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<RawContent, FetchError>;
}

/// Produces fetchers for the orchestrator
///
/// The orchestrator owns the factory and asks it for a fresh fetcher when its
/// client recycling policy says so.
pub trait FetcherFactory: Send + Sync {
    fn create(&self) -> Result<Arc<dyn PageFetcher>, HarvestError>;
}

impl<F> FetcherFactory for F
where
    F: Fn() -> Result<Arc<dyn PageFetcher>, HarvestError> + Send + Sync,
{
    fn create(&self) -> Result<Arc<dyn PageFetcher>, HarvestError> {
        self()
    }
}

/// Builds an HTTP client identifying itself with `user_agent`
///
/// # Example
///
/// ```no_run
/// use sumi_harvest::crawler::build_http_client;
///
/// let client = build_http_client("Mozilla/5.0").unwrap();
/// ```
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`PageFetcher`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher with its own client
    pub fn with_user_agent(user_agent: &str) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(user_agent)?))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<RawContent, FetchError> {
        if url.trim().is_empty() {
            return Err(FetchError::Unreachable {
                url: url.to_string(),
                reason: "empty URL".to_string(),
            });
        }

        if timeout.is_zero() {
            return Err(FetchError::Unreachable {
                url: url.to_string(),
                reason: "timeout must be greater than zero".to_string(),
            });
        }

        tracing::trace!("GET {}", url);

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_error(url, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::NonSuccessStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_error(url, timeout, e))?;

        Ok(RawContent {
            status_code: status.as_u16(),
            bytes: bytes.to_vec(),
        })
    }
}

/// Creates one [`HttpFetcher`], with a brand new client, per call
#[derive(Debug, Clone)]
pub struct HttpFetcherFactory {
    user_agent: String,
}

impl HttpFetcherFactory {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }
}

impl FetcherFactory for HttpFetcherFactory {
    fn create(&self) -> Result<Arc<dyn PageFetcher>, HarvestError> {
        tracing::debug!("Building HTTP client");
        Ok(Arc::new(HttpFetcher::with_user_agent(&self.user_agent)?))
    }
}

/// Maps a reqwest error onto the fetch error taxonomy
fn classify_error(url: &str, timeout: Duration, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            timeout,
        }
    } else {
        FetchError::Unreachable {
            url: url.to_string(),
            reason: error.to_string(),
        }
    }
}
