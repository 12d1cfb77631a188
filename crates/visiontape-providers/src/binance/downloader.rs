//! Size-bounded, cancellable archive download
//!
//! URL pattern:
//! ```text
//! {base_url}/{SYMBOL}/{SYMBOL}-trades-{YYYY}-{MM}-{DD}.zip
//! ```
//!
//! The body is read chunk by chunk against a hard byte ceiling, and the whole
//! download races the caller's `CancellationToken` and the request deadline.

use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use visiontape_core::TradeDate;

use super::connector::ConnectorConfig;

const TCP_KEEPALIVE: Duration = Duration::from_secs(60);

/// Upper bound on the buffer reserved from a declared `Content-Length`
const MAX_INITIAL_CAPACITY: u64 = 8 * 1024 * 1024;

fn initial_capacity(declared: Option<u64>) -> usize {
    declared.unwrap_or(0).min(MAX_INITIAL_CAPACITY) as usize
}

/// Errors that can occur while downloading an archive
#[derive(Debug, Error)]
pub enum DownloadError {
    /// HTTP client could not be constructed; the only variant without a URL
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    /// Transport failure (DNS, connect, TLS, reset)
    #[error("HTTP error for {url}: {message}")]
    Http { url: String, message: String },

    /// Deadline elapsed before the body was fully read
    #[error("Request timeout after {after:?} for {url}")]
    Timeout { url: String, after: Duration },

    /// Caller cancelled the download
    #[error("Download cancelled for {url}")]
    Cancelled { url: String },

    /// Any status other than 200
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Downloaded archive is empty: {url}")]
    EmptyBody { url: String },

    /// Body larger than the configured ceiling
    #[error("Response from {url} exceeds the {limit} byte limit")]
    SizeExceeded { url: String, limit: u64 },
}

impl DownloadError {
    /// Remote resource the error refers to
    pub fn url(&self) -> Option<&str> {
        match self {
            DownloadError::Client(_) => None,
            DownloadError::Http { url, .. }
            | DownloadError::Timeout { url, .. }
            | DownloadError::Cancelled { url }
            | DownloadError::Status { url, .. }
            | DownloadError::EmptyBody { url }
            | DownloadError::SizeExceeded { url, .. } => Some(url),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, DownloadError::Cancelled { .. })
    }
}

/// Build the archive URL for a symbol and day
pub fn archive_url(base_url: &str, symbol: &str, date: &TradeDate) -> String {
    format!(
        "{}/{}/{}-trades-{}.zip",
        base_url.trim_end_matches('/'),
        symbol,
        symbol,
        date
    )
}

/// Downloader for daily trade archives
///
/// Cheap to clone; clones share the connection pool and the host
/// connection limit.
#[derive(Debug, Clone)]
pub struct TradeArchiveDownloader {
    client: Client,
    base_url: String,
    request_timeout: Duration,
    max_response_bytes: u64,
    /// One permit per allowed concurrent connection to the data host
    connection_slots: Arc<Semaphore>,
}

impl TradeArchiveDownloader {
    /// Create a downloader with its own connection pool
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::Client` if the TLS backend cannot be initialised.
    pub fn new(config: &ConnectorConfig) -> Result<Self, DownloadError> {
        let max_connections = config.max_connections_per_host.max(1);

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(config.max_idle_connections.min(max_connections))
            .pool_idle_timeout(config.idle_connection_timeout)
            .tcp_keepalive(TCP_KEEPALIVE)
            .build()
            .map_err(|e| DownloadError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            request_timeout: config.request_timeout,
            max_response_bytes: config.max_response_bytes,
            connection_slots: Arc::new(Semaphore::new(max_connections)),
        })
    }

    pub fn archive_url(&self, symbol: &str, date: &TradeDate) -> String {
        archive_url(&self.base_url, symbol, date)
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn max_response_bytes(&self) -> u64 {
        self.max_response_bytes
    }

    /// Download the raw archive bytes for a symbol and day
    ///
    /// # Errors
    ///
    /// | Scenario | Error |
    /// |----------|-------|
    /// | `cancel` fired | `Cancelled` |
    /// | deadline elapsed | `Timeout` |
    /// | connect/transport failure | `Http` |
    /// | status other than 200 | `Status` |
    /// | body over the ceiling | `SizeExceeded` |
    /// | zero-length body | `EmptyBody` |
    pub async fn download(
        &self,
        symbol: &str,
        date: &TradeDate,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, DownloadError> {
        let url = self.archive_url(symbol, date);
        let started = Instant::now();

        debug!(
            event_type = "download_start",
            symbol = symbol,
            date = %date,
            url = %url,
            "Downloading trades archive"
        );

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(DownloadError::Cancelled { url: url.clone() }),
            result = tokio::time::timeout(self.request_timeout, self.fetch_body(&url)) => {
                result.unwrap_or_else(|_| {
                    Err(DownloadError::Timeout {
                        url: url.clone(),
                        after: self.request_timeout,
                    })
                })
            }
        };

        match &outcome {
            Ok(body) => info!(
                event_type = "download_complete",
                symbol = symbol,
                date = %date,
                size_bytes = body.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Downloaded trades archive"
            ),
            Err(e) => warn!(
                event_type = "download_failed",
                symbol = symbol,
                date = %date,
                error = %e,
                "Trades archive download failed"
            ),
        }

        outcome
    }

    async fn fetch_body(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        let http_error = |e: reqwest::Error| DownloadError::Http {
            url: url.to_string(),
            message: e.to_string(),
        };

        // Held until the body is fully read
        let _slot = self
            .connection_slots
            .acquire()
            .await
            .map_err(|e| DownloadError::Http {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let mut response = self.client.get(url).send().await.map_err(http_error)?;

        if response.status() != StatusCode::OK {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let limit = self.max_response_bytes;
        let declared = response.content_length();
        if declared.is_some_and(|len| len > limit) {
            return Err(DownloadError::SizeExceeded {
                url: url.to_string(),
                limit,
            });
        }

        let mut body = Vec::with_capacity(initial_capacity(declared));
        while let Some(chunk) = response.chunk().await.map_err(http_error)? {
            if (body.len() + chunk.len()) as u64 > limit {
                return Err(DownloadError::SizeExceeded {
                    url: url.to_string(),
                    limit,
                });
            }
            body.extend_from_slice(&chunk);
        }

        if body.is_empty() {
            return Err(DownloadError::EmptyBody {
                url: url.to_string(),
            });
        }

        Ok(body)
    }
}
