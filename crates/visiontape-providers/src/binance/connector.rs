//! Download-then-parse façade
//!
//! `TradesConnector` owns one downloader (and its connection pool) and one
//! parser. It is cheap to clone and safe to share across tasks.

use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;
use visiontape_config::DataConfig;
use visiontape_core::{FetchResult, TradeDate, TradeRecord};

use super::archive::{ParseError, TradeArchiveParser};
use super::downloader::{DownloadError, TradeArchiveDownloader};

/// Connector settings fixed at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorConfig {
    pub base_url: String,
    /// Deadline for the whole download
    pub request_timeout: Duration,
    pub max_idle_connections: usize,
    pub max_connections_per_host: usize,
    pub idle_connection_timeout: Duration,
    pub max_response_bytes: u64,
    /// Per CSV member; `None` reads every row
    pub max_trades_per_member: Option<usize>,
    pub user_agent: String,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self::from(&DataConfig::default())
    }
}

impl From<&DataConfig> for ConnectorConfig {
    fn from(data: &DataConfig) -> Self {
        Self {
            base_url: data.base_url.clone(),
            request_timeout: data.request_timeout(),
            max_idle_connections: data.max_idle_connections,
            max_connections_per_host: data.max_connections_per_host,
            idle_connection_timeout: data.idle_timeout(),
            max_response_bytes: data.max_response_bytes,
            max_trades_per_member: data.max_trades_per_member,
            user_agent: data.user_agent.clone(),
        }
    }
}

/// Errors returned by [`TradesConnector`]
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Download failed for {symbol} on {date}: {source}")]
    Download {
        symbol: String,
        date: String,
        #[source]
        source: DownloadError,
    },

    #[error("Parse failed for {symbol} on {date}: {source}")]
    Parse {
        symbol: String,
        date: String,
        #[source]
        source: ParseError,
    },

    /// The blocking parse task panicked or was aborted
    #[error("Parse worker failed for {symbol} on {date}: {message}")]
    Worker {
        symbol: String,
        date: String,
        message: String,
    },
}

impl ConnectorError {
    pub fn symbol(&self) -> &str {
        match self {
            ConnectorError::Download { symbol, .. }
            | ConnectorError::Parse { symbol, .. }
            | ConnectorError::Worker { symbol, .. } => symbol,
        }
    }

    pub fn date(&self) -> &str {
        match self {
            ConnectorError::Download { date, .. }
            | ConnectorError::Parse { date, .. }
            | ConnectorError::Worker { date, .. } => date,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ConnectorError::Download { source, .. } if source.is_cancelled())
    }
}

/// Fetches and decodes one day of trades for a symbol
#[derive(Debug, Clone)]
pub struct TradesConnector {
    downloader: TradeArchiveDownloader,
    parser: TradeArchiveParser,
}

impl TradesConnector {
    /// Build the HTTP client and parser from `config`
    pub fn new(config: ConnectorConfig) -> Result<Self, DownloadError> {
        Ok(Self {
            downloader: TradeArchiveDownloader::new(&config)?,
            parser: TradeArchiveParser::new()
                .with_max_trades_per_member(config.max_trades_per_member),
        })
    }

    /// Fetch trades for `symbol` on `year`-`month`-`day`
    ///
    /// Components are used as given; callers validate them first
    /// (see `visiontape_core::TradeDate::parse_parts`).
    pub async fn fetch_trades(
        &self,
        symbol: &str,
        year: i32,
        month: u32,
        day: u32,
        cancel: &CancellationToken,
    ) -> Result<FetchResult, ConnectorError> {
        self.fetch_date(symbol, TradeDate::new(year, month, day), cancel)
            .await
    }

    /// Fetch trades for `symbol` on `date`
    ///
    /// # Errors
    ///
    /// The first failing stage decides the error; nothing is retried. A
    /// cancellation that arrives while the archive is being parsed is
    /// reported as a cancelled download once the parse returns.
    pub async fn fetch_date(
        &self,
        symbol: &str,
        date: TradeDate,
        cancel: &CancellationToken,
    ) -> Result<FetchResult, ConnectorError> {
        let started = Instant::now();
        let date_str = date.to_string();

        let body = self
            .downloader
            .download(symbol, &date, cancel)
            .await
            .map_err(|source| ConnectorError::Download {
                symbol: symbol.to_string(),
                date: date_str.clone(),
                source,
            })?;
        let archive_bytes = body.len();

        let trades = self.parse_body(symbol, &date, body, cancel).await?;

        info!(
            event_type = "fetch_complete",
            symbol = symbol,
            date = %date_str,
            trade_count = trades.len(),
            archive_bytes = archive_bytes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetched trades"
        );

        Ok(FetchResult::new(symbol, date_str, trades))
    }

    async fn parse_body(
        &self,
        symbol: &str,
        date: &TradeDate,
        body: Vec<u8>,
        cancel: &CancellationToken,
    ) -> Result<Vec<TradeRecord>, ConnectorError> {
        let parser = self.parser;
        let trades = tokio::task::spawn_blocking(move || parser.parse_archive(&body))
            .await
            .map_err(|e| ConnectorError::Worker {
                symbol: symbol.to_string(),
                date: date.to_string(),
                message: e.to_string(),
            })?
            .map_err(|source| ConnectorError::Parse {
                symbol: symbol.to_string(),
                date: date.to_string(),
                source,
            })?;

        if cancel.is_cancelled() {
            return Err(ConnectorError::Download {
                symbol: symbol.to_string(),
                date: date.to_string(),
                source: DownloadError::Cancelled {
                    url: self.downloader.archive_url(symbol, date),
                },
            });
        }

        Ok(trades)
    }
}
