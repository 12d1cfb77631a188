//! Data provider integrations
//!
//! Source-specific adapters for fetching and decoding trade archives.
//!
//! ## Supported Providers
//!
//! - `binance` - Binance Vision spot daily `trades` archives (zip of CSV)
//!
//! ## Pipeline
//!
//! ```text
//! TradesConnector::fetch_trades
//!   ├── TradeArchiveDownloader   size-bounded, cancellable GET
//!   └── TradeArchiveParser       one worker per CSV member, streaming rows
//!         └── decode_trades      header/short/malformed rows dropped
//! ```
//!
//! ## Design Principles
//!
//! 1. **No hidden state**: no caching, no retries, no disk writes
//! 2. **Error propagation**: terminal failures carry symbol/date/URL context
//! 3. **Row tolerance**: a bad row is dropped, a bad member fails the archive
//! 4. **Bounded resources**: body size ceiling, host connection cap
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tokio_util::sync::CancellationToken;
//! use visiontape_providers::{ConnectorConfig, TradesConnector};
//!
//! let connector = TradesConnector::new(ConnectorConfig::default())?;
//! let cancel = CancellationToken::new();
//! let result = connector.fetch_trades("BTCUSDT", 2024, 1, 15, &cancel).await?;
//! println!("{} trades on {}", result.trade_count, result.date);
//! ```

#[cfg(feature = "binance")]
pub mod binance;

// Binance provider re-exports (alphabetically sorted)
#[cfg(feature = "binance")]
pub use binance::{
    decode_trades, parse_bool, ConnectorConfig, ConnectorError, DecodeStats, DecodedTrades,
    DownloadError, MemberError, ParseError, TradeArchiveDownloader, TradeArchiveParser,
    TradesConnector,
};
