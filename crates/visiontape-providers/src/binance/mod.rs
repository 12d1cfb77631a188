//! Binance Vision data provider
//!
//! Daily spot `trades` archives published at
//! `https://data.binance.vision/data/spot/daily/trades/<SYMBOL>/`.
//!
//! ## Architecture
//!
//! - `downloader` - archive URL construction and bounded HTTP download
//! - `archive` - zip member selection and concurrent per-member parsing
//! - `rows` - streaming CSV row decoding into `TradeRecord`
//! - `connector` - download → parse → `FetchResult` façade
//!
//! ## CSV Layout
//!
//! ```text
//! TradeId,Price,Quantity,QuoteQuantity,Timestamp,IsBuyerMaker,IsBestMatch
//! 3366738183,42283.58,0.00122,51.5859676,1704067200003,true,true
//! ```
//!
//! The header row is optional; older archives ship without one.

pub mod archive;
pub mod connector;
pub mod downloader;
pub mod rows;

pub use archive::{MemberError, ParseError, TradeArchiveParser};
pub use connector::{ConnectorConfig, ConnectorError, TradesConnector};
pub use downloader::{archive_url, DownloadError, TradeArchiveDownloader};
pub use rows::{decode_trades, parse_bool, DecodeStats, DecodedTrades};
