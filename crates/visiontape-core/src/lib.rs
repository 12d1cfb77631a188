//! Core types for Binance Vision daily trade archives
//!
//! Provider-independent building blocks shared by the downloader, the
//! archive parser and the command-line front end:
//!
//! - `types` - `TradeRecord`, `FetchResult` and the JSON response envelope
//! - `date` - `TradeDate`, the single zero-padding rule for archive dates
//! - `validation` - symbol/date checks applied before a fetch is issued
//! - `metrics` - injectable request counters
//!
//! ## Quick Start
//!
//! ```rust
//! use visiontape_core::{validate_symbol, TradeDate};
//!
//! validate_symbol("BTCUSDT").unwrap();
//! let date = TradeDate::parse_parts("2024", "1", "5").unwrap();
//! assert_eq!(date.to_string(), "2024-01-05");
//! ```

pub mod date;
pub mod metrics;
pub mod types;
pub mod validation;

pub use date::TradeDate;
pub use metrics::{ActiveRequestGuard, MetricsSnapshot, RequestMetrics};
pub use types::{FetchResponse, FetchResult, TradeRecord};
pub use validation::{validate_symbol, ValidationError};
