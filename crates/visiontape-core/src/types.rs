//! Type definitions for downloaded trade data

use serde::{Deserialize, Serialize};

/// Single executed trade from a Binance Vision `trades` archive
///
/// CSV column order (spot daily trades):
/// `TradeId,Price,Quantity,QuoteQuantity,Timestamp,IsBuyerMaker,IsBestMatch`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Exchange trade ID
    #[serde(rename = "trade_id")]
    pub id: i64,

    /// Execution price
    pub price: f64,

    /// Base asset quantity
    pub quantity: f64,

    /// Quote asset quantity (price * quantity as reported by the exchange)
    pub quote_quantity: f64,

    /// Trade time in milliseconds since the Unix epoch
    #[serde(rename = "timestamp")]
    pub timestamp_millis: i64,

    /// Whether the buyer was the maker (true = aggressive sell)
    pub is_buyer_maker: bool,

    /// Whether the trade was the best price match
    pub is_best_match: bool,
}

/// Result of one fetch-and-parse cycle for a symbol and day
///
/// `trade_count` always equals `trades.len()`; construct through
/// [`FetchResult::new`] to keep it that way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    pub symbol: String,

    /// Normalized `YYYY-MM-DD` date
    pub date: String,

    pub trade_count: usize,

    /// Row order is preserved within an archive member; member order is unspecified
    pub trades: Vec<TradeRecord>,
}

impl FetchResult {
    pub fn new(
        symbol: impl Into<String>,
        date: impl Into<String>,
        trades: Vec<TradeRecord>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            date: date.into(),
            trade_count: trades.len(),
            trades,
        }
    }

    /// Earliest and latest trade timestamps (milliseconds)
    pub fn time_range(&self) -> Option<(i64, i64)> {
        let first = self.trades.first()?.timestamp_millis;
        Some(self.trades.iter().fold((first, first), |(lo, hi), t| {
            (lo.min(t.timestamp_millis), hi.max(t.timestamp_millis))
        }))
    }
}

/// JSON envelope written for every fetch request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<FetchResult>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FetchResponse {
    pub fn success(result: FetchResult) -> Self {
        Self {
            success: true,
            message: Some(format!(
                "Successfully downloaded and parsed {} trades for {} on {}",
                result.trade_count, result.symbol, result.date
            )),
            data: Some(result),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            data: None,
            error: Some(error.into()),
        }
    }
}
