//! Streaming CSV row decoding
//!
//! Rows are read one at a time into a reused `ByteRecord`; a member is never
//! buffered in full. Row-level problems are counted, not raised.

use csv::{ByteRecord, ReaderBuilder};
use std::io::Read;
use visiontape_core::TradeRecord;

/// Fields in a spot `trades` row
pub const TRADE_FIELD_COUNT: usize = 7;

/// Values of the first column that identify a header row
const HEADER_ID_COLUMNS: [&str; 2] = ["TradeId", "trade_id"];

/// Per-member decoding counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Records read from the CSV stream, header included
    pub rows_read: usize,
    pub header_skipped: bool,
    /// Short or unparsable rows that were dropped
    pub rows_skipped: usize,
    /// Reading stopped at the configured trade cap
    pub truncated: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DecodedTrades {
    /// Trades in file row order
    pub trades: Vec<TradeRecord>,
    pub stats: DecodeStats,
}

/// Parse the boolean spellings found in Binance CSVs
///
/// Accepts `true`/`false`, `t`/`f` (any case) and `1`/`0`.
pub fn parse_bool(token: &str) -> Option<bool> {
    if token.eq_ignore_ascii_case("true") || token.eq_ignore_ascii_case("t") || token == "1" {
        Some(true)
    } else if token.eq_ignore_ascii_case("false") || token.eq_ignore_ascii_case("f") || token == "0"
    {
        Some(false)
    } else {
        None
    }
}

fn field(record: &ByteRecord, index: usize) -> Option<&str> {
    record.get(index).and_then(|raw| std::str::from_utf8(raw).ok())
}

/// Header detection for the first row of a member
///
/// A row is a header when its first field is a known id column name or is
/// not numeric at all.
// NOTE: a header-less file whose first data row has a garbled id is also
// treated as a header here, so that single row is lost.
pub fn is_header_row(record: &ByteRecord) -> bool {
    match field(record, 0) {
        Some(first) => HEADER_ID_COLUMNS.contains(&first) || first.parse::<f64>().is_err(),
        None => !record.is_empty(),
    }
}

/// Convert one CSV row positionally, `None` if it is short or malformed
pub fn parse_trade_row(record: &ByteRecord) -> Option<TradeRecord> {
    if record.len() < TRADE_FIELD_COUNT {
        return None;
    }

    Some(TradeRecord {
        id: field(record, 0)?.parse().ok()?,
        price: field(record, 1)?.parse().ok()?,
        quantity: field(record, 2)?.parse().ok()?,
        quote_quantity: field(record, 3)?.parse().ok()?,
        timestamp_millis: field(record, 4)?.parse().ok()?,
        is_buyer_maker: parse_bool(field(record, 5)?)?,
        is_best_match: parse_bool(field(record, 6)?)?,
    })
}

/// Decode every trade row from a CSV stream
///
/// # Arguments
///
/// * `reader` - CSV byte stream (typically a zip member)
/// * `max_trades` - stop once this many trades were decoded (`None` = unlimited)
///
/// # Errors
///
/// Only stream-level failures (I/O, decompression, checksum) are returned.
/// Individual bad rows are dropped and counted in `DecodeStats::rows_skipped`.
pub fn decode_trades<R: Read>(
    reader: R,
    max_trades: Option<usize>,
) -> Result<DecodedTrades, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut decoded = DecodedTrades {
        trades: Vec::with_capacity(max_trades.unwrap_or(10_000).min(1_000_000)),
        stats: DecodeStats::default(),
    };
    let mut record = ByteRecord::new();

    while reader.read_byte_record(&mut record)? {
        decoded.stats.rows_read += 1;

        if decoded.stats.rows_read == 1 && is_header_row(&record) {
            decoded.stats.header_skipped = true;
            continue;
        }

        if max_trades.is_some_and(|max| decoded.trades.len() >= max) {
            decoded.stats.truncated = true;
            break;
        }

        match parse_trade_row(&record) {
            Some(trade) => decoded.trades.push(trade),
            None => decoded.stats.rows_skipped += 1,
        }
    }

    Ok(decoded)
}
