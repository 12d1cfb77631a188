//! Zip archive extraction and concurrent member parsing
//!
//! Only the central directory is read up front. Each selected CSV member is
//! then decompressed and decoded by its own rayon task; every task works on a
//! private buffer and takes the shared lock once, to append its result.

use parking_lot::Mutex;
use std::io::{Cursor, Read, Seek};
use thiserror::Error;
use tracing::{debug, warn};
use visiontape_core::TradeRecord;
use zip::result::ZipError;
use zip::ZipArchive;

use super::rows::decode_trades;

/// Member file extension selected for parsing
pub const CSV_EXTENSION: &str = ".csv";

/// A member that could not be opened or streamed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{member}: {reason}")]
pub struct MemberError {
    pub member: String,
    pub reason: String,
}

impl MemberError {
    fn new(member: &str, reason: impl Into<String>) -> Self {
        Self {
            member: member.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while parsing an archive
#[derive(Debug, Error)]
pub enum ParseError {
    /// Bytes are not a readable zip archive
    #[error("Failed to read zip archive: {0}")]
    InvalidArchive(#[from] ZipError),

    #[error("No CSV files found in the archive")]
    NoCsvMembers,

    /// One or more members failed; every failure is listed
    #[error("{} of {total} CSV members failed: {}", .failures.len(), summarize(.failures))]
    MemberFailures {
        total: usize,
        failures: Vec<MemberError>,
    },
}

fn summarize(failures: &[MemberError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Names of the CSV members worth parsing, sorted
///
/// Directories and names consisting only of the extension are skipped.
pub fn csv_member_names<R: Read + Seek>(archive: &ZipArchive<R>) -> Vec<String> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|name| {
            !name.ends_with('/')
                && name.len() > CSV_EXTENSION.len()
                && name.ends_with(CSV_EXTENSION)
        })
        .map(str::to_string)
        .collect();
    names.sort();
    names
}

/// Parser for Binance Vision trade archives
#[derive(Debug, Clone, Copy, Default)]
pub struct TradeArchiveParser {
    max_trades_per_member: Option<usize>,
}

impl TradeArchiveParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of trades decoded from each member
    pub fn with_max_trades_per_member(mut self, max: Option<usize>) -> Self {
        self.max_trades_per_member = max;
        self
    }

    /// Parse every CSV member of a zip archive
    ///
    /// Members are parsed in parallel and joined before returning. Trades of a
    /// single member keep their file order; the order of members in the
    /// output is unspecified.
    ///
    /// # Errors
    ///
    /// - `InvalidArchive` if the bytes are not a zip archive
    /// - `NoCsvMembers` if no member ends in `.csv`
    /// - `MemberFailures` listing every member that could not be read
    pub fn parse_archive(&self, bytes: &[u8]) -> Result<Vec<TradeRecord>, ParseError> {
        let archive = ZipArchive::new(Cursor::new(bytes))?;
        let members = csv_member_names(&archive);
        if members.is_empty() {
            return Err(ParseError::NoCsvMembers);
        }

        debug!(
            event_type = "archive_opened",
            archive_bytes = bytes.len(),
            entries = archive.len(),
            csv_members = members.len(),
            "Opened trades archive"
        );

        let trades = Mutex::new(Vec::new());
        let failures = Mutex::new(Vec::new());
        let max_trades = self.max_trades_per_member;

        rayon::scope(|scope| {
            for member in &members {
                let mut archive = archive.clone();
                let trades = &trades;
                let failures = &failures;

                scope.spawn(move |_| match parse_member(&mut archive, member, max_trades) {
                    Ok(mut parsed) => trades.lock().append(&mut parsed),
                    Err(failure) => {
                        warn!(
                            event_type = "member_failed",
                            member = %failure.member,
                            reason = %failure.reason,
                            "Failed to parse archive member"
                        );
                        failures.lock().push(failure);
                    }
                });
            }
        });

        let mut failures = failures.into_inner();
        if !failures.is_empty() {
            failures.sort_by(|a, b| a.member.cmp(&b.member));
            return Err(ParseError::MemberFailures {
                total: members.len(),
                failures,
            });
        }

        Ok(trades.into_inner())
    }
}

fn parse_member<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    member: &str,
    max_trades: Option<usize>,
) -> Result<Vec<TradeRecord>, MemberError> {
    let file = archive
        .by_name(member)
        .map_err(|e| MemberError::new(member, format!("failed to open: {e}")))?;

    let decoded = decode_trades(file, max_trades)
        .map_err(|e| MemberError::new(member, format!("failed to read CSV: {e}")))?;

    debug!(
        event_type = "member_parsed",
        member = member,
        trade_count = decoded.trades.len(),
        rows_skipped = decoded.stats.rows_skipped,
        header_skipped = decoded.stats.header_skipped,
        truncated = decoded.stats.truncated,
        "Parsed archive member"
    );

    Ok(decoded.trades)
}
