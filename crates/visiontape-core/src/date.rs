//! Archive date handling
//!
//! Binance Vision names daily archives `<SYMBOL>-trades-<YYYY>-<MM>-<DD>.zip`.
//! `TradeDate` owns the zero-padding rule so the download URL and the
//! `FetchResult::date` field can never disagree.

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

use crate::validation::ValidationError;

/// Earliest year accepted by [`TradeDate::parse_parts`]
pub const MIN_YEAR: i32 = 2000;

/// Latest year accepted by [`TradeDate::parse_parts`]
pub const MAX_YEAR: i32 = 2100;

/// Calendar day identifying one daily archive
///
/// Displays as zero-padded `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TradeDate {
    year: i32,
    month: u32,
    day: u32,
}

impl TradeDate {
    /// Build a date from raw components without validation
    ///
    /// Callers that accept user input should go through [`TradeDate::parse_parts`]
    /// or [`TradeDate::from_naive`] instead.
    pub const fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    /// Convert from a chrono date (always a real calendar date)
    pub fn from_naive(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month(), date.day())
    }

    /// Parse and validate string components as received from a user
    ///
    /// Accepts unpadded month/day (`"1"`) as well as padded (`"01"`).
    ///
    /// # Errors
    ///
    /// - `InvalidYear` if the year is not an integer in 2000-2100
    /// - `InvalidMonth` if the month is not an integer in 1-12
    /// - `InvalidDay` if the day is not an integer in 1-31
    /// - `InvalidDate` if the composed date does not exist (e.g. Feb 30)
    pub fn parse_parts(year: &str, month: &str, day: &str) -> Result<Self, ValidationError> {
        let (year, month, day) = (year.trim(), month.trim(), day.trim());

        let y: i32 = year
            .parse()
            .ok()
            .filter(|y| (MIN_YEAR..=MAX_YEAR).contains(y))
            .ok_or_else(|| ValidationError::InvalidYear(year.to_string()))?;

        let m: u32 = month
            .parse()
            .ok()
            .filter(|m| (1..=12).contains(m))
            .ok_or_else(|| ValidationError::InvalidMonth(month.to_string()))?;

        let d: u32 = day
            .parse()
            .ok()
            .filter(|d| (1..=31).contains(d))
            .ok_or_else(|| ValidationError::InvalidDay(day.to_string()))?;

        let date = Self::new(y, m, d);
        if date.to_naive().is_none() {
            return Err(ValidationError::InvalidDate(date.to_string()));
        }
        Ok(date)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// `None` when the components do not form a real calendar date
    pub fn to_naive(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

impl fmt::Display for TradeDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for TradeDate {
    type Err = ValidationError;

    /// Parse `YYYY-MM-DD` (month/day may be unpadded)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(3, '-');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(y), Some(m), Some(d)) => Self::parse_parts(y, m, d),
            _ => Err(ValidationError::MalformedDate(s.to_string())),
        }
    }
}

impl From<NaiveDate> for TradeDate {
    fn from(date: NaiveDate) -> Self {
        Self::from_naive(date)
    }
}
