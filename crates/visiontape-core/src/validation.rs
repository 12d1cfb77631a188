//! Input validation for fetch requests

use thiserror::Error;

/// Errors raised while validating user-supplied symbol and date parts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,

    #[error("invalid symbol format: {0} (should be uppercase alphanumeric)")]
    InvalidSymbol(String),

    #[error("invalid year: {0}")]
    InvalidYear(String),

    #[error("invalid month: {0} (must be 01-12)")]
    InvalidMonth(String),

    #[error("invalid day: {0} (must be 01-31)")]
    InvalidDay(String),

    /// Components are in range but the calendar date does not exist
    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("malformed date: {0} (expected YYYY-MM-DD)")]
    MalformedDate(String),
}

/// Validate a trading pair symbol
///
/// Symbols must match `^[A-Z0-9]+$`. Lowercase input is rejected rather
/// than silently uppercased.
///
/// # Errors
///
/// - `EmptySymbol` for an empty string
/// - `InvalidSymbol` for anything outside `A-Z0-9`
pub fn validate_symbol(symbol: &str) -> Result<(), ValidationError> {
    if symbol.is_empty() {
        return Err(ValidationError::EmptySymbol);
    }
    if !symbol
        .bytes()
        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
    {
        return Err(ValidationError::InvalidSymbol(symbol.to_string()));
    }
    Ok(())
}
