//! Error types shared by the converter crates.

use thiserror::Error;

/// Errors raised while parsing run dates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("Invalid date format: {0} (expected YYYYMMDD or YYYY-MM-DD)")]
    InvalidFormat(String),

    #[error("Start date {start} is after end date {end}")]
    InvertedRange { start: String, end: String },
}
