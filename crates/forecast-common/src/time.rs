//! Run-date handling.
//!
//! Source files are produced once per forecast run, one run per calendar
//! day, so dates are plain `NaiveDate`s rendered as `YYYYMMDD`.

use chrono::{Duration, NaiveDate};

use crate::error::TimeParseError;

/// Parse a run date in `YYYYMMDD` or `YYYY-MM-DD` form.
pub fn parse_run_date(s: &str) -> Result<NaiveDate, TimeParseError> {
    let compact: String = s.trim().chars().filter(|c| *c != '-').collect();
    if compact.len() != 8 || !compact.chars().all(|c| c.is_ascii_digit()) {
        return Err(TimeParseError::InvalidFormat(s.to_string()));
    }
    NaiveDate::parse_from_str(&compact, "%Y%m%d")
        .map_err(|_| TimeParseError::InvalidFormat(s.to_string()))
}

/// Daily dates from `start` to `end`, both inclusive, ascending.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>, TimeParseError> {
    if start > end {
        return Err(TimeParseError::InvertedRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    let days = (end - start).num_days();
    Ok((0..=days).map(|d| start + Duration::days(d)).collect())
}

/// Render a date as `YYYYMMDD`, the form used in source file names.
pub fn format_compact(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Whole days between 1970-01-01 and `date` (negative before the epoch).
pub fn days_since_epoch(date: NaiveDate) -> i64 {
    // NaiveDate::default() is 1970-01-01
    (date - NaiveDate::default()).num_days()
}
