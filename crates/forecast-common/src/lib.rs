//! Common types and utilities shared across the converter crates.

pub mod error;
pub mod grid;
pub mod time;
pub mod variable;

pub use error::TimeParseError;
pub use grid::{GridDescriptor, GridExtent};
pub use time::{date_range, days_since_epoch, format_compact, parse_run_date};
pub use variable::{
    default_catalog, default_forecast_steps, ExtractionStrategy, VariableCategory, VariableKind,
    VariableSpec, DEFAULT_MAX_STEP,
};
