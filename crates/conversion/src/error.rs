//! Error types for the conversion engine.

use std::path::PathBuf;

use forecast_common::TimeParseError;
use grib2_parser::Grib2Error;
use thiserror::Error;
use zarr_store::StoreError;

/// Errors that can occur during a conversion run.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// No source file exists anywhere in the requested range.
    #[error("no source file found for {start}..={end} in {}", directory.display())]
    GridNotFound {
        start: String,
        end: String,
        directory: PathBuf,
    },

    /// A variable (optionally at one step) is absent from a present file.
    #[error("variable {variable}{} not found in {}", step.map(|s| format!(" (step {})", s)).unwrap_or_default(), file.display())]
    VariableNotFound {
        variable: String,
        step: Option<u32>,
        file: PathBuf,
    },

    /// A decoded field does not hold `nlat * nlon` values.
    #[error("variable {variable} in {}: expected {expected} values, got {found}", file.display())]
    FieldSize {
        variable: String,
        file: PathBuf,
        expected: usize,
        found: usize,
    },

    /// A source file's grid differs from the discovered grid.
    #[error("grid of {} ({found}) does not match the store grid ({expected})", file.display())]
    GridMismatch {
        file: PathBuf,
        expected: String,
        found: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid date: {0}")]
    Date(#[from] TimeParseError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Source error: {0}")]
    Source(#[from] Grib2Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConversionError {
    /// True for failures confined to one (date, variable) cell. The cell is
    /// left at the fill value and the run continues.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::VariableNotFound { .. } | Self::FieldSize { .. } | Self::Source(_)
        )
    }
}

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, ConversionError>;
