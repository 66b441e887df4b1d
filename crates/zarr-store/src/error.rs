//! Error types for the Zarr store.

use thiserror::Error;

/// Errors that can occur while creating or writing the store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Storage/IO error.
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reported by the Zarr library.
    #[error("Zarr error: {0}")]
    Zarr(String),

    /// Invalid chunking or compression settings.
    #[error("configuration error: {0}")]
    Config(String),

    /// No array with this name exists in the store.
    #[error("unknown array: {0}")]
    UnknownArray(String),

    /// A slab of the wrong size was passed to a write.
    #[error("array {array}: expected {expected} values, got {found}")]
    ShapeMismatch {
        array: String,
        expected: usize,
        found: usize,
    },

    /// Time index outside the time coordinate.
    #[error("array {array}: time index {index} out of range (ntime = {len})")]
    IndexOutOfRange {
        array: String,
        index: usize,
        len: usize,
    },

    /// Invalid metadata read back from the store.
    #[error("invalid metadata: {0}")]
    Metadata(String),
}

impl StoreError {
    /// Create a Zarr error from any displayable library error.
    pub fn zarr(err: impl std::fmt::Display) -> Self {
        Self::Zarr(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Metadata(err.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
