//! Error types for GRIB2 message access.

use thiserror::Error;

use crate::message::MessageIndex;

/// Errors raised while opening or decoding GRIB2 files.
#[derive(Error, Debug)]
pub enum Grib2Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid GRIB2 format: {0}")]
    InvalidFormat(String),

    #[error("Failed to decode message {index:?}: {reason}")]
    Decode { index: MessageIndex, reason: String },

    #[error("Unsupported grid: {0}")]
    UnsupportedGrid(String),

    #[error("Unsupported time unit code {0}")]
    UnsupportedTimeUnit(u8),

    #[error("Message {0:?} not found")]
    MessageNotFound(MessageIndex),

    #[error("Parameter table error: {0}")]
    Table(String),
}

pub type Result<T> = std::result::Result<T, Grib2Error>;
