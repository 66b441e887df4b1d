//! Chunking and compression settings for the store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Requested chunk sizes per logical axis.
///
/// `None` for latitude or longitude means one chunk spanning the whole axis.
/// Requests larger than an axis are clamped to the axis length when the
/// schema is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    /// Chunk size along time.
    pub time: usize,
    /// Chunk size along step. Defaults to the time chunk size.
    pub step: Option<usize>,
    pub latitude: Option<usize>,
    pub longitude: Option<usize>,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            time: 1,
            step: None,
            latitude: None,
            longitude: None,
        }
    }
}

impl ChunkConfig {
    /// Requested step chunk size.
    pub fn step_chunk(&self) -> usize {
        self.step.unwrap_or(self.time)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let axes = [
            ("time", Some(self.time)),
            ("step", self.step),
            ("latitude", self.latitude),
            ("longitude", self.longitude),
        ];
        for (axis, size) in axes {
            if size == Some(0) {
                return Err(StoreError::Config(format!(
                    "chunk size along {} must be > 0",
                    axis
                )));
            }
        }
        Ok(())
    }
}

/// Compression codec for the store's arrays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Codec {
    /// No compression.
    None,
    /// Zstd compression.
    #[default]
    Zstd,
    /// Gzip compression.
    Gzip,
    /// Blosc with LZ4.
    BloscLz4,
    /// Blosc with Zstd.
    BloscZstd,
}

impl Codec {
    /// Get the codec name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Zstd => "zstd",
            Self::Gzip => "gzip",
            Self::BloscLz4 => "blosc_lz4",
            Self::BloscZstd => "blosc_zstd",
        }
    }

    /// Accepted level range for the codec.
    pub fn level_range(&self) -> Option<std::ops::RangeInclusive<i32>> {
        match self {
            Self::None => None,
            Self::Zstd => Some(-7..=22),
            Self::Gzip | Self::BloscLz4 | Self::BloscZstd => Some(0..=9),
        }
    }
}

impl FromStr for Codec {
    type Err = String;

    /// Parse from string (case-insensitive). `lz4` is accepted for `blosc_lz4`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "zstd" => Ok(Self::Zstd),
            "gzip" => Ok(Self::Gzip),
            "lz4" | "blosc_lz4" => Ok(Self::BloscLz4),
            "blosc_zstd" => Ok(Self::BloscZstd),
            other => Err(format!(
                "unknown compression '{}' (expected none, zstd, gzip, blosc_lz4 or blosc_zstd)",
                other
            )),
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Codec selection plus level, shared by every array in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    pub codec: Codec,
    pub level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            codec: Codec::Zstd,
            level: 3,
        }
    }
}

impl CompressionConfig {
    pub fn new(codec: Codec, level: i32) -> Self {
        Self { codec, level }
    }

    pub fn none() -> Self {
        Self::new(Codec::None, 0)
    }

    /// Validate the level against the codec's range.
    pub fn validate(&self) -> Result<()> {
        match self.codec.level_range() {
            Some(range) if !range.contains(&self.level) => Err(StoreError::Config(format!(
                "{} level must be in {}..={}, got {}",
                self.codec,
                range.start(),
                range.end(),
                self.level
            ))),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for CompressionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.codec {
            Codec::None => write!(f, "none"),
            codec => write!(f, "{} (level {})", codec, self.level),
        }
    }
}
