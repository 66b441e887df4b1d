//! Construction of the shared compression codec.

use std::sync::Arc;

use zarrs::array::codec::bytes_to_bytes::blosc::{
    BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode,
};
use zarrs::array::codec::{BytesToBytesCodecTraits, GzipCodec, ZstdCodec};

use crate::config::{Codec, CompressionConfig};
use crate::error::{Result, StoreError};

/// Shared handle to a bytes-to-bytes codec.
pub type SharedCodec = Arc<dyn BytesToBytesCodecTraits>;

/// Build the codec described by `config` for arrays whose elements are
/// `element_size` bytes wide, or `None` for no compression.
///
/// Only blosc depends on the element size: its byte shuffle runs at that
/// width.
pub fn build_codec(config: &CompressionConfig, element_size: usize) -> Result<Option<SharedCodec>> {
    config.validate()?;

    let codec: SharedCodec = match config.codec {
        Codec::None => return Ok(None),
        Codec::Zstd => Arc::new(ZstdCodec::new(config.level.into(), false)),
        Codec::Gzip => {
            let level = u32::try_from(config.level)
                .map_err(|_| StoreError::Config(format!("invalid gzip level {}", config.level)))?;
            Arc::new(GzipCodec::new(level).map_err(|e| StoreError::Config(e.to_string()))?)
        }
        Codec::BloscLz4 => blosc(BloscCompressor::LZ4, config.level, element_size)?,
        Codec::BloscZstd => blosc(BloscCompressor::Zstd, config.level, element_size)?,
    };
    Ok(Some(codec))
}

fn blosc(compressor: BloscCompressor, level: i32, typesize: usize) -> Result<SharedCodec> {
    let level = u8::try_from(level)
        .ok()
        .and_then(|l| BloscCompressionLevel::try_from(l).ok())
        .ok_or_else(|| StoreError::Config(format!("invalid blosc level {}", level)))?;

    let codec = BloscCodec::new(compressor, level, None, BloscShuffleMode::Shuffle, Some(typesize))
        .map_err(|e| StoreError::Config(e.to_string()))?;
    Ok(Arc::new(codec))
}
