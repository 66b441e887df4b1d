//! Zarr V3 store for converted forecast data.
//!
//! The store holds four coordinate arrays (`time`, `step`, `latitude`,
//! `longitude`) and one float32 array per variable, shaped
//! `(time, step, latitude, longitude)` for forecast variables and
//! `(time, latitude, longitude)` for analysis variables. Every array is
//! chunked per [`ChunkConfig`] (clamped to the axis lengths) and compressed
//! with a single shared codec.
//!
//! Stores are always created from scratch: [`ZarrStore::create`] removes
//! any existing store at the target path.

pub mod codec;
pub mod config;
pub mod error;
pub mod read;
pub mod schema;
pub mod size;
pub mod store;

pub use codec::build_codec;
pub use config::{ChunkConfig, Codec, CompressionConfig};
pub use error::{Result, StoreError};
pub use read::StoreReader;
pub use schema::{ArrayLayout, EffectiveChunks, StoreSchema};
pub use size::{directory_size, format_size};
pub use store::ZarrStore;
