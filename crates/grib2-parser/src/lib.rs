//! GRIB2 message access for the converter.
//!
//! Source files are read through the [`SourceReader`] and [`FieldSource`]
//! traits. [`GribReader`] implements them on top of the `grib` crate:
//! message headers (short name, level, step timing) are indexed once when a
//! file is opened, and field values are decoded on demand.

pub mod error;
pub mod message;
pub mod reader;
pub mod sections;
pub mod source;
pub mod tables;

pub use error::{Grib2Error, Result};
pub use message::{MessageHeader, MessageIndex, ParameterCode, SurfaceLevel};
pub use reader::{GribFile, GribReader};
pub use sections::ProductTiming;
pub use source::{FieldSource, SourceReader};
pub use tables::{ParameterEntry, ParameterTable};
