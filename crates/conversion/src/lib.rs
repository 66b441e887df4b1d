//! GRIB to Zarr conversion engine.
//!
//! A run turns one source file per forecast date into a single Zarr store
//! indexed by `(time, step, latitude, longitude)`:
//!
//! 1. [`discover_grid`] reads the grid from the first existing file.
//! 2. [`zarr_store::ZarrStore::create`] allocates coordinates and arrays.
//! 3. [`DateProcessor`] extracts every variable of each date and writes its
//!    time slab. Missing files and missing variables leave fill values.
//!
//! [`Converter`] drives the three phases and returns a
//! [`ConversionSummary`].

pub mod config;
pub mod converter;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod process;

pub use config::{ConversionConfig, DATE_PLACEHOLDER, DEFAULT_FILE_PATTERN};
pub use converter::{ConversionSummary, Converter};
pub use discovery::{discover_grid, DiscoveredGrid};
pub use error::{ConversionError, Result};
pub use extract::{extract_variable, plan_variable, select_message, Selection};
pub use process::{DateProcessor, DateReport, DateStatus};
