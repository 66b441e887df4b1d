//! Grid discovery: the spatial grid shared by every source file of a run.

use std::path::PathBuf;

use chrono::NaiveDate;
use forecast_common::GridDescriptor;
use grib2_parser::SourceReader;
use tracing::{debug, info};

use crate::config::ConversionConfig;
use crate::error::{ConversionError, Result};

/// Grid found by [`discover_grid`], with the file it was read from.
#[derive(Debug, Clone)]
pub struct DiscoveredGrid {
    pub grid: GridDescriptor,
    pub date: NaiveDate,
    pub source: PathBuf,
}

/// Scan `dates` in order and read the grid of the first source file that
/// exists.
///
/// Fails with [`ConversionError::GridNotFound`] when no file exists in the
/// whole range. A file that exists but cannot be opened is an error too:
/// no schema can be built without a grid.
pub fn discover_grid(
    dates: &[NaiveDate],
    config: &ConversionConfig,
    reader: &dyn SourceReader,
) -> Result<DiscoveredGrid> {
    for &date in dates {
        let path = config.resolve_source(date);
        if !path.is_file() {
            debug!(date = %date, path = %path.display(), "No source file");
            continue;
        }

        let source = reader.open(&path)?;
        let grid = source.grid().clone();
        info!(
            date = %date,
            path = %path.display(),
            grid = %grid.describe(),
            "Discovered grid"
        );
        return Ok(DiscoveredGrid {
            grid,
            date,
            source: path,
        });
    }

    Err(ConversionError::GridNotFound {
        start: dates.first().map(|d| d.to_string()).unwrap_or_default(),
        end: dates.last().map(|d| d.to_string()).unwrap_or_default(),
        directory: config.input_dir.clone(),
    })
}
