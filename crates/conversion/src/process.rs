//! Per-date processing: extract every variable from one source file and
//! write it into that date's time slab.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use grib2_parser::{FieldSource, SourceReader};
use tracing::{debug, info, warn};
use zarr_store::ZarrStore;

use crate::error::{ConversionError, Result};
use crate::extract::extract_variable;

/// What happened to a date as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateStatus {
    /// The source file was read; see the per-variable lists.
    Processed,
    /// No source file for the date.
    MissingFile,
    /// The source file exists but could not be opened.
    Unreadable(String),
}

/// Outcome of processing one date.
#[derive(Debug, Clone)]
pub struct DateReport {
    pub date: NaiveDate,
    pub time_index: usize,
    pub source: PathBuf,
    pub status: DateStatus,
    /// Display names of variables written.
    pub written: Vec<String>,
    /// Display names of variables left at the fill value, with the reason.
    pub skipped: Vec<(String, String)>,
}

impl DateReport {
    fn new(date: NaiveDate, time_index: usize, source: &Path, status: DateStatus) -> Self {
        Self {
            date,
            time_index,
            source: source.to_path_buf(),
            status,
            written: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Number of variables whose slab was left at the fill value.
    pub fn unwritten(&self, nvariables: usize) -> usize {
        nvariables - self.written.len()
    }
}

impl fmt::Display for DateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processed => write!(f, "processed"),
            Self::MissingFile => write!(f, "missing file"),
            Self::Unreadable(reason) => write!(f, "unreadable: {}", reason),
        }
    }
}

/// Writes dates into an initialized store.
///
/// Each call to [`DateProcessor::process`] touches only the slab at its
/// time index, so calls for distinct dates can run concurrently.
pub struct DateProcessor<'a> {
    store: &'a ZarrStore,
    reader: &'a dyn SourceReader,
}

impl<'a> DateProcessor<'a> {
    pub fn new(store: &'a ZarrStore, reader: &'a dyn SourceReader) -> Self {
        Self { store, reader }
    }

    /// Populate the slab at `time_index` from the file at `path`.
    ///
    /// A missing or unreadable file leaves every variable at the fill value.
    /// A missing variable leaves only that variable at the fill value.
    /// Grid mismatches and store failures abort the run.
    pub fn process(&self, date: NaiveDate, time_index: usize, path: &Path) -> Result<DateReport> {
        info!(date = %date, index = time_index, path = %path.display(), "Processing date");

        if !path.is_file() {
            warn!(date = %date, path = %path.display(), "Source file not found, skipping date");
            return Ok(DateReport::new(date, time_index, path, DateStatus::MissingFile));
        }

        let source = match self.reader.open(path) {
            Ok(source) => source,
            Err(e) => {
                warn!(date = %date, path = %path.display(), error = %e, "Cannot open source file, skipping date");
                return Ok(DateReport::new(
                    date,
                    time_index,
                    path,
                    DateStatus::Unreadable(e.to_string()),
                ));
            }
        };

        self.check_grid(source.as_ref())?;

        let schema = self.store.schema();
        let mut report = DateReport::new(date, time_index, path, DateStatus::Processed);

        for spec in &schema.variables {
            match extract_variable(source.as_ref(), spec, &schema.steps) {
                Ok(values) => {
                    self.store.write_slab(&spec.display_name, time_index, &values)?;
                    debug!(date = %date, variable = %spec.display_name, "Wrote variable");
                    report.written.push(spec.display_name.clone());
                }
                Err(e) if e.is_recoverable() => {
                    warn!(
                        date = %date,
                        variable = %spec.short_id,
                        error = %e,
                        "Variable not extracted, leaving fill value"
                    );
                    report.skipped.push((spec.display_name.clone(), e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }

    fn check_grid(&self, source: &dyn FieldSource) -> Result<()> {
        let expected = &self.store.schema().grid;
        let found = source.grid();
        if !expected.matches(found) {
            return Err(ConversionError::GridMismatch {
                file: source.path().to_path_buf(),
                expected: expected.describe(),
                found: found.describe(),
            });
        }
        Ok(())
    }
}
