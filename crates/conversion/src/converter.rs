//! Run orchestration: discovery, store initialization, then every date.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use grib2_parser::{GribReader, ParameterTable, SourceReader};
use rayon::prelude::*;
use tracing::{info, warn};
use zarr_store::{format_size, StoreSchema, ZarrStore};

use crate::config::ConversionConfig;
use crate::discovery::discover_grid;
use crate::error::{ConversionError, Result};
use crate::process::{DateProcessor, DateReport, DateStatus};

/// Drives one conversion run.
pub struct Converter {
    config: ConversionConfig,
    reader: Arc<dyn SourceReader>,
}

impl Converter {
    pub fn new(config: ConversionConfig, reader: Arc<dyn SourceReader>) -> Self {
        Self { config, reader }
    }

    /// Converter reading GRIB2 files, with the configured parameter table
    /// or the built-in one.
    pub fn with_grib(config: ConversionConfig) -> Result<Self> {
        let table = match &config.parameter_table {
            Some(path) => {
                let table = ParameterTable::from_yaml_file(path)?;
                info!(path = %path.display(), entries = table.len(), "Loaded parameter table");
                table
            }
            None => ParameterTable::builtin(),
        };
        Ok(Self::new(config, Arc::new(GribReader::new(table))))
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Run the conversion.
    ///
    /// Validation, grid discovery and store creation complete before any
    /// date is processed. Failures confined to a date or a variable are
    /// reported in the summary; everything else aborts the run.
    pub fn run(&self) -> Result<ConversionSummary> {
        let config = &self.config;
        config.validate()?;
        let dates = config.dates()?;

        info!(
            start = %config.start_date,
            end = %config.end_date,
            dates = dates.len(),
            input = %config.input_dir.display(),
            output = %config.output.display(),
            "Starting conversion"
        );

        let discovered = discover_grid(&dates, config, self.reader.as_ref())?;

        let schema = StoreSchema::new(
            discovered.grid,
            dates.clone(),
            config.forecast_steps.clone(),
            config.variables.clone(),
            &config.chunks,
        )?;
        let store = ZarrStore::create(&config.output, schema, &config.compression)?;

        let reports = self.process_dates(&store, &dates)?;

        let summary = ConversionSummary::new(&store, reports);
        info!(
            dates = summary.ndates,
            missing = summary.missing_dates.len(),
            unreadable = summary.unreadable_dates.len(),
            unwritten = summary.unwritten_cells,
            total_size = summary.total_size,
            "Conversion finished"
        );
        Ok(summary)
    }

    fn process_dates(&self, store: &ZarrStore, dates: &[NaiveDate]) -> Result<Vec<DateReport>> {
        let processor = DateProcessor::new(store, self.reader.as_ref());
        let process = |(index, date): (usize, &NaiveDate)| {
            processor.process(*date, index, &self.config.resolve_source(*date))
        };

        let workers = self.config.workers;
        if workers > 1 && store.schema().chunks.time == 1 {
            info!(workers, "Processing dates in parallel");
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| ConversionError::InvalidConfig(format!("thread pool: {}", e)))?;
            pool.install(|| dates.par_iter().enumerate().map(process).collect())
        } else {
            if workers > 1 {
                warn!(
                    workers,
                    time_chunk = store.schema().chunks.time,
                    "Time chunks span several dates, processing sequentially"
                );
            }
            dates.iter().enumerate().map(process).collect()
        }
    }
}

/// Final report of a run.
#[derive(Debug, Clone)]
pub struct ConversionSummary {
    pub output: PathBuf,
    pub forecast_variables: Vec<String>,
    pub analysis_variables: Vec<String>,
    pub ndates: usize,
    pub nsteps: usize,
    pub nlat: usize,
    pub nlon: usize,
    pub grid_type: String,
    /// On-disk size per data array, by display name.
    pub array_sizes: Vec<(String, u64)>,
    pub total_size: u64,
    pub missing_dates: Vec<NaiveDate>,
    pub unreadable_dates: Vec<NaiveDate>,
    /// Number of (date, variable) slabs left at the fill value.
    pub unwritten_cells: usize,
    pub reports: Vec<DateReport>,
}

impl ConversionSummary {
    fn new(store: &ZarrStore, reports: Vec<DateReport>) -> Self {
        let schema = store.schema();
        let nvariables = schema.variables.len();

        let names = |forecast: bool| -> Vec<String> {
            schema
                .variables
                .iter()
                .filter(|v| v.is_forecast() == forecast)
                .map(|v| v.short_id.clone())
                .collect()
        };

        let dates_with = |pred: fn(&DateStatus) -> bool| -> Vec<NaiveDate> {
            reports
                .iter()
                .filter(|r| pred(&r.status))
                .map(|r| r.date)
                .collect()
        };

        Self {
            output: store.root().to_path_buf(),
            forecast_variables: names(true),
            analysis_variables: names(false),
            ndates: schema.ntime(),
            nsteps: schema.nstep(),
            nlat: schema.grid.nlat,
            nlon: schema.grid.nlon,
            grid_type: schema.grid.grid_type.clone(),
            array_sizes: store.array_sizes(),
            total_size: store.total_size(),
            missing_dates: dates_with(|s| *s == DateStatus::MissingFile),
            unreadable_dates: dates_with(|s| matches!(s, DateStatus::Unreadable(_))),
            unwritten_cells: reports.iter().map(|r| r.unwritten(nvariables)).sum(),
            reports,
        }
    }
}

impl fmt::Display for ConversionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Zarr store: {}", self.output.display())?;
        writeln!(f, "  Forecast variables: {}", self.forecast_variables.join(", "))?;
        writeln!(f, "  Analysis variables: {}", self.analysis_variables.join(", "))?;
        writeln!(f, "  Dates: {}", self.ndates)?;
        writeln!(f, "  Steps: {}", self.nsteps)?;
        writeln!(f, "  Grid: {} x {} ({})", self.nlat, self.nlon, self.grid_type)?;
        writeln!(f, "  Array sizes:")?;
        for (name, size) in &self.array_sizes {
            writeln!(f, "    {:<36} {:>12}", name, format_size(*size))?;
        }
        writeln!(f, "  Total size: {}", format_size(self.total_size))?;
        if !self.missing_dates.is_empty() {
            writeln!(f, "  Missing files: {}", join_dates(&self.missing_dates))?;
        }
        if !self.unreadable_dates.is_empty() {
            writeln!(f, "  Unreadable files: {}", join_dates(&self.unreadable_dates))?;
        }
        write!(f, "  Slabs left at fill value: {}", self.unwritten_cells)
    }
}

fn join_dates(dates: &[NaiveDate]) -> String {
    dates
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
