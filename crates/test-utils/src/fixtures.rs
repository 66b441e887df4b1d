//! JSON source-file fixtures.
//!
//! A fixture file stands in for one GRIB file: a grid plus a list of
//! messages with short name, step timing and values. [`FixtureReader`]
//! opens them through the same [`SourceReader`] trait the GRIB reader
//! implements, so missing-file handling goes through the real filesystem.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use forecast_common::GridDescriptor;
use grib2_parser::{
    FieldSource, Grib2Error, MessageHeader, MessageIndex, ParameterCode, SourceReader,
};
use serde::{Deserialize, Serialize};

/// One message of a fixture file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureMessage {
    pub short_name: String,
    pub start_step: u32,
    pub end_step: u32,
    pub values: Vec<f32>,
}

/// Contents of a fixture file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureFile {
    pub grid: GridDescriptor,
    pub messages: Vec<FixtureMessage>,
}

impl FixtureFile {
    pub fn new(grid: GridDescriptor) -> Self {
        Self {
            grid,
            messages: Vec::new(),
        }
    }

    /// Add a single-step message.
    pub fn instant(self, short_name: &str, step: u32, values: Vec<f32>) -> Self {
        self.message(short_name, step, step, values)
    }

    /// Add an accumulation from `start_step` to `end_step`.
    pub fn accumulated(self, short_name: &str, start_step: u32, end_step: u32, values: Vec<f32>) -> Self {
        self.message(short_name, start_step, end_step, values)
    }

    /// Add a static field (step 0).
    pub fn analysis(self, short_name: &str, values: Vec<f32>) -> Self {
        self.message(short_name, 0, 0, values)
    }

    pub fn message(mut self, short_name: &str, start_step: u32, end_step: u32, values: Vec<f32>) -> Self {
        self.messages.push(FixtureMessage {
            short_name: short_name.to_string(),
            start_step,
            end_step,
            values,
        });
        self
    }

    /// Write the fixture as JSON.
    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, json)
    }

    fn read(path: &Path) -> grib2_parser::Result<Self> {
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Grib2Error::InvalidFormat(format!("{}: {}", path.display(), e)))
    }
}

/// Counters shared by a reader and the sources it opened.
#[derive(Debug, Default)]
pub struct ReadStats {
    opens: AtomicUsize,
    decodes: AtomicUsize,
}

impl ReadStats {
    /// Number of files opened.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Number of messages decoded.
    pub fn decodes(&self) -> usize {
        self.decodes.load(Ordering::SeqCst)
    }
}

/// [`SourceReader`] over JSON fixture files.
#[derive(Debug, Clone, Default)]
pub struct FixtureReader {
    stats: Arc<ReadStats>,
}

impl FixtureReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> Arc<ReadStats> {
        Arc::clone(&self.stats)
    }
}

impl SourceReader for FixtureReader {
    fn open(&self, path: &Path) -> grib2_parser::Result<Box<dyn FieldSource>> {
        let file = FixtureFile::read(path)?;
        self.stats.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FixtureSource::new(path, file, Arc::clone(&self.stats))))
    }
}

/// An opened fixture file.
pub struct FixtureSource {
    path: PathBuf,
    grid: GridDescriptor,
    headers: Vec<MessageHeader>,
    values: Vec<Vec<f32>>,
    stats: Arc<ReadStats>,
}

impl FixtureSource {
    fn new(path: &Path, file: FixtureFile, stats: Arc<ReadStats>) -> Self {
        let mut headers = Vec::with_capacity(file.messages.len());
        let mut values = Vec::with_capacity(file.messages.len());
        for (i, message) in file.messages.into_iter().enumerate() {
            headers.push(MessageHeader {
                index: (i, 0),
                short_name: Some(message.short_name),
                code: ParameterCode::new(255, 255, 255),
                surface: None,
                start_step: message.start_step,
                end_step: message.end_step,
            });
            values.push(message.values);
        }
        Self {
            path: path.to_path_buf(),
            grid: file.grid,
            headers,
            values,
            stats,
        }
    }
}

impl FieldSource for FixtureSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn headers(&self) -> &[MessageHeader] {
        &self.headers
    }

    fn grid(&self) -> &GridDescriptor {
        &self.grid
    }

    fn read_values(&self, index: MessageIndex) -> grib2_parser::Result<Vec<f32>> {
        self.stats.decodes.fetch_add(1, Ordering::SeqCst);
        self.values
            .get(index.0)
            .cloned()
            .ok_or(Grib2Error::MessageNotFound(index))
    }
}
