//! Store layout: coordinate axes, array shapes and effective chunk shapes.

use chrono::NaiveDate;
use forecast_common::{GridDescriptor, VariableSpec};
use tracing::warn;

use crate::config::ChunkConfig;
use crate::error::{Result, StoreError};

/// Coordinate array names, in dimension order.
pub const TIME: &str = "time";
pub const STEP: &str = "step";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";

/// Shape, chunking and dimension names of one array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayLayout {
    pub name: String,
    pub shape: Vec<u64>,
    pub chunks: Vec<u64>,
    pub dimensions: Vec<&'static str>,
}

impl ArrayLayout {
    /// Number of values in one time slab (`shape[1..]`).
    pub fn slab_len(&self) -> usize {
        self.shape[1..].iter().product::<u64>() as usize
    }
}

/// Effective chunk sizes after clamping to the axis lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveChunks {
    pub time: u64,
    pub step: u64,
    pub latitude: u64,
    pub longitude: u64,
}

/// Everything needed to allocate the store, computed once per run.
#[derive(Debug, Clone)]
pub struct StoreSchema {
    pub dates: Vec<NaiveDate>,
    pub steps: Vec<u32>,
    pub grid: GridDescriptor,
    pub variables: Vec<VariableSpec>,
    pub chunks: EffectiveChunks,
}

impl StoreSchema {
    /// Build the schema. Dates are used as given; the caller supplies a
    /// contiguous ascending sequence.
    pub fn new(
        grid: GridDescriptor,
        dates: Vec<NaiveDate>,
        steps: Vec<u32>,
        variables: Vec<VariableSpec>,
        chunks: &ChunkConfig,
    ) -> Result<Self> {
        chunks.validate()?;
        if dates.is_empty() {
            return Err(StoreError::Config("no dates to store".to_string()));
        }
        if steps.is_empty() {
            return Err(StoreError::Config("no forecast steps to store".to_string()));
        }
        if grid.is_empty() {
            return Err(StoreError::Config("grid has no points".to_string()));
        }

        let chunks = EffectiveChunks {
            time: clamp_chunk(TIME, Some(chunks.time), dates.len()),
            step: clamp_chunk(STEP, Some(chunks.step_chunk()), steps.len()),
            latitude: clamp_chunk(LATITUDE, chunks.latitude, grid.nlat),
            longitude: clamp_chunk(LONGITUDE, chunks.longitude, grid.nlon),
        };

        Ok(Self {
            dates,
            steps,
            grid,
            variables,
            chunks,
        })
    }

    pub fn ntime(&self) -> usize {
        self.dates.len()
    }

    pub fn nstep(&self) -> usize {
        self.steps.len()
    }

    /// Layout of a variable's data array.
    pub fn variable_layout(&self, spec: &VariableSpec) -> ArrayLayout {
        let (nlat, nlon) = (self.grid.nlat as u64, self.grid.nlon as u64);
        let c = &self.chunks;
        let (shape, chunks) = if spec.is_forecast() {
            (
                vec![self.ntime() as u64, self.nstep() as u64, nlat, nlon],
                vec![c.time, c.step, c.latitude, c.longitude],
            )
        } else {
            (
                vec![self.ntime() as u64, nlat, nlon],
                vec![c.time, c.latitude, c.longitude],
            )
        };
        ArrayLayout {
            name: spec.display_name.clone(),
            shape,
            chunks,
            dimensions: spec.dimensions().to_vec(),
        }
    }

    /// Layouts of the four coordinate arrays.
    ///
    /// The time coordinate shares the data arrays' time chunking; the others
    /// are a single chunk.
    pub fn coordinate_layouts(&self) -> Vec<ArrayLayout> {
        let axis = |name: &'static str, len: usize, chunk: u64| ArrayLayout {
            name: name.to_string(),
            shape: vec![len as u64],
            chunks: vec![chunk],
            dimensions: vec![name],
        };
        vec![
            axis(TIME, self.ntime(), self.chunks.time),
            axis(STEP, self.nstep(), self.nstep() as u64),
            axis(LATITUDE, self.grid.nlat, self.grid.nlat as u64),
            axis(LONGITUDE, self.grid.nlon, self.grid.nlon as u64),
        ]
    }

    /// Look up a variable by its array name.
    pub fn variable(&self, display_name: &str) -> Option<&VariableSpec> {
        self.variables.iter().find(|v| v.display_name == display_name)
    }
}

/// Clamp a requested chunk size to the axis length; `None` spans the axis.
fn clamp_chunk(axis: &str, requested: Option<usize>, len: usize) -> u64 {
    let chunk = match requested {
        Some(size) if size > len => {
            warn!(
                axis,
                requested = size,
                length = len,
                "Chunk size exceeds axis length, clamping"
            );
            len
        }
        Some(size) => size,
        None => len,
    };
    chunk.max(1) as u64
}
