//! GRIB2 source files read with the `grib` crate.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use forecast_common::GridDescriptor;
use grib::{Grib2, Grib2Read, SeekableGrib2Reader, SubMessage};
use tracing::{debug, warn};

use crate::error::{Grib2Error, Result};
use crate::message::{MessageHeader, MessageIndex, ParameterCode, SurfaceLevel};
use crate::sections::ProductTiming;
use crate::source::{FieldSource, SourceReader};
use crate::tables::ParameterTable;

/// Coordinates are rounded to this many decimal places, which removes the
/// single-precision noise of the `grib` crate's lat/lon iterator.
const COORDINATE_DECIMALS: i32 = 6;

/// Opens GRIB2 files, resolving short names with a parameter table.
#[derive(Debug, Clone)]
pub struct GribReader {
    table: Arc<ParameterTable>,
}

impl GribReader {
    pub fn new(table: ParameterTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    pub fn table(&self) -> &ParameterTable {
        &self.table
    }
}

impl Default for GribReader {
    fn default() -> Self {
        Self::new(ParameterTable::builtin())
    }
}

impl SourceReader for GribReader {
    fn open(&self, path: &Path) -> Result<Box<dyn FieldSource>> {
        Ok(Box::new(GribFile::open(path, &self.table)?))
    }
}

type FileGrib2 = Grib2<SeekableGrib2Reader<BufReader<File>>>;

/// An opened GRIB2 file with its message headers indexed.
pub struct GribFile {
    path: PathBuf,
    grib: FileGrib2,
    headers: Vec<MessageHeader>,
    grid: GridDescriptor,
}

impl GribFile {
    /// Open a file, index every submessage and derive the grid from the
    /// first one.
    pub fn open(path: &Path, table: &ParameterTable) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let grib = grib::from_reader(reader)
            .map_err(|e| Grib2Error::InvalidFormat(format!("{}: {}", path.display(), e)))?;

        let mut headers = Vec::new();
        let mut grid = None;

        for (index, submsg) in grib.iter() {
            if grid.is_none() {
                grid = Some(grid_of(&submsg)?);
            }
            match header_of(index, &submsg, table) {
                Ok(header) => headers.push(header),
                Err(e) => warn!(
                    path = %path.display(),
                    message = ?index,
                    error = %e,
                    "Skipping message with unreadable product definition"
                ),
            }
        }

        let grid = grid.ok_or_else(|| {
            Grib2Error::InvalidFormat(format!("{}: file holds no messages", path.display()))
        })?;

        debug!(
            path = %path.display(),
            messages = headers.len(),
            grid = %grid.describe(),
            "Indexed GRIB2 file"
        );

        Ok(Self {
            path: path.to_path_buf(),
            grib,
            headers,
            grid,
        })
    }
}

impl FieldSource for GribFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn headers(&self) -> &[MessageHeader] {
        &self.headers
    }

    fn grid(&self) -> &GridDescriptor {
        &self.grid
    }

    fn read_values(&self, index: MessageIndex) -> Result<Vec<f32>> {
        let submsg = self
            .grib
            .iter()
            .find_map(|(i, submsg)| (i == index).then_some(submsg))
            .ok_or(Grib2Error::MessageNotFound(index))?;
        decode(index, submsg)
    }

    fn read_many(&self, indices: &[MessageIndex]) -> Result<Vec<Vec<f32>>> {
        let mut wanted: HashMap<MessageIndex, Vec<usize>> = HashMap::new();
        for (position, index) in indices.iter().enumerate() {
            wanted.entry(*index).or_default().push(position);
        }

        let mut out: Vec<Option<Vec<f32>>> = vec![None; indices.len()];
        let mut remaining = wanted.len();
        for (index, submsg) in self.grib.iter() {
            if remaining == 0 {
                break;
            }
            let Some(positions) = wanted.get(&index) else {
                continue;
            };
            let values = decode(index, submsg)?;
            for &position in positions {
                out[position] = Some(values.clone());
            }
            remaining -= 1;
        }

        out.into_iter()
            .zip(indices)
            .map(|(values, &index)| values.ok_or(Grib2Error::MessageNotFound(index)))
            .collect()
    }
}

fn header_of<R>(
    index: MessageIndex,
    submsg: &SubMessage<'_, R>,
    table: &ParameterTable,
) -> Result<MessageHeader> {
    let prod_def = submsg.prod_def();
    let unsupported = || {
        Grib2Error::InvalidFormat(format!(
            "unsupported product definition template {}",
            prod_def.prod_tmpl_num()
        ))
    };
    let code = ParameterCode::new(
        submsg.indicator().discipline,
        prod_def.parameter_category().ok_or_else(unsupported)?,
        prod_def.parameter_number().ok_or_else(unsupported)?,
    );

    let surface = prod_def.fixed_surfaces().map(|(first, _)| SurfaceLevel {
        kind: first.surface_type,
        value: first.value(),
    });

    let payload: Vec<u8> = prod_def.iter().copied().collect();
    let timing = ProductTiming::decode(prod_def.prod_tmpl_num(), &payload)?;

    Ok(MessageHeader {
        index,
        short_name: table.resolve(code, surface).map(str::to_string),
        code,
        surface,
        start_step: timing.start_step,
        end_step: timing.end_step,
    })
}

fn grid_of<R>(submsg: &SubMessage<'_, R>) -> Result<GridDescriptor> {
    let (ni, nj) = submsg
        .grid_shape()
        .map_err(|e| Grib2Error::UnsupportedGrid(e.to_string()))?;
    let points: Vec<(f32, f32)> = submsg
        .latlons()
        .map_err(|e| Grib2Error::UnsupportedGrid(e.to_string()))?
        .collect();

    if points.len() != ni * nj {
        return Err(Grib2Error::InvalidFormat(format!(
            "grid has {} points, expected {}x{}",
            points.len(),
            ni,
            nj
        )));
    }
    // Values are indexed row by row; a column-major scan cannot be described
    // by separate lat and lon vectors.
    if ni > 1 && points[0].0 != points[1].0 {
        return Err(Grib2Error::UnsupportedGrid(
            "grid points are not stored row by row".to_string(),
        ));
    }

    let lats = (0..nj).map(|j| round_coordinate(points[j * ni].0)).collect();
    let lons = (0..ni).map(|i| round_coordinate(points[i].1)).collect();
    let grid_type = grid_type_name(submsg.grid_def().grid_tmpl_num());

    Ok(GridDescriptor::new(lats, lons, grid_type))
}

fn decode<R: Grib2Read>(index: MessageIndex, submsg: SubMessage<'_, R>) -> Result<Vec<f32>> {
    let decoder = grib::Grib2SubmessageDecoder::from(submsg).map_err(|e| Grib2Error::Decode {
        index,
        reason: e.to_string(),
    })?;
    let values = decoder.dispatch().map_err(|e| Grib2Error::Decode {
        index,
        reason: e.to_string(),
    })?;
    Ok(values.collect())
}

fn round_coordinate(value: f32) -> f64 {
    let scale = 10f64.powi(COORDINATE_DECIMALS);
    (f64::from(value) * scale).round() / scale
}

/// Grid type names for grid definition templates (code table 3.1).
pub fn grid_type_name(template: u16) -> String {
    match template {
        0 => "regular_ll".to_string(),
        1 => "rotated_ll".to_string(),
        20 => "polar_stereographic".to_string(),
        30 => "lambert".to_string(),
        40 => "regular_gg".to_string(),
        other => format!("template_{}", other),
    }
}
