//! Creation of the Zarr store and per-date slab writes.

use std::collections::HashMap;
use std::mem::size_of;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use forecast_common::{days_since_epoch, VariableKind, VariableSpec};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use zarrs::array::{Array, ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::group::GroupBuilder;
use zarrs_filesystem::FilesystemStore;

use crate::codec::{build_codec, SharedCodec};
use crate::config::CompressionConfig;
use crate::error::{Result, StoreError};
use crate::schema::{ArrayLayout, StoreSchema, LATITUDE, LONGITUDE, STEP, TIME};
use crate::size::directory_size;

/// Global `Conventions` attribute.
pub const CONVENTIONS: &str = "CF-1.8";

/// Global `title` attribute.
pub const TITLE: &str = "GRIB data converted to Zarr";

/// Units of the time coordinate.
pub const TIME_UNITS: &str = "days since 1970-01-01";

/// A freshly created store, with every array addressable by name.
pub struct ZarrStore {
    root: PathBuf,
    schema: StoreSchema,
    arrays: HashMap<String, (ArrayLayout, Array<FilesystemStore>)>,
}

impl ZarrStore {
    /// Create the store at `root`, replacing anything already there.
    ///
    /// Coordinates are written in full before any data array is allocated.
    /// Data arrays are created empty (fill value NaN).
    pub fn create(root: &Path, schema: StoreSchema, compression: &CompressionConfig) -> Result<Self> {
        let codec = build_codec(compression, size_of::<f32>())?;

        if root.exists() {
            warn!(path = %root.display(), "Removing existing store");
            std::fs::remove_dir_all(root)?;
        }
        std::fs::create_dir_all(root)?;

        let storage = Arc::new(FilesystemStore::new(root).map_err(StoreError::zarr)?);

        let mut group = GroupBuilder::new();
        group.attributes(global_attributes(&schema));
        group
            .build(storage.clone(), "/")
            .map_err(StoreError::zarr)?
            .store_metadata()
            .map_err(StoreError::zarr)?;

        write_coordinates(&storage, &schema, compression)?;

        let mut arrays = HashMap::with_capacity(schema.variables.len());
        for spec in &schema.variables {
            let layout = schema.variable_layout(spec);
            let array = build_array(
                &storage,
                &layout,
                DataType::Float32,
                FillValue::from(f32::NAN),
                variable_attributes(spec, &layout),
                codec.as_ref(),
            )?;
            array.store_metadata().map_err(StoreError::zarr)?;
            debug!(
                array = %layout.name,
                shape = ?layout.shape,
                chunks = ?layout.chunks,
                "Created data array"
            );
            arrays.insert(layout.name.clone(), (layout, array));
        }

        info!(
            path = %root.display(),
            variables = schema.variables.len(),
            ntime = schema.ntime(),
            nstep = schema.nstep(),
            grid = %schema.grid.describe(),
            compression = %compression,
            "Initialized Zarr store"
        );

        Ok(Self {
            root: root.to_path_buf(),
            schema,
            arrays,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn schema(&self) -> &StoreSchema {
        &self.schema
    }

    /// Layout of a data array.
    pub fn layout(&self, name: &str) -> Option<&ArrayLayout> {
        self.arrays.get(name).map(|(layout, _)| layout)
    }

    /// Write one date's slab of a data array: `array[time_index, ...]`.
    ///
    /// `values` holds `shape[1..]` values in row-major order: all steps of
    /// a forecast variable, or one field of an analysis variable.
    pub fn write_slab(&self, name: &str, time_index: usize, values: &[f32]) -> Result<()> {
        let (layout, array) = self
            .arrays
            .get(name)
            .ok_or_else(|| StoreError::UnknownArray(name.to_string()))?;

        if time_index >= self.schema.ntime() {
            return Err(StoreError::IndexOutOfRange {
                array: name.to_string(),
                index: time_index,
                len: self.schema.ntime(),
            });
        }
        let expected = layout.slab_len();
        if values.len() != expected {
            return Err(StoreError::ShapeMismatch {
                array: name.to_string(),
                expected,
                found: values.len(),
            });
        }

        let mut start = vec![0u64; layout.shape.len()];
        start[0] = time_index as u64;
        let mut shape = layout.shape.clone();
        shape[0] = 1;

        let subset = ArraySubset::new_with_start_shape(start, shape).map_err(StoreError::zarr)?;
        array
            .store_array_subset_elements(&subset, values)
            .map_err(StoreError::zarr)
    }

    /// On-disk size of each data array, in schema order.
    pub fn array_sizes(&self) -> Vec<(String, u64)> {
        self.schema
            .variables
            .iter()
            .map(|spec| {
                let size = directory_size(&self.root.join(&spec.display_name));
                (spec.display_name.clone(), size)
            })
            .collect()
    }

    /// On-disk size of the whole store.
    pub fn total_size(&self) -> u64 {
        directory_size(&self.root)
    }
}

fn build_array<T: Into<FillValue>>(
    storage: &Arc<FilesystemStore>,
    layout: &ArrayLayout,
    data_type: DataType,
    fill_value: T,
    attributes: Map<String, Value>,
    codec: Option<&SharedCodec>,
) -> Result<Array<FilesystemStore>> {
    let chunk_grid: zarrs::array::ChunkGrid = layout
        .chunks
        .clone()
        .try_into()
        .map_err(|e| StoreError::Config(format!("{:?}", e)))?;

    let mut binding = ArrayBuilder::new(layout.shape.clone(), data_type, chunk_grid, fill_value.into());
    let mut builder = binding.attributes(attributes);

    if let Some(codec) = codec {
        builder = builder.bytes_to_bytes_codecs(vec![codec.clone()]);
    }

    builder
        .dimension_names(Some(layout.dimensions.clone()))
        .build(storage.clone(), &format!("/{}", layout.name))
        .map_err(StoreError::zarr)
}

fn write_coordinates(
    storage: &Arc<FilesystemStore>,
    schema: &StoreSchema,
    compression: &CompressionConfig,
) -> Result<()> {
    // time, latitude and longitude are 8 bytes wide, step is 4
    let wide = build_codec(compression, size_of::<f64>())?;
    let narrow = build_codec(compression, size_of::<i32>())?;
    let layouts = schema.coordinate_layouts();

    for layout in &layouts {
        let subset = ArraySubset::new_with_shape(layout.shape.clone());
        let attributes = coordinate_attributes(layout);
        match layout.name.as_str() {
            TIME => {
                let days: Vec<i64> = schema.dates.iter().map(|d| days_since_epoch(*d)).collect();
                let array =
                    build_array(storage, layout, DataType::Int64, 0i64, attributes, wide.as_ref())?;
                array.store_metadata().map_err(StoreError::zarr)?;
                array
                    .store_array_subset_elements(&subset, &days)
                    .map_err(StoreError::zarr)?;
            }
            STEP => {
                let steps: Vec<i32> = schema.steps.iter().map(|&s| s as i32).collect();
                let array =
                    build_array(storage, layout, DataType::Int32, -1i32, attributes, narrow.as_ref())?;
                array.store_metadata().map_err(StoreError::zarr)?;
                array
                    .store_array_subset_elements(&subset, &steps)
                    .map_err(StoreError::zarr)?;
            }
            _ => {
                let values = if layout.name == LATITUDE {
                    &schema.grid.lats
                } else {
                    &schema.grid.lons
                };
                let array = build_array(
                    storage,
                    layout,
                    DataType::Float64,
                    f64::NAN,
                    attributes,
                    wide.as_ref(),
                )?;
                array.store_metadata().map_err(StoreError::zarr)?;
                array
                    .store_array_subset_elements(&subset, values)
                    .map_err(StoreError::zarr)?;
            }
        }
        debug!(coordinate = %layout.name, len = layout.shape[0], "Wrote coordinate");
    }
    Ok(())
}

fn global_attributes(schema: &StoreSchema) -> Map<String, Value> {
    let mut attrs = Map::new();
    attrs.insert("Conventions".to_string(), json!(CONVENTIONS));
    attrs.insert("title".to_string(), json!(TITLE));
    attrs.insert("creation_date".to_string(), json!(Utc::now().to_rfc3339()));
    attrs.insert("grid_type".to_string(), json!(schema.grid.grid_type));
    if let Some(extent) = &schema.grid.extent {
        attrs.insert("lat_first".to_string(), json!(extent.lat_first));
        attrs.insert("lat_last".to_string(), json!(extent.lat_last));
        attrs.insert("lon_first".to_string(), json!(extent.lon_first));
        attrs.insert("lon_last".to_string(), json!(extent.lon_last));
        attrs.insert("lat_increment".to_string(), json!(extent.lat_increment));
        attrs.insert("lon_increment".to_string(), json!(extent.lon_increment));
    }
    attrs
}

fn coordinate_attributes(layout: &ArrayLayout) -> Map<String, Value> {
    let mut attrs = Map::new();
    match layout.name.as_str() {
        TIME => {
            attrs.insert("long_name".to_string(), json!("initial time of forecast"));
            attrs.insert("standard_name".to_string(), json!("forecast_reference_time"));
            attrs.insert("units".to_string(), json!(TIME_UNITS));
            attrs.insert("calendar".to_string(), json!("proleptic_gregorian"));
        }
        STEP => {
            attrs.insert("long_name".to_string(), json!("time since forecast_reference_time"));
            attrs.insert("standard_name".to_string(), json!("forecast_period"));
            attrs.insert("units".to_string(), json!("hours"));
        }
        LATITUDE => {
            attrs.insert("long_name".to_string(), json!("latitude"));
            attrs.insert("standard_name".to_string(), json!("latitude"));
            attrs.insert("units".to_string(), json!("degrees_north"));
        }
        LONGITUDE => {
            attrs.insert("long_name".to_string(), json!("longitude"));
            attrs.insert("standard_name".to_string(), json!("longitude"));
            attrs.insert("units".to_string(), json!("degrees_east"));
        }
        _ => {}
    }
    attrs.insert("_ARRAY_DIMENSIONS".to_string(), json!(layout.dimensions));
    attrs
}

fn variable_attributes(spec: &VariableSpec, layout: &ArrayLayout) -> Map<String, Value> {
    let mut attrs = Map::new();
    attrs.insert("short_name".to_string(), json!(spec.short_id));
    attrs.insert("long_name".to_string(), json!(spec.long_name));
    if let Some(units) = &spec.units {
        attrs.insert("units".to_string(), json!(units));
    }
    let kind = match spec.kind {
        VariableKind::Instantaneous => "instantaneous",
        VariableKind::Accumulated => "accumulated",
    };
    attrs.insert("kind".to_string(), json!(kind));
    attrs.insert("coordinates".to_string(), json!(layout.dimensions.join(" ")));
    attrs.insert("_ARRAY_DIMENSIONS".to_string(), json!(layout.dimensions));
    attrs
}
