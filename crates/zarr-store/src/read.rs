//! Read-back access to a store on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};
use zarrs::array::Array;
use zarrs::array_subset::ArraySubset;
use zarrs::group::Group;
use zarrs_filesystem::FilesystemStore;

use crate::error::{Result, StoreError};

/// Opens arrays of an existing store for reading.
pub struct StoreReader {
    root: PathBuf,
    storage: Arc<FilesystemStore>,
}

impl StoreReader {
    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no store at {}", root.display()),
            )));
        }
        let storage = Arc::new(FilesystemStore::new(root).map_err(StoreError::zarr)?);
        Ok(Self {
            root: root.to_path_buf(),
            storage,
        })
    }

    fn array(&self, name: &str) -> Result<Array<FilesystemStore>> {
        Array::open(self.storage.clone(), &format!("/{}", name))
            .map_err(|_| StoreError::UnknownArray(name.to_string()))
    }

    /// Shape of an array.
    pub fn shape(&self, name: &str) -> Result<Vec<u64>> {
        Ok(self.array(name)?.shape().to_vec())
    }

    /// Attributes of an array.
    pub fn attributes(&self, name: &str) -> Result<Map<String, Value>> {
        Ok(self.array(name)?.attributes().clone())
    }

    /// Attributes of the root group.
    pub fn global_attributes(&self) -> Result<Map<String, Value>> {
        let group = Group::open(self.storage.clone(), "/").map_err(StoreError::zarr)?;
        Ok(group.attributes().clone())
    }

    /// Raw `zarr.json` metadata document of an array.
    pub fn metadata(&self, name: &str) -> Result<Value> {
        let path = self.root.join(name).join("zarr.json");
        let text = std::fs::read_to_string(&path)
            .map_err(|_| StoreError::UnknownArray(name.to_string()))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Chunk shape of an array, from its regular chunk grid.
    pub fn chunk_shape(&self, name: &str) -> Result<Vec<u64>> {
        let metadata = self.metadata(name)?;
        metadata
            .pointer("/chunk_grid/configuration/chunk_shape")
            .and_then(Value::as_array)
            .map(|dims| dims.iter().filter_map(Value::as_u64).collect())
            .ok_or_else(|| StoreError::Metadata(format!("{}: no regular chunk grid", name)))
    }

    /// Dimension names recorded in the array metadata.
    pub fn dimension_names(&self, name: &str) -> Result<Vec<String>> {
        let metadata = self.metadata(name)?;
        Ok(metadata
            .get("dimension_names")
            .and_then(Value::as_array)
            .map(|dims| {
                dims.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Read a whole 1-D coordinate as `f64`.
    pub fn read_f64(&self, name: &str) -> Result<Vec<f64>> {
        let array = self.array(name)?;
        let subset = ArraySubset::new_with_shape(array.shape().to_vec());
        array
            .retrieve_array_subset_elements::<f64>(&subset)
            .map_err(StoreError::zarr)
    }

    /// Read a whole 1-D coordinate as `i64`.
    pub fn read_i64(&self, name: &str) -> Result<Vec<i64>> {
        let array = self.array(name)?;
        let subset = ArraySubset::new_with_shape(array.shape().to_vec());
        array
            .retrieve_array_subset_elements::<i64>(&subset)
            .map_err(StoreError::zarr)
    }

    /// Read a whole 1-D coordinate as `i32`.
    pub fn read_i32(&self, name: &str) -> Result<Vec<i32>> {
        let array = self.array(name)?;
        let subset = ArraySubset::new_with_shape(array.shape().to_vec());
        array
            .retrieve_array_subset_elements::<i32>(&subset)
            .map_err(StoreError::zarr)
    }

    /// Read `array[time_index, ...]` of a data array.
    pub fn read_slab(&self, name: &str, time_index: usize) -> Result<Vec<f32>> {
        let array = self.array(name)?;
        let mut start = vec![0u64; array.dimensionality()];
        start[0] = time_index as u64;
        let mut shape = array.shape().to_vec();
        shape[0] = 1;
        let subset = ArraySubset::new_with_start_shape(start, shape).map_err(StoreError::zarr)?;
        array
            .retrieve_array_subset_elements::<f32>(&subset)
            .map_err(StoreError::zarr)
    }

    /// Read one field `array[time_index, step_index, :, :]` of a forecast array.
    pub fn read_field(&self, name: &str, time_index: usize, step_index: usize) -> Result<Vec<f32>> {
        let array = self.array(name)?;
        let shape = array.shape();
        if shape.len() != 4 {
            return Err(StoreError::Metadata(format!(
                "{} has {} dimensions, expected 4",
                name,
                shape.len()
            )));
        }
        let subset = ArraySubset::new_with_start_shape(
            vec![time_index as u64, step_index as u64, 0, 0],
            vec![1, 1, shape[2], shape[3]],
        )
        .map_err(StoreError::zarr)?;
        array
            .retrieve_array_subset_elements::<f32>(&subset)
            .map_err(StoreError::zarr)
    }
}
