//! Traits separating the conversion engine from the file format.

use std::path::Path;

use forecast_common::GridDescriptor;

use crate::error::Result;
use crate::message::{MessageHeader, MessageIndex};

/// An opened source file: message headers plus on-demand field values.
pub trait FieldSource {
    /// Path the source was opened from.
    fn path(&self) -> &Path;

    /// Headers of every message, in file order.
    fn headers(&self) -> &[MessageHeader];

    /// The grid of the file's fields.
    fn grid(&self) -> &GridDescriptor;

    /// Decode the values of one message, row-major `(nlat, nlon)`.
    fn read_values(&self, index: MessageIndex) -> Result<Vec<f32>>;

    /// Decode several messages, returned in the order requested.
    ///
    /// Implementations backed by sequential files should override this to
    /// decode everything in one pass.
    fn read_many(&self, indices: &[MessageIndex]) -> Result<Vec<Vec<f32>>> {
        indices.iter().map(|&index| self.read_values(index)).collect()
    }
}

/// Opens source files of one format.
pub trait SourceReader: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn FieldSource>>;
}
