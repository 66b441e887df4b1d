//! Grid descriptors for the shared spatial grid of a conversion run.

use serde::{Deserialize, Serialize};

/// Tolerance used when comparing coordinate vectors of two grids (degrees).
pub const COORDINATE_TOLERANCE: f64 = 1e-4;

/// The spatial grid shared by every source file of a run.
///
/// Values of a field are laid out row-major: `nlat` rows of `nlon` points,
/// row `j` at latitude `lats[j]`, column `i` at longitude `lons[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridDescriptor {
    /// Latitude of each row (degrees north).
    pub lats: Vec<f64>,
    /// Longitude of each column (degrees east).
    pub lons: Vec<f64>,
    /// Number of rows.
    pub nlat: usize,
    /// Number of columns.
    pub nlon: usize,
    /// Grid type name (e.g. "regular_ll").
    pub grid_type: String,
    /// Corner and increment metadata, when it can be derived.
    pub extent: Option<GridExtent>,
}

impl GridDescriptor {
    /// Create a descriptor from its coordinate vectors.
    pub fn new(lats: Vec<f64>, lons: Vec<f64>, grid_type: impl Into<String>) -> Self {
        let extent = GridExtent::from_axes(&lats, &lons);
        Self {
            nlat: lats.len(),
            nlon: lons.len(),
            lats,
            lons,
            grid_type: grid_type.into(),
            extent,
        }
    }

    /// Number of points in one 2-D field.
    pub fn len(&self) -> usize {
        self.nlat * self.nlon
    }

    /// Check if the grid has no points.
    pub fn is_empty(&self) -> bool {
        self.nlat == 0 || self.nlon == 0
    }

    /// Shape of one field as `(nlat, nlon)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.nlat, self.nlon)
    }

    /// Check whether `other` describes the same grid.
    ///
    /// Dimensions must be equal; coordinates may differ by at most
    /// [`COORDINATE_TOLERANCE`] degrees.
    pub fn matches(&self, other: &GridDescriptor) -> bool {
        self.nlat == other.nlat
            && self.nlon == other.nlon
            && axis_matches(&self.lats, &other.lats)
            && axis_matches(&self.lons, &other.lons)
    }

    /// Short human-readable description, used in logs and error messages.
    pub fn describe(&self) -> String {
        match &self.extent {
            Some(extent) => format!(
                "{}x{} {} (lat {}..{}, lon {}..{})",
                self.nlat,
                self.nlon,
                self.grid_type,
                extent.lat_first,
                extent.lat_last,
                extent.lon_first,
                extent.lon_last
            ),
            None => format!("{}x{} {}", self.nlat, self.nlon, self.grid_type),
        }
    }
}

fn axis_matches(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| (x - y).abs() <= COORDINATE_TOLERANCE)
}

/// Corner points and increments of a regular grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridExtent {
    pub lat_first: f64,
    pub lon_first: f64,
    pub lat_last: f64,
    pub lon_last: f64,
    /// Absolute spacing between consecutive latitudes.
    pub lat_increment: f64,
    /// Absolute spacing between consecutive longitudes.
    pub lon_increment: f64,
}

impl GridExtent {
    /// Derive the extent from coordinate vectors.
    ///
    /// Returns `None` unless both axes hold at least two points.
    pub fn from_axes(lats: &[f64], lons: &[f64]) -> Option<Self> {
        if lats.len() < 2 || lons.len() < 2 {
            return None;
        }
        Some(Self {
            lat_first: lats[0],
            lon_first: lons[0],
            lat_last: lats[lats.len() - 1],
            lon_last: lons[lons.len() - 1],
            lat_increment: (lats[1] - lats[0]).abs(),
            lon_increment: (lons[1] - lons[0]).abs(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn europe_quarter_degree() -> GridDescriptor {
        let lats = (0..5).map(|j| 70.5 - j as f64 * 0.25).collect();
        let lons = (0..4).map(|i| -23.5 + i as f64 * 0.25).collect();
        GridDescriptor::new(lats, lons, "regular_ll")
    }

    #[test]
    fn test_descriptor_dimensions() {
        let grid = europe_quarter_degree();
        assert_eq!(grid.nlat, 5);
        assert_eq!(grid.nlon, 4);
        assert_eq!(grid.len(), 20);
        assert_eq!(grid.shape(), (5, 4));
        assert!(!grid.is_empty());
    }

    #[test]
    fn test_extent_derived_from_axes() {
        let extent = europe_quarter_degree().extent.expect("extent");
        assert_eq!(extent.lat_first, 70.5);
        assert_eq!(extent.lat_last, 69.5);
        assert_eq!(extent.lon_first, -23.5);
        assert_eq!(extent.lon_last, -22.75);
        assert!((extent.lat_increment - 0.25).abs() < 1e-12);
        assert!((extent.lon_increment - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_extent_missing_for_single_point_axis() {
        let grid = GridDescriptor::new(vec![45.0], vec![0.0, 1.0], "regular_ll");
        assert!(grid.extent.is_none());
        assert_eq!(grid.describe(), "1x2 regular_ll");
    }

    #[test]
    fn test_matches_within_tolerance() {
        let a = europe_quarter_degree();
        let mut b = a.clone();
        b.lats[2] += 1e-6;
        assert!(a.matches(&b));

        b.lons[0] += 0.1;
        assert!(!a.matches(&b));
    }

    #[test]
    fn test_matches_rejects_other_shape() {
        let a = europe_quarter_degree();
        let b = GridDescriptor::new(a.lats[..4].to_vec(), a.lons.clone(), "regular_ll");
        assert!(!a.matches(&b));
    }
}
