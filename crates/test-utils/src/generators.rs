//! Generators for synthetic grids and fields.
//!
//! Fields are row-major `(nlat, nlon)`, matching the layout the converter
//! writes into the store.

use forecast_common::GridDescriptor;

/// Creates a regular lat/lon grid scanning north to south, west to east.
///
/// # Example
///
/// ```
/// use test_utils::regular_grid;
///
/// let grid = regular_grid(3, 4, 50.0, 10.0, 0.5);
/// assert_eq!(grid.lats, vec![50.0, 49.5, 49.0]);
/// assert_eq!(grid.lons, vec![10.0, 10.5, 11.0, 11.5]);
/// ```
pub fn regular_grid(
    nlat: usize,
    nlon: usize,
    lat_first: f64,
    lon_first: f64,
    increment: f64,
) -> GridDescriptor {
    let lats = (0..nlat).map(|j| lat_first - j as f64 * increment).collect();
    let lons = (0..nlon).map(|i| lon_first + i as f64 * increment).collect();
    GridDescriptor::new(lats, lons, "regular_ll")
}

/// The 2x2 grid used by the small end-to-end scenarios.
pub fn small_grid() -> GridDescriptor {
    regular_grid(2, 2, 45.0, 5.0, 1.0)
}

/// Creates a field with predictable values.
///
/// Each point is `row * 1000 + col`, which makes it easy to check that a
/// field was written to the right place without transposition.
///
/// ```
/// use test_utils::indexed_field;
///
/// let field = indexed_field(2, 3);
/// assert_eq!(field, vec![0.0, 1.0, 2.0, 1000.0, 1001.0, 1002.0]);
/// ```
pub fn indexed_field(nlat: usize, nlon: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(nlat * nlon);
    for row in 0..nlat {
        for col in 0..nlon {
            data.push((row * 1000 + col) as f32);
        }
    }
    data
}

/// Creates a field where every point holds `value`.
pub fn constant_field(nlat: usize, nlon: usize, value: f32) -> Vec<f32> {
    vec![value; nlat * nlon]
}

/// Creates a temperature-like field in Kelvin.
///
/// Values rise from `base` in the north-west corner by up to 30 K towards
/// the south-east, so every point differs from its neighbours.
pub fn temperature_field(nlat: usize, nlon: usize, base: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(nlat * nlon);
    for row in 0..nlat {
        for col in 0..nlon {
            let x_factor = col as f32 / nlon.max(1) as f32;
            let y_factor = row as f32 / nlat.max(1) as f32;
            data.push(base + x_factor * 15.0 + y_factor * 15.0);
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_grid_extent() {
        let grid = regular_grid(5, 8, 60.0, -10.0, 0.25);
        assert_eq!(grid.shape(), (5, 8));
        let extent = grid.extent.unwrap();
        assert_eq!(extent.lat_first, 60.0);
        assert_eq!(extent.lat_last, 59.0);
        assert_eq!(extent.lon_last, -8.25);
        assert_eq!(extent.lon_increment, 0.25);
    }

    #[test]
    fn test_indexed_field_layout() {
        let field = indexed_field(3, 2);
        assert_eq!(field.len(), 6);
        assert_eq!(field[1], 1.0);
        assert_eq!(field[2], 1000.0);
    }

    #[test]
    fn test_temperature_field_range() {
        let field = temperature_field(10, 10, 260.0);
        assert!(field.iter().all(|&t| (260.0..290.0).contains(&t)));
        assert!(field[0] < field[99]);
    }
}
