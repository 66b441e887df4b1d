//! Shared test utilities for the converter workspace.
//!
//! This crate provides common testing infrastructure including:
//! - A JSON fixture format and a [`SourceReader`](grib2_parser::SourceReader)
//!   over it, so the engine can be tested without GRIB encoders
//! - A synthetic GRIB2 message builder for the `grib` crate read path
//! - Grid and field generators
//! - Approximate-equality assertion macros
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;
pub mod grib_builder;

pub use fixtures::*;
pub use generators::*;
pub use grib_builder::*;

/// Assert that two coordinates or values agree within `epsilon`.
///
/// ```
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(44.500_001_f64, 44.5, 1e-5);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right) = ($left as f64, $right as f64);
        let diff = (left - right).abs();
        assert!(
            diff <= $epsilon as f64,
            "{} = {} differs from {} = {} by {}",
            stringify!($left),
            left,
            stringify!($right),
            right,
            diff
        );
    }};
}

/// Assert that two fields are equal point by point within `epsilon`.
#[macro_export]
macro_rules! assert_field_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left = &$left;
        let right = &$right;
        assert_eq!(left.len(), right.len(), "field lengths differ");
        for (i, (l, r)) in left.iter().zip(right.iter()).enumerate() {
            let diff = ((*l as f64) - (*r as f64)).abs();
            if diff > $epsilon as f64 {
                panic!(
                    "assertion failed: fields differ at point {}\n  left: `{:?}`,\n right: `{:?}`",
                    i, l, r
                );
            }
        }
    }};
}

/// Assert that every value of a field is NaN.
#[macro_export]
macro_rules! assert_all_nan {
    ($field:expr) => {{
        let field = &$field;
        if let Some((i, v)) = field.iter().enumerate().find(|(_, v)| !v.is_nan()) {
            panic!("assertion failed: value {} at point {} is not NaN", v, i);
        }
    }};
}
