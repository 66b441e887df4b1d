//! Full run over synthetic GRIB2 files read through the `grib` crate.

use chrono::NaiveDate;
use conversion::{ConversionConfig, ConversionError, Converter};
use forecast_common::{VariableKind, VariableSpec};
use test_utils::{
    assert_all_nan, assert_field_approx_eq, build_grib_file, temperature_field, Grib2Builder,
};
use zarr_store::StoreReader;

fn message() -> Grib2Builder {
    Grib2Builder::new().with_grid(2, 2).with_origin(45.0, 5.0, 1.0)
}

fn t2m(step: u32, base: f32) -> Grib2Builder {
    message()
        .with_parameter(0, 0, 0)
        .with_surface(103, 2)
        .with_forecast_hour(step)
        .with_values(temperature_field(2, 2, base))
}

fn tp(end: u32, value: f32) -> Grib2Builder {
    message()
        .with_parameter(0, 1, 8)
        .with_surface(1, 0)
        .with_accumulation(0, end)
        .with_constant_value(value)
}

fn lsm(values: Vec<f32>) -> Grib2Builder {
    message()
        .with_parameter(2, 0, 0)
        .with_surface(1, 0)
        .with_forecast_hour(0)
        .with_values(values)
}

fn config(input: &std::path::Path, output: &std::path::Path) -> ConversionConfig {
    let mut config = ConversionConfig::new(
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
        input,
        output,
    );
    config.forecast_steps = vec![0, 1, 2];
    config.variables = vec![
        VariableSpec::forecast("tp", "total_precipitation", "Total precipitation", "m", VariableKind::Accumulated),
        VariableSpec::forecast("2t", "2m_temperature", "2 metre temperature", "K", VariableKind::Instantaneous),
        VariableSpec::analysis("lsm", "land_sea_mask", "Land-sea mask", "(0 - 1)"),
    ];
    config
}

#[test]
fn test_grib_files_to_store() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let root = output.path().join("edt.zarr");
    let config = config(input.path(), &root);

    std::fs::write(
        config.resolve_source(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
        build_grib_file(&[
            t2m(0, 270.0),
            t2m(1, 271.0),
            t2m(2, 272.0),
            tp(1, 0.5),
            tp(2, 1.5),
            lsm(vec![1.0, 0.0, 0.0, 1.0]),
        ]),
    )
    .unwrap();

    let summary = Converter::with_grib(config).unwrap().run().unwrap();
    assert_eq!(summary.nlat, 2);
    assert_eq!(summary.nlon, 2);
    assert_eq!(summary.grid_type, "regular_ll");
    assert_eq!(summary.unwritten_cells, 3);

    let store = StoreReader::open(&root).unwrap();
    assert_eq!(store.read_f64("latitude").unwrap(), vec![45.0, 44.0]);
    assert_eq!(store.read_f64("longitude").unwrap(), vec![5.0, 6.0]);

    assert_field_approx_eq!(store.read_field("total_precipitation", 0, 0).unwrap(), vec![0.0; 4], 0.0);
    assert_field_approx_eq!(store.read_field("total_precipitation", 0, 1).unwrap(), vec![0.5; 4], 1e-4);
    assert_field_approx_eq!(store.read_field("total_precipitation", 0, 2).unwrap(), vec![1.5; 4], 1e-4);
    for (s, expected) in [270.0, 271.0, 272.0].into_iter().enumerate() {
        assert_field_approx_eq!(
            store.read_field("2m_temperature", 0, s).unwrap(),
            temperature_field(2, 2, expected),
            1e-3
        );
    }
    assert_field_approx_eq!(store.read_slab("land_sea_mask", 0).unwrap(), vec![1.0, 0.0, 0.0, 1.0], 1e-3);
    assert_all_nan!(store.read_slab("2m_temperature", 1).unwrap());
}

#[test]
fn test_grid_change_between_files_aborts() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let config = config(input.path(), &output.path().join("edt.zarr"));

    std::fs::write(
        config.resolve_source(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
        build_grib_file(&[lsm(vec![1.0, 0.0, 0.0, 1.0])]),
    )
    .unwrap();
    std::fs::write(
        config.resolve_source(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()),
        build_grib_file(&[Grib2Builder::new()
            .with_grid(3, 2)
            .with_origin(45.0, 5.0, 1.0)
            .with_parameter(2, 0, 0)
            .with_surface(1, 0)
            .with_constant_value(1.0)]),
    )
    .unwrap();

    let err = Converter::with_grib(config).unwrap().run().unwrap_err();
    assert!(matches!(err, ConversionError::GridMismatch { .. }));
}
