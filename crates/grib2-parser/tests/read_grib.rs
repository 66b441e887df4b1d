//! Reading synthetic GRIB2 files through the `grib` crate.

use grib2_parser::{
    FieldSource, GribReader, ParameterCode, ParameterEntry, ParameterTable, SourceReader,
};
use test_utils::{assert_approx_eq, assert_field_approx_eq, build_grib_file, Grib2Builder};

fn t2m(step: u32, values: Vec<f32>) -> Grib2Builder {
    Grib2Builder::new()
        .with_grid(3, 2)
        .with_origin(45.0, 5.0, 0.5)
        .with_parameter(0, 0, 0)
        .with_surface(103, 2)
        .with_forecast_hour(step)
        .with_values(values)
}

fn tp(start: u32, end: u32, value: f32) -> Grib2Builder {
    Grib2Builder::new()
        .with_grid(3, 2)
        .with_origin(45.0, 5.0, 0.5)
        .with_parameter(0, 1, 8)
        .with_surface(1, 0)
        .with_accumulation(start, end)
        .with_constant_value(value)
}

fn write_file(messages: &[Grib2Builder]) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("edt_20250101.grib");
    std::fs::write(&path, build_grib_file(messages)).unwrap();
    (dir, path)
}

#[test]
fn test_headers_and_grid() {
    let field = vec![270.0, 271.0, 272.0, 273.0, 274.0, 275.0];
    let (_dir, path) = write_file(&[
        t2m(0, field.clone()),
        t2m(1, field.clone()),
        tp(0, 1, 0.5),
        tp(0, 2, 1.5),
    ]);

    let source = GribReader::default().open(&path).unwrap();
    let headers = source.headers();
    assert_eq!(headers.len(), 4);

    assert!(headers[0].is("2t"));
    assert_eq!(headers[0].step_range(), "0");
    assert_eq!(headers[1].step_range(), "1");

    assert!(headers[2].is("tp"));
    assert_eq!(headers[2].start_step, 0);
    assert_eq!(headers[2].end_step, 1);
    assert_eq!(headers[3].step_range(), "0-2");

    let grid = source.grid();
    assert_eq!(grid.shape(), (2, 3));
    assert_eq!(grid.grid_type, "regular_ll");
    assert_approx_eq!(grid.lats[0], 45.0, 1e-6);
    assert_approx_eq!(grid.lats[1], 44.5, 1e-6);
    assert_approx_eq!(grid.lons[2], 6.0, 1e-6);
}

#[test]
fn test_values_decode() {
    let field = vec![270.0, 271.0, 272.0, 273.0, 274.0, 275.0];
    let (_dir, path) = write_file(&[t2m(0, field.clone()), tp(0, 1, 0.5)]);

    let source = GribReader::default().open(&path).unwrap();
    let index = source.headers()[0].index;
    let values = source.read_values(index).unwrap();
    assert_field_approx_eq!(values, field, 1e-3);
}

#[test]
fn test_read_many_preserves_request_order() {
    let (_dir, path) = write_file(&[tp(0, 1, 1.0), tp(0, 2, 2.0), tp(0, 3, 3.0)]);

    let source = GribReader::default().open(&path).unwrap();
    let indices: Vec<_> = source.headers().iter().rev().map(|h| h.index).collect();
    let fields = source.read_many(&indices).unwrap();

    assert_eq!(fields.len(), 3);
    assert_field_approx_eq!(fields[0], vec![3.0; 6], 1e-6);
    assert_field_approx_eq!(fields[2], vec![1.0; 6], 1e-6);
}

#[test]
fn test_unknown_parameter_has_no_short_name() {
    let unknown = Grib2Builder::new()
        .with_grid(3, 2)
        .with_parameter(0, 19, 0)
        .with_constant_value(1.0);
    let (_dir, path) = write_file(&[unknown]);

    let source = GribReader::default().open(&path).unwrap();
    assert_eq!(source.headers()[0].short_name, None);
    assert_eq!(source.headers()[0].label(), "P0_19_0");
}

#[test]
fn test_parameter_code_from_indicator_and_product_definition() {
    let lsm = Grib2Builder::new()
        .with_grid(3, 2)
        .with_parameter(2, 0, 0)
        .with_surface(1, 0)
        .with_constant_value(1.0);
    let (_dir, path) = write_file(&[lsm, tp(0, 1, 0.5)]);

    let source = GribReader::default().open(&path).unwrap();
    let headers = source.headers();
    assert_eq!(headers[0].code, ParameterCode::new(2, 0, 0));
    assert!(headers[0].is("lsm"));
    assert_eq!(headers[1].code, ParameterCode::new(0, 1, 8));
}

#[test]
fn test_custom_table() {
    let (_dir, path) = write_file(&[t2m(0, vec![280.0; 6])]);

    let mut table = ParameterTable::new();
    table.add(ParameterEntry {
        short_name: "t2m".to_string(),
        discipline: 0,
        category: 0,
        number: 0,
        surface_type: None,
        surface_value: None,
    });
    let source = GribReader::new(table).open(&path).unwrap();
    assert!(source.headers()[0].is("t2m"));
}
