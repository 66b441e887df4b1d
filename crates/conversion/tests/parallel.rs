//! Index-partitioned fan-out over dates.

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use conversion::{ConversionConfig, Converter};
use forecast_common::{VariableKind, VariableSpec};
use test_utils::{assert_all_nan, regular_grid, FixtureFile, FixtureReader};
use zarr_store::StoreReader;

const NDATES: u32 = 6;

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

fn setup(input: &Path, output: &Path, workers: usize, time_chunk: usize) -> ConversionConfig {
    let mut config = ConversionConfig::new(date(1), date(NDATES), input, output);
    config.file_pattern = "run_{date}.json".to_string();
    config.forecast_steps = vec![0, 3, 6];
    config.workers = workers;
    config.chunks.time = time_chunk;
    config.variables = vec![
        VariableSpec::forecast("2t", "2m_temperature", "2 metre temperature", "K", VariableKind::Instantaneous),
        VariableSpec::analysis("z", "geopotential", "Geopotential", "m**2 s**-2"),
    ];

    // Every date except the 4th; values encode the date and step.
    for d in (1..=NDATES).filter(|d| *d != 4) {
        let mut file = FixtureFile::new(regular_grid(3, 4, 50.0, 0.0, 0.25));
        for step in [0, 3, 6] {
            file = file.instant("2t", step, vec![(d * 100 + step) as f32; 12]);
        }
        file.analysis("z", vec![d as f32; 12])
            .write(&config.resolve_source(date(d)))
            .unwrap();
    }
    config
}

fn check_store(root: &Path) {
    let store = StoreReader::open(root).unwrap();
    for d in 1..=NDATES {
        let t = (d - 1) as usize;
        if d == 4 {
            assert_all_nan!(store.read_slab("2m_temperature", t).unwrap());
            assert_all_nan!(store.read_slab("geopotential", t).unwrap());
            continue;
        }
        for (s, step) in [0u32, 3, 6].iter().enumerate() {
            assert_eq!(
                store.read_field("2m_temperature", t, s).unwrap(),
                vec![(d * 100 + step) as f32; 12]
            );
        }
        assert_eq!(store.read_slab("geopotential", t).unwrap(), vec![d as f32; 12]);
    }
}

#[test]
fn test_parallel_run_matches_layout() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let root = output.path().join("par.zarr");
    let config = setup(input.path(), &root, 4, 1);

    let reader = FixtureReader::new();
    let stats = reader.stats();
    let summary = Converter::new(config, Arc::new(reader)).run().unwrap();

    assert_eq!(summary.reports.len(), NDATES as usize);
    for (i, report) in summary.reports.iter().enumerate() {
        assert_eq!(report.time_index, i);
        assert_eq!(report.date, date(i as u32 + 1));
    }
    assert_eq!(summary.missing_dates, vec![date(4)]);
    // One open for discovery plus one per present date.
    assert_eq!(stats.opens(), NDATES as usize);
    check_store(&root);
}

#[test]
fn test_shared_time_chunks_run_sequentially() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let root = output.path().join("seq.zarr");
    let config = setup(input.path(), &root, 4, 3);

    Converter::new(config, Arc::new(FixtureReader::new()))
        .run()
        .unwrap();
    check_store(&root);
}
