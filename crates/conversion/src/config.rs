//! Run configuration for the conversion engine.
//!
//! Loaded from YAML (or built directly by the CLI). Every field except the
//! dates and paths has a default matching the reference dataset.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use forecast_common::{date_range, default_catalog, default_forecast_steps, format_compact, VariableSpec};
use serde::{Deserialize, Serialize};
use zarr_store::{ChunkConfig, CompressionConfig};

use crate::error::{ConversionError, Result};

/// Placeholder replaced by the `YYYYMMDD` run date in file patterns.
pub const DATE_PLACEHOLDER: &str = "{date}";

/// Default source file name pattern.
pub const DEFAULT_FILE_PATTERN: &str = "edt_{date}.grib";

fn default_file_pattern() -> String {
    DEFAULT_FILE_PATTERN.to_string()
}

fn default_workers() -> usize {
    1
}

/// Complete configuration of one conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// First run date, `YYYYMMDD` or `YYYY-MM-DD`.
    #[serde(with = "run_date")]
    pub start_date: NaiveDate,
    /// Last run date (inclusive).
    #[serde(with = "run_date")]
    pub end_date: NaiveDate,
    /// Directory holding one source file per run date.
    pub input_dir: PathBuf,
    /// Source file name, with `{date}` standing for the run date.
    #[serde(default = "default_file_pattern")]
    pub file_pattern: String,
    /// Path of the store to create. Replaced if it exists.
    pub output: PathBuf,
    /// Forecast steps (hours) stored for forecast variables.
    #[serde(default = "default_forecast_steps")]
    pub forecast_steps: Vec<u32>,
    #[serde(default)]
    pub chunks: ChunkConfig,
    #[serde(default)]
    pub compression: CompressionConfig,
    #[serde(default = "default_catalog")]
    pub variables: Vec<VariableSpec>,
    /// YAML parameter table replacing the built-in one.
    #[serde(default)]
    pub parameter_table: Option<PathBuf>,
    /// Number of dates processed concurrently.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl ConversionConfig {
    /// Configuration with defaults for everything but dates and paths.
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        input_dir: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            start_date,
            end_date,
            input_dir: input_dir.into(),
            file_pattern: default_file_pattern(),
            output: output.into(),
            forecast_steps: default_forecast_steps(),
            chunks: ChunkConfig::default(),
            compression: CompressionConfig::default(),
            variables: default_catalog(),
            parameter_table: None,
            workers: default_workers(),
        }
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Check the configuration before anything is read or written.
    pub fn validate(&self) -> Result<()> {
        if self.start_date > self.end_date {
            return Err(ConversionError::InvalidConfig(format!(
                "start date {} is after end date {}",
                self.start_date, self.end_date
            )));
        }

        if self.file_pattern.matches(DATE_PLACEHOLDER).count() != 1 {
            return Err(ConversionError::InvalidConfig(format!(
                "file pattern '{}' must contain {} exactly once",
                self.file_pattern, DATE_PLACEHOLDER
            )));
        }

        if self.forecast_steps.is_empty() {
            return Err(ConversionError::InvalidConfig(
                "forecast step list is empty".to_string(),
            ));
        }
        if self.forecast_steps.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConversionError::InvalidConfig(
                "forecast steps must be strictly ascending".to_string(),
            ));
        }

        if self.variables.is_empty() {
            return Err(ConversionError::InvalidConfig(
                "no variables configured".to_string(),
            ));
        }
        let mut names = HashSet::new();
        for spec in &self.variables {
            if !names.insert(spec.display_name.as_str()) {
                return Err(ConversionError::InvalidConfig(format!(
                    "duplicate variable name '{}'",
                    spec.display_name
                )));
            }
        }

        if self.workers == 0 {
            return Err(ConversionError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }

        self.chunks
            .validate()
            .and_then(|_| self.compression.validate())
            .map_err(|e| ConversionError::InvalidConfig(e.to_string()))?;

        if !self.input_dir.is_dir() {
            return Err(ConversionError::InvalidConfig(format!(
                "input directory {} does not exist",
                self.input_dir.display()
            )));
        }

        Ok(())
    }

    /// Run dates, daily and inclusive.
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        Ok(date_range(self.start_date, self.end_date)?)
    }

    /// Path of the source file for a run date.
    pub fn resolve_source(&self, date: NaiveDate) -> PathBuf {
        let name = self
            .file_pattern
            .replace(DATE_PLACEHOLDER, &format_compact(date));
        self.input_dir.join(name)
    }

    pub fn forecast_variables(&self) -> impl Iterator<Item = &VariableSpec> {
        self.variables.iter().filter(|v| v.is_forecast())
    }

    pub fn analysis_variables(&self) -> impl Iterator<Item = &VariableSpec> {
        self.variables.iter().filter(|v| !v.is_forecast())
    }
}

/// Serde adapter for run dates. Accepts `YYYYMMDD` (string or YAML integer)
/// and `YYYY-MM-DD`; writes `YYYYMMDD`.
mod run_date {
    use chrono::NaiveDate;
    use forecast_common::{format_compact, parse_run_date};
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_compact(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let text = match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s,
            Raw::Number(n) => n.to_string(),
        };
        parse_run_date(&text).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_common::VariableKind;
    use zarr_store::Codec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn config_in(dir: &Path) -> ConversionConfig {
        ConversionConfig::new(date(2025, 1, 1), date(2025, 1, 3), dir, dir.join("out.zarr"))
    }

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        assert_eq!(config.file_pattern, "edt_{date}.grib");
        assert_eq!(config.forecast_steps.len(), 49);
        assert_eq!(config.variables.len(), 15);
        assert_eq!(config.forecast_variables().count(), 11);
        assert_eq!(config.analysis_variables().count(), 4);
        assert_eq!(config.workers, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_source_and_dates() {
        let config = config_in(Path::new("/data/grib"));
        assert_eq!(
            config.resolve_source(date(2025, 1, 2)),
            PathBuf::from("/data/grib/edt_20250102.grib")
        );
        assert_eq!(
            config.dates().unwrap(),
            vec![date(2025, 1, 1), date(2025, 1, 2), date(2025, 1, 3)]
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let dir = tempfile::tempdir().unwrap();

        let mut config = config_in(dir.path());
        config.start_date = date(2025, 2, 1);
        assert!(matches!(config.validate(), Err(ConversionError::InvalidConfig(_))));

        let mut config = config_in(dir.path());
        config.file_pattern = "edt.grib".to_string();
        assert!(config.validate().is_err());
        config.file_pattern = "{date}_{date}.grib".to_string();
        assert!(config.validate().is_err());

        let mut config = config_in(dir.path());
        config.forecast_steps = vec![0, 2, 1];
        assert!(config.validate().is_err());
        config.forecast_steps = vec![0, 1, 1];
        assert!(config.validate().is_err());
        config.forecast_steps.clear();
        assert!(config.validate().is_err());

        let mut config = config_in(dir.path());
        config.variables.push(config.variables[0].clone());
        assert!(config.validate().is_err());
        config.variables.clear();
        assert!(config.validate().is_err());

        let mut config = config_in(dir.path());
        config.chunks.time = 0;
        assert!(config.validate().is_err());

        let mut config = config_in(dir.path());
        config.compression = CompressionConfig::new(Codec::Gzip, 12);
        assert!(config.validate().is_err());

        let mut config = config_in(dir.path());
        config.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_input_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir.path().join("missing"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_from_yaml_applies_defaults() {
        let yaml = r#"
start_date: 20250101
end_date: "2025-01-05"
input_dir: /data/grib
output: /data/out.zarr
chunks:
  time: 5
  latitude: 100
compression:
  codec: blosc_lz4
  level: 5
"#;
        let config = ConversionConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.start_date, date(2025, 1, 1));
        assert_eq!(config.end_date, date(2025, 1, 5));
        assert_eq!(config.file_pattern, DEFAULT_FILE_PATTERN);
        assert_eq!(config.chunks.time, 5);
        assert_eq!(config.chunks.step_chunk(), 5);
        assert_eq!(config.chunks.latitude, Some(100));
        assert_eq!(config.chunks.longitude, None);
        assert_eq!(config.compression, CompressionConfig::new(Codec::BloscLz4, 5));
        assert_eq!(config.variables.len(), 15);
    }

    #[test]
    fn test_from_yaml_custom_variables() {
        let yaml = r#"
start_date: "20250101"
end_date: "20250101"
input_dir: in
output: out.zarr
forecast_steps: [0, 6, 12]
variables:
  - short_id: tp
    display_name: total_precipitation
    kind: accumulated
    category: forecast
  - short_id: lsm
    display_name: land_sea_mask
    kind: instantaneous
    category: analysis
"#;
        let config = ConversionConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.forecast_steps, vec![0, 6, 12]);
        assert_eq!(config.variables.len(), 2);
        assert_eq!(config.variables[0].kind, VariableKind::Accumulated);
        assert!(!config.variables[1].is_forecast());
    }

    #[test]
    fn test_from_yaml_rejects_bad_date() {
        let yaml = "start_date: 2025-13-01\nend_date: 20250101\ninput_dir: a\noutput: b\n";
        assert!(matches!(
            ConversionConfig::from_yaml_str(yaml),
            Err(ConversionError::Yaml(_))
        ));
    }

    #[test]
    fn test_yaml_roundtrip_writes_compact_dates() {
        let config = config_in(Path::new("in"));
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("start_date: '20250101'") || yaml.contains("start_date: \"20250101\""));
        assert_eq!(ConversionConfig::from_yaml_str(&yaml).unwrap(), config);
    }
}
