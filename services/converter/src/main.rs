//! grib2zarr: converts one GRIB file per forecast date into a single Zarr
//! store.
//!
//! Settings come from an optional YAML file; command-line flags override
//! the file.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use conversion::{ConversionConfig, Converter};
use forecast_common::parse_run_date;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use zarr_store::Codec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "grib2zarr")]
#[command(about = "Convert daily GRIB forecast files into a chunked Zarr store")]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "GRIB2ZARR_CONFIG")]
    config: Option<PathBuf>,

    /// First run date (YYYYMMDD or YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<String>,

    /// Last run date, inclusive
    #[arg(long)]
    end_date: Option<String>,

    /// Directory holding the GRIB files
    #[arg(long, env = "GRIB2ZARR_GRIB_DIR")]
    grib_dir: Option<PathBuf>,

    /// File name pattern; {date} is replaced by YYYYMMDD
    #[arg(long)]
    grib_pattern: Option<String>,

    /// Output store path (replaced if it exists)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Chunk size along time
    #[arg(long)]
    chunk_time: Option<usize>,

    /// Chunk size along step (default: same as time)
    #[arg(long)]
    chunk_step: Option<usize>,

    /// Chunk size along latitude (default: full axis)
    #[arg(long)]
    chunk_lat: Option<usize>,

    /// Chunk size along longitude (default: full axis)
    #[arg(long)]
    chunk_lon: Option<usize>,

    /// Compression: none, zstd, gzip, blosc_lz4, blosc_zstd
    #[arg(long)]
    compression: Option<String>,

    /// Compression level
    #[arg(long)]
    compression_level: Option<i32>,

    /// YAML GRIB2 parameter table replacing the built-in one
    #[arg(long)]
    parameter_table: Option<PathBuf>,

    /// Dates processed concurrently
    #[arg(short, long)]
    workers: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.log_format);

    let config = build_config(&args)?;
    info!(
        start = %config.start_date,
        end = %config.end_date,
        variables = config.variables.len(),
        compression = %config.compression,
        "Loaded configuration"
    );

    let summary = Converter::with_grib(config)?.run()?;
    println!("{}", summary);
    Ok(())
}

fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = fmt().with_env_filter(filter).with_target(true);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

/// Merge the optional config file with command-line overrides.
fn build_config(args: &Args) -> Result<ConversionConfig> {
    let mut config = match &args.config {
        Some(path) => load_file(path)?,
        None => {
            let (Some(start), Some(end), Some(grib_dir), Some(output)) =
                (&args.start_date, &args.end_date, &args.grib_dir, &args.output)
            else {
                bail!("--start-date, --end-date, --grib-dir and --output are required without --config");
            };
            ConversionConfig::new(
                parse_run_date(start)?,
                parse_run_date(end)?,
                grib_dir,
                output,
            )
        }
    };

    if let Some(start) = &args.start_date {
        config.start_date = parse_run_date(start)?;
    }
    if let Some(end) = &args.end_date {
        config.end_date = parse_run_date(end)?;
    }
    if let Some(dir) = &args.grib_dir {
        config.input_dir = dir.clone();
    }
    if let Some(pattern) = &args.grib_pattern {
        config.file_pattern = pattern.clone();
    }
    if let Some(output) = &args.output {
        config.output = output.clone();
    }

    if let Some(time) = args.chunk_time {
        config.chunks.time = time;
    }
    if args.chunk_step.is_some() {
        config.chunks.step = args.chunk_step;
    }
    if args.chunk_lat.is_some() {
        config.chunks.latitude = args.chunk_lat;
    }
    if args.chunk_lon.is_some() {
        config.chunks.longitude = args.chunk_lon;
    }

    if let Some(name) = &args.compression {
        config.compression.codec = name.parse::<Codec>().map_err(anyhow::Error::msg)?;
    }
    if let Some(level) = args.compression_level {
        config.compression.level = level;
    }

    if args.parameter_table.is_some() {
        config.parameter_table = args.parameter_table.clone();
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }

    Ok(config)
}

fn load_file(path: &Path) -> Result<ConversionConfig> {
    ConversionConfig::from_yaml_file(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(config: &ConversionConfig) -> (String, String) {
        (config.start_date.to_string(), config.end_date.to_string())
    }

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("grib2zarr").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_flags_only() {
        let args = parse(&[
            "--start-date", "20250101",
            "--end-date", "2025-01-31",
            "--grib-dir", "/data/grib",
            "--output", "/data/edt.zarr",
            "--chunk-time", "5",
            "--chunk-lat", "100",
            "--compression", "lz4",
            "--compression-level", "5",
        ]);
        let config = build_config(&args).unwrap();

        assert_eq!(ymd(&config), ("2025-01-01".to_string(), "2025-01-31".to_string()));
        assert_eq!(config.input_dir, PathBuf::from("/data/grib"));
        assert_eq!(config.file_pattern, "edt_{date}.grib");
        assert_eq!(config.chunks.time, 5);
        assert_eq!(config.chunks.step_chunk(), 5);
        assert_eq!(config.chunks.latitude, Some(100));
        assert_eq!(config.chunks.longitude, None);
        assert_eq!(config.compression.codec, Codec::BloscLz4);
        assert_eq!(config.compression.level, 5);
        assert_eq!(args.log_format, LogFormat::Text);
    }

    #[test]
    fn test_missing_required_flags() {
        let args = parse(&["--start-date", "20250101"]);
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn test_unknown_compression() {
        let args = parse(&[
            "--start-date", "20250101",
            "--end-date", "20250102",
            "--grib-dir", "in",
            "--output", "out.zarr",
            "--compression", "bz2",
        ]);
        let err = build_config(&args).unwrap_err();
        assert!(err.to_string().contains("unknown compression"));
    }

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "start_date: 20250101\nend_date: 20250110\ninput_dir: /a\noutput: /b.zarr\nworkers: 2\n",
        )
        .unwrap();

        let path_str = path.to_str().unwrap();
        let args = parse(&["--config", path_str, "--end-date", "20250105", "--workers", "8"]);
        let config = build_config(&args).unwrap();

        assert_eq!(ymd(&config), ("2025-01-01".to_string(), "2025-01-05".to_string()));
        assert_eq!(config.input_dir, PathBuf::from("/a"));
        assert_eq!(config.workers, 8);
    }

    #[test]
    fn test_unreadable_config_file() {
        let args = parse(&["--config", "/nonexistent/grib2zarr.yaml"]);
        let err = build_config(&args).unwrap_err();
        assert!(err.to_string().contains("Failed to load configuration"));
    }
}
