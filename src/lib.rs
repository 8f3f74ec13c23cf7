//! # gridpoint
//!
//! Extracts the time series of one variable at one geographic point from
//! directories of gridded netCDF/HDF5 files, merges sensor generations into one
//! continuous series, fits linear trends and renders an annotated chart.
//!
//! ## Features
//!
//! - **Nearest-cell lookup**: the target is resolved once per directory against the
//!   first file's coordinate arrays
//! - **Two layouts, one importer**: netCDF (`[0, lat, lon]` at the root) and HDF5
//!   (`[0, lon, lat]` inside `Grid`) differ only in a [`extract::GridLayout`]
//! - **Generation merging**: later sources override earlier ones on shared dates
//! - **Trend reporting**: least-squares slope, annualized over a 360-day year
//! - **Outputs**: PNG/SVG chart and optional Parquet export
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gridpoint::{run_job, RunOptions, input::JobConfig};
//!
//! let config = JobConfig::from_file("grace.yaml").expect("Failed to load config");
//! let report = run_job(&config, &RunOptions::default()).expect("Run failed");
//! for series in &report.series {
//!     println!("{}: {} samples", series.label, series.series.len());
//! }
//! ```

pub mod error;
pub mod extract;
pub mod info;
pub mod input;
pub mod locate;
pub mod log;
pub mod output;
pub mod plot;
pub mod series;
pub mod trend;


pub use crate::error::{GridPointError, Result};

use crate::extract::{PointQuery, import_series};
use crate::input::{DatasetConfig, JobConfig, SeriesConfig};
use crate::locate::GeoPoint;
use crate::plot::{PlotSeries, render_chart};
use crate::series::{TimeSeries, merge_all};
use crate::trend::fit_series;
use ::log::{info, warn};
use std::path::Path;

/// Fails when the directory an output file would be created in does not exist.
fn require_parent_dir(output: &str) -> Result<()> {
    match Path::new(output).parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            Err(GridPointError::Config(format!(
                "output directory '{}' for '{}' does not exist",
                parent.display(),
                output
            )))
        }
        _ => Ok(()),
    }
}

/// Switches that do not belong in a job file.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Show per-import progress bars
    pub progress: bool,
    /// Build and report the series but write no chart or export
    pub skip_outputs: bool,
}

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub series: Vec<PlotSeries>,
    pub chart: Option<String>,
    pub parquet: Option<String>,
}

/// Imports one dataset directory at `target`.
pub fn import_dataset(
    dataset: &DatasetConfig,
    target: &GeoPoint,
    rounding: Option<u32>,
    progress: bool,
) -> Result<TimeSeries> {
    let query = PointQuery {
        target: *target,
        layout: dataset.layout(),
        rounding,
        progress,
    };
    import_series(
        &dataset.directory,
        &dataset.filename_filter,
        &dataset.variable_name,
        &query,
    )
}

/// Imports and merges every source of one series, applies its unit scale and fits
/// its trend when requested.
///
/// A trend that cannot be fitted (fewer than two finite samples) is logged and
/// left out; the series itself is still returned.
pub fn build_series(
    config: &SeriesConfig,
    target: &GeoPoint,
    rounding: Option<u32>,
    progress: bool,
) -> Result<PlotSeries> {
    let mut sources = Vec::with_capacity(config.sources.len());
    for dataset in &config.sources {
        sources.push(import_dataset(dataset, target, rounding, progress)?);
    }
    let merged = merge_all(&sources);
    info!(
        "Series '{}': {} samples from {} sources",
        config.label,
        merged.len(),
        sources.len()
    );

    let series = match config.scale {
        Some(factor) => merged.scaled(factor),
        None => merged,
    };

    let trend = if config.trend {
        match fit_series(&series) {
            Ok(trend) => Some(trend),
            Err(e) => {
                warn!("No trend for '{}': {}", config.label, e);
                None
            }
        }
    } else {
        None
    };

    Ok(PlotSeries {
        label: config.label.clone(),
        units: config.units.clone(),
        series,
        trend,
    })
}

/// Runs a whole job: every series is imported and the export table is built
/// before anything is written, so a failing import or a missing output
/// directory leaves no partial chart or export behind.
///
/// # Errors
///
/// Returns the first validation, import, plotting or export error.
pub fn run_job(config: &JobConfig, options: &RunOptions) -> Result<RunReport> {
    config.validate()?;

    let mut built = Vec::with_capacity(config.series.len());
    for series_config in &config.series {
        built.push(build_series(
            series_config,
            &config.target,
            config.rounding,
            options.progress,
        )?);
    }

    if options.skip_outputs {
        return Ok(RunReport {
            series: built,
            chart: None,
            parquet: None,
        });
    }

    require_parent_dir(&config.plot.output)?;
    let export = match &config.parquet_key {
        Some(parquet_key) => {
            require_parent_dir(parquet_key)?;
            Some((parquet_key, output::series_to_dataframe(&built)?))
        }
        None => None,
    };

    let title = config.plot.title_for(&config.target);
    render_chart(&built, &title, &config.plot)?;
    info!("Chart written to {}", config.plot.output);

    if let Some((parquet_key, mut frame)) = export {
        output::write_dataframe_to_parquet(&mut frame, parquet_key)?;
        info!("Series exported to {}", parquet_key);
    }

    Ok(RunReport {
        series: built,
        chart: Some(config.plot.output.clone()),
        parquet: config.parquet_key.clone(),
    })
}
