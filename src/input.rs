//! # Input Configuration Module
//!
//! This module provides job configuration parsing and validation. A job names the
//! target point, the series to build (each merged from one or more gridded
//! datasets), the chart to render and an optional Parquet export.
//!
//! ## Configuration Structure
//!
//! - **target**: `{ lat, lon }` in decimal degrees
//! - **rounding**: fractional digits kept per sample (default 8, `null` disables)
//! - **series**: list of series; each has a label, optional unit scale and units,
//!   a trend flag, and ordered `sources` (later sources win on shared dates)
//! - **plot**: chart output path and styling
//! - **parquet_key**: optional Parquet export path
//!
//! ## Example Usage
//!
//! ```rust
//! use gridpoint::input::JobConfig;
//!
//! let json = r#"
//! {
//!   "target": { "lat": 30.5, "lon": 38.5 },
//!   "series": [
//!     {
//!       "label": "GLDAS",
//!       "sources": [
//!         {
//!           "directory": "../db/gldas",
//!           "filename_filter": "GLDAS-NOAH_1deg_tws_anomaly_monthly",
//!           "variable_name": "TWS_monthly"
//!         }
//!       ]
//!     }
//!   ]
//! }"#;
//! let config = JobConfig::from_json(json)?;
//! assert_eq!(config.rounding, Some(8));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::error::{GridPointError, Result};
use crate::extract::{AxisOrder, GridLayout};
use crate::locate::GeoPoint;
use crate::series::MAX_ROUNDING;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Fractional digits kept per sample unless a job says otherwise.
pub const DEFAULT_ROUNDING: u32 = 8;

/// Days per "year" used when annualizing a trend slope.
pub const DAYS_PER_YEAR: f64 = 360.0;

/// Main configuration structure for a gridpoint job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobConfig {
    /// Point to extract
    pub target: GeoPoint,
    /// Fractional digits kept per sample
    #[serde(default = "default_rounding")]
    pub rounding: Option<u32>,
    /// Series to build, in plotting order
    pub series: Vec<SeriesConfig>,
    /// Chart settings
    #[serde(default)]
    pub plot: PlotConfig,
    /// Optional Parquet export of every series
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parquet_key: Option<String>,
}

/// One plotted series, merged from one or more datasets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesConfig {
    pub label: String,
    /// Multiplicative unit conversion applied after merging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    /// Unit name used in trend reports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    /// Fit and draw a linear trend
    #[serde(default = "default_true")]
    pub trend: bool,
    /// Sources in generation order; later ones win on shared timestamps
    pub sources: Vec<DatasetConfig>,
}

/// One directory of gridded files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetConfig {
    pub directory: PathBuf,
    /// Substring every file name must contain
    pub filename_filter: String,
    pub variable_name: String,
    #[serde(default)]
    pub format: DatasetFormat,
    /// Overrides the format's default sub-group (empty string means root)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Overrides the format's default spatial axis order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis_order: Option<AxisOrder>,
    /// Overrides the timestamp attribute name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_attribute: Option<String>,
}

/// Supported container layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetFormat {
    #[default]
    Netcdf,
    Hdf5,
}

/// Chart settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlotConfig {
    /// `.png` or `.svg`
    #[serde(default = "default_plot_output")]
    pub output: String,
    /// Defaults to `Point: <lat>N, <lon>E`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default = "default_x_label")]
    pub x_label: String,
    #[serde(default = "default_y_label")]
    pub y_label: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
}

fn default_rounding() -> Option<u32> {
    Some(DEFAULT_ROUNDING)
}

fn default_true() -> bool {
    true
}

fn default_plot_output() -> String {
    "gridpoint.png".to_string()
}

fn default_x_label() -> String {
    "Date".to_string()
}

fn default_y_label() -> String {
    "Equivalent water height (mm)".to_string()
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_font_size() -> u32 {
    14
}

impl Default for PlotConfig {
    fn default() -> Self {
        PlotConfig {
            output: default_plot_output(),
            title: None,
            x_label: default_x_label(),
            y_label: default_y_label(),
            width: default_width(),
            height: default_height(),
            font_size: default_font_size(),
        }
    }
}

impl DatasetFormat {
    pub fn layout(&self) -> GridLayout {
        match self {
            DatasetFormat::Netcdf => GridLayout::netcdf(),
            DatasetFormat::Hdf5 => GridLayout::hdf5(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DatasetFormat::Netcdf => "netcdf",
            DatasetFormat::Hdf5 => "hdf5",
        }
    }
}

impl DatasetConfig {
    /// The format's layout with this dataset's overrides applied.
    pub fn layout(&self) -> GridLayout {
        let mut layout = self.format.layout();
        if let Some(group) = &self.group {
            layout.group = if group.is_empty() {
                None
            } else {
                Some(group.clone())
            };
        }
        if let Some(order) = self.axis_order {
            layout.axis_order = order;
        }
        if let Some(attribute) = &self.time_attribute {
            layout.time_attribute = attribute.clone();
        }
        layout
    }
}

impl PlotConfig {
    pub fn title_for(&self, target: &GeoPoint) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| format!("Point: {}", target))
    }
}

impl JobConfig {
    /// Loads a job configuration from a JSON or YAML file, chosen by extension
    /// (`.yaml`/`.yml` is YAML, anything else JSON).
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use gridpoint::input::JobConfig;
    ///
    /// let config = JobConfig::from_file("grace.yaml")?;
    /// println!("Target: {}", config.target);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);
        if is_yaml {
            Self::from_yaml(&content)
        } else {
            Self::from_json(&content)
        }
    }

    pub fn from_json(json_str: &str) -> Result<Self> {
        let config: JobConfig = serde_json::from_str(json_str)?;
        Ok(config)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        let config: JobConfig = serde_yaml::from_str(yaml_str)?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Checks the job without touching any data files.
    pub fn validate(&self) -> Result<()> {
        self.target.validate()?;
        if self.series.is_empty() {
            return Err(GridPointError::Config("no series configured".to_string()));
        }
        if let Some(decimals) = self.rounding
            && decimals > MAX_ROUNDING
        {
            return Err(GridPointError::Config(format!(
                "rounding of {} digits exceeds f64 precision",
                decimals
            )));
        }
        for series in &self.series {
            if series.label.trim().is_empty() {
                return Err(GridPointError::Config("series label is empty".to_string()));
            }
            if series.sources.is_empty() {
                return Err(GridPointError::Config(format!(
                    "series '{}' has no sources",
                    series.label
                )));
            }
            if let Some(scale) = series.scale
                && (!scale.is_finite() || scale == 0.0)
            {
                return Err(GridPointError::Config(format!(
                    "series '{}' has invalid scale {}",
                    series.label, scale
                )));
            }
            for source in &series.sources {
                if source.filename_filter.is_empty() || source.variable_name.is_empty() {
                    return Err(GridPointError::Config(format!(
                        "series '{}' has a source with an empty filter or variable name",
                        series.label
                    )));
                }
            }
        }
        let output = self.plot.output.to_lowercase();
        if !(output.ends_with(".png") || output.ends_with(".svg")) {
            return Err(GridPointError::Config(format!(
                "plot output '{}' must end with .png or .svg",
                self.plot.output
            )));
        }
        if self.plot.width == 0 || self.plot.height == 0 {
            return Err(GridPointError::Config("plot size must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Directories named by the job that do not exist on disk.
    pub fn missing_directories(&self) -> Vec<&Path> {
        self.series
            .iter()
            .flat_map(|s| s.sources.iter())
            .map(|d| d.directory.as_path())
            .filter(|dir| !dir.is_dir())
            .collect()
    }
}
