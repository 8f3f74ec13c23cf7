//! # CLI Module
//!
//! Command-line interface for gridpoint:
//! - Argument parsing with clap
//! - Job file loading (JSON/YAML) with command-line and `GRIDPOINT_` environment
//!   overrides
//! - Subcommands for running jobs, extracting single datasets, inspecting files,
//!   validating jobs, generating templates and shell completions

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use gridpoint::extract::AxisOrder;
use gridpoint::input::{DatasetConfig, DatasetFormat, JobConfig, PlotConfig, SeriesConfig};
use gridpoint::locate::GeoPoint;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Point time-series extraction and trend plotting for gridded datasets
#[derive(Parser, Debug)]
#[command(name = "gridpoint")]
#[command(about = "Extract, merge and plot point time series from netCDF/HDF5 grids")]
#[command(version)]
#[command(long_about = "
gridpoint extracts the value of one variable at one geographic point from every
file of a gridded dataset directory, merges sensor generations into a continuous
series, fits linear trends and renders an annotated chart.

EXAMPLES:
  # Run a job file
  gridpoint run --config grace.yaml

  # Same job at another point
  gridpoint run --config grace.yaml --point 31.0,39.5

  # Print one dataset's series as CSV
  gridpoint --output-format csv extract ../db/gldas \\
    -f GLDAS-NOAH_1deg_tws_anomaly_monthly -n TWS_monthly --point 30.5,38.5

  # Inspect an HDF5 grid
  gridpoint info 3B-MO.MS.MRG.3IMERG.20200101.HDF5 --detailed

  # Generate a template
  gridpoint template grace --format yaml > grace.yaml
")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode - suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format for structured data
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Job file path (JSON or YAML)
    #[arg(short, long, global = true, env = "GRIDPOINT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a job: import, merge, fit trends, plot and export
    #[command(long_about = "
Run a job file. Every series is imported before anything is written; an import
failure aborts the run without a chart.

EXAMPLES:
  gridpoint run --config grace.yaml
  gridpoint run --config grace.yaml --point=-12.5,130.0 --plot-output north.svg
  gridpoint run --config grace.yaml --dry-run
")]
    Run {
        /// Override the target point: lat,lon
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true, env = "GRIDPOINT_POINT")]
        point: Option<GeoPoint>,

        /// Override the chart output path (.png or .svg)
        #[arg(long, env = "GRIDPOINT_PLOT_OUTPUT")]
        plot_output: Option<String>,

        /// Override the Parquet export path
        #[arg(long, env = "GRIDPOINT_PARQUET_OUTPUT")]
        parquet_output: Option<String>,

        /// Override the rounding digits (0-15)
        #[arg(
            long,
            env = "GRIDPOINT_ROUNDING",
            value_parser = clap::value_parser!(u32).range(0..=gridpoint::series::MAX_ROUNDING as i64)
        )]
        rounding: Option<u32>,

        /// Build and report the series without writing chart or export
        #[arg(long, env = "GRIDPOINT_DRY_RUN")]
        dry_run: bool,
    },

    /// Extract one dataset directory and print its series
    #[command(long_about = "
Import a single dataset directory at one point and print the series in the
global --output-format (human, json, yaml or csv).

EXAMPLES:
  gridpoint extract ../db/grace-2002-2017 -f GRAC_GFZOP -n lwe_thickness --point 30.5,38.5
  gridpoint extract ../db/gpm-imerg -f 3B-MO.MS.MRG.3IMERG -n precipitation \\
    --point 30.5,38.5 --format hdf5
")]
    Extract {
        /// Directory holding the dataset files
        directory: PathBuf,

        /// Substring every file name must contain
        #[arg(short = 'f', long)]
        filter: String,

        /// Variable to extract
        #[arg(short = 'n', long)]
        variable: String,

        /// Target point: lat,lon
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        point: GeoPoint,

        /// File layout
        #[arg(long, value_enum, default_value_t = FormatArg::Netcdf)]
        format: FormatArg,

        /// Override the layout's sub-group
        #[arg(long)]
        group: Option<String>,

        /// Override the layout's spatial axis order
        #[arg(long, value_enum)]
        axis_order: Option<AxisOrderArg>,

        /// Fractional digits kept per sample (0-15)
        #[arg(
            long,
            default_value_t = gridpoint::input::DEFAULT_ROUNDING,
            conflicts_with = "no_rounding",
            value_parser = clap::value_parser!(u32).range(0..=gridpoint::series::MAX_ROUNDING as i64)
        )]
        rounding: u32,

        /// Keep raw values
        #[arg(long)]
        no_rounding: bool,
    },

    /// Show information about a grid file
    Info {
        /// Grid file path
        file: String,

        /// Show global attributes as well
        #[arg(long)]
        detailed: bool,

        /// Show only a specific variable
        #[arg(short = 'n', long)]
        variable: Option<String>,

        /// Output format for file information
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Validate a job file without importing data
    Validate {
        /// Job file to validate (defaults to --config)
        config_file: Option<PathBuf>,

        /// Also check that every dataset directory exists
        #[arg(long)]
        detailed: bool,
    },

    /// Generate job file templates
    Template {
        /// Template type to generate
        #[arg(value_enum)]
        template_type: TemplateType,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration format
        #[arg(long, value_enum, default_value_t = ConfigFormat::Json)]
        format: ConfigFormat,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON structured output
    Json,
    /// YAML structured output
    Yaml,
    /// CSV output
    Csv,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateType {
    /// One netCDF dataset with a trend
    Basic,
    /// GRACE + GRACE-FO merged, plus GLDAS
    Grace,
    /// GPM-IMERG monthly precipitation (HDF5)
    Precipitation,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON configuration format
    Json,
    /// YAML configuration format
    Yaml,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    /// `.nc`, root group, [0, lat, lon]
    Netcdf,
    /// `.HDF5`, `Grid` group, [0, lon, lat]
    Hdf5,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisOrderArg {
    LatLon,
    LonLat,
}

impl From<FormatArg> for DatasetFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Netcdf => DatasetFormat::Netcdf,
            FormatArg::Hdf5 => DatasetFormat::Hdf5,
        }
    }
}

impl From<AxisOrderArg> for AxisOrder {
    fn from(arg: AxisOrderArg) -> Self {
        match arg {
            AxisOrderArg::LatLon => AxisOrder::LatLon,
            AxisOrderArg::LonLat => AxisOrder::LonLat,
        }
    }
}

/// Command-line overrides for a job file
#[derive(Debug, Clone, Default)]
pub struct JobOverrides {
    pub point: Option<GeoPoint>,
    pub plot_output: Option<String>,
    pub parquet_output: Option<String>,
    pub rounding: Option<u32>,
}

/// Parse a point from command line argument
/// Format: lat,lon
pub fn parse_point(s: &str) -> Result<GeoPoint, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        return Err("Point must be in format 'lat,lon'".to_string());
    }

    let lat = parts[0]
        .trim()
        .parse::<f64>()
        .map_err(|_| "Invalid latitude value")?;
    let lon = parts[1]
        .trim()
        .parse::<f64>()
        .map_err(|_| "Invalid longitude value")?;

    let point = GeoPoint::new(lat, lon);
    point.validate().map_err(|e| e.to_string())?;
    Ok(point)
}

/// Loads the job file and applies command-line overrides.
/// Priority: command-line/environment > job file
pub fn load_job(config_path: Option<&PathBuf>, overrides: &JobOverrides) -> Result<JobConfig> {
    let Some(path) = config_path else {
        bail!("No job file given; use --config or GRIDPOINT_CONFIG");
    };
    let mut job = JobConfig::from_file(path)
        .with_context(|| format!("Failed to load job file {}", path.display()))?;

    if let Some(point) = overrides.point {
        job.target = point;
    }
    if let Some(output) = &overrides.plot_output {
        job.plot.output = output.clone();
    }
    if let Some(parquet) = &overrides.parquet_output {
        job.parquet_key = Some(parquet.clone());
    }
    if let Some(digits) = overrides.rounding {
        job.rounding = Some(digits);
    }
    Ok(job)
}

/// Job file templates mirroring common dataset combinations.
pub fn template_config(template_type: TemplateType) -> JobConfig {
    let target = GeoPoint::new(30.5, 38.5);
    let netcdf = |directory: &str, filter: &str, variable: &str| DatasetConfig {
        directory: PathBuf::from(directory),
        filename_filter: filter.to_string(),
        variable_name: variable.to_string(),
        format: DatasetFormat::Netcdf,
        group: None,
        axis_order: None,
        time_attribute: None,
    };

    match template_type {
        TemplateType::Basic => JobConfig {
            target,
            rounding: Some(gridpoint::input::DEFAULT_ROUNDING),
            series: vec![SeriesConfig {
                label: "GLDAS".to_string(),
                scale: None,
                units: Some("mm".to_string()),
                trend: true,
                sources: vec![netcdf(
                    "../db/gldas",
                    "GLDAS-NOAH_1deg_tws_anomaly_monthly",
                    "TWS_monthly",
                )],
            }],
            plot: PlotConfig::default(),
            parquet_key: None,
        },
        TemplateType::Grace => JobConfig {
            target,
            rounding: Some(gridpoint::input::DEFAULT_ROUNDING),
            series: vec![
                SeriesConfig {
                    label: "GRACE".to_string(),
                    scale: Some(1000.0),
                    units: Some("mm".to_string()),
                    trend: true,
                    sources: vec![
                        netcdf(
                            "../db/grace-2002-2017",
                            "GRAC_GFZOP_BA01_0600_LND_v03",
                            "lwe_thickness",
                        ),
                        netcdf(
                            "../db/grace-2018-2020",
                            "GRFO_GFZOP_BA01_0600_LND_v03",
                            "lwe_thickness",
                        ),
                    ],
                },
                SeriesConfig {
                    label: "GLDAS".to_string(),
                    scale: None,
                    units: Some("mm".to_string()),
                    trend: true,
                    sources: vec![netcdf(
                        "../db/gldas",
                        "GLDAS-NOAH_1deg_tws_anomaly_monthly",
                        "TWS_monthly",
                    )],
                },
            ],
            plot: PlotConfig {
                output: "grace.png".to_string(),
                ..PlotConfig::default()
            },
            parquet_key: Some("grace.parquet".to_string()),
        },
        TemplateType::Precipitation => JobConfig {
            target,
            rounding: Some(gridpoint::input::DEFAULT_ROUNDING),
            series: vec![SeriesConfig {
                label: "IMERG".to_string(),
                scale: None,
                units: Some("mm/hr".to_string()),
                trend: false,
                sources: vec![DatasetConfig {
                    format: DatasetFormat::Hdf5,
                    ..netcdf("../db/gpm-imerg", "3B-MO.MS.MRG.3IMERG", "precipitation")
                }],
            }],
            plot: PlotConfig {
                output: "imerg.png".to_string(),
                y_label: "Mean precipitation (mm/hr)".to_string(),
                ..PlotConfig::default()
            },
            parquet_key: None,
        },
    }
}

/// Serializes a template in the requested format.
pub fn render_template(template_type: TemplateType, format: ConfigFormat) -> Result<String> {
    let job = template_config(template_type);
    let text = match format {
        ConfigFormat::Json => job.to_json()?,
        ConfigFormat::Yaml => job.to_yaml()?,
    };
    Ok(text)
}
