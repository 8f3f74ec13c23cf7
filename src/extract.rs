//! # Dataset Importer
//!
//! Builds a [`TimeSeries`] for one geographic point from a directory of gridded
//! files. Every file is expected to carry a coverage-end timestamp attribute, two
//! coordinate arrays and a three-dimensional data variable shaped
//! `[leading, axis_a, axis_b]`.
//!
//! Import runs in two explicit phases:
//!
//! 1. [`resolve_grid_index`] reads the coordinate arrays of the *first* matching
//!    file and locates the nearest grid cell.
//! 2. [`extract_sample`] reads one timestamp and one value from each file at that
//!    fixed index.
//!
//! All files of a directory are assumed to share one grid; this is a precondition
//! and is not re-checked per file.
//!
//! Where the grid lives inside the file and in which order the spatial axes are
//! stored is described by a [`GridLayout`], so netCDF grids (`lat, lon` at the
//! root) and HDF5 grids (`lon, lat` inside a `Grid` group) go through the same code.

use crate::error::{GridPointError, Result};
use crate::locate::{GeoPoint, GridIndex, locate_point};
use crate::series::{MAX_ROUNDING, TimeSeries, round_to};
use chrono::NaiveDateTime;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Order of the two spatial axes after the leading index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisOrder {
    /// `var[leading, lat, lon]`
    LatLon,
    /// `var[leading, lon, lat]`
    LonLat,
}

impl AxisOrder {
    fn index_tuple(&self, leading: usize, index: &GridIndex) -> (usize, usize, usize) {
        match self {
            AxisOrder::LatLon => (leading, index.lat_index, index.lon_index),
            AxisOrder::LonLat => (leading, index.lon_index, index.lat_index),
        }
    }
}

/// Describes where the grid, data variable and timestamp live in one file format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridLayout {
    /// Case-sensitive filename suffix, including the dot.
    pub extension: String,
    /// Sub-group holding coordinates and data, `None` for the root group.
    pub group: Option<String>,
    pub axis_order: AxisOrder,
    /// Index along the singleton outer dimension (time, ensemble or layer).
    pub leading_index: usize,
    pub lat_variable: String,
    pub lon_variable: String,
    pub time_attribute: String,
}

impl GridLayout {
    /// netCDF grid: `.nc`, root group, `[0, lat, lon]`.
    pub fn netcdf() -> Self {
        GridLayout {
            extension: ".nc".to_string(),
            group: None,
            axis_order: AxisOrder::LatLon,
            leading_index: 0,
            lat_variable: "lat".to_string(),
            lon_variable: "lon".to_string(),
            time_attribute: "time_coverage_end".to_string(),
        }
    }

    /// HDF5 grid: `.HDF5`, `Grid` group, `[0, lon, lat]`.
    pub fn hdf5() -> Self {
        GridLayout {
            extension: ".HDF5".to_string(),
            group: Some("Grid".to_string()),
            axis_order: AxisOrder::LonLat,
            ..Self::netcdf()
        }
    }

    pub fn matches(&self, file_name: &str, filename_filter: &str) -> bool {
        file_name.contains(filename_filter) && file_name.ends_with(&self.extension)
    }
}

/// Everything an import needs besides the directory, filter and variable name.
#[derive(Debug, Clone)]
pub struct PointQuery {
    pub target: GeoPoint,
    pub layout: GridLayout,
    /// Fractional digits kept for every sample; `None` keeps the raw value.
    pub rounding: Option<u32>,
    /// Draw a progress bar over the file loop.
    pub progress: bool,
}

impl PointQuery {
    pub fn new(target: GeoPoint, layout: GridLayout) -> Self {
        PointQuery {
            target,
            layout,
            rounding: Some(crate::input::DEFAULT_ROUNDING),
            progress: false,
        }
    }
}

/// Lists the files of `directory` that match the filter and layout, sorted by name.
///
/// Names that are not valid UTF-8 are matched on their lossy form. An entry that
/// cannot be read fails the listing.
pub fn matching_files(
    directory: &Path,
    filename_filter: &str,
    layout: &GridLayout,
) -> Result<Vec<PathBuf>> {
    let mut matches: Vec<(String, PathBuf)> = Vec::new();
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if layout.matches(&name, filename_filter) {
            matches.push((name, entry.path()));
        }
    }
    matches.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(matches.into_iter().map(|(_, path)| path).collect())
}

/// Imports one sample per matching file of `directory` into a time series.
///
/// # Errors
///
/// - [`GridPointError::InvalidInput`] if the rounding exceeds [`MAX_ROUNDING`] digits
/// - [`GridPointError::NotFound`] if no file matches the filter and extension
/// - [`GridPointError::Format`] if a group, coordinate array, attribute or the
///   variable is missing or misshaped
/// - [`GridPointError::Parse`] if a timestamp attribute cannot be parsed
///
/// The first failing file aborts the import; its handle is released before the
/// error is returned.
pub fn import_series(
    directory: &Path,
    filename_filter: &str,
    variable_name: &str,
    query: &PointQuery,
) -> Result<TimeSeries> {
    if let Some(decimals) = query.rounding
        && decimals > MAX_ROUNDING
    {
        return Err(GridPointError::InvalidInput(format!(
            "rounding of {} digits exceeds the maximum of {}",
            decimals, MAX_ROUNDING
        )));
    }
    let files = matching_files(directory, filename_filter, &query.layout)?;
    if files.is_empty() {
        return Err(GridPointError::NotFound {
            directory: directory.to_path_buf(),
            filter: filename_filter.to_string(),
            extension: query.layout.extension.clone(),
        });
    }
    info!(
        "Importing '{}' from {} files in {}",
        variable_name,
        files.len(),
        directory.display()
    );

    let index = {
        let file = open(&files[0])?;
        resolve_grid_index(&file, &files[0], &query.layout, &query.target)?
    };
    debug!(
        "Resolved {} to lat index {}, lon index {}",
        query.target, index.lat_index, index.lon_index
    );

    let progress = progress_bar(files.len() as u64, query.progress);
    let mut series = TimeSeries::new();
    for path in &files {
        progress.set_message(file_label(path));
        let file = open(path)?;
        let (time, value) = extract_sample(&file, path, &query.layout, variable_name, &index)?;
        let value = match query.rounding {
            Some(decimals) => round_to(value, decimals),
            None => value,
        };
        if series.insert(time, value).is_some() {
            debug!("{} replaces an earlier sample at {}", path.display(), time);
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    Ok(series)
}

/// Phase one: locates `target` on the grid of one file.
pub fn resolve_grid_index(
    file: &netcdf::File,
    path: &Path,
    layout: &GridLayout,
    target: &GeoPoint,
) -> Result<GridIndex> {
    let (lats, lons) = match &layout.group {
        Some(group_name) => {
            let group = require_group(file, path, group_name)?;
            (
                read_coordinates(group.variable(&layout.lat_variable), path, &layout.lat_variable)?,
                read_coordinates(group.variable(&layout.lon_variable), path, &layout.lon_variable)?,
            )
        }
        None => (
            read_coordinates(file.variable(&layout.lat_variable), path, &layout.lat_variable)?,
            read_coordinates(file.variable(&layout.lon_variable), path, &layout.lon_variable)?,
        ),
    };

    locate_point(target, &lats, &lons).map_err(|e| GridPointError::format(path, e.to_string()))
}

/// Phase two: reads the coverage-end timestamp and the value at `index`.
pub fn extract_sample(
    file: &netcdf::File,
    path: &Path,
    layout: &GridLayout,
    variable_name: &str,
    index: &GridIndex,
) -> Result<(NaiveDateTime, f64)> {
    let raw_time = match &layout.group {
        Some(group_name) => {
            let group = require_group(file, path, group_name)?;
            match group.attribute(&layout.time_attribute) {
                Some(attr) => Some(attr_as_string(&attr, path)?),
                None => None,
            }
        }
        None => None,
    };
    let raw_time = match raw_time {
        Some(raw) => raw,
        None => {
            let attr = file.attribute(&layout.time_attribute).ok_or_else(|| {
                GridPointError::format(
                    path,
                    format!("attribute '{}' not found", layout.time_attribute),
                )
            })?;
            attr_as_string(&attr, path)?
        }
    };
    let time = parse_coverage_time(&raw_time, path)?;

    let value = match &layout.group {
        Some(group_name) => {
            let group = require_group(file, path, group_name)?;
            read_point_value(group.variable(variable_name), path, variable_name, layout, index)?
        }
        None => read_point_value(file.variable(variable_name), path, variable_name, layout, index)?,
    };

    Ok((time, value))
}

/// Parses a coverage timestamp after dropping a trailing UTC marker.
///
/// Accepts `YYYY-MM-DDTHH:MM:SS[.fff]`, the same with a space separator,
/// `YYYY-MM-DDTHH:MM`, and a bare `YYYY-MM-DD` (midnight).
pub fn parse_coverage_time(raw: &str, path: &Path) -> Result<NaiveDateTime> {
    let normalized = raw.trim();
    let normalized = normalized
        .strip_suffix('Z')
        .or_else(|| normalized.strip_suffix('z'))
        .unwrap_or(normalized);

    const FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
    for fmt in FORMATS {
        if let Ok(time) = NaiveDateTime::parse_from_str(normalized, fmt) {
            return Ok(time);
        }
    }

    match chrono::NaiveDate::parse_from_str(normalized, "%Y-%m-%d") {
        Ok(date) => Ok(date.and_time(chrono::NaiveTime::MIN)),
        Err(source) => Err(GridPointError::Parse {
            path: path.to_path_buf(),
            value: raw.to_string(),
            source,
        }),
    }
}

fn open(path: &Path) -> Result<netcdf::File> {
    debug!("Opening {}", path.display());
    netcdf::open(path).map_err(|e| GridPointError::netcdf(path, e))
}

fn require_group<'f>(
    file: &'f netcdf::File,
    path: &Path,
    group_name: &str,
) -> Result<netcdf::Group<'f>> {
    file.group(group_name)
        .map_err(|e| GridPointError::netcdf(path, e))?
        .ok_or_else(|| GridPointError::format(path, format!("group '{}' not found", group_name)))
}

fn read_coordinates(var: Option<netcdf::Variable<'_>>, path: &Path, name: &str) -> Result<Vec<f64>> {
    let var = var.ok_or_else(|| {
        GridPointError::format(path, format!("coordinate variable '{}' not found", name))
    })?;
    var.get_values::<f64, _>(..)
        .map_err(|e| GridPointError::netcdf(path, e))
}

fn read_point_value(
    var: Option<netcdf::Variable<'_>>,
    path: &Path,
    name: &str,
    layout: &GridLayout,
    index: &GridIndex,
) -> Result<f64> {
    let var = var
        .ok_or_else(|| GridPointError::format(path, format!("variable '{}' not found", name)))?;

    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    if shape.len() != 3 {
        return Err(GridPointError::format(
            path,
            format!("variable '{}' has {} dimensions, expected 3", name, shape.len()),
        ));
    }
    let indices = layout.axis_order.index_tuple(layout.leading_index, index);
    if indices.0 >= shape[0] || indices.1 >= shape[1] || indices.2 >= shape[2] {
        return Err(GridPointError::format(
            path,
            format!(
                "index {:?} is outside variable '{}' with shape {:?}",
                indices, name, shape
            ),
        ));
    }

    let value = var
        .get_value::<f64, _>(indices)
        .map_err(|e| GridPointError::netcdf(path, e))?;

    if let Some(fill) = fill_value(&var)
        && value == fill
    {
        warn!(
            "{}: '{}' holds the fill value at {:?}, storing NaN",
            path.display(),
            name,
            indices
        );
        return Ok(f64::NAN);
    }
    Ok(value)
}

fn fill_value(var: &netcdf::Variable<'_>) -> Option<f64> {
    let value = var.attribute("_FillValue")?.value().ok()?;
    match value {
        netcdf::AttributeValue::Double(v) => Some(v),
        netcdf::AttributeValue::Float(v) => Some(v as f64),
        netcdf::AttributeValue::Int(v) => Some(v as f64),
        netcdf::AttributeValue::Short(v) => Some(v as f64),
        _ => None,
    }
}

fn attr_as_string(attr: &netcdf::Attribute<'_>, path: &Path) -> Result<String> {
    match attr.value().map_err(|e| GridPointError::netcdf(path, e))? {
        netcdf::AttributeValue::Str(s) => Ok(s),
        netcdf::AttributeValue::Strs(mut strs) if !strs.is_empty() => Ok(strs.swap_remove(0)),
        other => Err(GridPointError::format(
            path,
            format!("attribute '{}' is not a string: {:?}", attr.name(), other),
        )),
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {wide_msg}")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}
