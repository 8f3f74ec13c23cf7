//! # Coordinate Locator
//!
//! Nearest-neighbour lookup of a decimal-degree coordinate in a grid coordinate
//! array, plus the small value types that describe a query point and the grid cell
//! it resolves to.

use crate::error::{GridPointError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A target location in decimal degrees.
///
/// # Examples
///
/// ```rust
/// use gridpoint::locate::GeoPoint;
///
/// let point = GeoPoint::new(30.5, 38.5);
/// assert!(point.validate().is_ok());
/// assert!(GeoPoint::new(91.0, 0.0).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        GeoPoint { lat, lon }
    }

    /// Checks that the point is finite and inside the accepted ranges.
    ///
    /// Longitudes up to 360 are accepted since many global grids use `0..360`.
    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(GridPointError::InvalidInput(format!(
                "latitude {} is outside [-90, 90]",
                self.lat
            )));
        }
        if !self.lon.is_finite() || !(-180.0..=360.0).contains(&self.lon) {
            return Err(GridPointError::InvalidInput(format!(
                "longitude {} is outside [-180, 360]",
                self.lon
            )));
        }
        Ok(())
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}N, {}E", self.lat, self.lon)
    }
}

/// Spatial indices of the grid cell closest to a [`GeoPoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridIndex {
    pub lat_index: usize,
    pub lon_index: usize,
}

/// Returns the index of the grid value closest to `target`.
///
/// Ties resolve to the first occurrence. NaN entries in the grid never win.
///
/// # Errors
///
/// Returns [`GridPointError::InvalidInput`] when the grid is empty, the target is
/// not finite, or no grid entry is comparable with the target.
///
/// # Examples
///
/// ```rust
/// use gridpoint::locate::locate;
///
/// assert_eq!(locate(22.0, &[10.0, 20.0, 30.0]).unwrap(), 1);
/// ```
pub fn locate(target: f64, grid: &[f64]) -> Result<usize> {
    if grid.is_empty() {
        return Err(GridPointError::InvalidInput(
            "cannot locate a coordinate in an empty grid".to_string(),
        ));
    }
    if !target.is_finite() {
        return Err(GridPointError::InvalidInput(format!(
            "target coordinate {} is not finite",
            target
        )));
    }

    let mut best: Option<(usize, f64)> = None;
    for (idx, &value) in grid.iter().enumerate() {
        let distance = (value - target).abs();
        if distance.is_nan() {
            continue;
        }
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((idx, distance)),
        }
    }

    best.map(|(idx, _)| idx).ok_or_else(|| {
        GridPointError::InvalidInput("grid contains no comparable coordinates".to_string())
    })
}

/// Resolves both spatial indices of `point` against latitude and longitude arrays.
pub fn locate_point(point: &GeoPoint, lats: &[f64], lons: &[f64]) -> Result<GridIndex> {
    Ok(GridIndex {
        lat_index: locate(point.lat, lats)?,
        lon_index: locate(point.lon, lons)?,
    })
}
