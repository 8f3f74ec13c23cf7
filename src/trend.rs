//! # Trend Fitting
//!
//! First-degree least-squares fit over `(date ordinal, value)` pairs. The date
//! ordinal is the number of (fractional) days since 1970-01-01T00:00, so the slope
//! is in value units per day.

use crate::error::{GridPointError, Result};
use crate::input::DAYS_PER_YEAR;
use crate::series::TimeSeries;
use chrono::{DateTime, NaiveDateTime, TimeDelta};
use std::fmt;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// `value = slope * ordinal + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
}

impl TrendLine {
    pub fn at(&self, ordinal: f64) -> f64 {
        self.slope * ordinal + self.intercept
    }

    /// Slope scaled to a 360-day year.
    pub fn annual_rate(&self) -> f64 {
        self.slope * DAYS_PER_YEAR
    }
}

impl fmt::Display for TrendLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x + {}", self.slope, self.intercept)
    }
}

/// Fractional days since the Unix epoch.
pub fn date_ordinal(time: &NaiveDateTime) -> f64 {
    let utc = time.and_utc();
    utc.timestamp() as f64 / SECONDS_PER_DAY
        + utc.timestamp_subsec_nanos() as f64 / (SECONDS_PER_DAY * 1e9)
}

/// Inverse of [`date_ordinal`], to the millisecond.
pub fn ordinal_to_datetime(ordinal: f64) -> Option<NaiveDateTime> {
    let millis = (ordinal * SECONDS_PER_DAY * 1000.0).round();
    if !millis.is_finite() {
        return None;
    }
    let epoch = DateTime::from_timestamp(0, 0)?.naive_utc();
    epoch.checked_add_signed(TimeDelta::try_milliseconds(millis as i64)?)
}

/// Least-squares line through `(x, y)` pairs.
///
/// # Errors
///
/// [`GridPointError::InvalidInput`] for fewer than two pairs or when every `x` is
/// the same.
pub fn fit_line(points: &[(f64, f64)]) -> Result<TrendLine> {
    if points.len() < 2 {
        return Err(GridPointError::InvalidInput(format!(
            "a trend needs at least two samples, got {}",
            points.len()
        )));
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx) = (0.0, 0.0);
    for &(x, y) in points {
        let dx = x - mean_x;
        sxy += dx * (y - mean_y);
        sxx += dx * dx;
    }
    if sxx == 0.0 {
        return Err(GridPointError::InvalidInput(
            "all samples share one date, slope is undefined".to_string(),
        ));
    }

    let slope = sxy / sxx;
    Ok(TrendLine {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

/// Fits a trend to the finite samples of `series`.
pub fn fit_series(series: &TimeSeries) -> Result<TrendLine> {
    let points: Vec<(f64, f64)> = series
        .iter()
        .filter(|(_, v)| v.is_finite())
        .map(|(t, v)| (date_ordinal(&t), v))
        .collect();
    fit_line(&points)
}

/// `n` evenly spaced points of `trend` between the first and last date of `series`.
pub fn trend_points(series: &TimeSeries, trend: &TrendLine) -> Vec<(NaiveDateTime, f64)> {
    let Some((first, last)) = series.span() else {
        return Vec::new();
    };
    let n = series.len();
    let (start, end) = (date_ordinal(&first), date_ordinal(&last));
    if n < 2 {
        return vec![(first, trend.at(start))];
    }
    let step = (end - start) / (n - 1) as f64;
    (0..n)
        .filter_map(|i| {
            let x = start + step * i as f64;
            ordinal_to_datetime(x).map(|t| (t, trend.at(x)))
        })
        .collect()
}
