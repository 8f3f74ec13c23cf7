//! # Time Series
//!
//! A [`TimeSeries`] maps coverage-end timestamps to one scalar sample each. It is
//! backed by an ordered map, so iteration is always ascending in time and a repeated
//! timestamp simply replaces the earlier sample.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;

/// One `(timestamp, value)` sample, used for serialized output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: NaiveDateTime,
    pub value: f64,
}

/// Ordered mapping from timestamp to scalar measurement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    points: BTreeMap<NaiveDateTime, f64>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a sample, returning the value it replaced if the timestamp was
    /// already present.
    pub fn insert(&mut self, time: NaiveDateTime, value: f64) -> Option<f64> {
        self.points.insert(time, value)
    }

    pub fn get(&self, time: &NaiveDateTime) -> Option<f64> {
        self.points.get(time).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn contains(&self, time: &NaiveDateTime) -> bool {
        self.points.contains_key(time)
    }

    /// Samples in ascending time order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.points.iter().map(|(t, v)| (*t, *v))
    }

    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.points.keys().copied()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.values().copied()
    }

    /// First and last timestamp, if any.
    pub fn span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let first = self.points.keys().next()?;
        let last = self.points.keys().next_back()?;
        Some((*first, *last))
    }

    /// Multiplies every value by `factor` (e.g. `1000.0` for metres to millimetres).
    pub fn scaled(&self, factor: f64) -> TimeSeries {
        self.iter().map(|(t, v)| (t, v * factor)).collect()
    }

    pub fn samples(&self) -> Vec<Sample> {
        self.iter().map(|(time, value)| Sample { time, value }).collect()
    }

    /// Returns a series holding every key of `self` and `overlay`; on a shared
    /// timestamp the overlay's value wins.
    pub fn merged_with(&self, overlay: &TimeSeries) -> TimeSeries {
        let mut points = self.points.clone();
        points.extend(overlay.iter());
        TimeSeries { points }
    }
}

impl FromIterator<(NaiveDateTime, f64)> for TimeSeries {
    fn from_iter<I: IntoIterator<Item = (NaiveDateTime, f64)>>(iter: I) -> Self {
        TimeSeries {
            points: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for TimeSeries {
    type Item = (NaiveDateTime, f64);
    type IntoIter = btree_map::IntoIter<NaiveDateTime, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl Serialize for TimeSeries {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter().map(|(time, value)| Sample { time, value }))
    }
}

/// Combines an older-generation series with a newer one. See [`TimeSeries::merged_with`].
///
/// # Examples
///
/// ```rust
/// use chrono::NaiveDate;
/// use gridpoint::series::{merge, TimeSeries};
///
/// let jan = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let base: TimeSeries = [(jan, 5.0)].into_iter().collect();
/// let overlay: TimeSeries = [(jan, 7.0)].into_iter().collect();
/// assert_eq!(merge(&base, &overlay).get(&jan), Some(7.0));
/// ```
pub fn merge(base: &TimeSeries, overlay: &TimeSeries) -> TimeSeries {
    base.merged_with(overlay)
}

/// Folds several sources in order; later sources win on shared timestamps.
pub fn merge_all<'a, I>(sources: I) -> TimeSeries
where
    I: IntoIterator<Item = &'a TimeSeries>,
{
    sources
        .into_iter()
        .fold(TimeSeries::new(), |acc, next| acc.merged_with(next))
}

/// Most fractional digits an `f64` sample can meaningfully keep.
pub const MAX_ROUNDING: u32 = 15;

/// Rounds `value` to `decimals` fractional digits, half away from zero.
///
/// `decimals` above [`MAX_ROUNDING`] is treated as [`MAX_ROUNDING`].
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals.min(MAX_ROUNDING) as i32);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() { rounded } else { value }
}
