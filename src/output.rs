//! # Parquet Output Module
//!
//! Exports built series as a long-format table (`series`, `time`, `value`) through
//! a Polars DataFrame written with `ParquetWriter`.

use crate::error::Result;
use crate::plot::PlotSeries;
use log::debug;
use polars::prelude::*;
use std::fs::File;

/// Builds the long-format DataFrame for `series`.
///
/// `time` is a millisecond datetime column without time zone.
pub fn series_to_dataframe(series: &[PlotSeries]) -> Result<DataFrame> {
    let mut labels: Vec<String> = Vec::new();
    let mut times: Vec<i64> = Vec::new();
    let mut values: Vec<f64> = Vec::new();

    for item in series {
        for (time, value) in item.series.iter() {
            labels.push(item.label.clone());
            times.push(time.and_utc().timestamp_millis());
            values.push(value);
        }
    }

    let time_column = Series::new("time".into(), times)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
    let columns = vec![
        Series::new("series".into(), labels).into(),
        time_column.into(),
        Series::new("value".into(), values).into(),
    ];

    Ok(DataFrame::new(columns)?)
}

/// Writes every series to a Parquet file at `output_path`.
pub fn write_series_to_parquet(series: &[PlotSeries], output_path: &str) -> Result<()> {
    let mut df = series_to_dataframe(series)?;
    write_dataframe_to_parquet(&mut df, output_path)
}

/// Writes an already built series table to `output_path`.
pub fn write_dataframe_to_parquet(df: &mut DataFrame, output_path: &str) -> Result<()> {
    debug!("DataFrame shape: {:?}", df.shape());
    debug!("DataFrame schema:\n{:?}", df.schema());

    let file = File::create(output_path)?;
    ParquetWriter::new(file).finish(df)?;
    debug!("Successfully wrote parquet file: {}", output_path);
    Ok(())
}
