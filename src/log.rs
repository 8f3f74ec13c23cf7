//! # Console Reporting
//!
//! User-facing lines printed by the `run` command: greeting, configuration echo,
//! per-series trend report and the closing timing line.

use crate::input::JobConfig;
use crate::plot::PlotSeries;
use std::time::Duration;

pub fn show_greeting(config_path: &str) {
    println!("=== Grid Point Time Series ===");
    println!("Loading configuration from: {}", config_path);
}

pub fn config_echo(config: &JobConfig) {
    println!("\nConfiguration:");
    println!("  Target: {}", config.target);
    match config.rounding {
        Some(digits) => println!("  Rounding: {} digits", digits),
        None => println!("  Rounding: off"),
    }
    println!("  Plot output: {}", config.plot.output);
    if let Some(parquet) = &config.parquet_key {
        println!("  Parquet output: {}", parquet);
    }
    println!("  Number of series: {}", config.series.len());

    for (i, series) in config.series.iter().enumerate() {
        println!("    Series {}: {} ({} sources)", i + 1, series.label, series.sources.len());
        for source in &series.sources {
            println!(
                "      {} [{}] {}*{}",
                source.variable_name,
                source.format.name(),
                source.directory.display(),
                source.filename_filter
            );
        }
    }
}

/// Prints the fitted coefficients and the annualized rate of every trended series.
pub fn show_trend_report(series: &[PlotSeries]) {
    println!();
    for item in series {
        println!("{}: {} samples", item.label, item.series.len());
        if let Some(trend) = &item.trend {
            println!("{} trendline coeffs: {}", item.label, trend);
            match &item.units {
                Some(units) => println!("Yearly variation: {} {}", trend.annual_rate(), units),
                None => println!("Yearly variation: {}", trend.annual_rate()),
            }
        }
    }
}

pub fn show_farewell_with_timing(elapsed: Duration) {
    println!("\n=== Completed successfully in {:.2?} ===", elapsed);
}
