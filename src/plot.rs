//! # Chart Rendering
//!
//! Draws every built series on one dated chart with `plotters`: raw samples as
//! markers joined by a line, and the fitted trend (if any) as a second line. The
//! backend is picked from the output extension (`.svg` for SVG, anything else PNG).

use crate::error::{GridPointError, Result};
use crate::input::PlotConfig;
use crate::series::TimeSeries;
use crate::trend::{TrendLine, trend_points};
use chrono::{NaiveDateTime, TimeDelta};
use log::debug;
use plotters::coord::Shift;
use plotters::coord::types::RangedDateTime;
use plotters::prelude::*;

/// A series ready to draw, already in display units.
#[derive(Debug, Clone)]
pub struct PlotSeries {
    pub label: String,
    pub units: Option<String>,
    pub series: TimeSeries,
    pub trend: Option<TrendLine>,
}

/// Renders `series` into the file named by `config.output`.
///
/// # Errors
///
/// [`GridPointError::Plot`] when no series holds a finite sample (nothing is
/// written then) or when the backend fails.
pub fn render_chart(series: &[PlotSeries], title: &str, config: &PlotConfig) -> Result<()> {
    let bounds = data_bounds(series)
        .ok_or_else(|| GridPointError::Plot("no finite samples to plot".to_string()))?;
    let size = (config.width, config.height);
    debug!("Rendering {} series to {}", series.len(), config.output);

    if config.output.to_lowercase().ends_with(".svg") {
        let root = SVGBackend::new(&config.output, size).into_drawing_area();
        draw_chart(root, bounds, series, title, config)
            .map_err(|e| GridPointError::Plot(e.to_string()))
    } else {
        let root = BitMapBackend::new(&config.output, size).into_drawing_area();
        draw_chart(root, bounds, series, title, config)
            .map_err(|e| GridPointError::Plot(e.to_string()))
    }
}

fn draw_chart<DB>(
    root: DrawingArea<DB, Shift>,
    bounds: Bounds,
    series: &[PlotSeries],
    title: &str,
    config: &PlotConfig,
) -> std::result::Result<(), Box<dyn std::error::Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let ((min_t, max_t), (min_y, max_y)) = bounds;

    root.fill(&WHITE)?;
    let font = config.font_size as i32;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", font + 4))
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(80)
        .build_cartesian_2d(RangedDateTime::from(min_t..max_t), min_y..max_y)?;

    chart
        .configure_mesh()
        .x_desc(config.x_label.as_str())
        .y_desc(config.y_label.as_str())
        .x_label_formatter(&|t: &NaiveDateTime| t.format("%Y-%m").to_string())
        .x_label_style(
            ("sans-serif", font)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .y_label_style(("sans-serif", font))
        .axis_desc_style(("sans-serif", font))
        .light_line_style(BLACK.mix(0.1))
        .draw()?;

    for (i, item) in series.iter().enumerate() {
        let color = Palette99::pick(i * 2).to_rgba();
        let points: Vec<(NaiveDateTime, f64)> =
            item.series.iter().filter(|(_, v)| v.is_finite()).collect();

        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(1)))?
            .label(item.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart.draw_series(
            points
                .iter()
                .map(|&(t, v)| Circle::new((t, v), 3, color.filled())),
        )?;

        if let Some(trend) = &item.trend {
            let trend_color = Palette99::pick(i * 2 + 1).to_rgba();
            chart
                .draw_series(LineSeries::new(
                    trend_points(&item.series, trend),
                    trend_color.stroke_width(2),
                ))?
                .label(format!("{} Trendline", item.label))
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], trend_color));
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .label_font(("sans-serif", font))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

type Bounds = ((NaiveDateTime, NaiveDateTime), (f64, f64));

/// Time and value ranges over every finite sample, padded so single points and
/// flat series still get a visible extent.
fn data_bounds(series: &[PlotSeries]) -> Option<Bounds> {
    let samples = series
        .iter()
        .flat_map(|s| s.series.iter())
        .filter(|(_, v)| v.is_finite());

    let mut bounds: Option<Bounds> = None;
    for (t, v) in samples {
        bounds = Some(match bounds {
            None => ((t, t), (v, v)),
            Some(((lo_t, hi_t), (lo_v, hi_v))) => {
                ((lo_t.min(t), hi_t.max(t)), (lo_v.min(v), hi_v.max(v)))
            }
        });
    }

    let ((min_t, mut max_t), (min_y, max_y)) = bounds?;
    if max_t == min_t {
        max_t += TimeDelta::days(1);
    }
    let padding = if (max_y - min_y).abs() > 1e-9 {
        (max_y - min_y) * 0.1
    } else {
        1.0
    };
    Some(((min_t, max_t), (min_y - padding, max_y + padding)))
}
