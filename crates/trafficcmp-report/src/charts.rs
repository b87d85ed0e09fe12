//! SVG charts rendered in memory with plotters.
//!
//! Every chart is drawn at 1200x800 with the backend's built-in font handling
//! and returned as an SVG string, so callers decide whether to inline it in a
//! page or write it to disk.

use plotters::prelude::*;
use thiserror::Error;
use tracing::warn;

use trafficcmp_core::dimension::week_number;
use trafficcmp_core::{AnalysisReport, ComparisonRow, Dimension, DimensionAnalysis, ShareRow};

use crate::format::{series_labels, thousands, truncate_label};

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

type Result<T> = core::result::Result<T, ChartError>;

pub const CHART_SIZE: (u32, u32) = (1200, 800);

/// Rows shown in the channel and page charts.
pub const CHART_TOP_N: usize = 10;

pub const OLD_COLOR: RGBColor = RGBColor(135, 206, 235);
pub const NEW_COLOR: RGBColor = RGBColor(240, 128, 128);
const DROP_COLOR: RGBColor = RGBColor(205, 92, 92);

const SHARE_PALETTE: [RGBColor; 6] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
];

#[derive(Debug, Clone)]
pub struct Chart {
    pub dimension: Dimension,
    pub title: String,
    pub svg: String,
}

/// Renders one chart per analysed dimension.
///
/// A chart that fails or has nothing to show is skipped with a warning; the
/// remaining charts are still returned.
pub fn render_charts(report: &AnalysisReport) -> Vec<Chart> {
    let (old_label, new_label) = series_labels(report);
    let mut charts = Vec::new();

    for analysis in report.analysed() {
        let (title, rendered) = match analysis.dimension {
            Dimension::Channel => (
                "Traffic Comparison by Channel".to_string(),
                channel_chart(
                    &analysis.top_by_old(CHART_TOP_N),
                    "Traffic Comparison by Channel",
                    &old_label,
                    &new_label,
                ),
            ),
            Dimension::Page => (
                "Top Pages with Largest Traffic Drop".to_string(),
                page_drop_chart(
                    &analysis.largest_drops(CHART_TOP_N),
                    "Top Pages with Largest Traffic Drop",
                ),
            ),
            Dimension::Date => (
                "Weekly Traffic Trend".to_string(),
                weekly_chart(analysis, "Weekly Traffic Trend", &old_label, &new_label),
            ),
            Dimension::Device => (
                "Traffic Share by Device".to_string(),
                device_share_chart(&analysis.shares, "Traffic Share by Device", &old_label, &new_label),
            ),
        };

        match rendered {
            Ok(svg) => charts.push(Chart {
                dimension: analysis.dimension,
                title,
                svg,
            }),
            Err(e) => warn!(dimension = %analysis.dimension, error = %e, "Chart skipped"),
        }
    }
    charts
}

fn draw_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Drawing(e.to_string())
}

/// Grouped bars, older period left and newer period right of each group.
///
/// Each category spans three x units: one per bar plus a gap.
pub fn channel_chart(
    rows: &[ComparisonRow],
    title: &str,
    old_label: &str,
    new_label: &str,
) -> Result<String> {
    if rows.is_empty() {
        return Err(ChartError::InvalidData("no channel rows to plot".to_string()));
    }

    let max = rows
        .iter()
        .flat_map(|r| [r.sessions_old, r.sessions_new])
        .fold(0.0_f64, f64::max);
    let y_max = if max > 0.0 { max * 1.1 } else { 1.0 };
    let labels: Vec<String> = rows
        .iter()
        .map(|r| truncate_label(&r.dimension_value, 16))
        .collect();
    let x_end = (rows.len() * 3) as i32;

    let mut svg = String::new();
    {
        let area = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        area.fill(&WHITE)
            .map_err(|e| ChartError::DrawingArea(e.to_string()))?;

        let mut chart = ChartBuilder::on(&area)
            .caption(title, ("sans-serif", 32))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(90)
            .build_cartesian_2d(0..x_end, 0.0..y_max)
            .map_err(|e| ChartError::ChartConfig(e.to_string()))?;

        // Label only the boundary between the two bars of a group.
        let x_fmt = |x: &i32| {
            if x % 3 == 1 {
                labels.get((x / 3) as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        };
        let y_fmt = |y: &f64| thousands(*y);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(x_end as usize + 1)
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .y_desc("Sessions")
            .label_style(("sans-serif", 16))
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(rows.iter().enumerate().map(|(i, r)| {
                let x = (i * 3) as i32;
                Rectangle::new([(x, 0.0), (x + 1, r.sessions_old)], OLD_COLOR.filled())
            }))
            .map_err(draw_err)?
            .label(old_label)
            .legend(|(x, y)| Rectangle::new([(x, y - 6), (x + 14, y + 6)], OLD_COLOR.filled()));

        chart
            .draw_series(rows.iter().enumerate().map(|(i, r)| {
                let x = (i * 3) as i32 + 1;
                Rectangle::new([(x, 0.0), (x + 1, r.sessions_new)], NEW_COLOR.filled())
            }))
            .map_err(draw_err)?
            .label(new_label)
            .legend(|(x, y)| Rectangle::new([(x, y - 6), (x + 14, y + 6)], NEW_COLOR.filled()));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(draw_err)?;

        area.present().map_err(draw_err)?;
    }
    Ok(svg)
}

/// Horizontal bars of absolute session loss, largest drop on top.
pub fn page_drop_chart(drops: &[ComparisonRow], title: &str) -> Result<String> {
    if drops.is_empty() {
        return Err(ChartError::InvalidData("no page lost traffic".to_string()));
    }

    let min = drops.iter().map(|r| r.change).fold(0.0_f64, f64::min);
    let x_min = if min < 0.0 { min * 1.1 } else { -1.0 };
    let n = drops.len();
    let labels: Vec<String> = drops
        .iter()
        .map(|r| truncate_label(&r.dimension_value, 32))
        .collect();
    let y_end = (n * 3) as i32;

    let mut svg = String::new();
    {
        let area = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        area.fill(&WHITE)
            .map_err(|e| ChartError::DrawingArea(e.to_string()))?;

        let mut chart = ChartBuilder::on(&area)
            .caption(title, ("sans-serif", 32))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(280)
            .build_cartesian_2d(x_min..0.0, 0..y_end)
            .map_err(|e| ChartError::ChartConfig(e.to_string()))?;

        // Slot i (from the top) occupies [3k, 3k + 2] with its label at 3k + 1.
        let slot = |i: usize| ((n - 1 - i) * 3) as i32;
        let y_fmt = |y: &i32| {
            if y % 3 == 1 {
                let k = (y / 3) as usize;
                n.checked_sub(k + 1)
                    .and_then(|i| labels.get(i))
                    .cloned()
                    .unwrap_or_default()
            } else {
                String::new()
            }
        };
        let x_fmt = |x: &f64| thousands(*x);
        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(y_end as usize + 1)
            .y_label_formatter(&y_fmt)
            .x_label_formatter(&x_fmt)
            .x_desc("Change in Sessions")
            .label_style(("sans-serif", 16))
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(drops.iter().enumerate().map(|(i, r)| {
                let y = slot(i);
                Rectangle::new([(r.change, y), (0.0, y + 2)], DROP_COLOR.filled())
            }))
            .map_err(draw_err)?;

        area.present().map_err(draw_err)?;
    }
    Ok(svg)
}

/// Sessions per calendar week for both periods on a shared week-number axis.
pub fn weekly_chart(
    analysis: &DimensionAnalysis,
    title: &str,
    old_label: &str,
    new_label: &str,
) -> Result<String> {
    let mut points: Vec<(i32, f64, f64)> = analysis
        .rows
        .iter()
        .filter_map(|r| {
            week_number(&r.dimension_value).map(|w| (w as i32, r.sessions_old, r.sessions_new))
        })
        .collect();
    if points.is_empty() {
        return Err(ChartError::InvalidData("no weekly rows to plot".to_string()));
    }
    points.sort_by_key(|(w, _, _)| *w);

    let max = points
        .iter()
        .flat_map(|(_, o, n)| [*o, *n])
        .fold(0.0_f64, f64::max);
    let y_max = if max > 0.0 { max * 1.1 } else { 1.0 };
    let first = points.first().map(|p| p.0).unwrap_or(1);
    let last = points.last().map(|p| p.0).unwrap_or(1);
    let x_range = (first - 1).max(0)..(last + 1);

    let mut svg = String::new();
    {
        let area = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        area.fill(&WHITE)
            .map_err(|e| ChartError::DrawingArea(e.to_string()))?;

        let mut chart = ChartBuilder::on(&area)
            .caption(title, ("sans-serif", 32))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(90)
            .build_cartesian_2d(x_range, 0.0..y_max)
            .map_err(|e| ChartError::ChartConfig(e.to_string()))?;

        let x_fmt = |x: &i32| format!("W{x:02}");
        let y_fmt = |y: &f64| thousands(*y);
        chart
            .configure_mesh()
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .x_desc("Week")
            .y_desc("Sessions")
            .label_style(("sans-serif", 16))
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(LineSeries::new(
                points.iter().map(|(w, o, _)| (*w, *o)),
                OLD_COLOR.stroke_width(3),
            ))
            .map_err(draw_err)?
            .label(old_label)
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], OLD_COLOR.stroke_width(3)));

        chart
            .draw_series(LineSeries::new(
                points.iter().map(|(w, _, n)| (*w, *n)),
                NEW_COLOR.stroke_width(3),
            ))
            .map_err(draw_err)?
            .label(new_label)
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], NEW_COLOR.stroke_width(3)));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(draw_err)?;

        area.present().map_err(draw_err)?;
    }
    Ok(svg)
}

/// Two horizontal 100% bars (older on top) split by device share.
pub fn device_share_chart(
    shares: &[ShareRow],
    title: &str,
    old_label: &str,
    new_label: &str,
) -> Result<String> {
    if shares.is_empty() {
        return Err(ChartError::InvalidData("no device shares to plot".to_string()));
    }

    let mut svg = String::new();
    {
        let area = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        area.fill(&WHITE)
            .map_err(|e| ChartError::DrawingArea(e.to_string()))?;

        let mut chart = ChartBuilder::on(&area)
            .caption(title, ("sans-serif", 32))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(200)
            .build_cartesian_2d(0.0..100.0, 0..6)
            .map_err(|e| ChartError::ChartConfig(e.to_string()))?;

        let y_fmt = |y: &i32| match y {
            4 => old_label.to_string(),
            1 => new_label.to_string(),
            _ => String::new(),
        };
        let x_fmt = |x: &f64| format!("{x:.0}%");
        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(7)
            .y_label_formatter(&y_fmt)
            .x_label_formatter(&x_fmt)
            .x_desc("Share of Sessions")
            .label_style(("sans-serif", 16))
            .draw()
            .map_err(draw_err)?;

        let mut old_offset = 0.0;
        let mut new_offset = 0.0;
        for (i, share) in shares.iter().enumerate() {
            let color = SHARE_PALETTE[i % SHARE_PALETTE.len()];
            let old_bar = Rectangle::new(
                [(old_offset, 3), (old_offset + share.share_old, 5)],
                color.filled(),
            );
            let new_bar = Rectangle::new(
                [(new_offset, 0), (new_offset + share.share_new, 2)],
                color.filled(),
            );
            old_offset += share.share_old;
            new_offset += share.share_new;

            chart
                .draw_series([old_bar, new_bar])
                .map_err(draw_err)?
                .label(share.dimension_value.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 14, y + 6)], color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(draw_err)?;

        area.present().map_err(draw_err)?;
    }
    Ok(svg)
}
