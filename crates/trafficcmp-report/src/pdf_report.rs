//! Two-page PDF summary of the top channels.

use std::path::Path;

use tracing::info;

use trafficcmp_core::{AnalysisReport, ComparisonRow, Dimension};

use crate::format::{percent, series_labels, thousands, truncate_label, whole};
use crate::pdf::{text_width, Document, Font, Page, PdfError, Rgb, PAGE_HEIGHT, PAGE_WIDTH};

/// Rows on both PDF pages.
pub const PDF_TOP_N: usize = 5;

const OLD_FILL: Rgb = Rgb(135, 206, 235);
const NEW_FILL: Rgb = Rgb(240, 128, 128);
const GRID: Rgb = Rgb(220, 220, 220);
const HEADER_FILL: Rgb = Rgb(64, 64, 64);
const STRIPE_FILL: Rgb = Rgb(242, 242, 242);

/// Builds the PDF for `dimension`: a grouped bar chart of the top rows by
/// older-period sessions, then the same rows as a table.
pub fn build_pdf_report(report: &AnalysisReport, dimension: Dimension) -> Result<Document, PdfError> {
    let analysis = report
        .dimension(dimension)
        .ok_or_else(|| PdfError::Empty(format!("no {} analysis in report", dimension.slug())))?;
    let rows = analysis.top_by_old(PDF_TOP_N);
    if rows.is_empty() {
        return Err(PdfError::Empty(format!("no {} rows", dimension.slug())));
    }

    let (old_label, new_label) = series_labels(report);
    let noun = dimension.label();
    let mut doc = Document::new("Traffic Comparison Report");
    doc.push_page(chart_page(
        &rows,
        &format!("Top {} {noun} Traffic Comparison", rows.len()),
        &old_label,
        &new_label,
    ));
    doc.push_page(table_page(
        &rows,
        &format!("Top {} {noun} Data Summary", rows.len()),
        noun,
        &old_label,
        &new_label,
    ));
    Ok(doc)
}

pub fn write_pdf_report(
    report: &AnalysisReport,
    dimension: Dimension,
    path: &Path,
) -> Result<(), PdfError> {
    let doc = build_pdf_report(report, dimension)?;
    doc.save(path)?;
    info!(path = %path.display(), pages = doc.page_count(), "PDF report written");
    Ok(())
}

/// Picks a round axis step so that `max` spans roughly five ticks.
fn nice_step(max: f64) -> f64 {
    if max <= 0.0 {
        return 1.0;
    }
    let raw = max / 5.0;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(10.0 * magnitude);
    step.max(1.0)
}

fn chart_page(rows: &[ComparisonRow], title: &str, old_label: &str, new_label: &str) -> Page {
    let mut page = Page::new();
    let (left, right, bottom, top) = (90.0, PAGE_WIDTH - 40.0, 140.0, PAGE_HEIGHT - 90.0);

    page.text_centered(PAGE_WIDTH / 2.0, PAGE_HEIGHT - 50.0, 18.0, Font::Bold, title);

    let max = rows
        .iter()
        .flat_map(|r| [r.sessions_old, r.sessions_new])
        .fold(0.0_f64, f64::max);
    let step = nice_step(max);
    let ticks = (max / step).ceil().max(1.0) as usize;
    let y_max = step * ticks as f64 * 1.05;
    let scale = |v: f64| bottom + (v.max(0.0) / y_max) * (top - bottom);

    for t in 0..=ticks {
        let value = step * t as f64;
        let y = scale(value);
        page.line((left, y), (right, y), 0.5, GRID);
        page.text_right(left - 6.0, y - 3.0, 9.0, Font::Regular, &thousands(value));
    }
    page.line((left, bottom), (right, bottom), 1.0, Rgb::BLACK);
    page.line((left, bottom), (left, top), 1.0, Rgb::BLACK);
    page.text_rotated(30.0, (bottom + top) / 2.0 - 20.0, 11.0, Font::Regular, 90.0, "Sessions");

    let group = (right - left) / rows.len() as f64;
    let bar = group * 0.35;
    for (i, row) in rows.iter().enumerate() {
        let center = left + group * (i as f64 + 0.5);
        for (x, value, fill) in [
            (center - bar, row.sessions_old, OLD_FILL),
            (center, row.sessions_new, NEW_FILL),
        ] {
            let height = scale(value) - bottom;
            page.fill_rect(x, bottom, bar, height, fill);
            page.text_centered(x + bar / 2.0, bottom + height + 4.0, 9.0, Font::Regular, &whole(value));
        }

        // Rotated 45 degrees with the label ending under the group centre.
        let label = truncate_label(&row.dimension_value, 28);
        let run = text_width(&label, 10.0) * std::f64::consts::FRAC_1_SQRT_2;
        page.text_rotated(center - run, bottom - 12.0 - run, 10.0, Font::Regular, 45.0, &label);
    }

    let legend_x = right - 170.0;
    let legend_y = top - 10.0;
    for (i, (label, fill)) in [(old_label, OLD_FILL), (new_label, NEW_FILL)].iter().enumerate() {
        let y = legend_y - i as f64 * 16.0;
        page.fill_rect(legend_x, y, 12.0, 10.0, *fill);
        page.text(legend_x + 18.0, y + 1.0, 10.0, Font::Regular, label);
    }
    page
}

fn table_page(
    rows: &[ComparisonRow],
    title: &str,
    noun: &str,
    old_label: &str,
    new_label: &str,
) -> Page {
    let mut page = Page::new();
    page.text_centered(PAGE_WIDTH / 2.0, PAGE_HEIGHT - 60.0, 18.0, Font::Bold, title);

    let widths = [280.0, 160.0, 160.0, 120.0];
    let table_width: f64 = widths.iter().sum();
    let left = (PAGE_WIDTH - table_width) / 2.0;
    let row_height = 28.0;
    let mut y = PAGE_HEIGHT - 120.0;

    let header = [
        noun.to_string(),
        format!("{old_label} Sessions"),
        format!("{new_label} Sessions"),
        "% Change".to_string(),
    ];
    draw_row(&mut page, left, y, &widths, row_height, &header, Some(HEADER_FILL), Font::Bold);

    for (i, row) in rows.iter().enumerate() {
        y -= row_height;
        let cells = [
            truncate_label(&row.dimension_value, 40),
            thousands(row.sessions_old),
            thousands(row.sessions_new),
            percent(row.percent_change),
        ];
        let fill = (i % 2 == 1).then_some(STRIPE_FILL);
        draw_row(&mut page, left, y, &widths, row_height, &cells, fill, Font::Regular);
    }
    page
}

#[allow(clippy::too_many_arguments)]
fn draw_row(
    page: &mut Page,
    left: f64,
    y: f64,
    widths: &[f64],
    height: f64,
    cells: &[String],
    fill: Option<Rgb>,
    font: Font,
) {
    page.set_text_color(if fill == Some(HEADER_FILL) { Rgb::WHITE } else { Rgb::BLACK });
    let mut x = left;
    for (width, cell) in widths.iter().zip(cells) {
        if let Some(fill) = fill {
            page.fill_rect(x, y, *width, height, fill);
        }
        page.stroke_rect(x, y, *width, height, 0.5, Rgb::BLACK);
        page.text_centered(x + width / 2.0, y + 9.0, 11.0, font, cell);
        x += width;
    }
    page.set_text_color(Rgb::BLACK);
}
