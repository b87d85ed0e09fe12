//! Console rendering of a comparison.

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use trafficcmp_core::{AnalysisReport, Dimension, DimensionAnalysis};

use crate::format::{percent, series_labels, whole};

/// One row per dimension value, sorted by older-period sessions, plus a `TOTAL` row.
pub fn comparison_table(analysis: &DimensionAnalysis, old_label: &str, new_label: &str) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        analysis.dimension.label().to_string(),
        format!("{old_label} Sessions"),
        format!("{new_label} Sessions"),
        "% Change".to_string(),
    ]);

    for row in analysis.top_by_old(analysis.rows.len()) {
        table.add_row(vec![
            Cell::new(&row.dimension_value),
            number_cell(whole(row.sessions_old)),
            number_cell(whole(row.sessions_new)),
            number_cell(percent(row.percent_change)),
        ]);
    }

    let totals = &analysis.totals;
    table.add_row(vec![
        Cell::new("TOTAL"),
        number_cell(whole(totals.sessions_old)),
        number_cell(whole(totals.sessions_new)),
        number_cell(percent(totals.percent_change)),
    ]);
    table
}

fn number_cell(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Full text report: period summary, the table for `dimension`, drop
/// conclusions (channel only) and the insight list.
pub fn render_console_report(report: &AnalysisReport, dimension: Dimension) -> String {
    let (old_label, new_label) = series_labels(report);
    let mut out = String::new();

    out.push_str(&format!(
        "Older period: {} days | Newer period: {} days | Pro-rata factor: {:.4}\n\n",
        report.old_period.day_count, report.new_period.day_count, report.pro_rata_factor
    ));

    match report.dimension(dimension) {
        Some(analysis) => {
            out.push_str(&format!("{} comparison\n", dimension.label()));
            out.push_str(&comparison_table(analysis, &old_label, &new_label).to_string());
            out.push_str(&format!(
                "\n\nTotal change: {}\n",
                percent(analysis.totals.percent_change)
            ));
        }
        None => out.push_str(&format!(
            "Column '{}' is not present in both files.\n",
            dimension.column()
        )),
    }

    if dimension == Dimension::Channel {
        if let Some(verdict) = &report.verdict {
            out.push('\n');
            for line in verdict.conclusions() {
                out.push_str(&line);
                out.push('\n');
            }
        }
    }

    out.push_str("\nInsights:\n");
    for insight in &report.insights {
        out.push_str(&format!("- {}\n", insight.trim_end()));
    }
    out
}
