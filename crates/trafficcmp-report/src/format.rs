//! Number and label formatting shared by every renderer.

use trafficcmp_core::{AnalysisReport, PeriodMeta};

/// Rounds to a whole number and groups digits with commas: `12345.6` -> `12,346`.
pub fn thousands(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Truncates toward zero, the way session counts are shown in tables and bar labels.
pub fn whole(value: f64) -> String {
    (value.trunc() as i64).to_string()
}

pub fn percent(value: f64) -> String {
    format!("{value:.2}%")
}

/// Legend labels for the older and newer series.
pub fn series_labels(report: &AnalysisReport) -> (String, String) {
    (
        format!("{} (Pro-rated)", period_name(&report.old_period, "Year 1")),
        period_name(&report.new_period, "Year 2"),
    )
}

fn period_name(period: &PeriodMeta, fallback: &str) -> String {
    period
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| fallback.to_string())
}

/// Shortens long dimension values for axis ticks.
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let mut short: String = label.chars().take(max_chars.saturating_sub(3)).collect();
    short.push_str("...");
    short
}
