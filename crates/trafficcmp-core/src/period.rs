//! Reporting-period detection from export header lines.

use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::{debug, warn};

/// Length and year of the period an export covers.
///
/// When the export has no usable `Start date:` / `End date:` lines the
/// period falls back to a full year of unknown calendar year, and `derived`
/// is `false`. Callers that display the period should say so.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodMeta {
    pub day_count: u32,
    pub year: Option<i32>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub derived: bool,
}

impl PeriodMeta {
    pub fn fallback(day_count: u32) -> Self {
        Self {
            day_count,
            year: None,
            start: None,
            end: None,
            derived: false,
        }
    }

    pub fn from_range(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        if end < start {
            return None;
        }
        let day_count = u32::try_from((end - start).num_days() + 1).ok()?;
        Some(Self {
            day_count,
            year: Some(start.year()),
            start: Some(start),
            end: Some(end),
            derived: true,
        })
    }

    /// Year label for chart legends and table headers.
    pub fn year_label(&self) -> String {
        self.year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }
}

/// Scans the first `scan_lines` lines of `path` for the period markers.
///
/// Any failure (unreadable file, missing marker, bad date, reversed range)
/// yields [`PeriodMeta::fallback`] with `default_days`.
pub fn read_period_meta(path: &Path, scan_lines: usize, default_days: u32) -> PeriodMeta {
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot read period metadata");
            return PeriodMeta::fallback(default_days);
        }
    };
    let lines = BufReader::new(file)
        .split(b'\n')
        .take(scan_lines)
        .map_while(|line| line.ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
    let meta = scan_period_lines(lines, default_days);
    debug!(path = %path.display(), ?meta, "Period metadata");
    meta
}

pub fn scan_period_lines<I, S>(lines: I, default_days: u32) -> PeriodMeta
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut start_raw = None;
    let mut end_raw = None;
    for line in lines {
        let line = line.as_ref();
        if line.contains("Start date:") {
            start_raw = marker_value(line);
        }
        if line.contains("End date:") {
            end_raw = marker_value(line);
        }
    }

    let (Some(start_raw), Some(end_raw)) = (start_raw, end_raw) else {
        return PeriodMeta::fallback(default_days);
    };
    let parsed = NaiveDate::parse_from_str(&start_raw, "%Y%m%d")
        .and_then(|start| NaiveDate::parse_from_str(&end_raw, "%Y%m%d").map(|end| (start, end)));
    match parsed {
        Ok((start, end)) => PeriodMeta::from_range(start, end).unwrap_or_else(|| {
            warn!(%start, %end, "End date precedes start date; using fallback period");
            PeriodMeta::fallback(default_days)
        }),
        Err(_) => PeriodMeta::fallback(default_days),
    }
}

fn marker_value(line: &str) -> Option<String> {
    line.rsplit(':')
        .next()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
