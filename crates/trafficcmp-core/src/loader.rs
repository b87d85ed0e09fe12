//! CSV loading and cleaning for analytics exports.
//!
//! Exports start with a block of `#`-prefixed metadata lines, then a header
//! row, then data rows, optionally followed by summary rows such as
//! `Grand total`. Only rows whose `Sessions` cell is a finite non-negative
//! number survive.

use std::path::Path;

use tracing::debug;

use crate::dimension::{Dimension, SESSIONS_COLUMN};
use crate::error::{CoreError, Result};

/// How many leading non-data lines to drop before the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderSkip {
    /// Skip leading blank and `#` comment lines; comment lines later in the
    /// file are ignored as well.
    #[default]
    Sniff,
    /// Skip exactly this many leading lines.
    Lines(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub cells: Vec<String>,
    pub sessions: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<SessionRecord>,
    /// Rows discarded during numeric coercion (footer and summary rows).
    pub dropped_rows: usize,
}

impl Dataset {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_dimension(&self, dimension: Dimension) -> bool {
        self.column_index(dimension.column()).is_some()
    }

    pub fn total_sessions(&self) -> f64 {
        self.rows.iter().map(|r| r.sessions).sum()
    }

    /// Multiplies every sessions value in place.
    pub fn scale_sessions(&mut self, factor: f64) {
        for row in &mut self.rows {
            row.sessions *= factor;
        }
    }

    /// Yields `(cell, sessions)` for the given column.
    pub fn column_values<'a>(
        &'a self,
        name: &str,
    ) -> Option<impl Iterator<Item = (&'a str, f64)> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| {
            (
                row.cells.get(idx).map(String::as_str).unwrap_or(""),
                row.sessions,
            )
        }))
    }
}

/// Reads and cleans one export file.
///
/// With `strict` set, a file in which no row survives coercion is rejected
/// instead of being treated as an empty period.
pub fn load_dataset(path: &Path, skip: HeaderSkip, strict: bool) -> Result<Dataset> {
    if !path.exists() {
        return Err(CoreError::MissingFile(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    let dataset = parse_dataset(&text, skip)?;

    debug!(
        path = %path.display(),
        rows = dataset.rows.len(),
        dropped = dataset.dropped_rows,
        "Loaded dataset"
    );

    if strict && dataset.rows.is_empty() {
        return Err(CoreError::MalformedData(format!(
            "no numeric '{SESSIONS_COLUMN}' rows in {}",
            path.display()
        )));
    }
    Ok(dataset)
}

pub fn parse_dataset(text: &str, skip: HeaderSkip) -> Result<Dataset> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let body = skip_header_lines(text, skip);

    let mut builder = csv::ReaderBuilder::new();
    builder.flexible(true).trim(csv::Trim::All);
    if skip == HeaderSkip::Sniff {
        builder.comment(Some(b'#'));
    }
    let mut reader = builder.from_reader(body.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let sessions_idx = headers
        .iter()
        .position(|h| h == SESSIONS_COLUMN)
        .ok_or_else(|| {
            CoreError::MalformedData(format!("missing '{SESSIONS_COLUMN}' column"))
        })?;

    let mut rows = Vec::new();
    let mut dropped_rows = 0;
    for record in reader.records() {
        let record = record?;
        let sessions = record.get(sessions_idx).and_then(parse_sessions);
        let summary = record.get(0).is_some_and(is_summary_label);
        match sessions {
            Some(sessions) if !summary => rows.push(SessionRecord {
                cells: record.iter().map(str::to_string).collect(),
                sessions,
            }),
            _ => dropped_rows += 1,
        }
    }

    Ok(Dataset {
        headers,
        rows,
        dropped_rows,
    })
}

/// Coerces a raw sessions cell. Anything that is not a finite, non-negative
/// number is rejected.
pub fn parse_sessions(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

fn is_summary_label(cell: &str) -> bool {
    cell.trim().eq_ignore_ascii_case("grand total")
}

fn skip_header_lines(text: &str, skip: HeaderSkip) -> &str {
    let mut rest = text;
    match skip {
        HeaderSkip::Lines(n) => {
            for _ in 0..n {
                match rest.find('\n') {
                    Some(pos) => rest = &rest[pos + 1..],
                    None => return "",
                }
            }
        }
        HeaderSkip::Sniff => loop {
            let (line, tail) = match rest.find('\n') {
                Some(pos) => (&rest[..pos], &rest[pos + 1..]),
                None => (rest, ""),
            };
            let trimmed = line.trim();
            if !(trimmed.is_empty() || trimmed.starts_with('#')) || rest.is_empty() {
                break;
            }
            rest = tail;
        },
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "\
# ----------------------------------------
# Traffic acquisition: Session primary channel group (Default Channel Group)
# ----------------------------------------
#
# Start date: 20240101
# End date: 20241231

Session primary channel group (Default Channel Group),Sessions,Engaged sessions
Organic Search,1200,800
Direct,400,300
Referral,n/a,0
Grand total,1600,1100
";

    #[test]
    fn sniff_skips_metadata_and_drops_footer_rows() {
        let ds = parse_dataset(EXPORT, HeaderSkip::Sniff).expect("parse");
        assert_eq!(ds.headers[1], "Sessions");
        assert_eq!(ds.rows.len(), 2);
        assert_eq!(ds.dropped_rows, 2);
        assert_eq!(ds.total_sessions(), 1600.0);
    }

    #[test]
    fn fixed_skip_drops_exact_line_count() {
        let text = "meta one\nmeta two\nDevice category,Sessions\nmobile,10\ndesktop,5\n";
        let ds = parse_dataset(text, HeaderSkip::Lines(2)).expect("parse");
        assert!(ds.has_dimension(Dimension::Device));
        assert_eq!(ds.rows.len(), 2);
    }

    #[test]
    fn missing_sessions_column_is_malformed() {
        let err = parse_dataset("Date,Users\n20240101,5\n", HeaderSkip::Sniff)
            .expect_err("no sessions column");
        assert!(matches!(err, CoreError::MalformedData(_)));
    }

    #[test]
    fn parse_sessions_rejects_non_counts() {
        assert_eq!(parse_sessions(" 42 "), Some(42.0));
        assert_eq!(parse_sessions("12.5"), Some(12.5));
        assert_eq!(parse_sessions("1,234"), None);
        assert_eq!(parse_sessions("-3"), None);
        assert_eq!(parse_sessions("NaN"), None);
        assert_eq!(parse_sessions(""), None);
    }

    #[test]
    fn scale_sessions_multiplies_every_row() {
        let text = "Device category,Sessions\nmobile,10\ndesktop,30\n";
        let mut ds = parse_dataset(text, HeaderSkip::Sniff).expect("parse");
        ds.scale_sessions(0.5);
        assert_eq!(ds.total_sessions(), 20.0);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = load_dataset(Path::new("/nonexistent/old.csv"), HeaderSkip::Sniff, false)
            .expect_err("missing");
        assert!(matches!(err, CoreError::MissingFile(_)));
    }

    #[test]
    fn strict_mode_rejects_empty_dataset() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "Device category,Sessions\nGrand total,12\n").expect("write");

        let lenient = load_dataset(&path, HeaderSkip::Sniff, false).expect("lenient");
        assert!(lenient.rows.is_empty());

        let err = load_dataset(&path, HeaderSkip::Sniff, true).expect_err("strict");
        assert!(matches!(err, CoreError::MalformedData(_)));
    }
}
