use std::path::PathBuf;

use crate::dimension::Dimension;
use crate::loader::HeaderSkip;

/// Number of leading lines scanned for `Start date:` / `End date:` markers.
pub const DEFAULT_METADATA_SCAN_LINES: usize = 11;

/// Day count assumed for a period whose header dates cannot be parsed.
pub const DEFAULT_PERIOD_DAYS: u32 = 365;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Uploaded CSVs land here under per-request unique names.
    pub upload_dir: PathBuf,
    /// Directory the CLI writes its PDF into when `--output` is not given.
    pub output_dir: PathBuf,
    pub header_skip: HeaderSkip,
    pub metadata_scan_lines: usize,
    pub default_period_days: u32,
    /// Treat a file with zero surviving data rows as malformed.
    pub strict: bool,
    pub max_upload_bytes: usize,
    pub cors_origins: Vec<String>,
}

/// Engine knobs derived from [`Config`] (or built directly by the CLI).
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub header_skip: HeaderSkip,
    pub metadata_scan_lines: usize,
    pub default_period_days: u32,
    pub strict: bool,
    /// Replaces the fallback day count of the older file when its header has no dates.
    pub old_days_override: Option<u32>,
    pub new_days_override: Option<u32>,
    /// Dimensions to analyse, in report order.
    pub dimensions: Vec<Dimension>,
    /// Dimensions whose column must be present in both files; a missing one
    /// fails with `MalformedData` instead of yielding the fallback insight.
    pub required: Vec<Dimension>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            header_skip: HeaderSkip::Sniff,
            metadata_scan_lines: DEFAULT_METADATA_SCAN_LINES,
            default_period_days: DEFAULT_PERIOD_DAYS,
            strict: false,
            old_days_override: None,
            new_days_override: None,
            dimensions: Dimension::ALL.to_vec(),
            required: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: std::env::var("TRAFFICCMP_PORT")
                .unwrap_or_else(|_| "5001".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            upload_dir: std::env::var("TRAFFICCMP_UPLOAD_DIR")
                .unwrap_or_else(|_| "./uploads".to_string())
                .into(),
            output_dir: std::env::var("TRAFFICCMP_OUTPUT_DIR")
                .unwrap_or_else(|_| ".".to_string())
                .into(),
            header_skip: match std::env::var("TRAFFICCMP_SKIP_ROWS") {
                Ok(raw) if !raw.trim().is_empty() => HeaderSkip::Lines(
                    raw.trim()
                        .parse()
                        .map_err(|e| format!("invalid TRAFFICCMP_SKIP_ROWS: {e}"))?,
                ),
                _ => HeaderSkip::Sniff,
            },
            metadata_scan_lines: std::env::var("TRAFFICCMP_METADATA_SCAN_LINES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_METADATA_SCAN_LINES),
            default_period_days: std::env::var("TRAFFICCMP_DEFAULT_PERIOD_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|days: &u32| *days > 0)
                .unwrap_or(DEFAULT_PERIOD_DAYS),
            strict: std::env::var("TRAFFICCMP_STRICT")
                .map(|v| v == "true")
                .unwrap_or(false),
            max_upload_bytes: std::env::var("TRAFFICCMP_MAX_UPLOAD_MB")
                .unwrap_or_else(|_| "32".to_string())
                .parse::<usize>()
                .map_err(|e| format!("invalid TRAFFICCMP_MAX_UPLOAD_MB: {e}"))?
                .saturating_mul(1024 * 1024),
            cors_origins: std::env::var("TRAFFICCMP_CORS_ORIGINS")
                .map(|v| v.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
        })
    }

    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            header_skip: self.header_skip,
            metadata_scan_lines: self.metadata_scan_lines,
            default_period_days: self.default_period_days,
            strict: self.strict,
            ..AnalysisOptions::default()
        }
    }
}
