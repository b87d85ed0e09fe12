//! Supported grouping dimensions and their typed extractors.

use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Exact header of the measure column in analytics exports.
pub const SESSIONS_COLUMN: &str = "Sessions";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Channel,
    Page,
    Date,
    Device,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Channel,
        Dimension::Page,
        Dimension::Date,
        Dimension::Device,
    ];

    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim() {
            "channel" => Ok(Self::Channel),
            "page" => Ok(Self::Page),
            "date" | "time" => Ok(Self::Date),
            "device" => Ok(Self::Device),
            _ => Err(anyhow!(
                "dimension must be one of: channel, page, date, device"
            )),
        }
    }

    /// Column header this dimension is read from.
    pub fn column(&self) -> &'static str {
        match self {
            Dimension::Channel => "Session primary channel group (Default Channel Group)",
            Dimension::Page => "Page path and screen class",
            Dimension::Date => "Date",
            Dimension::Device => "Device category",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Dimension::Channel => "channel",
            Dimension::Page => "page",
            Dimension::Date => "date",
            Dimension::Device => "device",
        }
    }

    /// Human label used in table headers.
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Channel => "Channel",
            Dimension::Page => "Page",
            Dimension::Date => "Week",
            Dimension::Device => "Device",
        }
    }

    /// Maps a raw cell to its grouping key. `None` means the row does not
    /// contribute to this dimension (blank cell, unparsable date).
    pub fn extract(&self, raw: &str) -> Option<String> {
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }
        match self {
            Dimension::Date => parse_export_date(value).map(|d| week_key(&d)),
            _ => Some(value.to_string()),
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// Exports write dates as `YYYYMMDD`; hand-edited files often use ISO dates.
pub fn parse_export_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

/// Seven-day bucket counted from 1 January (`W01`..`W53`), without the year,
/// so two periods from different years line up and no day crosses into a
/// neighbouring year's week.
pub fn week_key(date: &NaiveDate) -> String {
    format!("W{:02}", date.ordinal0() / 7 + 1)
}

/// Parses a key produced by [`week_key`] back into its week number.
pub fn week_number(key: &str) -> Option<u32> {
    key.strip_prefix('W')?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_known_slugs() {
        assert_eq!(Dimension::parse("channel").expect("channel"), Dimension::Channel);
        assert_eq!(Dimension::parse(" device ").expect("device"), Dimension::Device);
        assert_eq!(Dimension::parse("time").expect("time"), Dimension::Date);
        assert!(Dimension::parse("country").is_err());
    }

    #[test]
    fn extract_skips_blank_cells() {
        assert_eq!(Dimension::Channel.extract("   "), None);
        assert_eq!(
            Dimension::Channel.extract(" Organic Search "),
            Some("Organic Search".to_string())
        );
    }

    #[test]
    fn date_extractor_buckets_by_calendar_week() {
        // 2024-01-01 and 2025-01-01 both open week 1.
        assert_eq!(Dimension::Date.extract("20240101"), Some("W01".to_string()));
        assert_eq!(Dimension::Date.extract("2025-01-01"), Some("W01".to_string()));
        assert_eq!(Dimension::Date.extract("20240215"), Some("W07".to_string()));
        assert_eq!(Dimension::Date.extract("not a date"), None);
    }

    #[test]
    fn year_edges_stay_in_their_own_year() {
        assert_eq!(Dimension::Date.extract("20210101"), Some("W01".to_string()));
        assert_eq!(Dimension::Date.extract("20211231"), Some("W53".to_string()));
        assert_eq!(Dimension::Date.extract("20241230"), Some("W53".to_string()));
        assert_eq!(Dimension::Date.extract("20241224"), Some("W52".to_string()));
    }

    #[test]
    fn week_number_round_trips_key() {
        assert_eq!(week_number("W07"), Some(7));
        assert_eq!(week_number("7"), None);
    }
}
