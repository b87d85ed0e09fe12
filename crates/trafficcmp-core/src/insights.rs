//! Natural-language findings derived from merged comparison rows.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::compare::{percent_change, ComparisonRow, DimensionAnalysis};
use crate::dimension::Dimension;

/// Overall change below this percentage confirms a significant drop.
pub const DROP_THRESHOLD_PCT: f64 = -30.0;

pub const ORGANIC_SEARCH: &str = "Organic Search";
pub const DIRECT: &str = "Direct";
pub const PAID_REFERRAL_CHANNELS: [&str; 6] = [
    "Paid Search",
    "Referral",
    "Paid Social",
    "Organic Social",
    "Email",
    "Display",
];

pub const NO_INSIGHTS: &str = "No insights could be generated. Ensure your files contain \
columns like 'Session primary channel group', 'Page path and screen class', 'Date', or \
'Device category'.";

/// Builds the ordered insight list: channel, page, date, device.
///
/// Dimensions that were skipped or showed no drop contribute nothing. When
/// nothing at all was produced a single fallback insight names the expected
/// columns.
pub fn generate_insights(results: &BTreeMap<Dimension, Option<DimensionAnalysis>>) -> Vec<String> {
    let analysis = |dim: Dimension| results.get(&dim).and_then(Option::as_ref);
    let mut insights = Vec::new();

    if let Some(channel) = analysis(Dimension::Channel) {
        insights.push(overall_insight(channel));
    }
    if let Some(page) = analysis(Dimension::Page).and_then(DimensionAnalysis::worst) {
        insights.push(format!(
            "The traffic loss seems most concentrated on pages like '{}'.",
            page.dimension_value
        ));
    }
    if let Some(date) = analysis(Dimension::Date) {
        let anchor = date
            .worst()
            .and_then(|week| date.week_anchors.get(&week.dimension_value));
        if let Some(anchor) = anchor {
            insights.push(format!(
                "The most significant weekly drop occurred around {}.",
                anchor.format("%B %Y")
            ));
        }
    }
    if let Some(device) = analysis(Dimension::Device).and_then(DimensionAnalysis::worst) {
        insights.push(format!(
            "On a device level, '{}' traffic saw the most significant decrease.",
            device.dimension_value
        ));
    }

    if insights.is_empty() {
        insights.push(NO_INSIGHTS.to_string());
    }
    insights
}

/// Total change across all channels, naming the channel with the largest
/// loss when one exists.
pub fn overall_insight(channel: &DimensionAnalysis) -> String {
    let mut insight = format!(
        "Overall traffic changed by {:.2}%. ",
        channel.totals.percent_change
    );
    if let Some(worst) = channel.worst() {
        insight.push_str(&format!(
            "The largest driver is the '{}' channel, which dropped by {:.2}%.",
            worst.dimension_value,
            worst.percent_change.abs()
        ));
    }
    insight
}

/// Threshold commentary over the channel comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropVerdict {
    pub total_percent_change: f64,
    pub drop_over_threshold: bool,
    /// False for an empty channel set.
    pub all_channels_dropped: bool,
    pub organic_search_change: f64,
    pub direct_change: f64,
    pub paid_referral_change: f64,
}

impl DropVerdict {
    pub fn from_channels(channel: &DimensionAnalysis) -> Self {
        let rows = &channel.rows;
        let total_percent_change = channel.totals.percent_change;
        Self {
            total_percent_change,
            drop_over_threshold: total_percent_change < DROP_THRESHOLD_PCT,
            all_channels_dropped: !rows.is_empty() && rows.iter().all(|r| r.percent_change < 0.0),
            organic_search_change: single_channel_change(rows, ORGANIC_SEARCH),
            direct_change: single_channel_change(rows, DIRECT),
            paid_referral_change: group_change(rows, &PAID_REFERRAL_CHANNELS),
        }
    }

    /// Console conclusions, one sentence per line.
    pub fn conclusions(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(4);
        lines.push(if self.drop_over_threshold {
            "The total traffic drop from last year is confirmed to be over 30%.".to_string()
        } else {
            "The total traffic drop is not over 30%.".to_string()
        });
        lines.push(if self.all_channels_dropped {
            "All channels experienced a traffic drop.".to_string()
        } else {
            "Not all channels experienced a traffic drop.".to_string()
        });

        let organic = self.organic_search_change < 0.0;
        let direct = self.direct_change < 0.0;
        let paid = self.paid_referral_change < 0.0;
        if organic && direct && paid {
            lines.push(
                "The drop is across Organic Search, Direct, and Paid/Referral channels."
                    .to_string(),
            );
        } else {
            if organic {
                lines.push("There is a drop in Organic Search traffic.".to_string());
            }
            if direct {
                lines.push("There is a drop in Direct traffic.".to_string());
            }
            if paid {
                lines.push("There is a drop in Paid/Referral traffic.".to_string());
            }
        }
        lines
    }
}

fn single_channel_change(rows: &[ComparisonRow], name: &str) -> f64 {
    rows.iter()
        .find(|r| r.dimension_value == name)
        .map(|r| r.percent_change)
        .unwrap_or(0.0)
}

fn group_change(rows: &[ComparisonRow], names: &[&str]) -> f64 {
    let (old, new) = rows
        .iter()
        .filter(|r| names.contains(&r.dimension_value.as_str()))
        .fold((0.0, 0.0), |(old, new), r| {
            (old + r.sessions_old, new + r.sessions_new)
        });
    percent_change(old, new)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::compare::{merge, totals, Aggregate};

    fn analysis(dimension: Dimension, old: &[(&str, f64)], new: &[(&str, f64)]) -> DimensionAnalysis {
        let to_agg = |pairs: &[(&str, f64)]| -> Aggregate {
            pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
        };
        let rows = merge(&to_agg(old), &to_agg(new));
        DimensionAnalysis {
            dimension,
            totals: totals(&rows),
            rows,
            shares: Vec::new(),
            week_anchors: BTreeMap::new(),
        }
    }

    #[test]
    fn overall_insight_names_largest_drop() {
        let channel = analysis(
            Dimension::Channel,
            &[("Organic Search", 200.0), ("Direct", 100.0)],
            &[("Organic Search", 100.0), ("Direct", 110.0)],
        );
        assert_eq!(
            overall_insight(&channel),
            "Overall traffic changed by -30.00%. The largest driver is the 'Organic Search' \
             channel, which dropped by 50.00%."
        );
    }

    #[test]
    fn overall_insight_without_drop_has_only_total() {
        let channel = analysis(Dimension::Channel, &[("Direct", 100.0)], &[("Direct", 150.0)]);
        assert_eq!(overall_insight(&channel), "Overall traffic changed by 50.00%. ");
    }

    #[test]
    fn secondary_dimensions_are_omitted_without_drops() {
        let mut results = BTreeMap::new();
        results.insert(
            Dimension::Page,
            Some(analysis(Dimension::Page, &[("/a", 1.0)], &[("/a", 5.0)])),
        );
        results.insert(Dimension::Device, None);
        assert_eq!(generate_insights(&results), vec![NO_INSIGHTS.to_string()]);
    }

    #[test]
    fn insights_are_ordered_by_dimension() {
        let mut date = analysis(Dimension::Date, &[("W07", 50.0)], &[("W07", 20.0)]);
        date.week_anchors
            .insert("W07".to_string(), NaiveDate::from_ymd_opt(2025, 2, 10).expect("date"));

        let mut results = BTreeMap::new();
        results.insert(
            Dimension::Device,
            Some(analysis(
                Dimension::Device,
                &[("mobile", 10.0), ("desktop", 10.0)],
                &[("mobile", 4.0), ("desktop", 9.0)],
            )),
        );
        results.insert(Dimension::Date, Some(date));
        results.insert(
            Dimension::Page,
            Some(analysis(Dimension::Page, &[("/pricing", 9.0)], &[("/pricing", 3.0)])),
        );
        results.insert(Dimension::Channel, None);

        assert_eq!(
            generate_insights(&results),
            vec![
                "The traffic loss seems most concentrated on pages like '/pricing'.".to_string(),
                "The most significant weekly drop occurred around February 2025.".to_string(),
                "On a device level, 'mobile' traffic saw the most significant decrease."
                    .to_string(),
            ]
        );
    }

    #[test]
    fn verdict_flags_broad_drop() {
        let channel = analysis(
            Dimension::Channel,
            &[("Organic Search", 100.0), ("Direct", 100.0), ("Email", 50.0), ("Referral", 50.0)],
            &[("Organic Search", 50.0), ("Direct", 60.0), ("Email", 20.0), ("Referral", 30.0)],
        );
        let verdict = DropVerdict::from_channels(&channel);
        assert!(verdict.drop_over_threshold);
        assert!(verdict.all_channels_dropped);
        assert_eq!(verdict.paid_referral_change, -50.0);
        assert_eq!(
            verdict.conclusions().last().map(String::as_str),
            Some("The drop is across Organic Search, Direct, and Paid/Referral channels.")
        );
    }

    #[test]
    fn verdict_lists_individual_drops() {
        let channel = analysis(
            Dimension::Channel,
            &[("Organic Search", 100.0), ("Direct", 100.0)],
            &[("Organic Search", 90.0), ("Direct", 120.0)],
        );
        let verdict = DropVerdict::from_channels(&channel);
        assert!(!verdict.drop_over_threshold);
        assert!(!verdict.all_channels_dropped);
        assert_eq!(
            verdict.conclusions(),
            vec![
                "The total traffic drop is not over 30%.".to_string(),
                "Not all channels experienced a traffic drop.".to_string(),
                "There is a drop in Organic Search traffic.".to_string(),
            ]
        );
    }
}
