//! Per-dimension aggregation and the outer merge of two periods.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::dimension::{parse_export_date, week_key, Dimension};
use crate::loader::Dataset;

/// Summed sessions per dimension value. Keys are kept sorted so merges and
/// reports are deterministic.
pub type Aggregate = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub dimension_value: String,
    pub sessions_old: f64,
    pub sessions_new: f64,
    pub change: f64,
    /// Zero whenever `sessions_old` is zero, even if `change` is not.
    pub percent_change: f64,
}

impl ComparisonRow {
    pub fn new(dimension_value: impl Into<String>, sessions_old: f64, sessions_new: f64) -> Self {
        Self {
            dimension_value: dimension_value.into(),
            sessions_old,
            sessions_new,
            change: sessions_new - sessions_old,
            percent_change: percent_change(sessions_old, sessions_new),
        }
    }
}

pub fn percent_change(old: f64, new: f64) -> f64 {
    if old > 0.0 {
        (new - old) / old * 100.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Totals {
    pub sessions_old: f64,
    pub sessions_new: f64,
    pub change: f64,
    pub percent_change: f64,
}

/// Share of each period's total traffic held by one dimension value, 0–100.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareRow {
    pub dimension_value: String,
    pub share_old: f64,
    pub share_new: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DimensionAnalysis {
    pub dimension: Dimension,
    pub rows: Vec<ComparisonRow>,
    pub totals: Totals,
    /// Populated for [`Dimension::Device`] only.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shares: Vec<ShareRow>,
    /// First observed date of each week bucket; populated for
    /// [`Dimension::Date`] only.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub week_anchors: BTreeMap<String, NaiveDate>,
}

impl DimensionAnalysis {
    pub fn top_by_old(&self, n: usize) -> Vec<ComparisonRow> {
        top_by_old(&self.rows, n)
    }

    pub fn largest_drops(&self, n: usize) -> Vec<ComparisonRow> {
        largest_drops(&self.rows, n)
    }

    pub fn worst(&self) -> Option<&ComparisonRow> {
        worst_row(&self.rows)
    }
}

/// Group-sums one dataset by `dimension`. `None` when the column is absent.
pub fn aggregate(dataset: &Dataset, dimension: Dimension) -> Option<Aggregate> {
    let values = dataset.column_values(dimension.column())?;
    let mut agg = Aggregate::new();
    for (raw, sessions) in values {
        if let Some(key) = dimension.extract(raw) {
            *agg.entry(key).or_insert(0.0) += sessions;
        }
    }
    Some(agg)
}

/// Outer join of two aggregates; a key missing on one side counts as zero.
pub fn merge(old: &Aggregate, new: &Aggregate) -> Vec<ComparisonRow> {
    let mut keys: Vec<&String> = old.keys().chain(new.keys()).collect();
    keys.sort();
    keys.dedup();
    keys.into_iter()
        .map(|key| {
            ComparisonRow::new(
                key.clone(),
                old.get(key).copied().unwrap_or(0.0),
                new.get(key).copied().unwrap_or(0.0),
            )
        })
        .collect()
}

/// The `n` rows with the most old-period sessions, largest first.
pub fn top_by_old(rows: &[ComparisonRow], n: usize) -> Vec<ComparisonRow> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| b.sessions_old.total_cmp(&a.sessions_old));
    sorted.truncate(n);
    sorted
}

/// Up to `n` rows that lost traffic, most negative change first.
pub fn largest_drops(rows: &[ComparisonRow], n: usize) -> Vec<ComparisonRow> {
    let mut drops: Vec<ComparisonRow> = rows.iter().filter(|r| r.change < 0.0).cloned().collect();
    drops.sort_by(|a, b| a.change.total_cmp(&b.change));
    drops.truncate(n);
    drops
}

/// Row with the most negative change, if any row dropped at all.
pub fn worst_row(rows: &[ComparisonRow]) -> Option<&ComparisonRow> {
    rows.iter()
        .filter(|r| r.change < 0.0)
        .min_by(|a, b| a.change.total_cmp(&b.change))
}

pub fn totals(rows: &[ComparisonRow]) -> Totals {
    let sessions_old: f64 = rows.iter().map(|r| r.sessions_old).sum();
    let sessions_new: f64 = rows.iter().map(|r| r.sessions_new).sum();
    Totals {
        sessions_old,
        sessions_new,
        change: sessions_new - sessions_old,
        percent_change: percent_change(sessions_old, sessions_new),
    }
}

pub fn shares(rows: &[ComparisonRow]) -> Vec<ShareRow> {
    let Totals {
        sessions_old,
        sessions_new,
        ..
    } = totals(rows);
    let share = |value: f64, total: f64| if total > 0.0 { value / total * 100.0 } else { 0.0 };
    rows.iter()
        .map(|r| ShareRow {
            dimension_value: r.dimension_value.clone(),
            share_old: share(r.sessions_old, sessions_old),
            share_new: share(r.sessions_new, sessions_new),
        })
        .collect()
}

/// Earliest date observed in each week bucket of `primary`; weeks only
/// `secondary` has take their earliest date from there.
pub fn week_anchors(primary: &Dataset, secondary: &Dataset) -> BTreeMap<String, NaiveDate> {
    let mut anchors = earliest_dates(primary);
    for (key, date) in earliest_dates(secondary) {
        anchors.entry(key).or_insert(date);
    }
    anchors
}

fn earliest_dates(dataset: &Dataset) -> BTreeMap<String, NaiveDate> {
    let mut earliest: BTreeMap<String, NaiveDate> = BTreeMap::new();
    let Some(values) = dataset.column_values(Dimension::Date.column()) else {
        return earliest;
    };
    for date in values.filter_map(|(raw, _)| parse_export_date(raw)) {
        earliest
            .entry(week_key(&date))
            .and_modify(|seen| *seen = (*seen).min(date))
            .or_insert(date);
    }
    earliest
}

/// Aggregates and merges one dimension. `None` when either dataset lacks the
/// dimension's column.
pub fn analyze_dimension(
    old: &Dataset,
    new: &Dataset,
    dimension: Dimension,
) -> Option<DimensionAnalysis> {
    let old_agg = aggregate(old, dimension)?;
    let new_agg = aggregate(new, dimension)?;
    let rows = merge(&old_agg, &new_agg);
    let totals = totals(&rows);

    let shares = match dimension {
        Dimension::Device => shares(&rows),
        _ => Vec::new(),
    };
    let week_anchors = match dimension {
        Dimension::Date => week_anchors(new, old),
        _ => BTreeMap::new(),
    };

    Some(DimensionAnalysis {
        dimension,
        rows,
        totals,
        shares,
        week_anchors,
    })
}
