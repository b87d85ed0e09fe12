//! The comparison pipeline: load, clean, normalize, aggregate, merge, derive.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::compare::{analyze_dimension, DimensionAnalysis};
use crate::config::AnalysisOptions;
use crate::dimension::Dimension;
use crate::error::{CoreError, Result};
use crate::insights::{generate_insights, DropVerdict};
use crate::loader::{load_dataset, Dataset};
use crate::normalize::{normalize_older, pro_rata_factor, with_day_override};
use crate::period::{read_period_meta, PeriodMeta};

/// Everything one comparison produces. Built fresh per invocation.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub old_period: PeriodMeta,
    pub new_period: PeriodMeta,
    pub pro_rata_factor: f64,
    /// One entry per requested dimension; `None` means the dimension's column
    /// was missing from at least one file and its analysis was skipped.
    pub dimensions: BTreeMap<Dimension, Option<DimensionAnalysis>>,
    pub insights: Vec<String>,
    /// Present whenever the channel dimension was analysed.
    pub verdict: Option<DropVerdict>,
}

impl AnalysisReport {
    pub fn dimension(&self, dimension: Dimension) -> Option<&DimensionAnalysis> {
        self.dimensions.get(&dimension).and_then(Option::as_ref)
    }

    pub fn analysed(&self) -> impl Iterator<Item = &DimensionAnalysis> {
        self.dimensions.values().flatten()
    }
}

/// Compares an older export (`old_path`) against a newer one (`new_path`).
///
/// Load and period errors abort the whole run. Missing dimension columns only
/// skip that dimension.
#[tracing::instrument(skip_all, fields(old = %old_path.display(), new = %new_path.display()))]
pub fn run_analysis(
    old_path: &Path,
    new_path: &Path,
    options: &AnalysisOptions,
) -> Result<AnalysisReport> {
    let old = load_dataset(old_path, options.header_skip, options.strict)?;
    let new = load_dataset(new_path, options.header_skip, options.strict)?;

    let old_period = with_day_override(
        read_period_meta(old_path, options.metadata_scan_lines, options.default_period_days),
        options.old_days_override,
    );
    let new_period = with_day_override(
        read_period_meta(new_path, options.metadata_scan_lines, options.default_period_days),
        options.new_days_override,
    );

    analyze_datasets(old, new, old_period, new_period, options)
}

/// Pipeline tail for datasets that are already loaded.
pub fn analyze_datasets(
    mut old: Dataset,
    new: Dataset,
    old_period: PeriodMeta,
    new_period: PeriodMeta,
    options: &AnalysisOptions,
) -> Result<AnalysisReport> {
    if !old_period.derived || !new_period.derived {
        warn!(
            old_days = old_period.day_count,
            new_days = new_period.day_count,
            "Period dates missing from at least one file; using assumed day counts"
        );
    }

    let factor = pro_rata_factor(&old_period, &new_period);
    normalize_older(&mut old, factor);

    let mut dimensions = BTreeMap::new();
    for &dimension in &options.dimensions {
        let analysis = analyze_dimension(&old, &new, dimension);
        if analysis.is_none() {
            info!(%dimension, column = dimension.column(), "Dimension skipped: column not in both files");
        }
        dimensions.insert(dimension, analysis);
    }

    let missing: Vec<&str> = options
        .required
        .iter()
        .filter(|d| dimensions.get(*d).map_or(true, Option::is_none))
        .map(Dimension::column)
        .collect();
    if !missing.is_empty() {
        return Err(CoreError::MalformedData(format!(
            "required columns are not present in both files: {}",
            missing.join(", ")
        )));
    }

    let insights = generate_insights(&dimensions);
    let verdict = dimensions
        .get(&Dimension::Channel)
        .and_then(Option::as_ref)
        .map(DropVerdict::from_channels);

    info!(
        factor,
        analysed = dimensions.values().flatten().count(),
        insights = insights.len(),
        "Analysis complete"
    );

    Ok(AnalysisReport {
        old_period,
        new_period,
        pro_rata_factor: factor,
        dimensions,
        insights,
        verdict,
    })
}
