//! Pro-rata scaling so two periods of different length become comparable.

use tracing::warn;

use crate::loader::Dataset;
use crate::period::PeriodMeta;

/// Factor that scales the older period onto the newer period's length.
///
/// Always positive. An older period of zero days cannot be scaled, so the
/// factor falls back to `1.0` (data left unscaled) and a warning is logged.
pub fn pro_rata_factor(older: &PeriodMeta, newer: &PeriodMeta) -> f64 {
    if older.day_count == 0 || newer.day_count == 0 {
        warn!(
            older_days = older.day_count,
            newer_days = newer.day_count,
            "Zero-length period; leaving sessions unscaled"
        );
        return 1.0;
    }
    f64::from(newer.day_count) / f64::from(older.day_count)
}

/// Applies `factor` to the older dataset. The newer dataset is never touched.
pub fn normalize_older(older: &mut Dataset, factor: f64) {
    older.scale_sessions(factor);
}

/// Substitutes an explicit day count when the header carried no dates.
pub fn with_day_override(meta: PeriodMeta, override_days: Option<u32>) -> PeriodMeta {
    match override_days {
        Some(days) if !meta.derived && days > 0 => PeriodMeta {
            day_count: days,
            ..meta
        },
        _ => meta,
    }
}
