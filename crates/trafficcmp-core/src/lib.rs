//! Two-period comparison of website-traffic analytics exports.

pub mod compare;
pub mod config;
pub mod dimension;
pub mod engine;
pub mod error;
pub mod insights;
pub mod loader;
pub mod normalize;
pub mod period;

pub use compare::{ComparisonRow, DimensionAnalysis, ShareRow, Totals};
pub use dimension::Dimension;
pub use engine::{analyze_datasets, run_analysis, AnalysisReport};
pub use error::CoreError;
pub use period::PeriodMeta;
