//! Lexical quality estimation and batch reporting.
//!
//! [`QualityEstimator`] scores one ALTO document against a
//! [`SpellChecker`]; [`analyze`] and [`report`] aggregate many
//! [`EstimationRecord`](crate::types::EstimationRecord)s.
pub mod analysis;
pub mod checker;
pub mod estimator;
pub mod report;

pub use analysis::{Analysis, DEFAULT_BIN_WIDTH, DEFAULT_BINS, analyze};
pub use checker::{CheckRequest, CheckResponse, LanguageToolClient, SpellChecker};
pub use estimator::{EstimatorConfig, QualityEstimator, error_ratio};
pub use report::{render_report, write_report};

/// Round to three decimal places.
pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
