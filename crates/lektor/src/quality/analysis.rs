//! Histogram of error ratios over a batch of documents.

use crate::quality::round3;
use crate::types::EstimationRecord;
use crate::{LektorError, Result};

pub const DEFAULT_BINS: usize = 5;
pub const DEFAULT_BIN_WIDTH: f64 = 15.0;

/// Mean ratio and fixed-width buckets of the valid records of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis<'a> {
    pub mean: f64,
    /// Members per bucket, input order preserved.
    pub buckets: Vec<Vec<&'a EstimationRecord>>,
}

impl Analysis<'_> {
    pub fn bucket_sizes(&self) -> Vec<usize> {
        self.buckets.iter().map(Vec::len).collect()
    }

    pub fn record_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }
}

/// Bucket records by `ratio / bin_width`, overflow going to the last bucket.
///
/// Records with the missing-estimation sentinel are ignored. Returns
/// `Ok(None)` when no valid record remains.
///
/// # Errors
///
/// `LektorError::Validation` for zero `bins` or a non-positive `bin_width`.
pub fn analyze(records: &[EstimationRecord], bins: usize, bin_width: f64) -> Result<Option<Analysis<'_>>> {
    if bins == 0 {
        return Err(LektorError::validation("analysis needs at least one bin"));
    }
    if !(bin_width.is_finite() && bin_width > 0.0) {
        return Err(LektorError::validation(format!("invalid bin width {}", bin_width)));
    }

    let valid: Vec<&EstimationRecord> = records.iter().filter(|r| r.is_valid()).collect();
    if valid.is_empty() {
        return Ok(None);
    }

    let sum: f64 = valid.iter().map(|r| r.error_ratio_percent).sum();
    let mean = round3(sum / valid.len() as f64);

    let mut buckets = vec![Vec::new(); bins];
    for record in valid {
        let index = ((record.error_ratio_percent / bin_width) as usize).min(bins - 1);
        buckets[index].push(record);
    }
    Ok(Some(Analysis { mean, buckets }))
}
