//! Batch report (`.wtr`) rendering.
//!
//! ```text
//! mean,b1,b2,b3,b4,b5,total,invalid
//! label,ratio,words,errors,lines_in,dehyphenated,dropped_short,lines_out
//! ...
//! <blank line>
//! ```

use crate::Result;
use crate::quality::analysis::{DEFAULT_BIN_WIDTH, DEFAULT_BINS, analyze};
use crate::types::EstimationRecord;
use chrono::NaiveDateTime;
use std::path::Path;

pub const REPORT_EXTENSION: &str = "wtr";

/// `<dir_name>_<YYYY-MM-DD_HH-MM>.wtr`
pub fn report_file_name(dir_name: &str, finished: &NaiveDateTime) -> String {
    format!("{}_{}.{}", dir_name, finished.format("%Y-%m-%d_%H-%M"), REPORT_EXTENSION)
}

/// Mean ratio with at least one decimal place, `5.0` rather than `5`.
fn format_mean(mean: f64) -> String {
    if mean.is_finite() && mean.fract() == 0.0 {
        format!("{:.1}", mean)
    } else {
        mean.to_string()
    }
}

/// Render the report, or `None` when no record carries a valid ratio.
pub fn render_report(records: &[EstimationRecord]) -> Result<Option<String>> {
    let mut sorted: Vec<EstimationRecord> = records.iter().filter(|r| r.is_valid()).cloned().collect();
    sorted.sort_by(|a, b| a.error_ratio_percent.total_cmp(&b.error_ratio_percent));

    let Some(analysis) = analyze(&sorted, DEFAULT_BINS, DEFAULT_BIN_WIDTH)? else {
        return Ok(None);
    };
    let invalid = records.len() - sorted.len();

    let mean = format_mean(analysis.mean);
    let sizes: Vec<String> = analysis.bucket_sizes().iter().map(usize::to_string).collect();
    let mut out = format!("{},{},{},{}\n", mean, sizes.join(","), records.len(), invalid);
    for r in &sorted {
        out.push_str(&format!(
            "{},{:.3},{},{},{},{},{},{}\n",
            r.document_label,
            r.error_ratio_percent,
            r.word_count,
            r.error_count,
            r.line_count_in,
            r.dehyphenated_count,
            r.dropped_short_count,
            r.line_count_out
        ));
    }
    out.push('\n');

    tracing::info!(
        "WTR (Mean): '{}' (1: {}/{}, ... {}: {}/{})",
        mean,
        analysis.buckets[0].len(),
        sorted.len(),
        DEFAULT_BINS,
        analysis.buckets[DEFAULT_BINS - 1].len(),
        sorted.len()
    );
    Ok(Some(out))
}

/// Write the report to `path`. Returns `false` if there was nothing to write.
pub fn write_report(path: impl AsRef<Path>, records: &[EstimationRecord]) -> Result<bool> {
    match render_report(records)? {
        Some(content) => {
            std::fs::write(path.as_ref(), content)?;
            Ok(true)
        }
        None => Ok(false),
    }
}
