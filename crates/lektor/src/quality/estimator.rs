//! Per-document lexical quality estimation.

use crate::ocr::read_alto_lines;
use crate::quality::checker::{CheckRequest, SpellChecker};
use crate::quality::round3;
use crate::text::{NormalizationConfig, normalize_lines};
use crate::types::{EstimationRecord, MARK_MISSING_ESTIMATION, TextLine};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_LANGUAGE: &str = "de-DE";
pub const DEFAULT_ENABLED_RULES: &str = "GERMAN_SPELLER_RULE";

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_enabled_rules() -> String {
    DEFAULT_ENABLED_RULES.to_string()
}

fn default_min_len() -> usize {
    2
}

/// Estimation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_enabled_rules")]
    pub enabled_rules: String,
    /// Minimum character length of an ALTO line.
    #[serde(default = "default_min_len")]
    pub min_len: usize,
    #[serde(flatten)]
    pub normalization: NormalizationConfig,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            enabled_rules: default_enabled_rules(),
            min_len: default_min_len(),
            normalization: NormalizationConfig::default(),
        }
    }
}

/// Error rate in percent, `error_count` clamped to `word_count`.
///
/// Lower is better: 0 means no word was flagged, 100 means every word was.
pub fn error_ratio(error_count: usize, word_count: usize) -> f64 {
    if word_count == 0 {
        return MARK_MISSING_ESTIMATION;
    }
    let errors = error_count.min(word_count);
    round3(errors as f64 / word_count as f64 * 100.0)
}

/// Scores OCR output against a [`SpellChecker`].
pub struct QualityEstimator<C> {
    checker: C,
    config: EstimatorConfig,
}

impl<C: SpellChecker> QualityEstimator<C> {
    pub fn new(checker: C, config: EstimatorConfig) -> Self {
        Self { checker, config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn checker(&self) -> &C {
        &self.checker
    }

    pub async fn is_available(&self) -> bool {
        self.checker.is_available().await
    }

    /// Estimate the ALTO file at `path`, labelled by its file name.
    ///
    /// A file without lines yields [`EstimationRecord::missing`] and no
    /// checker call.
    pub async fn execute(&self, path: impl AsRef<Path>) -> Result<EstimationRecord> {
        let path = path.as_ref();
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.execute_labelled(path, label).await
    }

    /// Estimate the ALTO file at `path` under a caller-chosen label.
    pub async fn execute_labelled(&self, path: impl AsRef<Path>, label: impl Into<String>) -> Result<EstimationRecord> {
        let lines = read_alto_lines(path.as_ref(), self.config.min_len)?;
        self.estimate_lines(label, &lines).await
    }

    pub async fn estimate_lines(&self, label: impl Into<String>, lines: &[TextLine]) -> Result<EstimationRecord> {
        let label = label.into();
        if lines.is_empty() {
            tracing::warn!("no lines in '{}', skip estimation", label);
            return Ok(EstimationRecord::missing(label));
        }
        let texts: Vec<String> = lines.iter().map(TextLine::text_content).collect();
        self.estimate_texts(label, &texts).await
    }

    /// Normalize raw line texts and submit them.
    pub async fn estimate_texts<S: AsRef<str>>(
        &self,
        label: impl Into<String>,
        texts: &[S],
    ) -> Result<EstimationRecord> {
        let label = label.into();
        let normalized = normalize_lines(texts, &self.config.normalization);
        let word_count = normalized.word_count();
        let mut record = EstimationRecord {
            document_label: label,
            error_ratio_percent: MARK_MISSING_ESTIMATION,
            word_count,
            error_count: 0,
            line_count_in: normalized.total_lines,
            dehyphenated_count: normalized.dehyphenated_count,
            dropped_short_count: normalized.dropped_short_count,
            line_count_out: normalized.kept_line_count,
        };
        if word_count == 0 {
            tracing::warn!("no words left in '{}' after normalization", record.document_label);
            return Ok(record);
        }

        let request = CheckRequest {
            language: self.config.language.clone(),
            text: normalized.joined_text,
            enabled_rules: self.config.enabled_rules.clone(),
            enabled_only: true,
        };
        let response = self.checker.check(&request).await?;

        let flagged = response.matches.len();
        if flagged > word_count {
            tracing::warn!(
                "'{}': {} matches for {} words, clamped",
                record.document_label,
                flagged,
                word_count
            );
        }
        record.error_count = flagged.min(word_count);
        record.error_ratio_percent = error_ratio(record.error_count, word_count);
        tracing::debug!(
            "'{}': {} errors in {} words ({}%)",
            record.document_label,
            record.error_count,
            word_count,
            record.error_ratio_percent
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LektorError;
    use crate::quality::checker::CheckResponse;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeChecker {
        matches: usize,
        calls: AtomicUsize,
        last_text: Mutex<Option<String>>,
    }

    impl FakeChecker {
        fn new(matches: usize) -> Self {
            Self {
                matches,
                calls: AtomicUsize::new(0),
                last_text: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl SpellChecker for FakeChecker {
        async fn is_available(&self) -> bool {
            true
        }

        async fn check(&self, request: &CheckRequest) -> Result<CheckResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_text.lock().unwrap() = Some(request.text.clone());
            Ok(CheckResponse {
                matches: (0..self.matches).map(|i| json!({ "offset": i })).collect(),
            })
        }
    }

    struct DownChecker;

    #[async_trait]
    impl SpellChecker for DownChecker {
        async fn is_available(&self) -> bool {
            false
        }

        async fn check(&self, _request: &CheckRequest) -> Result<CheckResponse> {
            Err(LektorError::connection("connection refused"))
        }
    }

    fn line(id: &str, words: &[&str]) -> TextLine {
        TextLine::new(id, words.iter().map(|w| w.to_string()).collect(), vec![])
    }

    #[test]
    fn test_error_ratio() {
        assert_eq!(error_ratio(1, 3), 33.333);
        assert_eq!(error_ratio(0, 10), 0.0);
        assert_eq!(error_ratio(10, 10), 100.0);
        assert_eq!(error_ratio(12, 10), 100.0);
        assert_eq!(error_ratio(0, 0), MARK_MISSING_ESTIMATION);
    }

    #[tokio::test]
    async fn test_zero_lines_make_no_call() {
        let estimator = QualityEstimator::new(FakeChecker::new(0), EstimatorConfig::default());
        let record = estimator.estimate_lines("0001.xml", &[]).await.unwrap();
        assert_eq!(record, EstimationRecord::missing("0001.xml"));
        assert_eq!(estimator.checker().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_words_make_no_call() {
        let estimator = QualityEstimator::new(FakeChecker::new(0), EstimatorConfig::default());
        let lines = vec![line("l1", &["a", "1"]), line("l2", &["12"])];
        let record = estimator.estimate_lines("0002.xml", &lines).await.unwrap();
        assert!(!record.is_valid());
        assert_eq!(record.line_count_in, 2);
        assert_eq!(record.dropped_short_count, 2);
        assert_eq!(estimator.checker().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ratio_and_counts() {
        let estimator = QualityEstimator::new(FakeChecker::new(1), EstimatorConfig::default());
        let lines = vec![line("l1", &["Die", "Ver-"]), line("l2", &["waltung", "tagte"])];
        let record = estimator.estimate_lines("0003.xml", &lines).await.unwrap();

        assert_eq!(record.word_count, 3);
        assert_eq!(record.error_count, 1);
        assert_eq!(record.error_ratio_percent, 33.333);
        assert_eq!(record.dehyphenated_count, 1);
        assert_eq!(record.line_count_in, 2);
        assert_eq!(record.line_count_out, 2);
        assert_eq!(
            estimator.checker().last_text.lock().unwrap().as_deref(),
            Some("Die Verwaltung tagte")
        );
    }

    #[tokio::test]
    async fn test_error_count_clamped() {
        let estimator = QualityEstimator::new(FakeChecker::new(7), EstimatorConfig::default());
        let lines = vec![line("l1", &["zwei", "Worte"])];
        let record = estimator.estimate_lines("0004.xml", &lines).await.unwrap();
        assert_eq!(record.word_count, 2);
        assert_eq!(record.error_count, 2);
        assert_eq!(record.error_ratio_percent, 100.0);
    }

    #[tokio::test]
    async fn test_checker_failure_propagates() {
        let estimator = QualityEstimator::new(DownChecker, EstimatorConfig::default());
        assert!(!estimator.is_available().await);
        let lines = vec![line("l1", &["etwas", "Text"])];
        let err = estimator.estimate_lines("0005.xml", &lines).await.unwrap_err();
        assert!(err.is_estimation_failure());
    }

    #[test]
    fn test_config_flattens_normalization() {
        let config: EstimatorConfig = toml::from_str(
            r#"
            language = "en-US"
            noise_chars = "0123456789"
            "#,
        )
        .unwrap();
        assert_eq!(config.language, "en-US");
        assert_eq!(config.enabled_rules, DEFAULT_ENABLED_RULES);
        assert_eq!(config.normalization.noise_chars, "0123456789");
        assert!(config.normalization.replacements.is_empty());
    }
}
