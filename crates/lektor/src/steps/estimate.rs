//! Quality estimation of the current ALTO file.

use super::{Step, StepContext, StepKind, StepOutput, StepParams, parse_params, require_file};
use crate::Result;
use crate::quality::{EstimatorConfig, LanguageToolClient, QualityEstimator, SpellChecker};
use crate::types::EstimationRecord;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

pub const TAG: &str = "estimate-ocr";
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8010/v2/check";

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EstimateParams {
    #[serde(default = "default_service_url")]
    pub service_url: String,
    #[serde(flatten)]
    pub estimator: EstimatorConfig,
}

/// Statistics entries in record order: ratio, words, errors, then line counts.
pub fn record_statistics(record: &EstimationRecord) -> Vec<String> {
    vec![
        record.error_ratio_percent.to_string(),
        record.word_count.to_string(),
        record.error_count.to_string(),
        record.line_count_in.to_string(),
        record.dehyphenated_count.to_string(),
        record.dropped_short_count.to_string(),
        record.line_count_out.to_string(),
    ]
}

/// Read-only step scoring the current file.
///
/// A service failure only costs this document its estimation, the step then
/// reports [`EstimationRecord::missing`].
pub struct EstimateStep<C = LanguageToolClient> {
    estimator: QualityEstimator<C>,
}

impl EstimateStep<LanguageToolClient> {
    pub fn create(params: &StepParams) -> Result<Arc<dyn Step>> {
        let params: EstimateParams = parse_params(TAG, params)?;
        let client = LanguageToolClient::new(&params.service_url)?;
        Ok(Arc::new(Self::new(QualityEstimator::new(client, params.estimator))))
    }
}

impl<C: SpellChecker> EstimateStep<C> {
    pub fn new(estimator: QualityEstimator<C>) -> Self {
        Self { estimator }
    }

    pub fn estimator(&self) -> &QualityEstimator<C> {
        &self.estimator
    }
}

#[async_trait]
impl<C: SpellChecker + 'static> Step for EstimateStep<C> {
    fn name(&self) -> &str {
        TAG
    }

    fn kind(&self) -> StepKind {
        StepKind::ReadOnly
    }

    async fn execute(&self, ctx: &StepContext) -> Result<StepOutput> {
        require_file(&ctx.input)?;
        let record = match self.estimator.execute_labelled(&ctx.input, ctx.label.as_str()).await {
            Ok(record) => record,
            Err(e) if e.is_estimation_failure() => {
                tracing::warn!("[{}] estimation failed: {}", ctx.label, e);
                EstimationRecord::missing(ctx.label.as_str())
            }
            Err(e) => return Err(e),
        };
        Ok(StepOutput {
            path_next: None,
            statistics: record_statistics(&record),
            estimation: Some(record),
        })
    }
}
