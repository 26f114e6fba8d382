//! ALTO postprocessing as a pipeline step.

use super::{Step, StepContext, StepKind, StepOutput, StepParams, parse_params, require_file};
use crate::Result;
use crate::ocr::AltoPostprocessor;
use crate::ocr::postprocess::DEFAULT_PAGE_PREFIX;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

pub const TAG: &str = "postprocess-alto";

fn default_page_prefix() -> String {
    DEFAULT_PAGE_PREFIX.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PostprocessParams {
    /// Prepended to the file stem to form the Page ID.
    #[serde(default = "default_page_prefix")]
    pub page_prefix: String,
}

impl Default for PostprocessParams {
    fn default() -> Self {
        Self {
            page_prefix: default_page_prefix(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PostprocessStep {
    processor: AltoPostprocessor,
}

impl PostprocessStep {
    pub fn new(params: PostprocessParams) -> Self {
        Self {
            processor: AltoPostprocessor::new(params.page_prefix),
        }
    }

    pub fn create(params: &StepParams) -> Result<Arc<dyn Step>> {
        Ok(Arc::new(Self::new(parse_params(TAG, params)?)))
    }
}

#[async_trait]
impl Step for PostprocessStep {
    fn name(&self) -> &str {
        TAG
    }

    fn kind(&self) -> StepKind {
        StepKind::ReadWrite
    }

    async fn execute(&self, ctx: &StepContext) -> Result<StepOutput> {
        require_file(&ctx.input)?;
        let stats = self.processor.process_file(&ctx.input)?;
        Ok(StepOutput::default().with_statistics(stats.to_entries()))
    }
}
