//! File bookkeeping steps: moving results and removing scratch files.

use super::{Step, StepContext, StepKind, StepOutput, StepParams, base_name, parse_params, require_file};
use crate::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const MOVE_TAG: &str = "move-alto";
pub const REMOVE_TAG: &str = "remove-file";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MoveAltoParams {
    /// Destination directory, the origin's directory if unset.
    #[serde(default)]
    pub target_folder: Option<PathBuf>,
}

/// Copies the current file next to the document's origin as `<base>.xml`.
#[derive(Debug, Clone, Default)]
pub struct MoveAltoStep {
    params: MoveAltoParams,
}

impl MoveAltoStep {
    pub fn new(params: MoveAltoParams) -> Self {
        Self { params }
    }

    pub fn create(params: &StepParams) -> Result<Arc<dyn Step>> {
        Ok(Arc::new(Self::new(parse_params(MOVE_TAG, params)?)))
    }

    pub fn target(&self, ctx: &StepContext) -> Result<PathBuf> {
        let folder = match &self.params.target_folder {
            Some(folder) => folder.clone(),
            None => ctx.origin.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        Ok(folder.join(format!("{}.xml", base_name(&ctx.input)?)))
    }
}

#[async_trait]
impl Step for MoveAltoStep {
    fn name(&self) -> &str {
        MOVE_TAG
    }

    fn kind(&self) -> StepKind {
        StepKind::ReadWrite
    }

    async fn execute(&self, ctx: &StepContext) -> Result<StepOutput> {
        require_file(&ctx.input)?;
        let target = self.target(ctx)?;
        if target != ctx.input {
            tokio::fs::copy(&ctx.input, &target).await?;
        }
        Ok(StepOutput::next(target))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoveFileParams {
    pub file_suffix: String,
}

/// Deletes the current file if its name ends with the configured suffix.
#[derive(Debug, Clone)]
pub struct RemoveFileStep {
    params: RemoveFileParams,
}

impl RemoveFileStep {
    pub fn new(params: RemoveFileParams) -> Self {
        Self { params }
    }

    pub fn create(params: &StepParams) -> Result<Arc<dyn Step>> {
        Ok(Arc::new(Self::new(parse_params(REMOVE_TAG, params)?)))
    }
}

#[async_trait]
impl Step for RemoveFileStep {
    fn name(&self) -> &str {
        REMOVE_TAG
    }

    fn kind(&self) -> StepKind {
        StepKind::ReadWrite
    }

    async fn execute(&self, ctx: &StepContext) -> Result<StepOutput> {
        require_file(&ctx.input)?;
        let matches = ctx
            .input
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(&self.params.file_suffix));
        if !matches {
            return Ok(StepOutput::default());
        }
        tokio::fs::remove_file(&ctx.input).await?;
        tracing::debug!("removed '{}'", ctx.input.display());
        Ok(StepOutput::default().with_statistics(vec!["removed".to_string()]))
    }
}
