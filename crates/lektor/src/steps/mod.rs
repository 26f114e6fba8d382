//! Pipeline steps.
//!
//! Every step implements [`Step`] and is created from a string tag and a
//! parameter map through the [`StepRegistry`]. Steps belong to one of three
//! kinds:
//!
//! - [`StepKind::ReadOnly`] - inspects the current file (quality estimation)
//! - [`StepKind::ReadWrite`] - transforms, moves or deletes files
//! - [`StepKind::External`] - runs an external program (tesseract)
//!
//! A document is processed by threading [`StepOutput::path_next`] from one
//! step into the [`StepContext::input`] of the next.
//!
//! # Example
//!
//! ```rust,no_run
//! use lektor::steps::{StepContext, StepParams, StepRegistry};
//!
//! # async fn example() -> lektor::Result<()> {
//! let registry = StepRegistry::with_defaults();
//! let mut params = StepParams::new();
//! params.insert("file_suffix".to_string(), "tif".into());
//! let step = registry.build("remove-file", &params)?;
//!
//! let ctx = StepContext::new("/data/scan/0001.tif");
//! let output = step.execute(&ctx).await?;
//! println!("{}: {:?}", step.name(), output.statistics);
//! # Ok(())
//! # }
//! ```
pub mod command;
pub mod estimate;
pub mod files;
pub mod postprocess;
pub mod registry;
pub mod replace;
pub mod tesseract;

pub use command::CommandLine;
pub use registry::{STEP_REGISTRY, StepConstructor, StepRegistry, global_registry};

use crate::types::EstimationRecord;
use crate::{LektorError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Free-form step parameters, as read from a `[[steps]]` entry.
pub type StepParams = serde_json::Map<String, serde_json::Value>;

/// What a step does with its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    ReadOnly,
    ReadWrite,
    External,
}

/// Input of one step execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepContext {
    /// File the step works on.
    pub input: PathBuf,
    /// The document's original input file.
    pub origin: PathBuf,
    /// Display label, the origin's file name.
    pub label: String,
}

impl StepContext {
    pub fn new(origin: impl Into<PathBuf>) -> Self {
        let origin = origin.into();
        let label = origin
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| origin.display().to_string());
        Self {
            input: origin.clone(),
            origin,
            label,
        }
    }

    /// Same document, next input file.
    pub fn with_input(&self, input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            origin: self.origin.clone(),
            label: self.label.clone(),
        }
    }
}

/// Result of one step execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutput {
    /// Input of the following step, `None` keeps the current one.
    pub path_next: Option<PathBuf>,
    pub statistics: Vec<String>,
    pub estimation: Option<EstimationRecord>,
}

impl StepOutput {
    pub fn next(path: impl Into<PathBuf>) -> Self {
        Self {
            path_next: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn with_statistics(mut self, statistics: Vec<String>) -> Self {
        self.statistics = statistics;
        self
    }
}

/// A single processing step of the OCR pipeline.
#[async_trait]
pub trait Step: Send + Sync {
    /// Registry tag of the step, e.g. `replace-chars`.
    fn name(&self) -> &str;

    fn kind(&self) -> StepKind;

    /// Run the step on `ctx.input`.
    ///
    /// # Errors
    ///
    /// `LektorError::Io` errors are passed on unchanged.
    async fn execute(&self, ctx: &StepContext) -> Result<StepOutput>;
}

/// Deserialize step parameters into a typed struct.
pub fn parse_params<T: DeserializeOwned>(tag: &str, params: &StepParams) -> Result<T> {
    serde_json::from_value(serde_json::Value::Object(params.clone()))
        .map_err(|e| LektorError::validation_with_source(format!("Invalid parameters for step '{}': {}", tag, e), e))
}

/// File name up to its first dot: `0001.tif` gives `0001`.
pub(crate) fn base_name(path: &Path) -> Result<String> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LektorError::validation(format!("No file name in '{}'", path.display())))?;
    Ok(file_name.split('.').next().unwrap_or(file_name).to_string())
}

fn require_file(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(LektorError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("path '{}' invalid", path.display()),
        )))
    }
}
