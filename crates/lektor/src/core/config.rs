//! Pipeline configuration.
//!
//! Loaded from TOML, YAML or JSON, chosen by file extension:
//!
//! ```toml
//! [pipeline]
//! executors = 4
//! file_ext = ["tif", "jpg"]
//!
//! [[steps]]
//! type = "tesseract"
//! model_configs = "frk"
//! output_configs = ["alto"]
//!
//! [[steps]]
//! type = "estimate-ocr"
//! ```

use crate::steps::{StepParams, tesseract};
use crate::{LektorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name searched by [`PipelineConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "lektor.toml";

pub const DEFAULT_MARK_DONE: &str = "ocr_done";
pub const DEFAULT_MARK_FAIL: &str = "ocr_fail";

fn default_executors() -> usize {
    num_cpus::get()
}

fn default_file_ext() -> Vec<String> {
    ["tif", "jpg", "png", "jpeg"].iter().map(|e| e.to_string()).collect()
}

fn default_mark_done() -> String {
    DEFAULT_MARK_DONE.to_string()
}

fn default_mark_fail() -> String {
    DEFAULT_MARK_FAIL.to_string()
}

/// `[pipeline]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSection {
    /// Documents processed concurrently.
    #[serde(default = "default_executors")]
    pub executors: usize,
    /// Accepted input file name suffixes.
    #[serde(default = "default_file_ext")]
    pub file_ext: Vec<String>,
    #[serde(default)]
    pub workdir: Option<PathBuf>,
    /// Marker file expected in the data directory before a run.
    #[serde(default)]
    pub mark_prev: Option<String>,
    #[serde(default = "default_mark_done")]
    pub mark_done: String,
    #[serde(default = "default_mark_fail")]
    pub mark_fail: String,
    #[serde(default)]
    pub recursive: bool,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            executors: default_executors(),
            file_ext: default_file_ext(),
            workdir: None,
            mark_prev: None,
            mark_done: default_mark_done(),
            mark_fail: default_mark_fail(),
            recursive: false,
        }
    }
}

/// One `[[steps]]` entry: a registry tag plus free parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    #[serde(rename = "type")]
    pub tag: String,
    #[serde(flatten)]
    pub params: StepParams,
}

impl StepConfig {
    pub fn new(tag: impl Into<String>, params: StepParams) -> Self {
        Self { tag: tag.into(), params }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub pipeline: PipelineSection,
    /// Steps in execution order.
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

impl PipelineConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `LektorError::Validation` if the file can't be read or is invalid TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        toml::from_str(&content)
            .map_err(|e| LektorError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| LektorError::validation(format!("Invalid YAML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        serde_json::from_str(&content)
            .map_err(|e| LektorError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration, the format chosen by extension.
    ///
    /// `.toml`, `.yaml`/`.yml` and `.json` are supported.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "toml" => Self::from_toml_file(path),
            "yaml" | "yml" => Self::from_yaml_file(path),
            "json" => Self::from_json_file(path),
            _ => Err(LektorError::validation(format!(
                "Unsupported config format '{}', use .toml, .yaml or .json",
                path.display()
            ))),
        }
    }

    /// Discover `lektor.toml` in the current directory and its parents.
    ///
    /// # Returns
    ///
    /// - `Some(config)` if found
    /// - `None` if no config file found
    pub fn discover() -> Result<Option<Self>> {
        let current = std::env::current_dir().map_err(LektorError::Io)?;
        Self::discover_from(current)
    }

    /// Like [`PipelineConfig::discover`], starting at `start`.
    pub fn discover_from(start: impl AsRef<Path>) -> Result<Option<Self>> {
        for dir in start.as_ref().ancestors() {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                tracing::debug!("using config '{}'", candidate.display());
                return Ok(Some(Self::from_toml_file(candidate)?));
            }
        }
        Ok(None)
    }

    /// Check values the step registry doesn't cover.
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.executors == 0 {
            return Err(LektorError::validation("executors must be at least 1"));
        }
        if self.pipeline.file_ext.iter().all(|e| e.trim().is_empty()) {
            return Err(LektorError::validation("file_ext needs at least one extension"));
        }
        if self.steps.is_empty() {
            return Err(LektorError::validation("No steps configured"));
        }
        Ok(())
    }

    /// First configured tesseract step.
    pub fn tesseract_step_mut(&mut self) -> Option<&mut StepConfig> {
        self.steps.iter_mut().find(|s| s.tag == tesseract::TAG)
    }

    pub fn apply(&mut self, overrides: &PipelineOverrides) {
        overrides.apply_to(self);
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| LektorError::validation(format!("Failed to read config file {}: {}", path.display(), e)))
}

/// Command line values merged over a loaded [`PipelineConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineOverrides {
    pub workdir: Option<PathBuf>,
    pub executors: Option<usize>,
    pub model_configs: Option<String>,
    /// Raw tesseract arguments, empty and quote-only values are ignored.
    pub extra: Vec<String>,
    pub tesseract_bin: Option<String>,
    pub recursive: Option<bool>,
}

impl PipelineOverrides {
    fn extra_args(&self) -> Option<String> {
        let args: Vec<&str> = self
            .extra
            .iter()
            .map(|e| e.trim())
            .filter(|e| !e.trim_matches(['\'', '"']).trim().is_empty())
            .collect();
        (!args.is_empty()).then(|| args.join(" "))
    }

    pub fn apply_to(&self, config: &mut PipelineConfig) {
        if let Some(workdir) = &self.workdir {
            config.pipeline.workdir = Some(workdir.clone());
        }
        if let Some(executors) = self.executors {
            config.pipeline.executors = executors;
        }
        if let Some(recursive) = self.recursive {
            config.pipeline.recursive = recursive;
        }

        let extra = self.extra_args();
        let Some(step) = config.tesseract_step_mut() else {
            if self.model_configs.is_some() || extra.is_some() || self.tesseract_bin.is_some() {
                tracing::warn!("tesseract overrides given, but no tesseract step configured");
            }
            return;
        };
        if let Some(models) = &self.model_configs {
            step.params.insert("model_configs".to_string(), models.clone().into());
        }
        if let Some(extra) = extra {
            step.params.insert("extra".to_string(), extra.into());
        }
        if let Some(bin) = &self.tesseract_bin {
            step.params.insert("tesseract_bin".to_string(), bin.clone().into());
        }
    }
}
