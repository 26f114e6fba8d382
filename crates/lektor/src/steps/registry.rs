//! Step registration and lookup by tag.

use super::{Step, StepParams, estimate, files, postprocess, replace, tesseract};
use crate::{LektorError, Result};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::sync::{Arc, RwLock};

/// Builds a step from its configured parameters.
pub type StepConstructor = fn(&StepParams) -> Result<Arc<dyn Step>>;

/// Validate a step tag before registration.
///
/// # Rules
///
/// - Tag cannot be empty
/// - Tag cannot contain whitespace
fn validate_tag(tag: &str) -> Result<()> {
    if tag.is_empty() {
        return Err(LektorError::validation("Step tag cannot be empty"));
    }

    if tag.contains(char::is_whitespace) {
        return Err(LektorError::validation(format!(
            "Step tag '{}' cannot contain whitespace",
            tag
        )));
    }

    Ok(())
}

/// Maps step tags to constructors, in registration order.
///
/// # Example
///
/// ```rust
/// use lektor::steps::StepRegistry;
///
/// let registry = StepRegistry::with_defaults();
/// assert!(registry.contains("tesseract"));
/// assert!(registry.build("no-such-step", &Default::default()).is_err());
/// ```
#[derive(Clone)]
pub struct StepRegistry {
    constructors: IndexMap<String, StepConstructor>,
}

impl StepRegistry {
    /// Registry without any step.
    pub fn new_empty() -> Self {
        Self {
            constructors: IndexMap::new(),
        }
    }

    /// Registry with every built-in step.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new_empty();
        let defaults: [(&str, StepConstructor); 7] = [
            (tesseract::TAG, tesseract::TesseractStep::create),
            (replace::TAG, replace::ReplaceCharsStep::create),
            (replace::REGEX_TAG, replace::RegexReplaceStep::create),
            (postprocess::TAG, postprocess::PostprocessStep::create),
            (estimate::TAG, <estimate::EstimateStep>::create),
            (files::MOVE_TAG, files::MoveAltoStep::create),
            (files::REMOVE_TAG, files::RemoveFileStep::create),
        ];
        for (tag, constructor) in defaults {
            registry.constructors.insert(tag.to_string(), constructor);
        }
        registry
    }

    /// Register a constructor, replacing any previous one for `tag`.
    ///
    /// # Errors
    ///
    /// `LektorError::Validation` if `tag` is empty or contains whitespace.
    pub fn register(&mut self, tag: impl Into<String>, constructor: StepConstructor) -> Result<()> {
        let tag = tag.into();
        validate_tag(&tag)?;
        self.constructors.insert(tag, constructor);
        Ok(())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    pub fn tags(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Create the step registered under `tag`.
    ///
    /// # Errors
    ///
    /// - `LektorError::Validation` for an unknown tag
    /// - whatever the step's constructor rejects in `params`
    pub fn build(&self, tag: &str, params: &StepParams) -> Result<Arc<dyn Step>> {
        let constructor = self.constructors.get(tag).ok_or_else(|| {
            LektorError::validation(format!(
                "Unknown step type '{}', known: {}",
                tag,
                self.tags().join(", ")
            ))
        })?;
        constructor(params)
    }
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepRegistry").field("tags", &self.tags()).finish()
    }
}

/// Process-wide registry, pipelines start from a snapshot of it.
pub static STEP_REGISTRY: Lazy<Arc<RwLock<StepRegistry>>> =
    Lazy::new(|| Arc::new(RwLock::new(StepRegistry::with_defaults())));

/// Snapshot of [`STEP_REGISTRY`].
pub fn global_registry() -> Result<StepRegistry> {
    STEP_REGISTRY
        .read()
        .map(|registry| registry.clone())
        .map_err(|e| LektorError::Other(format!("Step registry lock poisoned: {}", e)))
}
