//! In-place character sequence replacement on raw OCR files.

use super::{Step, StepContext, StepKind, StepOutput, StepParams, parse_params, require_file};
use crate::{LektorError, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const TAG: &str = "replace-chars";
pub const REGEX_TAG: &str = "replace-chars-regex";

fn default_true() -> bool {
    true
}

/// Counts per replacement key, in first-seen order.
#[derive(Debug, Default)]
struct Replacements(IndexMap<String, usize>);

impl Replacements {
    fn hit(&mut self, key: String) {
        *self.0.entry(key).or_insert(0) += 1;
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_statistics(self) -> Vec<String> {
        self.0.into_iter().map(|(key, n)| format!("{}:{}", key, n)).collect()
    }
}

/// `<dir>/<stem>_before_<tag>.xml`
pub fn backup_path(path: &Path, tag: &str) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    path.with_file_name(format!("{}_before_{}.xml", stem, tag))
}

fn rewrite<F>(path: &Path, backup: Option<&str>, mut replace_line: F) -> Result<Vec<String>>
where
    F: FnMut(&str, &mut Replacements) -> String,
{
    let content = std::fs::read_to_string(path)?;
    let mut replacements = Replacements::default();
    let rewritten: String = content
        .split_inclusive('\n')
        .map(|line| replace_line(line, &mut replacements))
        .collect();

    if replacements.is_empty() {
        return Ok(Vec::new());
    }
    if let Some(tag) = backup {
        let target = backup_path(path, tag);
        std::fs::copy(path, &target)?;
        tracing::debug!("backup '{}'", target.display());
    }
    std::fs::write(path, rewritten)?;
    Ok(replacements.into_statistics())
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReplaceCharsParams {
    /// Sequence to replacement, applied in this order.
    pub dict_chars: IndexMap<String, String>,
    #[serde(default = "default_true")]
    pub must_backup: bool,
}

/// Plain sequence replacement. Statistics count lines containing a key.
#[derive(Debug, Clone)]
pub struct ReplaceCharsStep {
    params: ReplaceCharsParams,
}

impl ReplaceCharsStep {
    pub fn new(params: ReplaceCharsParams) -> Self {
        Self { params }
    }

    pub fn create(params: &StepParams) -> Result<Arc<dyn Step>> {
        Ok(Arc::new(Self::new(parse_params(TAG, params)?)))
    }

    fn replace_line(&self, line: &str, replacements: &mut Replacements) -> String {
        let mut line = line.to_string();
        for (from, to) in &self.params.dict_chars {
            if !from.is_empty() && line.contains(from.as_str()) {
                line = line.replace(from.as_str(), to);
                replacements.hit(from.clone());
            }
        }
        line
    }
}

#[async_trait]
impl Step for ReplaceCharsStep {
    fn name(&self) -> &str {
        TAG
    }

    fn kind(&self) -> StepKind {
        StepKind::ReadWrite
    }

    async fn execute(&self, ctx: &StepContext) -> Result<StepOutput> {
        require_file(&ctx.input)?;
        let backup = self.params.must_backup.then_some(TAG);
        let statistics = rewrite(&ctx.input, backup, |line, r| self.replace_line(line, r))?;
        Ok(StepOutput::default().with_statistics(statistics))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegexReplaceParams {
    /// Expression with one capture group.
    pub pattern: String,
    pub old: String,
    pub new: String,
}

/// Replacement inside regex captures, e.g. a misread `3` for a long s.
///
/// Only the first match per line is considered. Never writes a backup.
#[derive(Debug, Clone)]
pub struct RegexReplaceStep {
    regex: Regex,
    old: String,
    new: String,
}

impl RegexReplaceStep {
    pub fn new(params: RegexReplaceParams) -> Result<Self> {
        let regex = Regex::new(&params.pattern).map_err(|e| {
            LektorError::validation_with_source(format!("Invalid pattern '{}' for {}", params.pattern, REGEX_TAG), e)
        })?;
        if regex.captures_len() < 2 {
            return Err(LektorError::validation(format!(
                "Pattern '{}' for {} needs a capture group",
                params.pattern, REGEX_TAG
            )));
        }
        Ok(Self {
            regex,
            old: params.old,
            new: params.new,
        })
    }

    pub fn create(params: &StepParams) -> Result<Arc<dyn Step>> {
        Ok(Arc::new(Self::new(parse_params(REGEX_TAG, params)?)?))
    }

    fn replace_line(&self, line: &str, replacements: &mut Replacements) -> String {
        let Some(matched) = self.regex.captures(line).and_then(|c| c.get(1)) else {
            return line.to_string();
        };
        let matched = matched.as_str();
        let replacement = matched.replace(self.old.as_str(), &self.new);
        replacements.hit(format!("{}=>{}", matched, replacement));
        line.replace(matched, &replacement)
    }
}

#[async_trait]
impl Step for RegexReplaceStep {
    fn name(&self) -> &str {
        REGEX_TAG
    }

    fn kind(&self) -> StepKind {
        StepKind::ReadWrite
    }

    async fn execute(&self, ctx: &StepContext) -> Result<StepOutput> {
        require_file(&ctx.input)?;
        let statistics = rewrite(&ctx.input, None, |line, r| self.replace_line(line, r))?;
        Ok(StepOutput::default().with_statistics(statistics))
    }
}
