//! Turns raw OCR line strings into a dense word stream for spell checking.
//!
//! The stages run in this order:
//!
//! 1. trim, drop empty lines
//! 2. one de-hyphenation pass over adjacent lines
//! 3. configured replacements, noise removal, long-s folding, short token removal
//! 4. density filter (more than [`DENSE_LINE_MIN_CHARS`] characters)

use crate::types::NormalizationResult;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Lines with at most this many characters after cleaning are sparse.
pub const DENSE_LINE_MIN_CHARS: usize = 2;

/// Characters removed from every line before scoring.
pub const DEFAULT_NOISE_CHARS: &str = "0123456789\"“”„?!*:-=[]().;|";

const LONG_S: char = 'ſ';

fn default_noise_chars() -> String {
    DEFAULT_NOISE_CHARS.to_string()
}

/// Normalization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationConfig {
    /// Every character of this string is deleted from lines.
    #[serde(default = "default_noise_chars")]
    pub noise_chars: String,
    /// Ordered sequence replacements, applied before noise removal.
    #[serde(default)]
    pub replacements: IndexMap<String, String>,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            noise_chars: default_noise_chars(),
            replacements: IndexMap::new(),
        }
    }
}

impl NormalizationConfig {
    pub fn with_replacements<K, V>(mut self, replacements: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.replacements = replacements.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    fn is_noise(&self, c: char) -> bool {
        self.noise_chars.contains(c)
    }
}

/// Merge line-wrap hyphenation in a single pass with lookahead of one.
///
/// Returns the merge count. A line that lends its first token keeps the rest.
fn dehyphenate(lines: &mut [String]) -> usize {
    let mut merges = 0;
    for i in 1..lines.len() {
        if !lines[i - 1].ends_with('-') {
            continue;
        }
        let (head, rest) = {
            let mut tokens = lines[i].split_whitespace();
            let Some(head) = tokens.next() else {
                continue;
            };
            (head.to_string(), tokens.collect::<Vec<_>>().join(" "))
        };
        let current = &mut lines[i - 1];
        current.pop();
        current.push_str(&head);
        lines[i] = rest;
        merges += 1;
    }
    merges
}

fn clean_line(line: &str, config: &NormalizationConfig) -> String {
    let mut line = line.trim().to_string();
    for (from, to) in &config.replacements {
        if !from.is_empty() {
            line = line.replace(from.as_str(), to);
        }
    }
    let line: String = line.chars().filter(|c| !config.is_noise(*c)).collect();
    let line = line.replace("..", "");
    line.split_whitespace()
        .map(|token| token.replace(LONG_S, "s"))
        .filter(|token| token.chars().count() > 1)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize raw line strings, one entry per OCR line.
pub fn normalize_lines<S: AsRef<str>>(lines: &[S], config: &NormalizationConfig) -> NormalizationResult {
    let mut candidates: Vec<String> = lines
        .iter()
        .map(|l| l.as_ref().trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    let dehyphenated_count = dehyphenate(&mut candidates);

    let (dense, sparse): (Vec<String>, Vec<String>) = candidates
        .iter()
        .map(|line| clean_line(line, config))
        .partition(|line| line.chars().count() > DENSE_LINE_MIN_CHARS);

    NormalizationResult {
        joined_text: dense.join(" "),
        total_lines: lines.len(),
        dehyphenated_count,
        dropped_short_count: sparse.len(),
        kept_line_count: dense.len(),
    }
}
