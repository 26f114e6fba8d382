use serde::{Deserialize, Serialize};

/// Missing-estimation marker used instead of a ratio.
pub const MARK_MISSING_ESTIMATION: f64 = -1.0;

/// Integer vertex of a line polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// One line of recognized text on a page.
///
/// `words` are stored in reading order. Lines are immutable once built; an
/// invalid line carries no words and no shape and is filtered out before it
/// reaches callers of [`crate::ocr::extract_lines`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    id: String,
    valid: bool,
    words: Vec<String>,
    shape: Vec<Point>,
    reorder: bool,
    vertical: bool,
}

impl TextLine {
    pub fn new(id: impl Into<String>, words: Vec<String>, shape: Vec<Point>) -> Self {
        Self {
            id: id.into(),
            valid: true,
            words,
            shape,
            reorder: false,
            vertical: false,
        }
    }

    /// A line that must be excluded from downstream use.
    pub fn invalid(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            valid: false,
            words: Vec::new(),
            shape: Vec::new(),
            reorder: false,
            vertical: false,
        }
    }

    pub fn with_reorder(mut self, reorder: bool) -> Self {
        self.reorder = reorder;
        self
    }

    pub fn with_vertical(mut self, vertical: bool) -> Self {
        self.vertical = vertical;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn shape(&self) -> &[Point] {
        &self.shape
    }

    pub fn reorder(&self) -> bool {
        self.reorder
    }

    pub fn vertical(&self) -> bool {
        self.vertical
    }

    /// Space-joined line text.
    ///
    /// With `reorder` set each word is prepended to the text built so far, so
    /// the words come out in reverse of stored order. Right-to-left lines whose
    /// tokens were captured left-to-right are rendered this way.
    pub fn text_content(&self) -> String {
        if !self.reorder {
            return self.words.join(" ");
        }
        self.words.iter().fold(String::new(), |acc, word| {
            if acc.is_empty() {
                word.clone()
            } else {
                format!("{} {}", word, acc)
            }
        })
    }
}

impl std::fmt::Display for TextLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TextLine[{}]:{}", self.id, self.text_content())
    }
}

/// Outcome of [`crate::text::normalize_lines`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NormalizationResult {
    /// Dense, cleaned lines joined by single spaces.
    pub joined_text: String,
    /// Number of raw lines handed in, empty ones included.
    pub total_lines: usize,
    /// Lines merged with their successor across a wrap hyphen.
    pub dehyphenated_count: usize,
    /// Lines discarded as too short after cleaning.
    pub dropped_short_count: usize,
    pub kept_line_count: usize,
}

impl NormalizationResult {
    /// Number of whitespace-delimited tokens in `joined_text`.
    pub fn word_count(&self) -> usize {
        self.joined_text.split_whitespace().count()
    }
}

/// One document's quality measurement.
///
/// `error_ratio_percent` is the share of flagged words in percent, rounded to
/// three decimals, or [`MARK_MISSING_ESTIMATION`] if nothing was computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationRecord {
    pub document_label: String,
    pub error_ratio_percent: f64,
    pub word_count: usize,
    pub error_count: usize,
    pub line_count_in: usize,
    pub dehyphenated_count: usize,
    pub dropped_short_count: usize,
    pub line_count_out: usize,
}

impl EstimationRecord {
    /// Record for a document that could not be scored.
    pub fn missing(label: impl Into<String>) -> Self {
        Self {
            document_label: label.into(),
            error_ratio_percent: MARK_MISSING_ESTIMATION,
            word_count: 0,
            error_count: 0,
            line_count_in: 0,
            dehyphenated_count: 0,
            dropped_short_count: 0,
            line_count_out: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.error_ratio_percent > MARK_MISSING_ESTIMATION
    }
}
