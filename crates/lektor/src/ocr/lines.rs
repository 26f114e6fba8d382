//! Format dispatch and the XML line reader.

use crate::ocr::alto::alto_lines;
use crate::ocr::namespace::{OcrFormat, detect_format};
use crate::ocr::page::page_lines;
use crate::types::TextLine;
use crate::{LektorError, Result};
use roxmltree::Document;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Line extraction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineOptions {
    /// Minimum character length of a line's text.
    #[serde(default = "default_min_len")]
    pub min_len: usize,
    /// Render PAGE lines right-to-left, see [`TextLine::text_content`].
    #[serde(default)]
    pub reorder: bool,
    /// Order PAGE words top-to-bottom instead of left-to-right.
    #[serde(default)]
    pub vertical: bool,
}

fn default_min_len() -> usize {
    2
}

impl Default for LineOptions {
    fn default() -> Self {
        Self {
            min_len: default_min_len(),
            reorder: false,
            vertical: false,
        }
    }
}

/// Extract all valid text lines from a parsed OCR document.
///
/// `source` labels the document in error messages.
pub fn extract_lines(doc: &Document, source: &str, options: &LineOptions) -> Result<Vec<TextLine>> {
    let format = detect_format(doc)?;
    let lines = match format {
        OcrFormat::AltoV3 | OcrFormat::AltoV4 => alto_lines(doc, format.namespace(), options.min_len)?,
        OcrFormat::Page2013 | OcrFormat::Page2019 => page_lines(
            doc,
            format.namespace(),
            options.min_len,
            options.reorder,
            options.vertical,
            source,
        )?,
    };
    Ok(lines.into_iter().filter(TextLine::is_valid).collect())
}

/// File content as text, non-UTF-8 bytes reported as `LektorError::Parsing`.
pub(crate) fn read_ocr_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::InvalidData {
            LektorError::parsing_with_source(format!("Invalid UTF-8 in {}", path.display()), e)
        } else {
            LektorError::Io(e)
        }
    })
}

/// Read an OCR file and extract its lines.
///
/// # Errors
///
/// - `LektorError::Io` if the file cannot be read
/// - `LektorError::Parsing` for non-UTF-8 content, XML that is not
///   well-formed, or any malformed-input case of [`extract_lines`]
pub fn read_lines(path: impl AsRef<Path>, options: &LineOptions) -> Result<Vec<TextLine>> {
    let path = path.as_ref();
    let content = read_ocr_text(path)?;
    let doc = Document::parse(&content)
        .map_err(|e| LektorError::parsing_with_source(format!("{}: XML not well-formed", path.display()), e))?;
    extract_lines(&doc, &path.display().to_string(), options)
}

/// Read the lines of an ALTO file only.
///
/// # Errors
///
/// Fails with `LektorError::Parsing` for non-UTF-8 content and for any
/// non-ALTO document.
pub fn read_alto_lines(path: impl AsRef<Path>, min_len: usize) -> Result<Vec<TextLine>> {
    let path = path.as_ref();
    let content = read_ocr_text(path)?;
    let doc = Document::parse(&content)
        .map_err(|e| LektorError::parsing_with_source(format!("{}: XML not well-formed", path.display()), e))?;
    let format = detect_format(&doc)?;
    if !format.is_alto() {
        return Err(LektorError::parsing(format!(
            "{}: expected ALTO, found {}",
            path.display(),
            format
        )));
    }
    alto_lines(&doc, format.namespace(), min_len)
}
