//! ALTO cleanup: source image metadata and bottom-up pruning of empty content.

use crate::ocr::lines::read_ocr_text;
use crate::ocr::namespace::detect_format;
use crate::ocr::xml_tree::{Element, XmlTree};
use crate::{LektorError, Result};
use roxmltree::Document;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_PAGE_PREFIX: &str = "p";

/// What a postprocessing run changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostprocessStats {
    pub removed_strings: usize,
    pub removed_lines: usize,
    pub removed_blocks: usize,
    pub page_id_changed: bool,
}

impl PostprocessStats {
    /// Step statistics entries, e.g. `removed_strings:21`.
    pub fn to_entries(&self) -> Vec<String> {
        vec![
            format!("removed_strings:{}", self.removed_strings),
            format!("removed_lines:{}", self.removed_lines),
            format!("removed_blocks:{}", self.removed_blocks),
        ]
    }
}

/// Enriches and prunes a single-page ALTO document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AltoPostprocessor {
    page_prefix: String,
}

impl Default for AltoPostprocessor {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_PREFIX)
    }
}

impl AltoPostprocessor {
    pub fn new(page_prefix: impl Into<String>) -> Self {
        Self {
            page_prefix: page_prefix.into(),
        }
    }

    pub fn page_prefix(&self) -> &str {
        &self.page_prefix
    }

    /// Rewrite the ALTO file at `path` in place.
    ///
    /// # Errors
    ///
    /// - `LektorError::Io` when reading or writing fails
    /// - `LektorError::Parsing` when the file is not UTF-8, not well-formed or not ALTO
    pub fn process_file(&self, path: impl AsRef<Path>) -> Result<PostprocessStats> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| LektorError::validation(format!("No file name in {}", path.display())))?;

        let content = read_ocr_text(path)?;
        let doc = Document::parse(&content)?;
        let format = detect_format(&doc)?;
        if !format.is_alto() {
            return Err(LektorError::parsing(format!(
                "{}: postprocessing needs ALTO, found {}",
                path.display(),
                format
            )));
        }
        let mut tree = XmlTree::from_document(&doc);
        let stats = self.process_tree(&mut tree, file_name);
        std::fs::write(path, tree.to_xml_string()?)?;

        tracing::debug!(
            "postprocessed {}: -{} String, -{} TextLine, -{} Block",
            file_name,
            stats.removed_strings,
            stats.removed_lines,
            stats.removed_blocks
        );
        Ok(stats)
    }

    /// Apply metadata and pruning to a parsed tree.
    ///
    /// `file_name` is the ALTO file's base name, e.g. `00000001.xml`.
    pub fn process_tree(&self, tree: &mut XmlTree, file_name: &str) -> PostprocessStats {
        let file_identifier = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name);

        let mut stats = PostprocessStats::default();
        let root = tree.root_mut();
        set_source_image(root, file_name, file_identifier);

        let page_id = format!("{}{}", self.page_prefix, file_identifier);
        if let Some(page) = root.find_mut("Page")
            && page.attribute("ID") != Some(page_id.as_str())
        {
            page.set_attribute("ID", page_id);
            stats.page_id_changed = true;
        }

        prune(root, &mut stats);
        stats
    }
}

fn set_source_image(root: &mut Element, file_name: &str, file_identifier: &str) {
    let description = root.ensure_child("Description", 0);
    let after_unit = description.position("MeasurementUnit").map_or(0, |i| i + 1);
    let info = description.ensure_child("sourceImageInformation", after_unit);
    info.ensure_child("fileName", 0).set_text(file_name);
    let after_name = info.position("fileName").map_or(0, |i| i + 1);
    info.ensure_child("fileIdentifier", after_name).set_text(file_identifier);
}

fn is_empty_string(element: &Element) -> bool {
    element.local_name() == "String" && element.attribute("CONTENT").is_none_or(|c| c.trim().is_empty())
}

/// Returns whether anything below `element` was removed.
fn prune(element: &mut Element, stats: &mut PostprocessStats) -> bool {
    let mut changed = false;
    element.retain_children(|child| {
        let changed_below = prune(child, stats);
        let remove = if is_empty_string(child) {
            stats.removed_strings += 1;
            true
        } else if changed_below && child.local_name() == "TextLine" && child.child("String").is_none() {
            stats.removed_lines += 1;
            true
        } else if changed_below && child.local_name().ends_with("Block") && child.children().is_empty() {
            stats.removed_blocks += 1;
            true
        } else {
            false
        };
        changed |= changed_below || remove;
        !remove
    });
    changed
}
