//! PAGE 2013/2019 line extraction.
//!
//! PAGE engines may emit `Word` elements out of visual order, so words are
//! re-sorted by the mean of their polygon vertices. Lines need line-level
//! `TextEquiv/Unicode` text to be considered at all; a line that only carries
//! word-level text is treated as malformed input.

use crate::ocr::geometry::{parse_points, reading_coordinate};
use crate::types::TextLine;
use crate::{LektorError, Result};
use roxmltree::{Document, Node};

/// Directional and formatting marks removed from word tokens.
pub const CLEAR_MARKS: [char; 5] = [
    '\u{200f}', // RIGHT-TO-LEFT MARK
    '\u{200e}', // LEFT-TO-RIGHT MARK
    '\u{feff}', // ZERO WIDTH NO-BREAK SPACE (BOM)
    '\u{200c}', // ZERO WIDTH NON-JOINER
    '\u{202c}', // POP DIRECTIONAL FORMATTING
];

fn child<'a, 'input>(node: Node<'a, 'input>, namespace: &str, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name((namespace, name)))
}

/// Text of `TextEquiv/Unicode` directly below `node`.
fn direct_unicode<'a>(node: Node<'a, '_>, namespace: &str) -> Option<&'a str> {
    child(node, namespace, "TextEquiv")
        .and_then(|equiv| child(equiv, namespace, "Unicode"))
        .and_then(|unicode| unicode.text())
}

/// Text of the first nested `Unicode` element.
fn nested_unicode<'a>(node: Node<'a, '_>, namespace: &str) -> Option<&'a str> {
    node.descendants()
        .find(|n| n.has_tag_name((namespace, "Unicode")))
        .and_then(|unicode| unicode.text())
}

fn has_word_text(line: Node, namespace: &str) -> bool {
    line.children()
        .filter(|n| n.has_tag_name((namespace, "Word")))
        .filter_map(|word| direct_unicode(word, namespace))
        .any(|text| !text.trim().is_empty())
}

fn strip_marks(token: &str) -> String {
    token.chars().filter(|c| !CLEAR_MARKS.contains(c)).collect()
}

fn sort_key(coordinate: f64) -> i64 {
    coordinate.trunc() as i64
}

fn page_line(line: Node, namespace: &str, reorder: bool, vertical: bool) -> Result<TextLine> {
    let id = line
        .attribute("id")
        .ok_or_else(|| LektorError::parsing("PAGE TextLine without id attribute"))?;

    let words: Vec<Node> = line
        .children()
        .filter(|n| n.has_tag_name((namespace, "Word")))
        .collect();

    let mut keyed = Vec::with_capacity(words.len().max(1));
    if words.is_empty() {
        match reading_coordinate(line, namespace, vertical)? {
            Some(coordinate) => keyed.push((sort_key(coordinate), line)),
            None => {
                tracing::warn!("skip '{}': invalid coords!", id);
                return Ok(TextLine::invalid(id));
            }
        }
    } else {
        for word in words {
            let coordinate = reading_coordinate(word, namespace, vertical)?.ok_or_else(|| {
                let word_id = word.attribute("id").unwrap_or("n.a.");
                LektorError::parsing(format!("Invalid Coords of Word '{}' in '{}'!", word_id, id))
            })?;
            keyed.push((sort_key(coordinate), word));
        }
    }

    // stable: equal keys keep document order
    keyed.sort_by_key(|(key, _)| *key);

    let texts = keyed
        .iter()
        .filter_map(|(_, node)| nested_unicode(*node, namespace))
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(strip_marks)
        .collect();

    let points = child(line, namespace, "Coords")
        .and_then(|coords| coords.attribute("points"))
        .ok_or_else(|| LektorError::parsing(format!("TextLine '{}' misses Coords/@points", id)))?;
    let shape = parse_points(points)?;

    Ok(TextLine::new(id, texts, shape)
        .with_reorder(reorder)
        .with_vertical(vertical))
}

/// Extract PAGE lines with line-level text of at least `min_len` characters.
///
/// Returned lines may include invalid ones (no resolvable coordinates); the
/// caller filters them.
///
/// # Errors
///
/// Fails with `LektorError::Parsing` when a line has word-level text but no
/// line-level text, or when a word has no resolvable coordinates. `source`
/// names the document in the message.
pub fn page_lines(
    doc: &Document,
    namespace: &str,
    min_len: usize,
    reorder: bool,
    vertical: bool,
    source: &str,
) -> Result<Vec<TextLine>> {
    let mut matching = Vec::new();
    for line in doc.descendants().filter(|n| n.has_tag_name((namespace, "TextLine"))) {
        match direct_unicode(line, namespace) {
            Some(text) if !text.is_empty() => {
                let stripped = text.trim().chars().count();
                if stripped > 0 && stripped >= min_len {
                    matching.push(line);
                }
            }
            _ => {
                if has_word_text(line, namespace) {
                    return Err(LektorError::parsing(format!(
                        "{}: just words for line '{}'",
                        source,
                        line.attribute("id").unwrap_or("n.a.")
                    )));
                }
            }
        }
    }

    matching
        .into_iter()
        .map(|line| page_line(line, namespace, reorder, vertical))
        .collect()
}
