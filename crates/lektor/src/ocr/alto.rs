//! ALTO v3/v4 line extraction.
//!
//! ALTO stores `String` tokens in reading order already, so no geometric
//! re-sorting takes place. Each `TextLine` carries its box as
//! `HPOS`/`VPOS`/`WIDTH`/`HEIGHT`, which is turned into a four-point shape.

use crate::types::{Point, TextLine};
use crate::{LektorError, Result};
use roxmltree::{Document, Node};

fn word_contents(line: &Node, namespace: &str) -> Vec<String> {
    line.children()
        .filter(|n| n.has_tag_name((namespace, "String")))
        .filter_map(|s| s.attribute("CONTENT"))
        .map(str::to_string)
        .collect()
}

fn dimension(line: &Node, id: &str, attribute: &str) -> Result<i32> {
    let raw = line
        .attribute(attribute)
        .ok_or_else(|| LektorError::parsing(format!("TextLine '{}' misses attribute {}", id, attribute)))?;
    raw.trim()
        .parse::<f64>()
        .map(|v| v.round() as i32)
        .map_err(|_| LektorError::parsing(format!("TextLine '{}' has invalid {}='{}'", id, attribute, raw)))
}

/// Corners top-left, top-right, bottom-right, bottom-left.
fn rectangle(line: &Node, id: &str) -> Result<Vec<Point>> {
    let extend = |start: i32, attribute: &str| -> Result<i32> {
        start
            .checked_add(dimension(line, id, attribute)?)
            .ok_or_else(|| LektorError::parsing(format!("TextLine '{}' box overflows at {}", id, attribute)))
    };
    let x1 = dimension(line, id, "HPOS")?;
    let y1 = dimension(line, id, "VPOS")?;
    let x2 = extend(x1, "WIDTH")?;
    let y2 = extend(y1, "HEIGHT")?;
    Ok(vec![Point::new(x1, y1), Point::new(x2, y1), Point::new(x2, y2), Point::new(x1, y2)])
}

fn alto_line(line: &Node, namespace: &str) -> Result<TextLine> {
    let id = line
        .attribute("ID")
        .ok_or_else(|| LektorError::parsing("ALTO TextLine without ID attribute"))?;
    let words = word_contents(line, namespace);
    let shape = rectangle(line, id)?;
    Ok(TextLine::new(id, words, shape))
}

/// All `TextLine` elements whose space-joined `CONTENT` has at least
/// `min_len` characters.
pub fn alto_lines(doc: &Document, namespace: &str, min_len: usize) -> Result<Vec<TextLine>> {
    doc.descendants()
        .filter(|n| n.has_tag_name((namespace, "TextLine")))
        .filter(|line| word_contents(line, namespace).join(" ").chars().count() >= min_len)
        .map(|line| alto_line(&line, namespace))
        .collect()
}
