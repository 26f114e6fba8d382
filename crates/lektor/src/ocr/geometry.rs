//! Polygon geometry for reading-order sorting.

use crate::types::Point;
use crate::{LektorError, Result};
use roxmltree::Node;

fn parse_number(token: &str, points: &str) -> Result<i32> {
    if let Ok(value) = token.parse::<i32>() {
        return Ok(value);
    }
    token
        .parse::<f64>()
        .map(|v| v.round() as i32)
        .map_err(|_| LektorError::parsing(format!("Invalid coordinate '{}' in points '{}'", token, points)))
}

/// Parse a PAGE `points` attribute: whitespace-separated `x,y` pairs.
///
/// Vertices are returned in their original order.
pub fn parse_points(points: &str) -> Result<Vec<Point>> {
    points
        .split_whitespace()
        .map(|pair| {
            let (x, y) = pair
                .split_once(',')
                .ok_or_else(|| LektorError::parsing(format!("Invalid point pair '{}' in '{}'", pair, points)))?;
            Ok(Point::new(parse_number(x, points)?, parse_number(y, points)?))
        })
        .collect()
}

/// Mean of all vertex x and y values (not the area centroid).
pub fn vertex_mean(points: &[Point]) -> Option<(f64, f64)> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sum_x, sum_y) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
    Some((sum_x / n, sum_y / n))
}

/// Reading-order coordinate of an element with a `Coords` child.
///
/// Returns the mean x (or mean y when `vertical`) of the `points` vertices.
/// `Ok(None)` means the element has no usable coordinates: no `Coords`
/// child, no `points` attribute, or no point pairs at all.
pub fn reading_coordinate(node: Node, namespace: &str, vertical: bool) -> Result<Option<f64>> {
    let Some(coords) = node.children().find(|n| n.has_tag_name((namespace, "Coords"))) else {
        return Ok(None);
    };
    let Some(points) = coords.attribute("points") else {
        return Ok(None);
    };
    let parsed = parse_points(points)?;
    Ok(vertex_mean(&parsed).map(|(x, y)| if vertical { y } else { x }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::namespace::PAGE_2019_NS;
    use roxmltree::Document;

    #[test]
    fn test_parse_points_keeps_order() {
        let points = parse_points("10,20 30,20 30,40 10,40").unwrap();
        assert_eq!(
            points,
            vec![Point::new(10, 20), Point::new(30, 20), Point::new(30, 40), Point::new(10, 40)]
        );
    }

    #[test]
    fn test_parse_points_rejects_garbage() {
        assert!(parse_points("10,20 abc").is_err());
        assert!(parse_points("10,20 30;40").is_err());
    }

    #[test]
    fn test_parse_points_empty() {
        assert!(parse_points("   ").unwrap().is_empty());
    }

    #[test]
    fn test_vertex_mean_is_not_area_centroid() {
        // extra vertex on the right edge pulls the vertex mean, not the area
        let points = parse_points("0,0 10,0 10,5 10,10 0,10").unwrap();
        let (x, y) = vertex_mean(&points).unwrap();
        assert_eq!(x, 6.0);
        assert_eq!(y, 5.0);
    }

    fn word_xml(points: Option<&str>) -> String {
        let coords = match points {
            Some(p) => format!(r#"<Coords points="{}"/>"#, p),
            None => String::new(),
        };
        format!(r#"<Word xmlns="{}" id="w1">{}</Word>"#, PAGE_2019_NS, coords)
    }

    #[test]
    fn test_reading_coordinate_horizontal_and_vertical() {
        let xml = word_xml(Some("100,10 200,10 200,30 100,30"));
        let doc = Document::parse(&xml).unwrap();
        let word = doc.root_element();
        assert_eq!(reading_coordinate(word, PAGE_2019_NS, false).unwrap(), Some(150.0));
        assert_eq!(reading_coordinate(word, PAGE_2019_NS, true).unwrap(), Some(20.0));
    }

    #[test]
    fn test_reading_coordinate_zero_is_a_value() {
        let xml = word_xml(Some("0,0 0,0"));
        let doc = Document::parse(&xml).unwrap();
        assert_eq!(reading_coordinate(doc.root_element(), PAGE_2019_NS, false).unwrap(), Some(0.0));
    }

    #[test]
    fn test_reading_coordinate_missing() {
        let xml = word_xml(None);
        let doc = Document::parse(&xml).unwrap();
        assert_eq!(reading_coordinate(doc.root_element(), PAGE_2019_NS, false).unwrap(), None);

        let xml = word_xml(Some(""));
        let doc = Document::parse(&xml).unwrap();
        assert_eq!(reading_coordinate(doc.root_element(), PAGE_2019_NS, false).unwrap(), None);
    }

    #[test]
    fn test_reading_coordinate_other_namespace_ignored() {
        let xml = format!(
            r#"<Word xmlns="{}" xmlns:o="urn:other"><o:Coords points="1,1"/></Word>"#,
            PAGE_2019_NS
        );
        let doc = Document::parse(&xml).unwrap();
        assert_eq!(reading_coordinate(doc.root_element(), PAGE_2019_NS, false).unwrap(), None);
    }
}
