//! OCR format detection by root namespace.

use crate::{LektorError, Result};
use roxmltree::Document;

pub const ALTO_V3_NS: &str = "http://www.loc.gov/standards/alto/ns-v3#";
pub const ALTO_V4_NS: &str = "http://www.loc.gov/standards/alto/ns-v4#";
pub const PAGE_2013_NS: &str = "http://schema.primaresearch.org/PAGE/gts/pagecontent/2013-07-15";
pub const PAGE_2019_NS: &str = "http://schema.primaresearch.org/PAGE/gts/pagecontent/2019-07-15";

/// The four supported OCR schema variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OcrFormat {
    AltoV3,
    AltoV4,
    Page2013,
    Page2019,
}

const REGISTRY: [(OcrFormat, &str); 4] = [
    (OcrFormat::AltoV3, ALTO_V3_NS),
    (OcrFormat::AltoV4, ALTO_V4_NS),
    (OcrFormat::Page2013, PAGE_2013_NS),
    (OcrFormat::Page2019, PAGE_2019_NS),
];

impl OcrFormat {
    /// Exact match against the known namespace URIs.
    pub fn from_namespace(uri: &str) -> Option<Self> {
        REGISTRY.iter().find(|(_, ns)| *ns == uri).map(|(format, _)| *format)
    }

    pub fn namespace(&self) -> &'static str {
        match self {
            Self::AltoV3 => ALTO_V3_NS,
            Self::AltoV4 => ALTO_V4_NS,
            Self::Page2013 => PAGE_2013_NS,
            Self::Page2019 => PAGE_2019_NS,
        }
    }

    pub fn is_alto(&self) -> bool {
        matches!(self, Self::AltoV3 | Self::AltoV4)
    }

    pub fn is_page(&self) -> bool {
        matches!(self, Self::Page2013 | Self::Page2019)
    }
}

impl std::fmt::Display for OcrFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::AltoV3 => "alto3",
            Self::AltoV4 => "alto4",
            Self::Page2013 => "page2013",
            Self::Page2019 => "page2019",
        };
        f.write_str(label)
    }
}

/// Determine the schema of a parsed document from its root element.
///
/// # Errors
///
/// Returns `LektorError::Parsing` if the root namespace is missing or not one
/// of the four registered URIs.
pub fn detect_format(doc: &Document) -> Result<OcrFormat> {
    let root = doc.root_element();
    let uri = root.tag_name().namespace().unwrap_or("");
    OcrFormat::from_namespace(uri).ok_or_else(|| {
        LektorError::parsing(format!(
            "Unknown OCR namespace '{}' on root element <{}>",
            uri,
            root.tag_name().name()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_all_registered_formats() {
        for (format, ns) in REGISTRY {
            let xml = format!(r#"<root xmlns="{}"/>"#, ns);
            let doc = Document::parse(&xml).unwrap();
            assert_eq!(detect_format(&doc).unwrap(), format);
        }
    }

    #[test]
    fn test_detect_prefixed_root() {
        let xml = format!(r#"<pc:PcGts xmlns:pc="{}"/>"#, PAGE_2019_NS);
        let doc = Document::parse(&xml).unwrap();
        assert_eq!(detect_format(&doc).unwrap(), OcrFormat::Page2019);
    }

    #[test]
    fn test_unknown_namespace_rejected() {
        let doc = Document::parse(r#"<alto xmlns="http://www.loc.gov/standards/alto/ns-v2#"/>"#).unwrap();
        let err = detect_format(&doc).unwrap_err();
        assert!(matches!(err, LektorError::Parsing { .. }));
        assert!(err.to_string().contains("ns-v2#"));
    }

    #[test]
    fn test_missing_namespace_rejected() {
        let doc = Document::parse("<alto/>").unwrap();
        assert!(detect_format(&doc).is_err());
    }

    #[test]
    fn test_near_miss_not_accepted() {
        assert_eq!(OcrFormat::from_namespace("http://www.loc.gov/standards/alto/ns-v4"), None);
        assert_eq!(OcrFormat::from_namespace(ALTO_V4_NS), Some(OcrFormat::AltoV4));
    }

    #[test]
    fn test_format_kind() {
        assert!(OcrFormat::AltoV3.is_alto());
        assert!(OcrFormat::Page2013.is_page());
        assert!(!OcrFormat::Page2013.is_alto());
        assert_eq!(OcrFormat::Page2019.to_string(), "page2019");
    }
}
