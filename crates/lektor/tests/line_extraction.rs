//! Line extraction integration tests.
//!
//! Covers all four supported schemas through the file reader:
//! - ALTO v3/v4 line filtering and rectangle shapes
//! - PAGE 2013/2019 word ordering, mark stripping and malformed lines
//! - namespace rejection

use lektor::LektorError;
use lektor::Point;
use lektor::ocr::namespace::{ALTO_V3_NS, ALTO_V4_NS, PAGE_2013_NS, PAGE_2019_NS};
use lektor::ocr::{LineOptions, OcrFormat, detect_format, read_alto_lines, read_lines};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn alto(namespace: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<alto xmlns="{}">
  <Layout>
    <Page ID="p1" WIDTH="2000" HEIGHT="3000">
      <PrintSpace>
        <TextBlock ID="b1">
          <TextLine ID="line_1" HPOS="100" VPOS="200" WIDTH="800" HEIGHT="50">
            <String ID="s1" CONTENT="Anno"/><SP/><String ID="s2" CONTENT="1633"/>
          </TextLine>
          <TextLine ID="line_2" HPOS="100" VPOS="260" WIDTH="40" HEIGHT="50">
            <String ID="s3" CONTENT="a"/>
          </TextLine>
          <TextLine ID="line_3" HPOS="100.4" VPOS="320" WIDTH="799.6" HEIGHT="50">
            <String ID="s4" CONTENT="Weſtfalen"/>
          </TextLine>
        </TextBlock>
      </PrintSpace>
    </Page>
  </Layout>
</alto>"#,
        namespace
    )
}

fn page(namespace: &str, lines: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<PcGts xmlns="{}">
  <Page imageFilename="0001.tif" imageWidth="2000" imageHeight="3000">
    <TextRegion id="r1">
      <Coords points="0,0 2000,0 2000,3000 0,3000"/>
      {}
    </TextRegion>
  </Page>
</PcGts>"#,
        namespace, lines
    )
}

#[test]
fn test_alto_v3_lines_and_shapes() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "0001.xml", &alto(ALTO_V3_NS));

    let lines = read_lines(&path, &LineOptions::default()).unwrap();
    let ids: Vec<&str> = lines.iter().map(|l| l.id()).collect();
    assert_eq!(ids, vec!["line_1", "line_3"], "single char line is below min_len");
    assert!(lines.iter().all(|l| l.is_valid()));

    assert_eq!(lines[0].words(), &["Anno".to_string(), "1633".to_string()]);
    assert_eq!(lines[0].text_content(), "Anno 1633");
    assert_eq!(
        lines[0].shape(),
        &[Point::new(100, 200), Point::new(900, 200), Point::new(900, 250), Point::new(100, 250)]
    );
}

#[test]
fn test_alto_v4_min_len_boundary() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "0002.xml", &alto(ALTO_V4_NS));

    let options = LineOptions {
        min_len: 1,
        ..Default::default()
    };
    assert_eq!(read_lines(&path, &options).unwrap().len(), 3);

    let options = LineOptions {
        min_len: 9,
        ..Default::default()
    };
    let lines = read_lines(&path, &options).unwrap();
    assert_eq!(lines.len(), 2, "'Anno 1633' and 'Weſtfalen' have exactly 9 chars");

    assert_eq!(read_alto_lines(&path, 10).unwrap().len(), 0);
}

#[test]
fn test_page_words_sorted_by_geometry() {
    let dir = TempDir::new().unwrap();
    let lines = r#"
      <TextLine id="tl_1">
        <Coords points="100,100 900,100 900,150 100,150"/>
        <Word id="w_3"><Coords points="600,100 800,100 800,150 600,150"/><TextEquiv><Unicode>drei</Unicode></TextEquiv></Word>
        <Word id="w_1"><Coords points="100,100 250,100 250,150 100,150"/><TextEquiv><Unicode>eins</Unicode></TextEquiv></Word>
        <Word id="w_2"><Coords points="300,100 500,100 500,150 300,150"/><TextEquiv><Unicode> zwei </Unicode></TextEquiv></Word>
        <TextEquiv><Unicode>drei eins zwei</Unicode></TextEquiv>
      </TextLine>"#;
    let path = write(&dir, "0003.xml", &page(PAGE_2019_NS, lines));

    let lines = read_lines(&path, &LineOptions::default()).unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].text_content(), "eins zwei drei");
    assert_eq!(lines[0].shape().len(), 4);
    assert_eq!(lines[0].shape()[0], Point::new(100, 100));
}

#[test]
fn test_page_vertical_orders_by_y() {
    let dir = TempDir::new().unwrap();
    let lines = r#"
      <TextLine id="tl_v">
        <Coords points="100,100 150,100 150,900 100,900"/>
        <Word id="w_b"><Coords points="100,500 150,500 150,600 100,600"/><TextEquiv><Unicode>unten</Unicode></TextEquiv></Word>
        <Word id="w_a"><Coords points="100,100 150,100 150,200 100,200"/><TextEquiv><Unicode>oben</Unicode></TextEquiv></Word>
        <TextEquiv><Unicode>unten oben</Unicode></TextEquiv>
      </TextLine>"#;
    let path = write(&dir, "0004.xml", &page(PAGE_2013_NS, lines));

    let options = LineOptions {
        vertical: true,
        ..Default::default()
    };
    let lines = read_lines(&path, &options).unwrap();
    assert_eq!(lines[0].words(), &["oben".to_string(), "unten".to_string()]);
    assert!(lines[0].vertical());
}

#[test]
fn test_page_reorder_and_marks() {
    let dir = TempDir::new().unwrap();
    let lines = "
      <TextLine id=\"tl_rtl\">
        <Coords points=\"100,100 900,100 900,150 100,150\"/>
        <Word id=\"w_1\"><Coords points=\"100,100 300,100 300,150 100,150\"/><TextEquiv><Unicode>\u{200f}a\u{200c}b</Unicode></TextEquiv></Word>
        <Word id=\"w_2\"><Coords points=\"400,100 600,100 600,150 400,150\"/><TextEquiv><Unicode>cd\u{202c}</Unicode></TextEquiv></Word>
        <TextEquiv><Unicode>ab cd</Unicode></TextEquiv>
      </TextLine>";
    let path = write(&dir, "0005.xml", &page(PAGE_2019_NS, lines));

    let options = LineOptions {
        reorder: true,
        ..Default::default()
    };
    let lines = read_lines(&path, &options).unwrap();
    assert_eq!(lines[0].words(), &["ab".to_string(), "cd".to_string()]);
    assert_eq!(lines[0].text_content(), "cd ab");
}

#[test]
fn test_page_word_only_line_is_error() {
    let dir = TempDir::new().unwrap();
    let lines = r#"
      <TextLine id="tl_words_only">
        <Coords points="100,100 900,100 900,150 100,150"/>
        <Word id="w_1"><Coords points="100,100 300,100 300,150 100,150"/><TextEquiv><Unicode>nur</Unicode></TextEquiv></Word>
      </TextLine>"#;
    let path = write(&dir, "0006.xml", &page(PAGE_2019_NS, lines));

    let err = read_lines(&path, &LineOptions::default()).unwrap_err();
    assert!(matches!(err, LektorError::Parsing { .. }));
    let message = err.to_string();
    assert!(message.contains("tl_words_only"));
    assert!(message.contains("0006.xml"));
}

#[test]
fn test_page_word_without_coords_is_error() {
    let dir = TempDir::new().unwrap();
    let lines = r#"
      <TextLine id="tl_1">
        <Coords points="100,100 900,100 900,150 100,150"/>
        <Word id="w_nocoords"><TextEquiv><Unicode>ohne</Unicode></TextEquiv></Word>
        <TextEquiv><Unicode>ohne</Unicode></TextEquiv>
      </TextLine>"#;
    let path = write(&dir, "0007.xml", &page(PAGE_2019_NS, lines));

    let err = read_lines(&path, &LineOptions::default()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("w_nocoords"));
    assert!(message.contains("tl_1"));
}

#[test]
fn test_page_line_without_coords_is_skipped() {
    let dir = TempDir::new().unwrap();
    let lines = r#"
      <TextLine id="tl_nocoords">
        <TextEquiv><Unicode>keine Koordinaten</Unicode></TextEquiv>
      </TextLine>
      <TextLine id="tl_empty">
        <Coords points="100,300 900,300 900,350 100,350"/>
      </TextLine>
      <TextLine id="tl_ok">
        <Coords points="100,200 900,200 900,250 100,250"/>
        <TextEquiv><Unicode>mit Koordinaten</Unicode></TextEquiv>
      </TextLine>"#;
    let path = write(&dir, "0008.xml", &page(PAGE_2019_NS, lines));

    let lines = read_lines(&path, &LineOptions::default()).unwrap();
    let ids: Vec<&str> = lines.iter().map(|l| l.id()).collect();
    assert_eq!(ids, vec!["tl_ok"]);
    assert_eq!(lines[0].text_content(), "mit Koordinaten");
}

#[test]
fn test_unknown_namespace_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "0009.xml",
        r#"<alto xmlns="http://www.loc.gov/standards/alto/ns-v2#"><Layout/></alto>"#,
    );
    let err = read_lines(&path, &LineOptions::default()).unwrap_err();
    assert!(matches!(err, LektorError::Parsing { .. }));

    let unqualified = write(&dir, "0010.xml", "<alto><Layout/></alto>");
    assert!(read_lines(&unqualified, &LineOptions::default()).is_err());
}

#[test]
fn test_detect_all_formats() {
    for (namespace, expected) in [
        (ALTO_V3_NS, OcrFormat::AltoV3),
        (ALTO_V4_NS, OcrFormat::AltoV4),
        (PAGE_2013_NS, OcrFormat::Page2013),
        (PAGE_2019_NS, OcrFormat::Page2019),
    ] {
        let xml = format!(r#"<root xmlns="{}"/>"#, namespace);
        let doc = roxmltree::Document::parse(&xml).unwrap();
        assert_eq!(detect_format(&doc).unwrap(), expected);
    }
}

#[test]
fn test_read_errors() {
    let dir = TempDir::new().unwrap();
    let missing = read_lines(dir.path().join("missing.xml"), &LineOptions::default()).unwrap_err();
    assert!(matches!(missing, LektorError::Io(_)));

    let path = dir.path().join("latin1.xml");
    fs::write(&path, b"<alto>\xe4</alto>").unwrap();
    let invalid = read_lines(&path, &LineOptions::default()).unwrap_err();
    assert!(matches!(invalid, LektorError::Parsing { .. }));

    let broken = write(&dir, "broken.xml", "<alto><Layout></alto>");
    assert!(matches!(
        read_lines(&broken, &LineOptions::default()),
        Err(LektorError::Parsing { .. })
    ));

    let page_file = write(&dir, "page.xml", &page(PAGE_2019_NS, ""));
    assert!(read_alto_lines(&page_file, 2).is_err());
}
