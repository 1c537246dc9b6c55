//! End-to-end report generation.
//!
//! Runs the full pipeline from the fixture settings and data file for every
//! output format, then re-opens the artifact and checks that what was laid
//! out is what a reader would see.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use release_notes::config::{self, OutputFormat, ReportConfig};
use release_notes::pipeline::{self, Report, SectionStatus};
use release_notes::records::RecordSet;
use release_notes::source::{JsonDataSource, StaticDataSource};
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

/// Fixture settings with the asset cache moved into `tmp`.
fn fixture_config(tmp: &TempDir) -> ReportConfig {
    let mut config = config::load_config(&[fixture("settings.toml")]).unwrap();
    config.assets.cache_dir = tmp.path().join("cache").to_string_lossy().into_owned();
    config
}

fn fixture_source() -> JsonDataSource {
    JsonDataSource::load(&fixture("data.json")).unwrap()
}

fn generate(format: OutputFormat) -> Report {
    let tmp = TempDir::new().unwrap();
    pipeline::generate_from_config(&fixture_config(&tmp), format, &fixture_source()).unwrap()
}

fn read_part(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut content = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    content
}

fn resolve_entity(entity: &str) -> &'static str {
    match entity {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        other => panic!("unexpected entity {other}"),
    }
}

fn attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// What [`walk`] reports: element starts (including empty elements) and
/// the text of every `<t>` / `<w:t>` element.
enum Piece<'a> {
    Start(&'a BytesStart<'a>),
    Text(String),
}

fn walk(xml: &str, mut visit: impl FnMut(Piece)) {
    let mut reader = Reader::from_str(xml);
    let mut in_text = false;
    let mut buf = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text = true;
                    buf.clear();
                }
                visit(Piece::Start(&e));
            }
            Ok(Event::Empty(e)) => visit(Piece::Start(&e)),
            Ok(Event::Text(e)) if in_text => buf.push_str(&String::from_utf8_lossy(e.as_ref())),
            Ok(Event::GeneralRef(e)) if in_text => {
                buf.push_str(resolve_entity(&String::from_utf8_lossy(e.as_ref())))
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"t" => {
                in_text = false;
                visit(Piece::Text(buf.clone()));
            }
            Ok(Event::Eof) => break,
            Err(e) => panic!("malformed xml: {e}"),
            _ => {}
        }
    }
}

/// Cell reference → text for every non-blank cell of a worksheet.
fn sheet_cells(xml: &str) -> BTreeMap<String, String> {
    let mut cells = BTreeMap::new();
    let mut current = String::new();
    walk(xml, |piece| match piece {
        Piece::Start(e) if e.local_name().as_ref() == b"c" => {
            current = attr(e, b"r").unwrap_or_default();
        }
        Piece::Text(text) => {
            cells.insert(current.clone(), text);
        }
        Piece::Start(_) => {}
    });
    cells
}

/// Cell references that carry a hyperlink.
fn sheet_hyperlinks(xml: &str) -> Vec<String> {
    let mut refs = Vec::new();
    walk(xml, |piece| {
        if let Piece::Start(e) = piece
            && e.local_name().as_ref() == b"hyperlink"
        {
            refs.extend(attr(e, b"ref"));
        }
    });
    refs
}

/// Every run of text in a word-processing part, in document order.
fn document_texts(xml: &str) -> Vec<String> {
    let mut texts = Vec::new();
    walk(xml, |piece| {
        if let Piece::Text(t) = piece {
            texts.push(t);
        }
    });
    texts
}

/// Texts inside `<w:hyperlink>` elements.
fn document_link_texts(xml: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut in_text = false;
    let mut texts = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"hyperlink" => depth += 1,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"hyperlink" => depth -= 1,
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = depth > 0,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"t" => in_text = false,
            Ok(Event::Text(e)) if in_text => texts.push(String::from_utf8_lossy(e.as_ref()).into_owned()),
            Ok(Event::Eof) => break,
            Err(e) => panic!("malformed xml: {e}"),
            _ => {}
        }
    }
    texts
}

// ============================================================================
// Spreadsheet
// ============================================================================

#[test]
fn workbook_has_one_sheet_per_surface() {
    let report = generate(OutputFormat::Xlsx);
    assert_eq!(report.artifact.file_name, "Orders Sprint 14 Release Notes.xlsx");
    let workbook = read_part(&report.artifact.bytes, "xl/workbook.xml");
    assert!(workbook.contains(r#"name="Release Notes""#));
    assert!(workbook.contains(r#"name="Test Cases""#));
}

#[test]
fn workbook_cells_round_trip() {
    let report = generate(OutputFormat::Xlsx);
    let cells = sheet_cells(&read_part(&report.artifact.bytes, "xl/worksheets/sheet1.xml"));
    let values: Vec<&str> = cells.values().map(String::as_str).collect();

    assert_eq!(cells["B2"], "APPLICATION BUILD/RELEASE NOTES");
    for expected in [
        "Application",
        "Orders Sprint 14",
        "3/14/2026",
        "2026.3.14.2",
        "Application is accessible at: ",
        "https://orders.example.com/",
        "(Changeset: 4711)",
        "Deployed By",
        "Included Requirements",
        "Assigned To",
        "Fix login",
        "Login failed for SSO users",
        "Orders\\Reports",
    ] {
        assert!(values.contains(&expected), "missing {expected:?} in {values:?}");
    }

    let tests = sheet_cells(&read_part(&report.artifact.bytes, "xl/worksheets/sheet2.xml"));
    assert_eq!(tests["B2"], "Test Cases");
    assert!(tests.values().any(|v| v == "Login with SSO"));
}

#[test]
fn five_summary_facts_fill_three_rows_of_two_pairs() {
    let report = generate(OutputFormat::Xlsx);
    let cells = sheet_cells(&read_part(&report.artifact.bytes, "xl/worksheets/sheet1.xml"));
    // graphic row 1, title row 2, blank row 3, summary rows 4..=6 in B..=E
    assert_eq!(cells["B4"], "Application");
    assert_eq!(cells["D4"], "Release Date");
    assert_eq!(cells["B6"], "Build #");
    assert_eq!(cells["C6"], "2026.3.14.2");
    assert!(!cells.contains_key("D6"));
    assert!(!cells.contains_key("E6"));
}

#[test]
fn work_item_ids_are_hyperlinks() {
    let report = generate(OutputFormat::Xlsx);
    let sheet = read_part(&report.artifact.bytes, "xl/worksheets/sheet1.xml");
    let cells = sheet_cells(&sheet);
    let linked: Vec<&str> = sheet_hyperlinks(&sheet)
        .iter()
        .filter_map(|r| cells.get(r).map(String::as_str))
        .collect();
    assert!(linked.contains(&"7"), "{linked:?}");
    assert!(linked.contains(&"12"));

    let rels = read_part(&report.artifact.bytes, "xl/worksheets/_rels/sheet1.xml.rels");
    assert!(rels.contains("https://tracker.example.com/DefaultCollection/Orders/_workitems/edit/7"));
    assert!(rels.contains("_versionControl#path=$/Orders/Main"));
}

#[test]
fn workbook_embeds_header_graphic() {
    let report = generate(OutputFormat::Xlsx);
    let mut archive = zip::ZipArchive::new(Cursor::new(report.artifact.bytes)).unwrap();
    let mut png = Vec::new();
    archive
        .by_name("xl/media/image1.png")
        .unwrap()
        .read_to_end(&mut png)
        .unwrap();
    assert!(png.starts_with(b"\x89PNG"));
}

// ============================================================================
// Document
// ============================================================================

#[test]
fn document_texts_round_trip() {
    let report = generate(OutputFormat::Docx);
    assert_eq!(report.artifact.file_name, "Orders Sprint 14 Release Notes.docx");
    let xml = read_part(&report.artifact.bytes, "word/document.xml");
    let texts = document_texts(&xml);
    assert_eq!(texts[0], "APPLICATION BUILD/RELEASE NOTES");
    for expected in [
        "Build #",
        "Access",
        "Included Requirements",
        "Fix login",
        "Login failed for SSO users",
        "Test Cases",
        "Open Reports; click Export",
    ] {
        assert!(texts.iter().any(|t| t == expected), "missing {expected:?}");
    }
}

#[test]
fn document_links_work_items_and_access() {
    let report = generate(OutputFormat::Docx);
    let xml = read_part(&report.artifact.bytes, "word/document.xml");
    let linked = document_link_texts(&xml);
    assert!(linked.iter().any(|t| t == "7"));
    assert!(linked.iter().any(|t| t == "https://orders.example.com/"));
    let rels = read_part(&report.artifact.bytes, "word/_rels/document.xml.rels");
    assert!(rels.contains("_workitems/edit/7"));
}

#[test]
fn document_breaks_page_before_test_cases() {
    let report = generate(OutputFormat::Docx);
    let xml = read_part(&report.artifact.bytes, "word/document.xml");
    let page_break = xml.find(r#"<w:br w:type="page"/>"#).unwrap();
    let test_cases = xml.find("Login with SSO").unwrap();
    let requirements = xml.find("Fix login").unwrap();
    assert!(requirements < page_break && page_break < test_cases);
}

// ============================================================================
// Markup
// ============================================================================

#[test]
fn html_report_is_self_contained() {
    let report = generate(OutputFormat::Html);
    assert_eq!(report.artifact.mime_type, "text/html");
    let html = String::from_utf8(report.artifact.bytes).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("data:image/png;base64,"));
    assert!(html.contains(
        r#"<a href="https://tracker.example.com/DefaultCollection/Orders/_workitems/edit/7">7</a>"#
    ));
    assert!(html.contains(r#"<th class="column-header">Assigned To</th>"#));
    assert!(html.contains(r#"data-name="Test Cases""#));
}

// ============================================================================
// Failure isolation
// ============================================================================

#[test]
fn empty_records_still_produce_every_format() {
    for format in [OutputFormat::Xlsx, OutputFormat::Docx, OutputFormat::Html] {
        let tmp = TempDir::new().unwrap();
        let source = StaticDataSource::new()
            .with_records(RecordSet::new(["ID", "Type", "Title", "Area", "Description"]));
        let report =
            pipeline::generate_from_config(&fixture_config(&tmp), format, &source).unwrap();
        assert!(!report.artifact.bytes.is_empty());

        let statuses: Vec<&SectionStatus> = report.sections.iter().map(|s| &s.status).collect();
        assert_eq!(
            statuses[3],
            &SectionStatus::Substituted(
                "Table could not be created. Not enough data was pulled in: no rows.".into()
            )
        );
        assert_eq!(
            statuses[4],
            &SectionStatus::Substituted(
                "Table could not be created. Data object was not initialized.".into()
            )
        );
    }
}

#[test]
fn error_row_lands_in_workbook() {
    let tmp = TempDir::new().unwrap();
    let report = pipeline::generate_from_config(
        &fixture_config(&tmp),
        OutputFormat::Xlsx,
        &StaticDataSource::new(),
    )
    .unwrap();
    let sheet = read_part(&report.artifact.bytes, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("Table could not be created. Data object was not initialized."));
    assert!(sheet.contains("<mergeCell "));
}

#[test]
fn malformed_data_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("data.json");
    std::fs::write(&path, r#"{"records": "#).unwrap();
    assert!(JsonDataSource::load(&path).is_err());
}

#[test]
fn header_graphic_is_cached_between_runs() {
    let tmp = TempDir::new().unwrap();
    let config = fixture_config(&tmp);
    pipeline::generate_from_config(&config, OutputFormat::Html, &fixture_source()).unwrap();
    let cached = tmp.path().join("cache/header.png");
    let first = std::fs::metadata(&cached).unwrap().modified().unwrap();
    pipeline::generate_from_config(&config, OutputFormat::Html, &fixture_source()).unwrap();
    let second = std::fs::metadata(&cached).unwrap().modified().unwrap();
    assert_eq!(first, second);
}
