//! Flowing-document surface: an Office Open XML word-processing package.
//!
//! Rows and columns from the layout become document structure. Titles and
//! headings are paragraphs, grids are tables, and each new page starts after
//! a page break. Cursor gaps have no meaning on a flowing surface; a blank
//! paragraph after every table keeps adjacent tables from fusing.
//!
//! The header graphic goes into a first-page header so it sits top-left on
//! page one only.

use super::ooxml::{
    self, Package, REL_HYPERLINK, REL_IMAGE, Relationships, XML_DECL, escape_xml,
};
use super::{BackendError, Surface};
use crate::assets::HeaderGraphic;
use crate::config::OutputFormat;
use crate::layout::{Block, BlockKind, Cell, CellStyle};

const REL_HEADER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
const EMU_PER_POINT: u64 = 12_700;
/// 0.25in page margins, in twentieths of a point.
const MARGIN_TWIPS: u32 = 360;
const PAGE_SHORT_TWIPS: u32 = 12_240;
const PAGE_LONG_TWIPS: u32 = 15_840;

const NAMESPACES: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture""#;

pub struct DocumentSurface {
    body: String,
    rels: Relationships,
    graphic: Option<HeaderGraphic>,
    pages: usize,
    wide: bool,
}

impl DocumentSurface {
    pub fn new() -> Self {
        Self {
            body: String::new(),
            rels: Relationships::new(),
            graphic: None,
            pages: 0,
            wide: false,
        }
    }

    fn ensure_open(&self) -> Result<(), BackendError> {
        if self.pages == 0 {
            return Err(BackendError::Surface(
                "no page open; call pre_format first".into(),
            ));
        }
        Ok(())
    }

    fn paragraph(&mut self, cell: &Cell, centered: bool) {
        let mut p = String::from("<w:p><w:pPr>");
        if let Some(fill) = fill_for(cell.style) {
            p.push_str(&format!(r#"<w:shd w:val="clear" w:color="auto" w:fill="{fill}"/>"#));
        }
        if centered {
            p.push_str(r#"<w:jc w:val="center"/>"#);
        }
        p.push_str("</w:pPr>");
        p.push_str(&self.runs(cell));
        p.push_str("</w:p>");
        self.body.push_str(&p);
    }

    fn table(&mut self, block: &Block) {
        let width = block.region.width();
        let mut t = String::from(
            r#"<w:tbl><w:tblPr><w:tblW w:w="0" w:type="auto"/><w:jc w:val="center"/>"#,
        );
        if block.themed {
            t.push_str(
                r#"<w:tblBorders><w:top w:val="single" w:sz="8" w:color="8C8C8C"/><w:left w:val="single" w:sz="8" w:color="8C8C8C"/><w:bottom w:val="single" w:sz="8" w:color="8C8C8C"/><w:right w:val="single" w:sz="8" w:color="8C8C8C"/><w:insideH w:val="single" w:sz="4" w:color="737373"/><w:insideV w:val="single" w:sz="4" w:color="737373"/></w:tblBorders>"#,
            );
        }
        t.push_str("</w:tblPr><w:tblGrid>");
        for _ in 0..width {
            t.push_str("<w:gridCol/>");
        }
        t.push_str("</w:tblGrid>");

        for (i, row) in block.rows.iter().enumerate() {
            t.push_str("<w:tr>");
            if block.header_row && i == 0 {
                t.push_str("<w:trPr><w:tblHeader/></w:trPr>");
            }
            for cell in row {
                t.push_str("<w:tc><w:tcPr>");
                if block.merged {
                    t.push_str(&format!(r#"<w:gridSpan w:val="{width}"/>"#));
                }
                if let Some(fill) = fill_for(cell.style) {
                    t.push_str(&format!(
                        r#"<w:shd w:val="clear" w:color="auto" w:fill="{fill}"/>"#
                    ));
                }
                t.push_str(r#"<w:vAlign w:val="center"/></w:tcPr><w:p>"#);
                t.push_str(&self.runs(cell));
                t.push_str("</w:p></w:tc>");
            }
            t.push_str("</w:tr>");
        }
        t.push_str("</w:tbl><w:p/>");
        self.body.push_str(&t);
    }

    /// Text runs for a cell, wrapped in a hyperlink when it has one.
    fn runs(&mut self, cell: &Cell) -> String {
        if cell.text.is_empty() {
            return String::new();
        }
        let run = format!(
            r#"<w:r><w:rPr>{}</w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
            run_props(cell.style, cell.link.is_some()),
            escape_xml(&cell.text)
        );
        match &cell.link {
            Some(target) => {
                let id = self.rels.external(REL_HYPERLINK, target.as_str());
                format!(r#"<w:hyperlink r:id="{id}">{run}</w:hyperlink>"#)
            }
            None => run,
        }
    }

    fn section_props(&self, header_rel: Option<&str>) -> String {
        let (w, h, orient) = if self.wide {
            (PAGE_LONG_TWIPS, PAGE_SHORT_TWIPS, r#" w:orient="landscape""#)
        } else {
            (PAGE_SHORT_TWIPS, PAGE_LONG_TWIPS, "")
        };
        let mut s = String::from("<w:sectPr>");
        if let Some(id) = header_rel {
            s.push_str(&format!(r#"<w:headerReference w:type="first" r:id="{id}"/>"#));
        }
        s.push_str(&format!(
            r#"<w:pgSz w:w="{w}" w:h="{h}"{orient}/><w:pgMar w:top="{m}" w:right="{m}" w:bottom="{m}" w:left="{m}" w:header="{m}" w:footer="{m}" w:gutter="0"/>"#,
            m = MARGIN_TWIPS
        ));
        if header_rel.is_some() {
            s.push_str("<w:titlePg/>");
        }
        s.push_str("</w:sectPr>");
        s
    }
}

impl Default for DocumentSurface {
    fn default() -> Self {
        Self::new()
    }
}

fn fill_for(style: CellStyle) -> Option<&'static str> {
    match style {
        CellStyle::Title => Some("D3D3D3"),
        CellStyle::Label => Some("F2F2F2"),
        CellStyle::ColumnHeader => Some("17406D"),
        CellStyle::RowLight => Some("F5F5F5"),
        CellStyle::RowShaded => Some("ADD8E6"),
        CellStyle::Error => Some("00008B"),
        CellStyle::Heading | CellStyle::Value => None,
    }
}

fn run_props(style: CellStyle, link: bool) -> String {
    let (font, half_points, bold, color) = match style {
        CellStyle::Title => ("Times New Roman", 28, true, "000000"),
        CellStyle::Heading => ("Arial", 24, true, "000000"),
        CellStyle::Label => ("Arial", 16, true, "000000"),
        CellStyle::Value => ("Arial", 16, true, "008080"),
        CellStyle::ColumnHeader => ("Arial", 16, true, "FFFFFF"),
        CellStyle::RowLight | CellStyle::RowShaded => ("Arial", 16, false, "000000"),
        CellStyle::Error => ("Arial", 16, false, "FFFFFF"),
    };
    let color = if link { "0563C1" } else { color };
    // rPr children are a fixed sequence: rFonts, b, color, sz, szCs, u
    format!(
        r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}"/>{}<w:color w:val="{color}"/><w:sz w:val="{half_points}"/><w:szCs w:val="{half_points}"/>{}"#,
        if bold { "<w:b/>" } else { "" },
        if link { r#"<w:u w:val="single"/>"# } else { "" }
    )
}

fn header_xml(graphic: &HeaderGraphic, image_rel: &str) -> String {
    let cx = u64::from(graphic.width) * EMU_PER_POINT;
    let cy = u64::from(graphic.height) * EMU_PER_POINT;
    format!(
        r#"{XML_DECL}<w:hdr {NAMESPACES}><w:p><w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="1" name="Header Graphic"/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic><pic:nvPicPr><pic:cNvPr id="1" name="header.png"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="{image_rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p></w:hdr>"#
    )
}

impl Surface for DocumentSurface {
    fn format(&self) -> OutputFormat {
        OutputFormat::Docx
    }

    fn pre_format(&mut self, _name: &str) -> Result<(), BackendError> {
        if self.pages == 0 {
            self.pages = 1;
        }
        Ok(())
    }

    fn draw(&mut self, block: &Block) -> Result<(), BackendError> {
        self.ensure_open()?;
        match block.kind {
            BlockKind::Title | BlockKind::Heading => {
                if let Some(cell) = block.rows.first().and_then(|r| r.first()) {
                    self.paragraph(cell, block.kind == BlockKind::Title);
                }
            }
            BlockKind::KeyValue | BlockKind::Table | BlockKind::Error => self.table(block),
        }
        Ok(())
    }

    fn draw_graphic(&mut self, graphic: &HeaderGraphic, _row: u32) -> Result<(), BackendError> {
        self.ensure_open()?;
        self.graphic = Some(graphic.clone());
        Ok(())
    }

    fn new_page(&mut self, _name: &str) -> Result<(), BackendError> {
        self.ensure_open()?;
        self.body
            .push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#);
        self.pages += 1;
        Ok(())
    }

    fn post_format(&mut self, wide: bool) -> Result<(), BackendError> {
        self.ensure_open()?;
        self.wide = wide;
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>, BackendError> {
        self.ensure_open()?;
        let mut package = Package::new();
        let mut overrides = vec![(
            "/word/document.xml",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
        )];

        let header_rel = match self.graphic.take() {
            Some(graphic) => {
                let mut header_rels = Relationships::new();
                let image_rel = header_rels.internal(REL_IMAGE, "media/image1.png");
                package.add("word/media/image1.png", &graphic.png)?;
                package.add("word/header1.xml", header_xml(&graphic, &image_rel).as_bytes())?;
                package.add("word/_rels/header1.xml.rels", header_rels.to_xml().as_bytes())?;
                overrides.push((
                    "/word/header1.xml",
                    "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml",
                ));
                Some(self.rels.internal(REL_HEADER, "header1.xml"))
            }
            None => None,
        };
        let has_png = header_rel.is_some();

        let document = format!(
            r#"{XML_DECL}<w:document {NAMESPACES}><w:body>{}{}</w:body></w:document>"#,
            self.body,
            self.section_props(header_rel.as_deref())
        );

        package.add(
            "[Content_Types].xml",
            ooxml::content_types(&overrides, has_png).as_bytes(),
        )?;
        package.add("_rels/.rels", ooxml::root_rels("word/document.xml").as_bytes())?;
        package.add("word/document.xml", document.as_bytes())?;
        package.add("word/_rels/document.xml.rels", self.rels.to_xml().as_bytes())?;
        package.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Cursor, place_error, place_heading, place_title};
    use crate::config::ErrorMerge;
    use std::io::{Cursor as IoCursor, Read};

    fn document_xml(bytes: &[u8]) -> String {
        let mut archive = zip::ZipArchive::new(IoCursor::new(bytes)).unwrap();
        let mut out = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn link_run_properties_follow_schema_order() {
        let props = run_props(CellStyle::Value, true);
        let pos = |tag: &str| props.find(tag).unwrap();
        assert!(pos("<w:rFonts") < pos("<w:b/>"));
        assert!(pos("<w:b/>") < pos("<w:color"));
        assert!(pos("<w:color") < pos("<w:sz "));
        assert!(pos("<w:sz ") < pos("<w:szCs"));
        assert!(pos("<w:szCs") < pos("<w:u "));

        let plain = run_props(CellStyle::RowLight, false);
        assert!(!plain.contains("<w:u "));
        assert!(!plain.contains("<w:b/>"));
    }

    #[test]
    fn control_characters_never_reach_the_document() {
        let mut surface = DocumentSurface::new();
        surface.pre_format("Release Notes").unwrap();
        let mut cursor = Cursor::new_surface();
        surface
            .draw(&place_heading(&mut cursor, "Login\u{b}failed").unwrap())
            .unwrap();
        let xml = document_xml(&surface.finish().unwrap());
        assert!(xml.contains(">Loginfailed</w:t>"));
        assert!(!xml.chars().any(|c| c == '\u{b}'));
    }

    #[test]
    fn draw_before_pre_format_fails() {
        let mut surface = DocumentSurface::new();
        let mut cursor = Cursor::new_surface();
        let block = place_title(&mut cursor, "T", 6).unwrap();
        assert!(surface.draw(&block).is_err());
    }

    #[test]
    fn title_and_heading_become_paragraphs() {
        let mut surface = DocumentSurface::new();
        surface.pre_format("Release Notes").unwrap();
        let mut cursor = Cursor::new_surface();
        surface.draw(&place_title(&mut cursor, "NOTES", 6).unwrap()).unwrap();
        surface.draw(&place_heading(&mut cursor, "Details").unwrap()).unwrap();
        let xml = document_xml(&surface.finish().unwrap());
        assert!(xml.contains(r#"<w:jc w:val="center"/>"#));
        assert!(xml.contains(">NOTES</w:t>"));
        assert!(xml.contains(">Details</w:t>"));
        assert!(!xml.contains("<w:tbl>"));
    }

    #[test]
    fn merged_error_spans_band() {
        let mut surface = DocumentSurface::new();
        surface.pre_format("Release Notes").unwrap();
        let mut cursor = Cursor::new_surface();
        cursor.active_band(4);
        let block = place_error(&mut cursor, "Table could not be created. x", ErrorMerge::Row)
            .unwrap();
        surface.draw(&block).unwrap();
        let xml = document_xml(&surface.finish().unwrap());
        assert!(xml.contains(r#"<w:gridSpan w:val="4"/>"#));
        assert!(xml.contains(r#"w:fill="00008B""#));
    }

    #[test]
    fn wide_switches_to_landscape() {
        let mut surface = DocumentSurface::new();
        surface.pre_format("Release Notes").unwrap();
        surface.post_format(true).unwrap();
        let xml = document_xml(&surface.finish().unwrap());
        assert!(xml.contains(r#"w:orient="landscape""#));
    }

    #[test]
    fn new_page_inserts_break() {
        let mut surface = DocumentSurface::new();
        surface.pre_format("Release Notes").unwrap();
        surface.new_page("Test Cases").unwrap();
        let xml = document_xml(&surface.finish().unwrap());
        assert!(xml.contains(r#"<w:br w:type="page"/>"#));
    }

    #[test]
    fn graphic_goes_into_first_page_header() {
        let mut surface = DocumentSurface::new();
        surface.pre_format("Release Notes").unwrap();
        let graphic = HeaderGraphic {
            png: crate::assets::render_header_png().unwrap(),
            width: 125,
            height: 70,
        };
        surface.draw_graphic(&graphic, 1).unwrap();
        let bytes = surface.finish().unwrap();
        let xml = document_xml(&bytes);
        assert!(xml.contains(r#"<w:headerReference w:type="first""#));
        assert!(xml.contains("<w:titlePg/>"));
        let mut archive = zip::ZipArchive::new(IoCursor::new(bytes)).unwrap();
        assert!(archive.by_name("word/media/image1.png").is_ok());
    }
}
