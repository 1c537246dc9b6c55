//! Spreadsheet surface: an Office Open XML workbook.
//!
//! Each page becomes a worksheet. Blocks are written into a sparse cell map
//! and serialized when the workbook is finished:
//!
//! ```text
//! [Content_Types].xml
//! _rels/.rels
//! xl/workbook.xml              sheets in page order
//! xl/_rels/workbook.xml.rels
//! xl/styles.xml                fixed style table, see `style_index`
//! xl/worksheets/sheetN.xml     inline strings, merges, hyperlinks
//! xl/worksheets/_rels/sheetN.xml.rels
//! xl/drawings/drawing1.xml     header graphic anchor (first sheet only)
//! xl/drawings/_rels/drawing1.xml.rels
//! xl/media/image1.png
//! ```
//!
//! Themed blocks get thin borders and widen their columns to fit the longest
//! text. Image and row sizes are in points.

use super::ooxml::{
    self, Package, REL_HYPERLINK, REL_IMAGE, REL_STYLES, Relationships, XML_DECL, escape_xml,
};
use super::{BackendError, Surface};
use crate::assets::HeaderGraphic;
use crate::config::OutputFormat;
use crate::layout::{Block, Cell, CellStyle, Region, column_letters};
use std::collections::{BTreeMap, BTreeSet};

const EMU_PER_POINT: u64 = 12_700;
const MIN_COLUMN_WIDTH: f64 = 8.0;
const MAX_COLUMN_WIDTH: f64 = 60.0;
const MAX_SHEET_NAME: usize = 31;

const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_DRAWING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing";

#[derive(Debug, Clone, PartialEq)]
struct SheetCell {
    text: String,
    style: u32,
    link: Option<String>,
}

#[derive(Debug, Default)]
struct Sheet {
    name: String,
    cells: BTreeMap<(u32, u32), SheetCell>,
    merges: Vec<Region>,
    row_heights: BTreeMap<u32, f64>,
    col_widths: BTreeMap<u32, f64>,
    graphic: Option<HeaderGraphic>,
    wide: bool,
}

impl Sheet {
    fn new(name: String) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    fn put(&mut self, col: u32, row: u32, cell: SheetCell) {
        self.cells.insert((row, col), cell);
    }

    fn widen(&mut self, col: u32, text: &str) {
        let longest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
        let width = (longest as f64 * 1.1 + 2.0).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
        let entry = self.col_widths.entry(col).or_insert(width);
        *entry = entry.max(width);
    }

    fn dimension(&self) -> Option<String> {
        let first_row = self.cells.keys().map(|(r, _)| *r).min()?;
        let last_row = self.cells.keys().map(|(r, _)| *r).max()?;
        let first_col = self.cells.keys().map(|(_, c)| *c).min()?;
        let last_col = self.cells.keys().map(|(_, c)| *c).max()?;
        Some(
            Region {
                first_col,
                last_col,
                first_row,
                last_row,
            }
            .to_string(),
        )
    }
}

pub struct SpreadsheetSurface {
    sheets: Vec<Sheet>,
}

impl SpreadsheetSurface {
    pub fn new() -> Self {
        Self { sheets: Vec::new() }
    }

    fn current(&mut self) -> Result<&mut Sheet, BackendError> {
        self.sheets
            .last_mut()
            .ok_or_else(|| BackendError::Surface("no worksheet open; call pre_format first".into()))
    }

    fn open_sheet(&mut self, name: &str) {
        let name = unique_sheet_name(name, self.sheets.iter().map(|s| s.name.as_str()));
        self.sheets.push(Sheet::new(name));
    }
}

impl Default for SpreadsheetSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for SpreadsheetSurface {
    fn format(&self) -> OutputFormat {
        OutputFormat::Xlsx
    }

    fn pre_format(&mut self, name: &str) -> Result<(), BackendError> {
        if self.sheets.is_empty() {
            self.open_sheet(name);
        }
        Ok(())
    }

    fn draw(&mut self, block: &Block) -> Result<(), BackendError> {
        let sheet = self.current()?;
        let bordered = block.themed;

        for (col, row, cell) in block.positioned() {
            sheet.put(col, row, sheet_cell(cell, bordered));
            if block.themed && !block.merged {
                sheet.widen(col, &cell.text);
            }
        }

        if block.merged {
            // fill the rest of each merged row so borders and fills span the band
            for (i, row) in block.rows.iter().enumerate() {
                let r = block.region.first_row + i as u32;
                if let Some(first) = row.first() {
                    let filler = Cell::blank(first.style);
                    for c in block.region.first_col + 1..=block.region.last_col {
                        sheet.put(c, r, sheet_cell(&filler, bordered));
                    }
                }
                sheet.merges.push(Region {
                    first_row: r,
                    last_row: r,
                    ..block.region
                });
            }
        }

        if let Some(height) = block.row_height {
            for r in block.region.first_row..=block.region.last_row {
                sheet.row_heights.insert(r, height);
            }
        }
        Ok(())
    }

    fn draw_graphic(&mut self, graphic: &HeaderGraphic, row: u32) -> Result<(), BackendError> {
        let sheet = self.current()?;
        sheet.row_heights.insert(row, f64::from(graphic.height) + 1.0);
        sheet.graphic = Some(graphic.clone());
        Ok(())
    }

    fn new_page(&mut self, name: &str) -> Result<(), BackendError> {
        self.open_sheet(name);
        Ok(())
    }

    fn post_format(&mut self, wide: bool) -> Result<(), BackendError> {
        self.current()?.wide = wide;
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>, BackendError> {
        if self.sheets.is_empty() {
            return Err(BackendError::Surface("workbook has no worksheets".into()));
        }
        let mut package = Package::new();
        let mut overrides: Vec<(String, &str)> = vec![
            (
                "/xl/workbook.xml".into(),
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml",
            ),
            (
                "/xl/styles.xml".into(),
                "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml",
            ),
        ];

        let mut workbook_rels = Relationships::new();
        let mut sheet_entries = Vec::new();
        let mut drawings = 0;

        for (i, sheet) in self.sheets.iter().enumerate() {
            let n = i + 1;
            let rel_id = workbook_rels.internal(REL_WORKSHEET, format!("worksheets/sheet{n}.xml"));
            sheet_entries.push(format!(
                r#"<sheet name="{}" sheetId="{n}" r:id="{rel_id}"/>"#,
                escape_xml(&sheet.name)
            ));

            let mut sheet_rels = Relationships::new();
            let drawing_rel = match &sheet.graphic {
                Some(graphic) => {
                    drawings += 1;
                    let d = drawings;
                    package.add(&format!("xl/media/image{d}.png"), &graphic.png)?;
                    let mut drawing_rels = Relationships::new();
                    let image_rel = drawing_rels.internal(REL_IMAGE, format!("../media/image{d}.png"));
                    package.add(
                        &format!("xl/drawings/drawing{d}.xml"),
                        drawing_xml(graphic, &image_rel).as_bytes(),
                    )?;
                    package.add(
                        &format!("xl/drawings/_rels/drawing{d}.xml.rels"),
                        drawing_rels.to_xml().as_bytes(),
                    )?;
                    overrides.push((
                        format!("/xl/drawings/drawing{d}.xml"),
                        "application/vnd.openxmlformats-officedocument.drawing+xml",
                    ));
                    Some(sheet_rels.internal(REL_DRAWING, format!("../drawings/drawing{d}.xml")))
                }
                None => None,
            };

            let xml = worksheet_xml(sheet, &mut sheet_rels, drawing_rel.as_deref());
            package.add(&format!("xl/worksheets/sheet{n}.xml"), xml.as_bytes())?;
            if !sheet_rels.is_empty() {
                package.add(
                    &format!("xl/worksheets/_rels/sheet{n}.xml.rels"),
                    sheet_rels.to_xml().as_bytes(),
                )?;
            }
            overrides.push((
                format!("/xl/worksheets/sheet{n}.xml"),
                "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml",
            ));
        }
        workbook_rels.internal(REL_STYLES, "styles.xml");

        let workbook = format!(
            r#"{XML_DECL}<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{}</sheets></workbook>"#,
            sheet_entries.concat()
        );

        let overrides: Vec<(&str, &str)> = overrides.iter().map(|(p, t)| (p.as_str(), *t)).collect();
        package.add(
            "[Content_Types].xml",
            ooxml::content_types(&overrides, drawings > 0).as_bytes(),
        )?;
        package.add("_rels/.rels", ooxml::root_rels("xl/workbook.xml").as_bytes())?;
        package.add("xl/workbook.xml", workbook.as_bytes())?;
        package.add("xl/_rels/workbook.xml.rels", workbook_rels.to_xml().as_bytes())?;
        package.add("xl/styles.xml", styles_xml().as_bytes())?;
        package.finish()
    }
}

fn sheet_cell(cell: &Cell, bordered: bool) -> SheetCell {
    SheetCell {
        text: cell.text.clone(),
        style: style_index(cell.style, cell.link.is_some(), bordered),
        link: cell.link.clone(),
    }
}

/// Excel sheet names: at most 31 chars, no `[]:*?/\`, unique within the book.
fn unique_sheet_name<'a>(name: &str, existing: impl Iterator<Item = &'a str> + Clone) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if "[]:*?/\\".contains(c) { '_' } else { c })
        .take(MAX_SHEET_NAME)
        .collect();
    let base = if cleaned.trim().is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    };

    let taken = |candidate: &str| existing.clone().any(|e| e.eq_ignore_ascii_case(candidate));
    if !taken(&base) {
        return base;
    }
    (2..)
        .map(|n| {
            let suffix = format!(" ({n})");
            let keep = MAX_SHEET_NAME.saturating_sub(suffix.len());
            format!("{}{suffix}", base.chars().take(keep).collect::<String>())
        })
        .find(|candidate| !taken(candidate))
        .unwrap_or(base)
}

fn worksheet_xml(sheet: &Sheet, rels: &mut Relationships, drawing_rel: Option<&str>) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );
    if sheet.wide {
        xml.push_str(r#"<sheetPr><pageSetUpPr fitToPage="1"/></sheetPr>"#);
    }
    if let Some(dim) = sheet.dimension() {
        xml.push_str(&format!(r#"<dimension ref="{dim}"/>"#));
    }

    if !sheet.col_widths.is_empty() {
        xml.push_str("<cols>");
        for (col, width) in &sheet.col_widths {
            xml.push_str(&format!(
                r#"<col min="{col}" max="{col}" width="{width:.2}" customWidth="1"/>"#
            ));
        }
        xml.push_str("</cols>");
    }

    xml.push_str("<sheetData>");
    let rows: BTreeSet<u32> = sheet
        .cells
        .keys()
        .map(|(r, _)| *r)
        .chain(sheet.row_heights.keys().copied())
        .collect();
    for row in rows {
        match sheet.row_heights.get(&row) {
            Some(h) => xml.push_str(&format!(r#"<row r="{row}" ht="{h}" customHeight="1">"#)),
            None => xml.push_str(&format!(r#"<row r="{row}">"#)),
        }
        for ((_, col), cell) in sheet.cells.range((row, 0)..=(row, u32::MAX)) {
            let reference = format!("{}{row}", column_letters(*col));
            if cell.text.is_empty() {
                xml.push_str(&format!(r#"<c r="{reference}" s="{}"/>"#, cell.style));
            } else {
                xml.push_str(&format!(
                    r#"<c r="{reference}" s="{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                    cell.style,
                    escape_xml(&cell.text)
                ));
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");

    if !sheet.merges.is_empty() {
        xml.push_str(&format!(r#"<mergeCells count="{}">"#, sheet.merges.len()));
        for region in &sheet.merges {
            xml.push_str(&format!(r#"<mergeCell ref="{region}"/>"#));
        }
        xml.push_str("</mergeCells>");
    }

    let links: Vec<(String, &str)> = sheet
        .cells
        .iter()
        .filter_map(|((row, col), cell)| {
            cell.link
                .as_deref()
                .map(|l| (format!("{}{row}", column_letters(*col)), l))
        })
        .collect();
    if !links.is_empty() {
        xml.push_str("<hyperlinks>");
        for (reference, target) in links {
            let id = rels.external(REL_HYPERLINK, target);
            xml.push_str(&format!(r#"<hyperlink ref="{reference}" r:id="{id}"/>"#));
        }
        xml.push_str("</hyperlinks>");
    }

    xml.push_str(
        r#"<pageMargins left="0.25" right="0.25" top="0.25" bottom="0.25" header="0" footer="0"/>"#,
    );
    if sheet.wide {
        xml.push_str(r#"<pageSetup orientation="landscape" fitToWidth="1" fitToHeight="0"/>"#);
    }
    if let Some(id) = drawing_rel {
        xml.push_str(&format!(r#"<drawing r:id="{id}"/>"#));
    }
    xml.push_str("</worksheet>");
    xml
}

fn drawing_xml(graphic: &HeaderGraphic, image_rel: &str) -> String {
    let cx = u64::from(graphic.width) * EMU_PER_POINT;
    let cy = u64::from(graphic.height) * EMU_PER_POINT;
    format!(
        r#"{XML_DECL}<xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><xdr:oneCellAnchor><xdr:from><xdr:col>0</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>0</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from><xdr:ext cx="{cx}" cy="{cy}"/><xdr:pic><xdr:nvPicPr><xdr:cNvPr id="2" name="Header Graphic"/><xdr:cNvPicPr><a:picLocks noChangeAspect="1"/></xdr:cNvPicPr></xdr:nvPicPr><xdr:blipFill><a:blip r:embed="{image_rel}"/><a:stretch><a:fillRect/></a:stretch></xdr:blipFill><xdr:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></xdr:spPr></xdr:pic><xdr:clientData/></xdr:oneCellAnchor></xdr:wsDr>"#
    )
}

// =============================================================================
// Style table
// =============================================================================

const STYLES: [CellStyle; 8] = [
    CellStyle::Title,
    CellStyle::Heading,
    CellStyle::Label,
    CellStyle::Value,
    CellStyle::ColumnHeader,
    CellStyle::RowLight,
    CellStyle::RowShaded,
    CellStyle::Error,
];

// (font, fill, centered) per entry of STYLES
const STYLE_FORMATS: [(u32, u32, bool); 8] = [
    (1, 2, true),
    (2, 0, false),
    (3, 3, false),
    (4, 0, false),
    (5, 4, false),
    (6, 5, false),
    (6, 6, false),
    (7, 7, false),
];

const LINK_FONT: u32 = 8;

/// `cellXfs` index for a cell. Index 0 is the workbook default; the rest are
/// laid out as `1 + (style · 2 + link) · 2 + bordered`.
pub fn style_index(style: CellStyle, link: bool, bordered: bool) -> u32 {
    let pos = STYLES.iter().position(|s| *s == style).unwrap_or(0) as u32;
    1 + (pos * 2 + u32::from(link)) * 2 + u32::from(bordered)
}

fn styles_xml() -> String {
    let fonts = [
        r#"<font><sz val="11"/><name val="Calibri"/></font>"#,
        r#"<font><b/><sz val="14"/><color rgb="FF000000"/><name val="Times New Roman"/></font>"#,
        r#"<font><b/><sz val="12"/><color rgb="FF000000"/><name val="Arial"/></font>"#,
        r#"<font><b/><sz val="8"/><color rgb="FF000000"/><name val="Arial"/></font>"#,
        r#"<font><b/><sz val="8"/><color rgb="FF008080"/><name val="Arial"/></font>"#,
        r#"<font><b/><sz val="8"/><color rgb="FFFFFFFF"/><name val="Arial"/></font>"#,
        r#"<font><sz val="8"/><color rgb="FF000000"/><name val="Arial"/></font>"#,
        r#"<font><sz val="8"/><color rgb="FFFFFFFF"/><name val="Arial"/></font>"#,
        r#"<font><u/><sz val="8"/><color rgb="FF0563C1"/><name val="Arial"/></font>"#,
    ];
    let solid = |rgb: &str| {
        format!(
            r#"<fill><patternFill patternType="solid"><fgColor rgb="FF{rgb}"/><bgColor indexed="64"/></patternFill></fill>"#
        )
    };
    let fills = [
        r#"<fill><patternFill patternType="none"/></fill>"#.to_string(),
        r#"<fill><patternFill patternType="gray125"/></fill>"#.to_string(),
        solid("D3D3D3"),
        solid("F2F2F2"),
        solid("17406D"),
        solid("F5F5F5"),
        solid("ADD8E6"),
        solid("00008B"),
    ];
    let borders = [
        "<border><left/><right/><top/><bottom/><diagonal/></border>",
        r#"<border><left style="thin"><color rgb="FF808080"/></left><right style="thin"><color rgb="FF808080"/></right><top style="thin"><color rgb="FF808080"/></top><bottom style="thin"><color rgb="FF808080"/></bottom><diagonal/></border>"#,
    ];

    let mut xfs = vec![r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#.to_string()];
    for (font, fill, centered) in STYLE_FORMATS {
        for link in [false, true] {
            for bordered in [false, true] {
                let font = if link { LINK_FONT } else { font };
                let align = if centered {
                    r#"<alignment horizontal="center" vertical="center" wrapText="1"/>"#
                } else {
                    r#"<alignment vertical="center" wrapText="1"/>"#
                };
                xfs.push(format!(
                    r#"<xf numFmtId="0" fontId="{font}" fillId="{fill}" borderId="{}" xfId="0" applyFont="1" applyFill="1" applyBorder="1" applyAlignment="1">{align}</xf>"#,
                    u32::from(bordered)
                ));
            }
        }
    }

    format!(
        r#"{XML_DECL}<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="{}">{}</fonts><fills count="{}">{}</fills><borders count="{}">{}</borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="{}">{}</cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#,
        fonts.len(),
        fonts.concat(),
        fills.len(),
        fills.concat(),
        borders.len(),
        borders.concat(),
        xfs.len(),
        xfs.concat()
    )
}
