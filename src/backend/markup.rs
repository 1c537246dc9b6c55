//! Markup surface: one self-contained HTML5 page.
//!
//! Each page of the report is a `<section class="page">`. Titles and
//! headings render as `h1`/`h2`, grids as tables whose cells carry the
//! cell-style name as their class (`label`, `row-shaded`, …). The header
//! graphic is inlined as a base64 data URI so the file has no siblings.
//!
//! Uses [maud](https://maud.lambda.xyz/) like the rest of the HTML output;
//! interpolated text is escaped automatically.

use super::{BackendError, Surface};
use crate::assets::HeaderGraphic;
use crate::config::OutputFormat;
use crate::layout::{Block, BlockKind, Cell};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use maud::{DOCTYPE, Markup, PreEscaped, html};

const CSS: &str = include_str!("../../static/report.css");

enum Item {
    Graphic { src: String, width: u32, height: u32 },
    Block(Block),
}

struct Page {
    name: String,
    items: Vec<Item>,
}

pub struct MarkupSurface {
    title: String,
    pages: Vec<Page>,
    wide: bool,
}

impl MarkupSurface {
    /// `title` becomes the document's `<title>`.
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            pages: Vec::new(),
            wide: false,
        }
    }

    fn current(&mut self) -> Result<&mut Page, BackendError> {
        self.pages
            .last_mut()
            .ok_or_else(|| BackendError::Surface("no section open; call pre_format first".into()))
    }

    fn open_page(&mut self, name: &str) {
        self.pages.push(Page {
            name: name.to_string(),
            items: Vec::new(),
        });
    }
}

impl Surface for MarkupSurface {
    fn format(&self) -> OutputFormat {
        OutputFormat::Html
    }

    fn pre_format(&mut self, name: &str) -> Result<(), BackendError> {
        if self.pages.is_empty() {
            self.open_page(name);
        }
        Ok(())
    }

    fn draw(&mut self, block: &Block) -> Result<(), BackendError> {
        self.current()?.items.push(Item::Block(block.clone()));
        Ok(())
    }

    fn draw_graphic(&mut self, graphic: &HeaderGraphic, _row: u32) -> Result<(), BackendError> {
        let src = format!("data:image/png;base64,{}", STANDARD.encode(&graphic.png));
        self.current()?.items.push(Item::Graphic {
            src,
            width: graphic.width,
            height: graphic.height,
        });
        Ok(())
    }

    fn new_page(&mut self, name: &str) -> Result<(), BackendError> {
        self.open_page(name);
        Ok(())
    }

    fn post_format(&mut self, wide: bool) -> Result<(), BackendError> {
        self.current()?;
        self.wide = wide;
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>, BackendError> {
        if self.pages.is_empty() {
            return Err(BackendError::Surface("document has no sections".into()));
        }
        let body_class = self.wide.then_some("wide");
        let content = html! {
            @for page in &self.pages {
                (render_page(page))
            }
        };
        Ok(base_document(&self.title, body_class, content)
            .into_string()
            .into_bytes())
    }
}

// ============================================================================
// HTML Components
// ============================================================================

fn base_document(title: &str, body_class: Option<&str>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(CSS)) }
            }
            body class=[body_class] {
                (content)
            }
        }
    }
}

fn render_page(page: &Page) -> Markup {
    html! {
        section.page data-name=(page.name) {
            @for item in &page.items {
                @match item {
                    Item::Graphic { src, width, height } => {
                        img.header-graphic src=(src) width=(width) height=(height) alt="";
                    }
                    Item::Block(block) => {
                        (render_block(block))
                    }
                }
            }
        }
    }
}

fn render_block(block: &Block) -> Markup {
    match block.kind {
        BlockKind::Title => html! {
            h1.title { (first_text(block)) }
        },
        BlockKind::Heading => html! {
            h2.heading { (first_text(block)) }
        },
        BlockKind::KeyValue | BlockKind::Table | BlockKind::Error => {
            let span = block.merged.then_some(block.region.width());
            html! {
                table class=[block.themed.then_some("themed")] {
                    @for (i, row) in block.rows.iter().enumerate() {
                        tr {
                            @for cell in row {
                                @if block.header_row && i == 0 {
                                    th class=(cell.style.name()) colspan=[span] { (render_cell(cell)) }
                                } @else {
                                    td class=(cell.style.name()) colspan=[span] { (render_cell(cell)) }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn render_cell(cell: &Cell) -> Markup {
    html! {
        @if let Some(link) = &cell.link {
            a href=(link) { (cell.text) }
        } @else {
            (cell.text)
        }
    }
}

fn first_text(block: &Block) -> &str {
    block
        .rows
        .first()
        .and_then(|r| r.first())
        .map(|c| c.text.as_str())
        .unwrap_or("")
}
