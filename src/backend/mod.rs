//! Report backends: the capability contract and the surfaces behind it.
//!
//! The pipeline talks to a [`ReportBackend`]: one method per section
//! primitive plus formatting and save. Every backend is a [`Generator`]
//! wrapped around a [`Surface`]. The generator owns the cursor and runs the
//! layout algorithms; the surface only draws finished blocks.
//!
//! | Surface | Output |
//! |---------|--------|
//! | [`spreadsheet::SpreadsheetSurface`] | `.xlsx` workbook, one worksheet per page |
//! | [`document::DocumentSurface`] | `.docx` document, page breaks between pages |
//! | [`markup::MarkupSurface`] | single HTML page, one `<section>` per page |
//!
//! `save` consumes the backend. If anything fails before that, dropping the
//! backend discards the partial output; nothing reaches the disk except the
//! cached header graphic.

pub mod document;
pub mod markup;
pub mod ooxml;
pub mod spreadsheet;

use crate::assets::{AssetCache, AssetError, HeaderGraphic};
use crate::config::{OutputFormat, RenderOptions, ReportSettings};
use crate::layout::{self, Block, Cursor, LayoutError, LinkRule};
use crate::lookup::NamedLookup;
use crate::records::RecordSet;
use log::debug;
use thiserror::Error;

/// Name of the first surface of every report.
pub const FIRST_SURFACE_NAME: &str = "Release Notes";

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),
    #[error("Surface error: {0}")]
    Surface(String),
}

/// Finished report: bytes plus how to name and serve them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: &'static str,
}

/// Everything the generation pipeline can ask a backend to do.
pub trait ReportBackend {
    fn format(&self) -> OutputFormat;

    /// Open the first surface.
    fn pre_format(&mut self) -> Result<(), BackendError>;

    /// Banner in the top-left corner of the first surface.
    fn create_header_graphic(&mut self) -> Result<(), BackendError>;

    fn create_title(&mut self, text: &str) -> Result<(), BackendError>;

    /// Section heading across the active band.
    fn create_header(&mut self, text: &str) -> Result<(), BackendError>;

    fn create_horizontal_table(
        &mut self,
        lookup: &NamedLookup,
        splits: usize,
        header: bool,
    ) -> Result<(), BackendError>;

    /// Fails with [`LayoutError::MalformedTable`] (wrapped) when the records
    /// are absent or empty. Nothing is drawn in that case.
    fn create_vertical_table(
        &mut self,
        records: Option<&RecordSet>,
        header: bool,
    ) -> Result<(), BackendError>;

    /// Heading plus one `label | value` row. The value links to `link`
    /// when one is given.
    fn create_named_section(
        &mut self,
        name: &str,
        label: &str,
        value: &str,
        link: Option<&str>,
    ) -> Result<(), BackendError>;

    fn create_error_message(&mut self, message: &str) -> Result<(), BackendError>;

    /// Post-format the current surface, then open a new one.
    fn create_new_page(&mut self, name: &str) -> Result<(), BackendError>;

    fn post_format(&mut self, wide: bool) -> Result<(), BackendError>;

    fn save(self: Box<Self>) -> Result<Artifact, BackendError>;
}

/// A drawing target for laid-out blocks.
pub trait Surface {
    fn format(&self) -> OutputFormat;

    /// Open the first page.
    fn pre_format(&mut self, name: &str) -> Result<(), BackendError>;

    fn draw(&mut self, block: &Block) -> Result<(), BackendError>;

    /// Place the banner at the top-left, occupying `row`.
    fn draw_graphic(&mut self, graphic: &HeaderGraphic, row: u32) -> Result<(), BackendError>;

    fn new_page(&mut self, name: &str) -> Result<(), BackendError>;

    fn post_format(&mut self, wide: bool) -> Result<(), BackendError>;

    fn finish(self) -> Result<Vec<u8>, BackendError>;
}

/// Backend built from a surface: owns the cursor, settings and asset cache.
pub struct Generator<S: Surface> {
    surface: S,
    cursor: Cursor,
    settings: ReportSettings,
    options: RenderOptions,
    assets: AssetCache,
}

impl<S: Surface> Generator<S> {
    pub fn new(surface: S, settings: ReportSettings, options: RenderOptions) -> Self {
        let assets = AssetCache::new(&options.assets.cache_dir);
        Self {
            surface,
            cursor: Cursor::first_surface(),
            settings,
            options,
            assets,
        }
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn draw(&mut self, block: &Block) -> Result<(), BackendError> {
        debug!("{:?} block at {}", block.kind, block.region);
        self.surface.draw(block)
    }
}

impl<S: Surface> ReportBackend for Generator<S> {
    fn format(&self) -> OutputFormat {
        self.surface.format()
    }

    fn pre_format(&mut self) -> Result<(), BackendError> {
        self.surface.pre_format(FIRST_SURFACE_NAME)
    }

    fn create_header_graphic(&mut self) -> Result<(), BackendError> {
        let (graphic, _) = self.assets.header_graphic()?;
        self.surface
            .draw_graphic(&graphic, self.cursor.current_row())?;
        self.cursor.advance_row(0);
        Ok(())
    }

    fn create_title(&mut self, text: &str) -> Result<(), BackendError> {
        let block = layout::place_title(&mut self.cursor, text, self.options.layout.title_width)?;
        self.draw(&block)
    }

    fn create_header(&mut self, text: &str) -> Result<(), BackendError> {
        let block = layout::place_heading(&mut self.cursor, text)?;
        self.draw(&block)
    }

    fn create_horizontal_table(
        &mut self,
        lookup: &NamedLookup,
        splits: usize,
        header: bool,
    ) -> Result<(), BackendError> {
        let placed = layout::place_key_value(
            &mut self.cursor,
            lookup,
            splits,
            header,
            LinkRule::SourceKey,
            &self.settings,
        )?;
        match placed {
            Some(block) => self.draw(&block),
            None => {
                debug!("{} has no entries, nothing placed", lookup.name());
                Ok(())
            }
        }
    }

    fn create_vertical_table(
        &mut self,
        records: Option<&RecordSet>,
        header: bool,
    ) -> Result<(), BackendError> {
        let block = layout::place_table(&mut self.cursor, records, header, &self.settings)?;
        self.draw(&block)
    }

    fn create_named_section(
        &mut self,
        name: &str,
        label: &str,
        value: &str,
        link: Option<&str>,
    ) -> Result<(), BackendError> {
        let (heading, row) = layout::place_named_section(
            &mut self.cursor,
            name,
            label,
            value,
            link,
            &self.settings,
        )?;
        self.draw(&heading)?;
        if let Some(row) = row {
            self.draw(&row)?;
        }
        Ok(())
    }

    fn create_error_message(&mut self, message: &str) -> Result<(), BackendError> {
        let block =
            layout::place_error(&mut self.cursor, message, self.options.layout.error_merge)?;
        self.draw(&block)
    }

    fn create_new_page(&mut self, name: &str) -> Result<(), BackendError> {
        self.surface.post_format(self.options.layout.wide)?;
        self.surface.new_page(name)?;
        self.cursor.reset();
        Ok(())
    }

    fn post_format(&mut self, wide: bool) -> Result<(), BackendError> {
        self.surface.post_format(wide)
    }

    fn save(self: Box<Self>) -> Result<Artifact, BackendError> {
        let format = self.surface.format();
        let file_name = format!("{}.{}", self.settings.file_stem(), format.extension());
        let bytes = self.surface.finish()?;
        Ok(Artifact {
            bytes,
            file_name,
            mime_type: format.mime_type(),
        })
    }
}

/// Construct the backend for `format`.
///
/// Fails with [`BackendError::Unavailable`] when the host cannot support a
/// report (the asset cache directory cannot be created).
pub fn open_backend(
    format: OutputFormat,
    settings: ReportSettings,
    options: RenderOptions,
) -> Result<Box<dyn ReportBackend>, BackendError> {
    std::fs::create_dir_all(&options.assets.cache_dir).map_err(|e| {
        BackendError::Unavailable(format!(
            "cannot prepare asset cache {}: {e}",
            options.assets.cache_dir
        ))
    })?;

    let backend: Box<dyn ReportBackend> = match format {
        OutputFormat::Xlsx => Box::new(Generator::new(
            spreadsheet::SpreadsheetSurface::new(),
            settings,
            options,
        )),
        OutputFormat::Docx => Box::new(Generator::new(
            document::DocumentSurface::new(),
            settings,
            options,
        )),
        OutputFormat::Html => Box::new(Generator::new(
            markup::MarkupSurface::new(settings.title_text()),
            settings,
            options,
        )),
    };
    Ok(backend)
}
