//! Layout engine: turns report data into positioned [`Block`]s.
//!
//! Everything here is surface-agnostic. A surface receives finished blocks and
//! only decides how to draw them; row and column arithmetic lives in this
//! module and its children.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`cursor`] | Current row, region start, active column band |
//! | [`cell`] | Regions, cells, blocks |
//! | [`horizontal`] | Stacked key/value grids |
//! | [`vertical`] | Column-per-field tables |
//!
//! The `place_*` functions run the full placement protocol against a cursor
//! (mark, band, extend, advance) and return the block to draw. A function
//! that fails leaves the cursor untouched.

pub mod cell;
pub mod cursor;
pub mod horizontal;
pub mod vertical;

pub use cell::{Block, BlockKind, Cell, CellStyle, Region, column_letters};
pub use cursor::Cursor;
pub use horizontal::LinkRule;

use crate::config::{ErrorMerge, ReportSettings};
use crate::lookup::NamedLookup;
use crate::records::RecordSet;
use thiserror::Error;

/// Row height of the title band, in points.
pub const TITLE_ROW_HEIGHT: f64 = 30.0;
/// Row height of table and error rows, in points.
pub const TABLE_ROW_HEIGHT: f64 = 24.0;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("splits must be at least 1")]
    ZeroSplits,
    #[error("{0}")]
    MalformedTable(String),
    #[error("{rows}x{cols} grid does not fit region {region}")]
    GridMismatch { region: Region, rows: usize, cols: usize },
    #[error("{rows}x{cols} grid is too large to place")]
    TooLarge { rows: usize, cols: usize },
}

/// Grid dimensions as a `(width, height)` the cursor can claim.
fn grid_size(cols: usize, rows: usize) -> Result<(u32, u32), LayoutError> {
    let too_large = || LayoutError::TooLarge { rows, cols };
    let width = u32::try_from(cols).map_err(|_| too_large())?;
    let height = u32::try_from(rows).map_err(|_| too_large())?;
    Ok((width, height))
}

/// Title: one merged row across `width` columns, then a blank row.
pub fn place_title(cursor: &mut Cursor, text: &str, width: u32) -> Result<Block, LayoutError> {
    let region = cursor.claim(width, 1);
    let block = Block::merged_row(BlockKind::Title, region, Cell::text(text, CellStyle::Title))?
        .themed(true)
        .with_row_height(TITLE_ROW_HEIGHT);
    cursor.advance_row(1);
    Ok(block)
}

/// Heading: one merged row across the active band. The next region starts
/// directly beneath it.
pub fn place_heading(cursor: &mut Cursor, text: &str) -> Result<Block, LayoutError> {
    let region = cursor.claim(cursor.column_count(), 1);
    let block =
        Block::merged_row(BlockKind::Heading, region, Cell::text(text, CellStyle::Heading))?;
    cursor.advance_row(0);
    cursor.mark_region_start();
    Ok(block)
}

/// Key/value grid of `2·splits` columns. An empty lookup places nothing.
pub fn place_key_value(
    cursor: &mut Cursor,
    lookup: &NamedLookup,
    splits: usize,
    header: bool,
    rule: LinkRule<'_>,
    settings: &ReportSettings,
) -> Result<Option<Block>, LayoutError> {
    let grid = horizontal::key_value_grid(lookup, splits, rule, settings)?;
    if grid.is_empty() {
        return Ok(None);
    }
    let (width, height) = grid_size(splits * 2, grid.len())?;
    let region = cursor.claim(width, height);
    let block = Block::grid(BlockKind::KeyValue, region, grid)?.themed(header);
    cursor.advance_row(1);
    Ok(Some(block))
}

/// Vertical table as wide as the record set. Preconditions are checked
/// before the cursor moves.
pub fn place_table(
    cursor: &mut Cursor,
    records: Option<&RecordSet>,
    header: bool,
    settings: &ReportSettings,
) -> Result<Block, LayoutError> {
    let grid = vertical::table_grid(records, header, settings)?;
    let (width, height) = grid_size(grid.first().map(Vec::len).unwrap_or(0), grid.len())?;
    let region = cursor.claim(width, height);
    let block = Block::grid(BlockKind::Table, region, grid)?
        .themed(true)
        .with_header_row(header)
        .with_row_height(TABLE_ROW_HEIGHT);
    cursor.advance_row(1);
    Ok(block)
}

/// Error row across the active band.
pub fn place_error(
    cursor: &mut Cursor,
    message: &str,
    merge: ErrorMerge,
) -> Result<Block, LayoutError> {
    let region = cursor.claim(cursor.column_count(), 1);
    let first = Cell::text(message, CellStyle::Error);
    let block = match merge {
        ErrorMerge::Row => Block::merged_row(BlockKind::Error, region, first)?,
        ErrorMerge::Cell => {
            let mut row = vec![first];
            row.resize(region.width() as usize, Cell::blank(CellStyle::Error));
            Block::grid(BlockKind::Error, region, vec![row])?
        }
    }
    .themed(true)
    .with_row_height(TABLE_ROW_HEIGHT);
    cursor.advance_row(1);
    Ok(block)
}

/// Named hyperlink section: a heading over a one-pair `label | value` row.
/// The value links to `link` when one is given and is plain text otherwise.
pub fn place_named_section(
    cursor: &mut Cursor,
    name: &str,
    label: &str,
    value: &str,
    link: Option<&str>,
    settings: &ReportSettings,
) -> Result<(Block, Option<Block>), LayoutError> {
    let lookup = NamedLookup::new(name).with(label, value);
    let rule = link.map_or(LinkRule::Plain, LinkRule::AllValues);
    let heading = place_heading(cursor, name)?;
    let row = place_key_value(cursor, &lookup, 1, true, rule, settings)?;
    Ok((heading, row))
}

/// Message shown in place of a table that could not be laid out.
pub fn table_error_message(reason: &impl std::fmt::Display) -> String {
    format!("Table could not be created. {reason}")
}
