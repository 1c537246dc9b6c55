//! Stacked key/value layout.
//!
//! `k` facts laid out with `s` splits become `2s` columns × `⌈k/s⌉` rows,
//! filled row by row. Odd columns (1st, 3rd, …) hold labels, even columns
//! hold values:
//!
//! ```text
//! splits = 2, keys = A B C D E
//!
//! | A | a | B | b |
//! | C | c | D | d |
//! | E | e |   |   |
//! ```

use super::{Cell, CellStyle, LayoutError};
use crate::config::ReportSettings;
use crate::lookup::NamedLookup;

/// Key whose value links to the version-control browser.
pub const SOURCE_KEY: &str = "Source";

/// Which values render as hyperlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkRule<'a> {
    /// Only the `Source` value, pointing at version control.
    #[default]
    SourceKey,
    /// Every value, pointing at the given target.
    AllValues(&'a str),
    /// No value is a link.
    Plain,
}

/// Rows needed for `keys` facts over `splits` label/value pairs.
pub fn row_count(keys: usize, splits: usize) -> usize {
    keys.div_ceil(splits)
}

/// Lay out `lookup` as a `row_count × 2·splits` grid of cells.
pub fn key_value_grid(
    lookup: &NamedLookup,
    splits: usize,
    rule: LinkRule<'_>,
    settings: &ReportSettings,
) -> Result<Vec<Vec<Cell>>, LayoutError> {
    if splits == 0 {
        return Err(LayoutError::ZeroSplits);
    }
    if splits.checked_mul(2).is_none_or(|cols| u32::try_from(cols).is_err()) {
        return Err(LayoutError::TooLarge {
            rows: row_count(lookup.len(), splits),
            cols: splits.saturating_mul(2),
        });
    }

    let rows = row_count(lookup.len(), splits);
    let mut entries = lookup.iter();
    let mut grid = Vec::with_capacity(rows);

    for _ in 0..rows {
        let mut row = Vec::with_capacity(splits * 2);
        for _ in 0..splits {
            match entries.next() {
                Some((key, value)) => {
                    row.push(Cell::text(key, CellStyle::Label));
                    row.push(value_cell(key, value, rule, settings));
                }
                None => {
                    row.push(Cell::blank(CellStyle::Label));
                    row.push(Cell::blank(CellStyle::Value));
                }
            }
        }
        grid.push(row);
    }
    Ok(grid)
}

fn value_cell(key: &str, value: &str, rule: LinkRule<'_>, settings: &ReportSettings) -> Cell {
    match rule {
        LinkRule::SourceKey if key == SOURCE_KEY => {
            Cell::link(value, settings.version_control_url(), CellStyle::Value)
        }
        LinkRule::AllValues(target) => Cell::link(value, target, CellStyle::Value),
        LinkRule::SourceKey | LinkRule::Plain => Cell::text(value, CellStyle::Value),
    }
}
