//! Laid-out content: regions, cells and the blocks surfaces draw.

use super::LayoutError;
use std::fmt;

/// Inclusive rectangle of 1-based (column, row) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub first_col: u32,
    pub last_col: u32,
    pub first_row: u32,
    pub last_row: u32,
}

impl Region {
    pub fn width(&self) -> u32 {
        self.last_col - self.first_col + 1
    }

    pub fn height(&self) -> u32 {
        self.last_row - self.first_row + 1
    }

    pub fn contains(&self, col: u32, row: u32) -> bool {
        (self.first_col..=self.last_col).contains(&col)
            && (self.first_row..=self.last_row).contains(&row)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}{}",
            column_letters(self.first_col),
            self.first_row,
            column_letters(self.last_col),
            self.last_row
        )
    }
}

/// Spreadsheet column name for a 1-based index: 1 → A, 27 → AA.
pub fn column_letters(mut col: u32) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push(b'A' + rem as u8);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Visual role of a cell. Each surface maps these to its own formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellStyle {
    Title,
    Heading,
    Label,
    Value,
    ColumnHeader,
    RowLight,
    RowShaded,
    Error,
}

impl CellStyle {
    /// Stable lowercase name, used for CSS classes and test output.
    pub fn name(self) -> &'static str {
        match self {
            CellStyle::Title => "title",
            CellStyle::Heading => "heading",
            CellStyle::Label => "label",
            CellStyle::Value => "value",
            CellStyle::ColumnHeader => "column-header",
            CellStyle::RowLight => "row-light",
            CellStyle::RowShaded => "row-shaded",
            CellStyle::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub link: Option<String>,
    pub style: CellStyle,
}

impl Cell {
    pub fn text(text: impl Into<String>, style: CellStyle) -> Self {
        Self {
            text: text.into(),
            link: None,
            style,
        }
    }

    pub fn link(text: impl Into<String>, target: impl Into<String>, style: CellStyle) -> Self {
        Self {
            text: text.into(),
            link: Some(target.into()),
            style,
        }
    }

    pub fn blank(style: CellStyle) -> Self {
        Self::text("", style)
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Title,
    Heading,
    KeyValue,
    Table,
    Error,
}

/// A region plus the cells drawn into it.
///
/// `rows` is row-major. A merged block has exactly one cell per row spanning
/// the whole band; otherwise every row has one cell per band column.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub region: Region,
    pub rows: Vec<Vec<Cell>>,
    pub merged: bool,
    /// Bordered and auto-sized as one themed range.
    pub themed: bool,
    /// First row is a column-header row.
    pub header_row: bool,
    /// Row height in points, when the block asks for one.
    pub row_height: Option<f64>,
}

impl Block {
    /// A full grid block. Fails if the grid does not exactly cover `region`.
    pub fn grid(kind: BlockKind, region: Region, rows: Vec<Vec<Cell>>) -> Result<Self, LayoutError> {
        let width = region.width() as usize;
        if rows.len() != region.height() as usize || rows.iter().any(|r| r.len() != width) {
            return Err(LayoutError::GridMismatch {
                region,
                rows: rows.len(),
                cols: rows.first().map(Vec::len).unwrap_or(0),
            });
        }
        Ok(Self {
            kind,
            region,
            rows,
            merged: false,
            themed: false,
            header_row: false,
            row_height: None,
        })
    }

    /// One merged row spanning the region's band.
    pub fn merged_row(kind: BlockKind, region: Region, cell: Cell) -> Result<Self, LayoutError> {
        if region.height() != 1 {
            return Err(LayoutError::GridMismatch {
                region,
                rows: 1,
                cols: 1,
            });
        }
        Ok(Self {
            kind,
            region,
            rows: vec![vec![cell]],
            merged: true,
            themed: false,
            header_row: false,
            row_height: None,
        })
    }

    pub fn themed(mut self, themed: bool) -> Self {
        self.themed = themed;
        self
    }

    pub fn with_header_row(mut self, header_row: bool) -> Self {
        self.header_row = header_row;
        self
    }

    pub fn with_row_height(mut self, points: f64) -> Self {
        self.row_height = Some(points);
        self
    }

    /// Every cell with its absolute (column, row) position.
    ///
    /// Merged rows yield a single position at the band's first column.
    pub fn positioned(&self) -> impl Iterator<Item = (u32, u32, &Cell)> {
        let region = self.region;
        self.rows.iter().enumerate().flat_map(move |(r, row)| {
            row.iter()
                .enumerate()
                .map(move |(c, cell)| (region.first_col + c as u32, region.first_row + r as u32, cell))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(first_col: u32, last_col: u32, first_row: u32, last_row: u32) -> Region {
        Region {
            first_col,
            last_col,
            first_row,
            last_row,
        }
    }

    #[test]
    fn column_letters_cover_two_letter_range() {
        assert_eq!(column_letters(1), "A");
        assert_eq!(column_letters(2), "B");
        assert_eq!(column_letters(26), "Z");
        assert_eq!(column_letters(27), "AA");
        assert_eq!(column_letters(52), "AZ");
        assert_eq!(column_letters(703), "AAA");
    }

    #[test]
    fn region_displays_as_range_reference() {
        assert_eq!(region(2, 5, 3, 4).to_string(), "B3:E4");
    }

    #[test]
    fn region_contains_edges() {
        let r = region(2, 3, 1, 2);
        assert!(r.contains(2, 1));
        assert!(r.contains(3, 2));
        assert!(!r.contains(1, 1));
        assert!(!r.contains(2, 3));
    }

    #[test]
    fn grid_rejects_wrong_shape() {
        let rows = vec![vec![Cell::blank(CellStyle::Value)]];
        let err = Block::grid(BlockKind::Table, region(2, 3, 1, 1), rows).unwrap_err();
        assert!(matches!(err, LayoutError::GridMismatch { .. }));
    }

    #[test]
    fn positioned_yields_absolute_coordinates() {
        let rows = vec![
            vec![Cell::text("a", CellStyle::Label), Cell::text("b", CellStyle::Value)],
            vec![Cell::text("c", CellStyle::Label), Cell::text("d", CellStyle::Value)],
        ];
        let block = Block::grid(BlockKind::KeyValue, region(2, 3, 5, 6), rows).unwrap();
        let cells: Vec<(u32, u32, &str)> = block
            .positioned()
            .map(|(c, r, cell)| (c, r, cell.text.as_str()))
            .collect();
        assert_eq!(cells, vec![(2, 5, "a"), (3, 5, "b"), (2, 6, "c"), (3, 6, "d")]);
    }

    #[test]
    fn merged_row_must_be_one_row_high() {
        let cell = Cell::text("Title", CellStyle::Title);
        assert!(Block::merged_row(BlockKind::Title, region(2, 7, 2, 2), cell.clone()).is_ok());
        assert!(Block::merged_row(BlockKind::Title, region(2, 7, 2, 3), cell).is_err());
    }
}
