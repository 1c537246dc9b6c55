//! The layout cursor: where the next region goes on the current surface.
//!
//! Rows and columns are 1-based. The column offset is fixed per surface; the
//! band width changes per region. `current_row` only moves forward until the
//! next [`reset`](Cursor::reset).
//!
//! Every region is placed the same way:
//!
//! ```text
//! mark_region_start()        start_row = current_row
//! active_band(width)         column_count = width
//! extend_region(height)      current_row = start_row + height - 1
//! ... draw [offset, offset+width-1] × [start_row, current_row] ...
//! advance_row(1)             one blank row before the next region
//! ```

use super::Region;

/// Column where every surface's content starts (column A stays empty).
pub const COLUMN_OFFSET: u32 = 2;
/// Band width a surface starts with.
pub const DEFAULT_BAND: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    current_row: u32,
    start_row: u32,
    column_offset: u32,
    column_count: u32,
}

impl Cursor {
    /// Cursor for the first surface. Row 1 is left free for the header graphic.
    pub fn first_surface() -> Self {
        Self {
            current_row: 1,
            start_row: 1,
            column_offset: COLUMN_OFFSET,
            column_count: DEFAULT_BAND,
        }
    }

    /// Cursor state for every surface opened after the first.
    pub fn new_surface() -> Self {
        Self {
            current_row: 2,
            ..Self::first_surface()
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new_surface();
    }

    pub fn current_row(&self) -> u32 {
        self.current_row
    }

    pub fn start_row(&self) -> u32 {
        self.start_row
    }

    pub fn column_offset(&self) -> u32 {
        self.column_offset
    }

    pub fn column_count(&self) -> u32 {
        self.column_count
    }

    /// Move down `1 + extra` rows.
    pub fn advance_row(&mut self, extra: u32) {
        self.current_row += 1 + extra;
    }

    pub fn mark_region_start(&mut self) {
        self.start_row = self.current_row;
    }

    /// Set the width of the active band. Zero is clamped to one column.
    pub fn active_band(&mut self, width: u32) {
        self.column_count = width.max(1);
    }

    /// Stretch the current region to `height` rows (at least one).
    pub fn extend_region(&mut self, height: u32) {
        self.current_row = self.start_row + height.max(1) - 1;
    }

    /// The rectangle between the region start and the current row.
    pub fn region(&self) -> Region {
        Region {
            first_col: self.column_offset,
            last_col: self.column_offset + self.column_count - 1,
            first_row: self.start_row,
            last_row: self.current_row,
        }
    }

    /// Mark, size and extend a region in one step.
    pub fn claim(&mut self, width: u32, height: u32) -> Region {
        self.mark_region_start();
        self.active_band(width);
        self.extend_region(height);
        self.region()
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::first_surface()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn first_surface_starts_on_row_one() {
        let c = Cursor::first_surface();
        assert_eq!(c.current_row(), 1);
        assert_eq!(c.start_row(), 1);
        assert_eq!(c.column_offset(), 2);
        assert_eq!(c.column_count(), 4);
    }

    #[test]
    fn reset_returns_to_new_surface_state() {
        let mut c = Cursor::first_surface();
        c.claim(6, 3);
        c.advance_row(4);
        c.reset();
        assert_eq!(c, Cursor::new_surface());
        assert_eq!(c.current_row(), 2);
        assert_eq!(c.start_row(), 1);
    }

    #[test]
    fn claim_covers_band_and_height() {
        let mut c = Cursor::new_surface();
        let r = c.claim(4, 3);
        assert_eq!(
            r,
            Region {
                first_col: 2,
                last_col: 5,
                first_row: 2,
                last_row: 4
            }
        );
        assert_eq!(c.current_row(), 4);
    }

    #[test]
    fn single_row_region() {
        let mut c = Cursor::new_surface();
        let r = c.claim(2, 1);
        assert_eq!(r.first_row, r.last_row);
        assert_eq!(r.width(), 2);
    }

    #[test]
    fn zero_width_band_clamped() {
        let mut c = Cursor::new_surface();
        c.active_band(0);
        assert_eq!(c.column_count(), 1);
    }

    proptest! {
        #[test]
        fn prop_two_zero_advances_equal_one_gap(start in 1u32..1000) {
            let mut a = Cursor::new_surface();
            a.advance_row(start);
            let mut b = a;
            a.advance_row(0);
            a.advance_row(0);
            b.advance_row(1);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_regions_never_overlap(heights in proptest::collection::vec(1u32..20, 1..10)) {
            let mut c = Cursor::new_surface();
            let mut last_row = 0;
            for h in heights {
                let r = c.claim(4, h);
                prop_assert!(r.first_row > last_row);
                prop_assert!(r.first_row <= r.last_row);
                prop_assert_eq!(r.height(), h);
                last_row = r.last_row;
                c.advance_row(1);
            }
        }
    }
}
