//! Dirty-region bookkeeping in cell coordinates.
//!
//! `refresh` marks the whole grid, `refresh_region` a sub-rectangle; marks
//! accumulated before the next paint cycle are unioned into one rectangle.

/// A rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub row: usize,
    pub col: usize,
    pub rows: usize,
    pub cols: usize,
}

impl CellRect {
    pub fn new(row: usize, col: usize, rows: usize, cols: usize) -> Self {
        CellRect { row, col, rows, cols }
    }

    /// Build a rect from signed arguments, clipped to a `grid_rows` ×
    /// `grid_cols` grid. Returns `None` when nothing remains.
    pub fn from_signed(
        row: i32,
        col: i32,
        height: i32,
        width: i32,
        grid_rows: usize,
        grid_cols: usize,
    ) -> Option<Self> {
        if height <= 0 || width <= 0 {
            return None;
        }
        let r0 = i64::from(row).max(0);
        let c0 = i64::from(col).max(0);
        let r1 = (i64::from(row) + i64::from(height)).min(grid_rows as i64);
        let c1 = (i64::from(col) + i64::from(width)).min(grid_cols as i64);
        if r0 >= r1 || c0 >= c1 {
            return None;
        }
        Some(CellRect {
            row: r0 as usize,
            col: c0 as usize,
            rows: (r1 - r0) as usize,
            cols: (c1 - c0) as usize,
        })
    }

    pub fn end_row(&self) -> usize {
        self.row + self.rows
    }

    pub fn end_col(&self) -> usize {
        self.col + self.cols
    }

    /// Smallest rectangle covering both.
    pub fn union(self, other: CellRect) -> CellRect {
        let row = self.row.min(other.row);
        let col = self.col.min(other.col);
        let end_row = self.end_row().max(other.end_row());
        let end_col = self.end_col().max(other.end_col());
        CellRect { row, col, rows: end_row - row, cols: end_col - col }
    }

    /// Intersect with a grid that may have shrunk since the mark.
    pub fn clamp_to(self, grid_rows: usize, grid_cols: usize) -> Option<CellRect> {
        let rows = self.end_row().min(grid_rows).saturating_sub(self.row);
        let cols = self.end_col().min(grid_cols).saturating_sub(self.col);
        if rows == 0 || cols == 0 {
            None
        } else {
            Some(CellRect { row: self.row, col: self.col, rows, cols })
        }
    }
}

/// Accumulated repaint area, drained once per paint cycle.
#[derive(Debug, Default)]
pub struct DirtyRegion {
    pending: Option<CellRect>,
}

impl DirtyRegion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_all(&mut self, grid_rows: usize, grid_cols: usize) {
        if grid_rows > 0 && grid_cols > 0 {
            self.mark(CellRect::new(0, 0, grid_rows, grid_cols));
        }
    }

    pub fn mark(&mut self, rect: CellRect) {
        self.pending = Some(match self.pending {
            Some(current) => current.union(rect),
            None => rect,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_none()
    }

    /// Drain the accumulated rectangle.
    pub fn take(&mut self) -> Option<CellRect> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_signed_clips_to_grid() {
        let rect = CellRect::from_signed(-2, -3, 10, 10, 5, 6).unwrap();
        assert_eq!(rect, CellRect::new(0, 0, 5, 6));
    }

    #[test]
    fn from_signed_rejects_empty() {
        assert_eq!(CellRect::from_signed(0, 0, 0, 5, 10, 10), None);
        assert_eq!(CellRect::from_signed(20, 0, 2, 2, 10, 10), None);
        assert_eq!(CellRect::from_signed(0, -5, 2, 3, 10, 10), None);
    }

    #[test]
    fn union_covers_both() {
        let a = CellRect::new(0, 0, 2, 2);
        let b = CellRect::new(5, 7, 1, 3);
        assert_eq!(a.union(b), CellRect::new(0, 0, 6, 10));
    }

    #[test]
    fn marks_accumulate_until_taken() {
        let mut dirty = DirtyRegion::new();
        assert!(dirty.is_empty());
        dirty.mark(CellRect::new(1, 1, 1, 1));
        dirty.mark(CellRect::new(3, 4, 1, 1));
        assert_eq!(dirty.take(), Some(CellRect::new(1, 1, 3, 4)));
        assert!(dirty.is_empty());
        assert_eq!(dirty.take(), None);
    }

    #[test]
    fn clamp_to_shrunken_grid() {
        let rect = CellRect::new(2, 2, 10, 10);
        assert_eq!(rect.clamp_to(5, 5), Some(CellRect::new(2, 2, 3, 3)));
        assert_eq!(rect.clamp_to(2, 5), None);
    }
}
