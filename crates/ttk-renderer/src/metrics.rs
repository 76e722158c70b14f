//! Cell metrics and grid↔pixel coordinate mapping.
//!
//! Grid origin is top-left; the native drawing origin is bottom-left, so the
//! row axis flips when converting. All pixel values are in points (the
//! platform applies its own backing scale).

/// Monospace cell metrics measured from the configured font.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    pub char_width: f64,
    /// Line height: ascent + descent + leading, rounded up.
    pub char_height: f64,
    pub ascent: f64,
}

impl CellMetrics {
    /// Left pixel edge of a column.
    pub fn pixel_x(&self, col: usize, offset_x: f64) -> f64 {
        col as f64 * self.char_width + offset_x
    }

    /// Bottom pixel edge of a row in flipped (bottom-left origin) space.
    pub fn pixel_y(&self, row: usize, grid_rows: usize, offset_y: f64) -> f64 {
        (grid_rows.saturating_sub(row + 1)) as f64 * self.char_height + offset_y
    }

    /// Text baseline for a row: the cell bottom plus descent and leading.
    pub fn baseline_y(&self, row: usize, grid_rows: usize, offset_y: f64) -> f64 {
        self.pixel_y(row, grid_rows, offset_y) + (self.char_height - self.ascent)
    }

    /// Grid dimensions that fit a content area, floored, at least 1×1.
    pub fn grid_size(&self, content_width: f64, content_height: f64) -> (usize, usize) {
        let rows = (content_height / self.char_height).floor() as usize;
        let cols = (content_width / self.char_width).floor() as usize;
        (rows.max(1), cols.max(1))
    }

    /// Offset that centers a `rows`×`cols` grid in a content area.
    pub fn centering_offset(
        &self,
        content_width: f64,
        content_height: f64,
        rows: usize,
        cols: usize,
    ) -> (f64, f64) {
        let used_w = cols as f64 * self.char_width;
        let used_h = rows as f64 * self.char_height;
        (((content_width - used_w) / 2.0).max(0.0), ((content_height - used_h) / 2.0).max(0.0))
    }

    /// Content size snapped down to whole cells.
    pub fn snap_size(&self, content_width: f64, content_height: f64) -> (f64, f64) {
        let (rows, cols) = self.grid_size(content_width, content_height);
        (cols as f64 * self.char_width, rows as f64 * self.char_height)
    }

    /// Horizontal offset that centers a glyph of the given advance within a
    /// one- or two-cell span. Fallback fonts may produce advances that
    /// differ from the base cell width.
    pub fn glyph_center_dx(&self, advance: f64, wide: bool) -> f64 {
        let span = self.char_width * if wide { 2.0 } else { 1.0 };
        (span - advance) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> CellMetrics {
        CellMetrics { char_width: 8.0, char_height: 16.0, ascent: 12.0 }
    }

    #[test]
    fn row_axis_flips() {
        let m = metrics();
        // last row touches the bottom of the content area
        assert_eq!(m.pixel_y(23, 24, 0.0), 0.0);
        assert_eq!(m.pixel_y(0, 24, 0.0), 23.0 * 16.0);
        assert_eq!(m.pixel_x(10, 2.0), 82.0);
    }

    #[test]
    fn baseline_sits_descent_above_cell_bottom() {
        let m = metrics();
        assert_eq!(m.baseline_y(23, 24, 0.0), 4.0);
    }

    #[test]
    fn grid_size_floors_with_minimum() {
        let m = metrics();
        assert_eq!(m.grid_size(640.0, 384.0), (24, 80));
        assert_eq!(m.grid_size(647.9, 390.0), (24, 80));
        assert_eq!(m.grid_size(1.0, 1.0), (1, 1));
    }

    #[test]
    fn snap_rounds_down_to_whole_cells() {
        let m = metrics();
        assert_eq!(m.snap_size(645.0, 390.0), (640.0, 384.0));
    }

    #[test]
    fn glyph_centering_splits_slack() {
        let m = metrics();
        assert_eq!(m.glyph_center_dx(8.0, false), 0.0);
        assert_eq!(m.glyph_center_dx(6.0, false), 1.0);
        assert_eq!(m.glyph_center_dx(15.0, true), 0.5);
    }
}
