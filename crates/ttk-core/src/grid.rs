//! Backend-neutral character grid and its drawing primitives.
//!
//! The grid is a dense row-major array of cells. Wide (double-width)
//! graphemes occupy a lead cell plus a placeholder cell immediately to its
//! right; every write repairs any wide glyph it would cut in half, on either
//! side, before landing. Both backends share this model; the terminal
//! backend mirrors it because the terminal's native read-back is 8-bit lossy
//! and cannot recover wide characters.

use crate::width;
use crate::Attributes;

// ──────────────────────────────────────────────
// Cells
// ──────────────────────────────────────────────

/// What a cell displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellContent {
    /// One grapheme cluster; `wide` means it also claims the next cell.
    Glyph { text: String, wide: bool },
    /// The right half of the wide glyph in the cell to the left. Its color
    /// pair and attributes mirror the lead cell's.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub content: CellContent,
    pub color_pair: u16,
    pub attrs: Attributes,
}

impl Cell {
    /// A space in the default color pair with no attributes. Renderers skip
    /// these entirely.
    pub fn empty() -> Self {
        Cell {
            content: CellContent::Glyph { text: " ".to_string(), wide: false },
            color_pair: 0,
            attrs: Attributes::empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.color_pair == 0
            && self.attrs.is_empty()
            && matches!(&self.content, CellContent::Glyph { text, wide: false } if text == " ")
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.content, CellContent::Placeholder)
    }

    pub fn is_wide_lead(&self) -> bool {
        matches!(self.content, CellContent::Glyph { wide: true, .. })
    }

    /// The displayed grapheme, if any.
    pub fn grapheme(&self) -> Option<&str> {
        match &self.content {
            CellContent::Glyph { text, .. } => Some(text),
            CellContent::Placeholder => None,
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::empty()
    }
}

// ──────────────────────────────────────────────
// Grid
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Grid {
            rows,
            cols,
            cells: vec![vec![Cell::empty(); cols]; rows],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(row)?.get(col)
    }

    pub fn row(&self, row: usize) -> Option<&[Cell]> {
        self.cells.get(row).map(Vec::as_slice)
    }

    // ── Drawing primitives ──────────────────────

    pub fn clear(&mut self) {
        for row in &mut self.cells {
            for cell in row {
                *cell = Cell::empty();
            }
        }
    }

    /// Clear a rectangle, clipped to the grid. Wide glyphs cut at the region
    /// boundary are repaired like any other overwrite.
    pub fn clear_region(&mut self, row: i32, col: i32, height: i32, width: i32) {
        if height <= 0 || width <= 0 {
            return;
        }
        let r0 = row.max(0) as i64;
        let r1 = (i64::from(row) + i64::from(height)).min(self.rows as i64);
        for r in r0..r1 {
            self.draw_hline(r as i32, col, ' ', width, 0);
        }
    }

    /// Write `text` starting at `(row, col)`, one grapheme cluster per cell
    /// (two for wide clusters). A negative start column discards leading
    /// clusters, each advancing by its own width, until the column is
    /// non-negative; the tail is clipped at the right edge.
    pub fn draw_text(&mut self, row: i32, col: i32, text: &str, color_pair: u16, attrs: Attributes) {
        if row < 0 || row as usize >= self.rows || self.cols == 0 {
            return;
        }
        let row = row as usize;
        let mut col = i64::from(col);
        for (grapheme, w) in width::clusters(text) {
            if col >= self.cols as i64 {
                break;
            }
            if col < 0 {
                col += w as i64;
                continue;
            }
            self.put(row, col as usize, grapheme, w == 2, color_pair, attrs);
            col += w as i64;
        }
    }

    /// Fill a row span with `length` repetitions of `ch`.
    pub fn draw_hline(&mut self, row: i32, col: i32, ch: char, length: i32, color_pair: u16) {
        if row < 0 || row as usize >= self.rows || length <= 0 || self.cols == 0 {
            return;
        }
        let row = row as usize;
        let text = ch.to_string();
        let w = width::cell_width(&text) as i64;
        let mut col = i64::from(col);
        let mut remaining = i64::from(length);
        if col < 0 {
            let skip = ((-col) + w - 1) / w;
            let skip = skip.min(remaining);
            col += skip * w;
            remaining -= skip;
        }
        while remaining > 0 && col < self.cols as i64 {
            self.put(row, col as usize, &text, w == 2, color_pair, Attributes::empty());
            col += w;
            remaining -= 1;
        }
    }

    /// Fill a column span with `length` repetitions of `ch`.
    pub fn draw_vline(&mut self, row: i32, col: i32, ch: char, length: i32, color_pair: u16) {
        if col < 0 || col as usize >= self.cols || length <= 0 {
            return;
        }
        let col = col as usize;
        let text = ch.to_string();
        let wide = width::is_wide(&text);
        let r0 = row.max(0) as i64;
        let r1 = (i64::from(row) + i64::from(length)).min(self.rows as i64);
        for r in r0..r1 {
            self.put(r as usize, col, &text, wide, color_pair, Attributes::empty());
        }
    }

    /// Draw a rectangle. Filled rectangles are spaces in the requested color
    /// pair; outlined rectangles use box-drawing characters, degenerating to
    /// a single corner, a row of horizontals, or a column of verticals for
    /// 1×1, 1×N, and N×1 geometries.
    pub fn draw_rect(
        &mut self,
        row: i32,
        col: i32,
        height: i32,
        width: i32,
        color_pair: u16,
        filled: bool,
    ) {
        if height <= 0 || width <= 0 {
            return;
        }
        if filled {
            let r0 = row.max(0) as i64;
            let r1 = (i64::from(row) + i64::from(height)).min(self.rows as i64);
            for r in r0..r1 {
                self.draw_hline(r as i32, col, ' ', width, color_pair);
            }
            return;
        }

        let bottom = i64::from(row) + i64::from(height) - 1;
        let right = i64::from(col) + i64::from(width) - 1;
        match (height, width) {
            (1, 1) => self.put_corner(i64::from(row), i64::from(col), '┌', color_pair),
            (1, _) => {
                self.put_corner(i64::from(row), i64::from(col), '┌', color_pair);
                self.hline_span(i64::from(row), i64::from(col) + 1, width - 2, color_pair);
                self.put_corner(i64::from(row), right, '┐', color_pair);
            }
            (_, 1) => {
                self.put_corner(i64::from(row), i64::from(col), '┌', color_pair);
                self.vline_span(i64::from(row) + 1, i64::from(col), height - 2, color_pair);
                self.put_corner(bottom, i64::from(col), '└', color_pair);
            }
            _ => {
                self.put_corner(i64::from(row), i64::from(col), '┌', color_pair);
                self.hline_span(i64::from(row), i64::from(col) + 1, width - 2, color_pair);
                self.put_corner(i64::from(row), right, '┐', color_pair);
                self.vline_span(i64::from(row) + 1, i64::from(col), height - 2, color_pair);
                self.vline_span(i64::from(row) + 1, right, height - 2, color_pair);
                self.put_corner(bottom, i64::from(col), '└', color_pair);
                self.hline_span(bottom, i64::from(col) + 1, width - 2, color_pair);
                self.put_corner(bottom, right, '┘', color_pair);
            }
        }
    }

    /// Content-preserving resize: the overlapping region is copied, new
    /// cells start empty. A wide lead that sat clipped at the old right edge
    /// regains its placeholder when the grid grows past it.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        let old_cols = self.cols;
        let mut next = vec![vec![Cell::empty(); cols]; rows];
        for r in 0..rows.min(self.rows) {
            for c in 0..cols.min(old_cols) {
                next[r][c] = self.cells[r][c].clone();
            }
            if cols > old_cols && old_cols > 0 {
                let last = old_cols - 1;
                if next[r][last].is_wide_lead() {
                    let color_pair = next[r][last].color_pair;
                    let attrs = next[r][last].attrs;
                    next[r][last + 1] = Cell { content: CellContent::Placeholder, color_pair, attrs };
                }
            }
        }
        self.cells = next;
        self.rows = rows;
        self.cols = cols;
    }

    // ── Cell writes and placeholder repair ──────

    fn put_corner(&mut self, row: i64, col: i64, ch: char, color_pair: u16) {
        if row < 0 || row >= self.rows as i64 || col < 0 || col >= self.cols as i64 {
            return;
        }
        self.put(row as usize, col as usize, &ch.to_string(), false, color_pair, Attributes::empty());
    }

    fn hline_span(&mut self, row: i64, col: i64, length: i32, color_pair: u16) {
        if row < 0 || row >= self.rows as i64 {
            return;
        }
        self.draw_hline(row as i32, col.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32, '─', length, color_pair);
    }

    fn vline_span(&mut self, row: i64, col: i64, length: i32, color_pair: u16) {
        if col < 0 || col >= self.cols as i64 {
            return;
        }
        self.draw_vline(row.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32, col as i32, '│', length, color_pair);
    }

    /// Write one glyph at `(row, col)`, repairing any wide glyph the write
    /// would cut in half. `(row, col)` must be in bounds.
    fn put(&mut self, row: usize, col: usize, grapheme: &str, wide: bool, color_pair: u16, attrs: Attributes) {
        self.repair_for_write(row, col);
        let claims_next = wide && col + 1 < self.cols;
        if claims_next {
            self.repair_for_write(row, col + 1);
        }
        self.cells[row][col] = Cell {
            content: CellContent::Glyph { text: grapheme.to_string(), wide },
            color_pair,
            attrs,
        };
        if claims_next {
            self.cells[row][col + 1] = Cell { content: CellContent::Placeholder, color_pair, attrs };
        }
    }

    /// Repair before overwriting `(row, col)`: a placeholder means the lead
    /// to the left loses its right half; a wide lead means the placeholder to
    /// the right loses its left half. The repaired cell becomes a space and
    /// keeps its own previous color pair and attributes.
    fn repair_for_write(&mut self, row: usize, col: usize) {
        match self.cells[row][col].content {
            CellContent::Placeholder => {
                if col > 0 && self.cells[row][col - 1].is_wide_lead() {
                    self.cells[row][col - 1].content =
                        CellContent::Glyph { text: " ".to_string(), wide: false };
                }
            }
            CellContent::Glyph { wide: true, .. } => {
                if col + 1 < self.cols && self.cells[row][col + 1].is_placeholder() {
                    self.cells[row][col + 1].content =
                        CellContent::Glyph { text: " ".to_string(), wide: false };
                }
            }
            CellContent::Glyph { .. } => {}
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
