//! Cursor and IME marked-text overlays, drawn after both batching passes.

use ttk_core::{width, Cursor, Grid, Rgb};

use crate::batch::Cluster;

/// Cursor fill: translucent white, visible over typical backgrounds.
pub const CURSOR_FILL: (Rgb, f32) = (Rgb::WHITE, 0.8);

/// Composition backgrounds: dark for the marked text, lighter for the
/// selected sub-range.
pub const MARKED_BG: Rgb = Rgb(40, 40, 40);
pub const MARKED_SELECTED_BG: Rgb = Rgb(90, 90, 110);
pub const MARKED_FG: Rgb = Rgb(235, 235, 235);

// ──────────────────────────────────────────────
// Cursor
// ──────────────────────────────────────────────

/// The cell to overdraw with the translucent cursor block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorOverlay {
    pub row: usize,
    pub col: usize,
}

/// `None` when the cursor is hidden or outside the grid. Cursor rendering
/// never mutates batched runs; it only overdraws the cursor cell.
pub fn cursor_overlay(cursor: &Cursor, grid: &Grid) -> Option<CursorOverlay> {
    if !cursor.visible || cursor.row >= grid.rows() || cursor.col >= grid.cols() {
        return None;
    }
    Some(CursorOverlay { row: cursor.row, col: cursor.col })
}

// ──────────────────────────────────────────────
// Marked text (IME composition)
// ──────────────────────────────────────────────

/// In-progress IME composition. Lives on the desktop backend, never in the
/// grid; it is rendered on top of committed cells, anchored at the cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkedText {
    pub text: String,
    /// Selected sub-range as `(offset, length)` in UTF-16 units, the way the
    /// platform input context reports it.
    pub selected: (usize, usize),
}

impl MarkedText {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn set(&mut self, text: String, selected: (usize, usize)) {
        self.text = text;
        self.selected = selected;
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.selected = (0, 0);
    }
}

/// Background cell of the composition, relative to the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkedCell {
    pub col_offset: usize,
    pub width: usize,
    pub selected: bool,
}

/// Everything needed to draw a composition: per-cluster backgrounds, the
/// text with cluster geometry for glyph centering (cluster columns are
/// offsets from the anchor), and one underline across the whole width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedOverlay {
    pub cells: Vec<MarkedCell>,
    pub text: String,
    pub clusters: Vec<Cluster>,
    /// Total width in cells; also the underline span.
    pub width: usize,
}

pub fn plan_marked_text(marked: &MarkedText) -> Option<MarkedOverlay> {
    if marked.is_empty() {
        return None;
    }
    let (sel_start, sel_len) = marked.selected;
    let sel_end = sel_start.saturating_add(sel_len);

    let mut cells = Vec::new();
    let mut clusters = Vec::new();
    let mut col = 0usize;
    let mut utf16 = 0usize;
    for (grapheme, w) in width::clusters(&marked.text) {
        let units = grapheme.encode_utf16().count();
        let selected = sel_len > 0 && utf16 < sel_end && utf16 + units > sel_start;
        cells.push(MarkedCell { col_offset: col, width: w, selected });
        clusters.push(Cluster { utf16_offset: utf16, col, width: w });
        col += w;
        utf16 += units;
    }

    Some(MarkedOverlay { cells, text: marked.text.clone(), clusters, width: col })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ttk_core::Attributes;

    #[test]
    fn hidden_or_out_of_grid_cursor_draws_nothing() {
        let grid = Grid::new(2, 2);
        let hidden = Cursor { row: 0, col: 0, visible: false };
        assert_eq!(cursor_overlay(&hidden, &grid), None);
        let outside = Cursor { row: 5, col: 0, visible: true };
        assert_eq!(cursor_overlay(&outside, &grid), None);
    }

    #[test]
    fn visible_cursor_overlays_its_cell() {
        let mut grid = Grid::new(2, 4);
        grid.draw_text(1, 2, "x", 0, Attributes::empty());
        let cursor = Cursor { row: 1, col: 2, visible: true };
        assert_eq!(cursor_overlay(&cursor, &grid), Some(CursorOverlay { row: 1, col: 2 }));
    }

    #[test]
    fn empty_marked_text_plans_nothing() {
        assert_eq!(plan_marked_text(&MarkedText::default()), None);
    }

    #[test]
    fn marked_text_cells_follow_cluster_widths() {
        let mut marked = MarkedText::default();
        marked.set("かな".to_string(), (0, 0));
        let overlay = plan_marked_text(&marked).unwrap();
        assert_eq!(overlay.width, 4);
        assert_eq!(
            overlay.cells,
            vec![
                MarkedCell { col_offset: 0, width: 2, selected: false },
                MarkedCell { col_offset: 2, width: 2, selected: false },
            ]
        );
        assert_eq!(overlay.clusters[1].utf16_offset, 1);
    }

    #[test]
    fn selected_range_highlights_its_clusters() {
        let mut marked = MarkedText::default();
        marked.set("abc".to_string(), (1, 1));
        let overlay = plan_marked_text(&marked).unwrap();
        let selected: Vec<bool> = overlay.cells.iter().map(|c| c.selected).collect();
        assert_eq!(selected, vec![false, true, false]);
    }

    #[test]
    fn surrogate_pair_clusters_use_utf16_offsets() {
        // 😀 is two UTF-16 units wide; the selection covers only the emoji.
        let mut marked = MarkedText::default();
        marked.set("a😀b".to_string(), (1, 2));
        let overlay = plan_marked_text(&marked).unwrap();
        assert_eq!(
            overlay.clusters,
            vec![
                Cluster { utf16_offset: 0, col: 0, width: 1 },
                Cluster { utf16_offset: 1, col: 1, width: 2 },
                Cluster { utf16_offset: 3, col: 3, width: 1 },
            ]
        );
        let selected: Vec<bool> = overlay.cells.iter().map(|c| c.selected).collect();
        assert_eq!(selected, vec![false, true, false]);
        assert_eq!(overlay.width, 4);
    }

    #[test]
    fn zero_length_selection_highlights_nothing() {
        let mut marked = MarkedText::default();
        marked.set("abc".to_string(), (1, 0));
        let overlay = plan_marked_text(&marked).unwrap();
        assert!(overlay.cells.iter().all(|c| !c.selected));
    }

    #[test]
    fn clear_resets_state() {
        let mut marked = MarkedText::default();
        marked.set("x".to_string(), (0, 1));
        marked.clear();
        assert!(marked.is_empty());
        assert_eq!(marked.selected, (0, 0));
    }
}
