//! Two-pass run batching.
//!
//! Pass 1 collects horizontal runs of adjacent cells sharing an effective
//! background color; pass 2 collects runs of contiguous non-empty cells
//! sharing a `(bold, foreground, underline)` signature, each flushed as one
//! typeset-line draw. Empty cells are skipped entirely, and REVERSE is
//! resolved before either pass so the swapped background lands in pass 1 and
//! the swapped foreground in pass 2.

use ttk_core::{Attributes, CellRect, ColorPairs, Grid, Rgb};

/// One background fill: `width` cells starting at `(row, col)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BgRun {
    pub row: usize,
    pub col: usize,
    pub width: usize,
    pub color: Rgb,
}

/// One grapheme cluster inside a text run. `utf16_offset` locates the
/// cluster in the run's string (native text APIs index in UTF-16 units);
/// `col` is its absolute grid column and `width` its cell span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cluster {
    pub utf16_offset: usize,
    pub col: usize,
    pub width: usize,
}

/// One typeset-line draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub row: usize,
    pub col: usize,
    pub text: String,
    pub bold: bool,
    pub underline: bool,
    pub color: Rgb,
    /// Total width in cells.
    pub width: usize,
    pub clusters: Vec<Cluster>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FramePlan {
    pub bg_runs: Vec<BgRun>,
    pub text_runs: Vec<TextRun>,
}

/// Batch the dirty region of a grid into draw runs.
pub fn plan_frame(grid: &Grid, pairs: &ColorPairs, dirty: CellRect) -> FramePlan {
    let mut plan = FramePlan::default();
    let Some(dirty) = dirty.clamp_to(grid.rows(), grid.cols()) else {
        return plan;
    };

    for row in dirty.row..dirty.end_row() {
        let cells = match grid.row(row) {
            Some(cells) => cells,
            None => continue,
        };
        let (start, end) = expand_to_whole_glyphs(cells, dirty.col, dirty.end_col());
        plan_backgrounds(&mut plan, pairs, cells, row, start, end);
        plan_text(&mut plan, pairs, cells, row, start, end);
    }

    log::debug!(
        "planned frame: {} bg runs, {} text runs",
        plan.bg_runs.len(),
        plan.text_runs.len()
    );
    plan
}

/// Widen a row span so it never starts on a placeholder or ends on a cut
/// wide lead, since half a glyph cannot be drawn.
fn expand_to_whole_glyphs(cells: &[ttk_core::Cell], start: usize, end: usize) -> (usize, usize) {
    let mut start = start;
    if start > 0 && cells[start].is_placeholder() {
        start -= 1;
    }
    let mut end = end;
    if end < cells.len() && cells[end - 1].is_wide_lead() {
        end += 1;
    }
    (start, end)
}

fn plan_backgrounds(
    plan: &mut FramePlan,
    pairs: &ColorPairs,
    cells: &[ttk_core::Cell],
    row: usize,
    start: usize,
    end: usize,
) {
    let mut run: Option<BgRun> = None;
    for col in start..end {
        let cell = &cells[col];
        if cell.is_empty() {
            if let Some(run) = run.take() {
                plan.bg_runs.push(run);
            }
            continue;
        }
        let (_, bg) = pairs.effective(cell.color_pair, cell.attrs);
        match run {
            Some(ref mut current) if current.color == bg => current.width += 1,
            _ => {
                if let Some(run) = run.take() {
                    plan.bg_runs.push(run);
                }
                run = Some(BgRun { row, col, width: 1, color: bg });
            }
        }
    }
    if let Some(run) = run {
        plan.bg_runs.push(run);
    }
}

fn plan_text(
    plan: &mut FramePlan,
    pairs: &ColorPairs,
    cells: &[ttk_core::Cell],
    row: usize,
    start: usize,
    end: usize,
) {
    let mut run: Option<TextRun> = None;
    let mut utf16_len = 0usize;
    for col in start..end {
        let cell = &cells[col];
        if cell.is_empty() {
            if let Some(run) = run.take() {
                plan.text_runs.push(run);
            }
            continue;
        }
        if cell.is_placeholder() {
            // covered by the wide lead already in the run
            continue;
        }
        let grapheme = match cell.grapheme() {
            Some(g) => g,
            None => continue,
        };
        let (fg, _) = pairs.effective(cell.color_pair, cell.attrs);
        let bold = cell.attrs.contains(Attributes::BOLD);
        let underline = cell.attrs.contains(Attributes::UNDERLINE);
        let cluster_width = if cell.is_wide_lead() { 2 } else { 1 };

        let extend = run.as_ref().is_some_and(|current| {
            current.bold == bold
                && current.underline == underline
                && current.color == fg
                && current.col + current.width == col
        });
        if !extend {
            if let Some(finished) = run.take() {
                plan.text_runs.push(finished);
            }
            run = Some(TextRun {
                row,
                col,
                text: String::new(),
                bold,
                underline,
                color: fg,
                width: 0,
                clusters: Vec::new(),
            });
            utf16_len = 0;
        }
        if let Some(current) = run.as_mut() {
            current.clusters.push(Cluster { utf16_offset: utf16_len, col, width: cluster_width });
            current.text.push_str(grapheme);
            current.width += cluster_width;
            utf16_len += grapheme.encode_utf16().count();
        }
    }
    if let Some(run) = run {
        plan.text_runs.push(run);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ttk_core::Attributes;

    fn full(grid: &Grid) -> CellRect {
        CellRect::new(0, 0, grid.rows(), grid.cols())
    }

    #[test]
    fn empty_grid_plans_nothing() {
        let grid = Grid::new(24, 80);
        let pairs = ColorPairs::new();
        let plan = plan_frame(&grid, &pairs, full(&grid));
        assert!(plan.bg_runs.is_empty());
        assert!(plan.text_runs.is_empty());
    }

    #[test]
    fn full_uniform_grid_batches_one_run_per_row() {
        let mut grid = Grid::new(24, 80);
        let pairs = ColorPairs::new();
        let line = "x".repeat(80);
        for row in 0..24 {
            grid.draw_text(row as i32, 0, &line, 1, Attributes::empty());
        }
        let plan = plan_frame(&grid, &pairs, full(&grid));
        assert_eq!(plan.bg_runs.len(), 24);
        assert_eq!(plan.text_runs.len(), 24);
        assert_eq!(plan.bg_runs[0].width, 80);
        assert_eq!(plan.text_runs[0].width, 80);
    }

    #[test]
    fn reverse_swaps_background_and_foreground() {
        let mut grid = Grid::new(1, 4);
        let mut pairs = ColorPairs::new();
        pairs.set(7, Rgb(255, 0, 0), Rgb(0, 0, 255)).unwrap();
        grid.draw_text(0, 0, "X", 7, Attributes::REVERSE);
        let plan = plan_frame(&grid, &pairs, full(&grid));
        assert_eq!(plan.bg_runs.len(), 1);
        assert_eq!(plan.bg_runs[0].color, Rgb(255, 0, 0));
        assert_eq!(plan.text_runs.len(), 1);
        assert_eq!(plan.text_runs[0].color, Rgb(0, 0, 255));
    }

    #[test]
    fn runs_break_on_signature_change() {
        let mut grid = Grid::new(1, 10);
        let mut pairs = ColorPairs::new();
        pairs.set(1, Rgb(10, 10, 10), Rgb(0, 0, 0)).unwrap();
        grid.draw_text(0, 0, "ab", 1, Attributes::empty());
        grid.draw_text(0, 2, "cd", 1, Attributes::BOLD);
        let plan = plan_frame(&grid, &pairs, full(&grid));
        // same background everywhere → one bg run
        assert_eq!(plan.bg_runs.len(), 1);
        assert_eq!(plan.bg_runs[0].width, 4);
        // bold break → two text runs
        assert_eq!(plan.text_runs.len(), 2);
        assert_eq!(plan.text_runs[0].text, "ab");
        assert!(!plan.text_runs[0].bold);
        assert_eq!(plan.text_runs[1].text, "cd");
        assert!(plan.text_runs[1].bold);
    }

    #[test]
    fn empty_cells_split_runs() {
        let mut grid = Grid::new(1, 10);
        let pairs = ColorPairs::new();
        grid.draw_text(0, 0, "ab", 1, Attributes::empty());
        grid.draw_text(0, 5, "cd", 1, Attributes::empty());
        let plan = plan_frame(&grid, &pairs, full(&grid));
        assert_eq!(plan.bg_runs.len(), 2);
        assert_eq!(plan.text_runs.len(), 2);
        assert_eq!(plan.text_runs[1].col, 5);
    }

    #[test]
    fn wide_clusters_carry_offsets_and_span() {
        let mut grid = Grid::new(1, 10);
        let pairs = ColorPairs::new();
        grid.draw_text(0, 1, "aあb", 1, Attributes::empty());
        let plan = plan_frame(&grid, &pairs, full(&grid));
        assert_eq!(plan.text_runs.len(), 1);
        let run = &plan.text_runs[0];
        assert_eq!(run.text, "aあb");
        assert_eq!(run.col, 1);
        assert_eq!(run.width, 4);
        assert_eq!(
            run.clusters,
            vec![
                Cluster { utf16_offset: 0, col: 1, width: 1 },
                Cluster { utf16_offset: 1, col: 2, width: 2 },
                Cluster { utf16_offset: 2, col: 4, width: 1 },
            ]
        );
        // the background run covers the placeholder cell too
        assert_eq!(plan.bg_runs[0].width, 4);
    }

    #[test]
    fn dirty_region_limits_planning() {
        let mut grid = Grid::new(4, 10);
        let pairs = ColorPairs::new();
        for row in 0..4 {
            grid.draw_text(row, 0, "0123456789", 1, Attributes::empty());
        }
        let plan = plan_frame(&grid, &pairs, CellRect::new(1, 2, 2, 3));
        assert_eq!(plan.text_runs.len(), 2);
        assert_eq!(plan.text_runs[0].row, 1);
        assert_eq!(plan.text_runs[0].col, 2);
        assert_eq!(plan.text_runs[0].text, "234");
    }

    #[test]
    fn dirty_region_expands_to_whole_glyphs() {
        let mut grid = Grid::new(1, 10);
        let pairs = ColorPairs::new();
        grid.draw_text(0, 0, "あい", 1, Attributes::empty());
        // dirty rect starts on あ's placeholder and ends on い's lead
        let plan = plan_frame(&grid, &pairs, CellRect::new(0, 1, 1, 2));
        assert_eq!(plan.text_runs.len(), 1);
        let run = &plan.text_runs[0];
        assert_eq!(run.col, 0);
        assert_eq!(run.text, "あい");
        assert_eq!(run.width, 4);
    }

    #[test]
    fn underline_and_reverse_combine_per_run() {
        let mut grid = Grid::new(1, 6);
        let mut pairs = ColorPairs::new();
        pairs.set(3, Rgb(200, 200, 200), Rgb(20, 20, 20)).unwrap();
        grid.draw_text(0, 0, "ab", 3, Attributes::UNDERLINE | Attributes::REVERSE);
        grid.draw_text(0, 2, "cd", 3, Attributes::UNDERLINE);
        let plan = plan_frame(&grid, &pairs, full(&grid));
        // the reverse half paints the fg as background, splitting pass 1
        assert_eq!(plan.bg_runs.len(), 2);
        assert_eq!(plan.bg_runs[0].color, Rgb(200, 200, 200));
        assert_eq!(plan.bg_runs[1].color, Rgb(20, 20, 20));
        // and the swapped foreground splits pass 2 despite equal underline
        assert_eq!(plan.text_runs.len(), 2);
        assert!(plan.text_runs.iter().all(|r| r.underline));
        assert_eq!(plan.text_runs[0].color, Rgb(20, 20, 20));
        assert_eq!(plan.text_runs[1].color, Rgb(200, 200, 200));
    }

    #[test]
    fn dirty_region_outside_shrunken_grid_is_ignored() {
        let grid = Grid::new(2, 2);
        let pairs = ColorPairs::new();
        let plan = plan_frame(&grid, &pairs, CellRect::new(5, 5, 4, 4));
        assert!(plan.bg_runs.is_empty() && plan.text_runs.is_empty());
    }

    #[test]
    fn default_pair_cells_still_get_background_runs() {
        let mut grid = Grid::new(1, 5);
        let pairs = ColorPairs::new();
        grid.draw_text(0, 0, "hi", 0, Attributes::BOLD);
        let plan = plan_frame(&grid, &pairs, full(&grid));
        assert_eq!(plan.bg_runs.len(), 1);
        assert_eq!(plan.bg_runs[0].color, Rgb::BLACK);
    }
}
