//! Executes frame plans against a CoreGraphics context.
//!
//! Backgrounds are plain rect fills; text runs are typeset with CoreText and
//! drawn glyph by glyph so every cluster can be centered within its cell
//! span. The system font cascade substitutes fallback fonts during
//! typesetting; the per-run fonts are read back from the line, which is how
//! CJK and emoji stay aligned to the grid even when the fallback's advance
//! differs from the base cell width.

use core_foundation::attributed_string::CFMutableAttributedString;
use core_foundation::base::{CFRange, TCFType};
use core_foundation::number::CFNumber;
use core_foundation::string::CFString;
use core_graphics::base::CGGlyph;
use core_graphics::color::CGColor;
use core_graphics::context::CGContext;
use core_graphics::geometry::{CGPoint, CGRect, CGSize};
use core_text::font::CTFont;
use core_text::line::CTLine;
use core_text::run::CTRun;
use core_text::string_attributes::{
    kCTFontAttributeName, kCTForegroundColorAttributeName, kCTUnderlineStyleAttributeName,
};

use ttk_core::color::DEFAULT_BG;
use ttk_core::{CellRect, Rgb};
use ttk_renderer::overlay::{CURSOR_FILL, MARKED_BG, MARKED_FG, MARKED_SELECTED_BG};
use ttk_renderer::{CellMetrics, Cluster, CursorOverlay, FramePlan, LruCache, MarkedOverlay};

use super::font::FontCache;

// ──────────────────────────────────────────────
// Caches
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct AttrKey {
    pub bold: bool,
    pub color: Rgb,
    pub underline: bool,
}

/// Cached attribute set for one text-run signature. Owns the platform
/// objects; eviction releases them.
pub(crate) struct TextAttributes {
    pub font: CTFont,
    pub color: CGColor,
    pub underline: bool,
}

pub(crate) struct DrawCaches {
    colors: LruCache<Rgb, CGColor>,
    attrs: LruCache<AttrKey, TextAttributes>,
}

impl DrawCaches {
    pub fn new() -> Self {
        DrawCaches { colors: LruCache::new(256), attrs: LruCache::new(100) }
    }

    pub fn clear(&mut self) {
        self.colors.clear();
        self.attrs.clear();
    }

    fn color(&mut self, rgb: Rgb) -> CGColor {
        self.colors.get_or_insert_with(rgb, || cg_color(rgb, 1.0)).clone()
    }

    fn attributes(&mut self, fonts: &FontCache, key: AttrKey) -> &TextAttributes {
        let color = self.color(key.color);
        self.attrs.get_or_insert_with(key, || TextAttributes {
            font: fonts.font(key.bold).clone(),
            color,
            underline: key.underline,
        })
    }
}

fn cg_color(rgb: Rgb, alpha: f64) -> CGColor {
    CGColor::rgb(
        f64::from(rgb.0) / 255.0,
        f64::from(rgb.1) / 255.0,
        f64::from(rgb.2) / 255.0,
        alpha,
    )
}

// ──────────────────────────────────────────────
// Frame execution
// ──────────────────────────────────────────────

/// Erase a cell region to the default background before the passes run.
pub(crate) fn erase_region(
    ctx: &CGContext,
    caches: &mut DrawCaches,
    region: CellRect,
    metrics: CellMetrics,
    offset: (f64, f64),
    grid_rows: usize,
) {
    let color = caches.color(DEFAULT_BG);
    let x = metrics.pixel_x(region.col, offset.0);
    let y = metrics.pixel_y(region.row + region.rows - 1, grid_rows, offset.1);
    ctx.set_fill_color(&color);
    ctx.fill_rect(CGRect::new(
        &CGPoint::new(x, y),
        &CGSize::new(region.cols as f64 * metrics.char_width, region.rows as f64 * metrics.char_height),
    ));
}

pub(crate) fn draw_frame(
    ctx: &CGContext,
    plan: &FramePlan,
    fonts: &FontCache,
    caches: &mut DrawCaches,
    metrics: CellMetrics,
    offset: (f64, f64),
    grid_rows: usize,
) {
    for run in &plan.bg_runs {
        let color = caches.color(run.color);
        fill_cells(ctx, &color, run.row, run.col, run.width, metrics, offset, grid_rows);
    }
    for run in &plan.text_runs {
        draw_text_line(
            ctx,
            &run.text,
            &run.clusters,
            run.row,
            run.color,
            run.bold,
            run.underline,
            fonts,
            caches,
            metrics,
            offset,
            grid_rows,
        );
    }
}

/// Translucent block over the cursor cell, drawn after both passes.
pub(crate) fn draw_cursor(
    ctx: &CGContext,
    overlay: CursorOverlay,
    metrics: CellMetrics,
    offset: (f64, f64),
    grid_rows: usize,
) {
    let (rgb, alpha) = CURSOR_FILL;
    let color = cg_color(rgb, f64::from(alpha));
    fill_cells(ctx, &color, overlay.row, overlay.col, 1, metrics, offset, grid_rows);
}

/// IME composition at the cursor cell: per-cluster backgrounds (lighter for
/// the selected sub-range), then the text with the committed-text centering
/// rule and one underline across the whole composition.
pub(crate) fn draw_marked_text(
    ctx: &CGContext,
    overlay: &MarkedOverlay,
    anchor_row: usize,
    anchor_col: usize,
    fonts: &FontCache,
    caches: &mut DrawCaches,
    metrics: CellMetrics,
    offset: (f64, f64),
    grid_rows: usize,
) {
    for cell in &overlay.cells {
        let rgb = if cell.selected { MARKED_SELECTED_BG } else { MARKED_BG };
        let color = caches.color(rgb);
        fill_cells(
            ctx,
            &color,
            anchor_row,
            anchor_col + cell.col_offset,
            cell.width,
            metrics,
            offset,
            grid_rows,
        );
    }
    let clusters: Vec<Cluster> = overlay
        .clusters
        .iter()
        .map(|c| Cluster {
            utf16_offset: c.utf16_offset,
            col: anchor_col + c.col,
            width: c.width,
        })
        .collect();
    draw_text_line(
        ctx,
        &overlay.text,
        &clusters,
        anchor_row,
        MARKED_FG,
        false,
        true,
        fonts,
        caches,
        metrics,
        offset,
        grid_rows,
    );
}

fn fill_cells(
    ctx: &CGContext,
    color: &CGColor,
    row: usize,
    col: usize,
    width_cells: usize,
    metrics: CellMetrics,
    offset: (f64, f64),
    grid_rows: usize,
) {
    let rect = CGRect::new(
        &CGPoint::new(metrics.pixel_x(col, offset.0), metrics.pixel_y(row, grid_rows, offset.1)),
        &CGSize::new(width_cells as f64 * metrics.char_width, metrics.char_height),
    );
    ctx.set_fill_color(color);
    ctx.fill_rect(rect);
}

// ──────────────────────────────────────────────
// Text runs
// ──────────────────────────────────────────────

struct GlyphRec {
    glyph: CGGlyph,
    x: f64,
    index: usize,
    font: CTFont,
}

#[allow(clippy::too_many_arguments)]
fn draw_text_line(
    ctx: &CGContext,
    text: &str,
    clusters: &[Cluster],
    row: usize,
    color: Rgb,
    bold: bool,
    underline: bool,
    fonts: &FontCache,
    caches: &mut DrawCaches,
    metrics: CellMetrics,
    offset: (f64, f64),
    grid_rows: usize,
) {
    if clusters.is_empty() || text.is_empty() {
        return;
    }
    let attrs = caches.attributes(fonts, AttrKey { bold, color, underline });
    let line = typeset(text, attrs);
    let baseline = metrics.baseline_y(row, grid_rows, offset.1);

    // Flatten the line's runs into glyphs in visual order. Fallback
    // substitution shows up here as runs carrying a different font.
    let mut recs: Vec<GlyphRec> = Vec::new();
    let runs = line.glyph_runs();
    for run in runs.iter() {
        let run: &CTRun = &run;
        let font = run_font(run).unwrap_or_else(|| attrs.font.clone());
        let glyphs = run.glyphs();
        let positions = run.positions();
        let indices = run.string_indices();
        for ((glyph, position), index) in glyphs.iter().zip(positions.iter()).zip(indices.iter()) {
            recs.push(GlyphRec {
                glyph: *glyph,
                x: position.x,
                index: (*index).max(0) as usize,
                font: font.clone(),
            });
        }
    }
    if recs.is_empty() {
        return;
    }
    let line_width = line.get_typographic_bounds().width;

    // Center each cluster's glyphs within its cell span using the measured
    // advance; intra-cluster offsets (combining sequences) are preserved.
    let mut placed: Vec<(CTFont, CGGlyph, CGPoint)> = Vec::with_capacity(recs.len());
    let mut i = 0;
    while i < recs.len() {
        let cluster = cluster_for_index(clusters, recs[i].index);
        let mut j = i + 1;
        while j < recs.len()
            && cluster_for_index(clusters, recs[j].index).utf16_offset == cluster.utf16_offset
        {
            j += 1;
        }
        let cluster_end_x = if j < recs.len() { recs[j].x } else { line_width };
        let advance = (cluster_end_x - recs[i].x).max(0.0);
        let cell_x = metrics.pixel_x(cluster.col, offset.0);
        let shift = cell_x + metrics.glyph_center_dx(advance, cluster.width == 2) - recs[i].x;
        for rec in &recs[i..j] {
            placed.push((rec.font.clone(), rec.glyph, CGPoint::new(rec.x + shift, baseline)));
        }
        i = j;
    }

    ctx.set_fill_color(&attrs.color);
    let mut start = 0;
    while start < placed.len() {
        let font = placed[start].0.clone();
        let mut end = start + 1;
        while end < placed.len() && same_font(&placed[end].0, &font) {
            end += 1;
        }
        let glyphs: Vec<CGGlyph> = placed[start..end].iter().map(|p| p.1).collect();
        let points: Vec<CGPoint> = placed[start..end].iter().map(|p| p.2).collect();
        font.draw_glyphs(&glyphs, &points, ctx.clone());
        start = end;
    }

    if underline {
        let span: usize = clusters.iter().map(|c| c.width).sum();
        let x = metrics.pixel_x(clusters[0].col, offset.0);
        let rect = CGRect::new(
            &CGPoint::new(x, baseline - 2.0),
            &CGSize::new(span as f64 * metrics.char_width, 1.0),
        );
        let color = attrs.color.clone();
        ctx.set_fill_color(&color);
        ctx.fill_rect(rect);
    }
}

fn typeset(text: &str, attrs: &TextAttributes) -> CTLine {
    let mut attributed = CFMutableAttributedString::new();
    attributed.replace_str(&CFString::new(text), CFRange::init(0, 0));
    let range = CFRange::init(0, attributed.char_len());
    unsafe {
        attributed.set_attribute(range, kCTFontAttributeName, &attrs.font.clone());
        attributed.set_attribute(range, kCTForegroundColorAttributeName, &attrs.color.clone());
        if attrs.underline {
            attributed.set_attribute(range, kCTUnderlineStyleAttributeName, &CFNumber::from(1i32));
        }
    }
    CTLine::new_with_attributed_string(attributed.as_concrete_TypeRef())
}

/// The font CoreText actually used for a run (the base font, or a cascade
/// substitute).
fn run_font(run: &CTRun) -> Option<CTFont> {
    let attributes = run.attributes()?;
    let key = unsafe { CFString::wrap_under_get_rule(kCTFontAttributeName) };
    let value = attributes.find(&key)?;
    Some(unsafe { CTFont::wrap_under_get_rule(value.as_CFTypeRef() as _) })
}

/// The cluster containing a UTF-16 index of the run string.
fn cluster_for_index(clusters: &[Cluster], utf16_index: usize) -> &Cluster {
    match clusters.binary_search_by_key(&utf16_index, |c| c.utf16_offset) {
        Ok(i) => &clusters[i],
        Err(0) => &clusters[0],
        Err(i) => &clusters[i - 1],
    }
}

fn same_font(a: &CTFont, b: &CTFont) -> bool {
    std::ptr::eq(a.as_concrete_TypeRef(), b.as_concrete_TypeRef())
}
