//! Frame-planning throughput on a typical 80×24 screen.
//!
//! The paint budget is 10 ms per full frame on desktop hardware; batching
//! must leave essentially all of it for the native draw calls.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ttk_core::{Attributes, CellRect, ColorPairs, Grid};
use ttk_renderer::plan_frame;

fn filled_grid() -> (Grid, ColorPairs) {
    let mut grid = Grid::new(24, 80);
    let mut pairs = ColorPairs::new();
    for id in 1..=8u16 {
        pairs
            .set(id, ttk_core::Rgb(id as u8 * 20, 0, 0), ttk_core::Rgb(0, id as u8 * 20, 0))
            .unwrap();
    }
    for row in 0..24 {
        let pair = (row % 8 + 1) as u16;
        let attrs = if row % 3 == 0 { Attributes::BOLD } else { Attributes::empty() };
        grid.draw_text(row as i32, 0, &"x".repeat(70), pair, attrs);
        grid.draw_text(row as i32, 70, "あいうえお", pair, attrs);
    }
    (grid, pairs)
}

fn bench_plan_frame(c: &mut Criterion) {
    let (grid, pairs) = filled_grid();
    let full = CellRect::new(0, 0, grid.rows(), grid.cols());

    c.bench_function("plan_frame_80x24_full", |b| {
        b.iter(|| plan_frame(black_box(&grid), black_box(&pairs), black_box(full)))
    });

    let region = CellRect::new(4, 10, 8, 40);
    c.bench_function("plan_frame_80x24_region", |b| {
        b.iter(|| plan_frame(black_box(&grid), black_box(&pairs), black_box(region)))
    });

    let empty = Grid::new(24, 80);
    c.bench_function("plan_frame_80x24_empty", |b| {
        b.iter(|| plan_frame(black_box(&empty), black_box(&pairs), black_box(full)))
    });
}

criterion_group!(benches, bench_plan_frame);
criterion_main!(benches);
