//! Frame planning for the TTK desktop backend.
//!
//! The desktop paint path splits in two: this crate walks the grid and turns
//! the dirty region into a platform-free `FramePlan` (background runs, text
//! runs, overlays), and the platform crate executes the plan with native
//! drawing calls. Keeping the batching pure makes the run construction, the
//! performance-critical part of the pipeline, unit-testable without a
//! window.

pub mod batch;
pub mod cache;
pub mod metrics;
pub mod overlay;

pub use batch::{plan_frame, BgRun, Cluster, FramePlan, TextRun};
pub use cache::LruCache;
pub use metrics::CellMetrics;
pub use overlay::{
    cursor_overlay, plan_marked_text, CursorOverlay, MarkedCell, MarkedOverlay, MarkedText,
};
