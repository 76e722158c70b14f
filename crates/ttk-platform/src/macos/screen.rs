//! DesktopScreen: the `Screen` implementation owning the native window, the
//! view, and the shared render state.
//!
//! The view and the window delegate hold weak back-references to the render
//! state (the screen owns the strong one), so paint callbacks can read the
//! grid and caches without a reference cycle.

use std::cell::RefCell;
use std::rc::Rc;

use objc2::rc::Retained;
use objc2::runtime::AnyObject;
use objc2::{msg_send, msg_send_id};
use objc2_app_kit::{NSApplication, NSApplicationActivationPolicy, NSEvent, NSWindow};
use objc2_foundation::{MainThreadMarker, NSDate, NSPoint, NSRect, NSSize, NSString};

use ttk_core::{
    Attributes, CellRect, ColorPairs, Cursor, DirtyRegion, Error, EventHandler, Grid, Result,
    Rgb, Screen, ScreenConfig,
};
use ttk_renderer::{CellMetrics, MarkedText};

use super::draw::DrawCaches;
use super::font::FontCache;
use super::pasteboard;
use super::view::TtkView;
use super::window::{create_window, TtkWindowDelegate};

// ──────────────────────────────────────────────
// Shared render state
// ──────────────────────────────────────────────

pub(crate) struct RenderState {
    pub grid: Grid,
    pub pairs: ColorPairs,
    pub cursor: Cursor,
    pub marked: MarkedText,
    pub dirty: DirtyRegion,
    pub metrics: CellMetrics,
    /// Centering offset of the grid within the content area, in points.
    pub offset: (f64, f64),
    pub fonts: FontCache,
    pub caches: DrawCaches,
    pub handler: Option<Box<dyn EventHandler>>,
}

/// Invoke the application handler with the state borrow released, so the
/// handler can call back into the screen (draw, move the cursor, refresh)
/// without tripping the RefCell.
pub(crate) fn dispatch_event(
    state: &Rc<RefCell<RenderState>>,
    deliver: impl FnOnce(&mut dyn EventHandler) -> bool,
) -> bool {
    let handler = state.borrow_mut().handler.take();
    let mut consumed = false;
    if let Some(mut handler) = handler {
        consumed = deliver(handler.as_mut());
        let mut state = state.borrow_mut();
        if state.handler.is_none() {
            state.handler = Some(handler);
        }
    }
    consumed
}

// ──────────────────────────────────────────────
// DesktopScreen
// ──────────────────────────────────────────────

struct WindowParts {
    window: Retained<NSWindow>,
    view: Retained<TtkView>,
    // setDelegate: does not retain; keeping it here keeps it alive
    _delegate: Retained<TtkWindowDelegate>,
    mtm: MainThreadMarker,
}

pub struct DesktopScreen {
    config: ScreenConfig,
    state: Option<Rc<RefCell<RenderState>>>,
    parts: Option<WindowParts>,
    /// Handler registered before initialize() (or recovered at shutdown).
    pending_handler: Option<Box<dyn EventHandler>>,
}

impl DesktopScreen {
    pub fn new(config: &ScreenConfig) -> Result<Self> {
        Ok(DesktopScreen {
            config: config.clone(),
            state: None,
            parts: None,
            pending_handler: None,
        })
    }

    fn with_state<R: Default>(&self, f: impl FnOnce(&mut RenderState) -> R) -> R {
        match &self.state {
            Some(state) => f(&mut state.borrow_mut()),
            None => R::default(),
        }
    }

    fn request_redraw(&self) {
        if let Some(parts) = &self.parts {
            unsafe { parts.view.setNeedsDisplay(true) };
        }
    }

    /// Invalidate only the pixels covering a cell rect.
    fn request_redraw_rect(&self, rect: CellRect) {
        let Some(parts) = &self.parts else {
            return;
        };
        let pixel: Option<NSRect> = self.with_state(|state| {
            let rows = state.grid.rows();
            if rows == 0 {
                return None;
            }
            Some(NSRect::new(
                NSPoint::new(
                    state.metrics.pixel_x(rect.col, state.offset.0),
                    state.metrics.pixel_y(rect.row + rect.rows - 1, rows, state.offset.1),
                ),
                NSSize::new(
                    rect.cols as f64 * state.metrics.char_width,
                    rect.rows as f64 * state.metrics.char_height,
                ),
            ))
        });
        if let Some(pixel) = pixel {
            unsafe { parts.view.setNeedsDisplayInRect(pixel) };
        }
    }
}

impl Screen for DesktopScreen {
    fn initialize(&mut self) -> Result<()> {
        if self.state.is_some() {
            return Ok(());
        }
        let mtm = MainThreadMarker::new().ok_or(Error::UnsupportedPlatform(
            "the desktop backend must run on the main thread",
        ))?;
        let app = NSApplication::sharedApplication(mtm);
        app.setActivationPolicy(NSApplicationActivationPolicy::Regular);

        let fonts = FontCache::new(&self.config.font_family, self.config.font_size)?;
        let metrics = fonts.metrics();
        let rows = self.config.rows.max(1);
        let cols = self.config.cols.max(1);
        let content_width = cols as f64 * metrics.char_width;
        let content_height = rows as f64 * metrics.char_height;

        let state = Rc::new(RefCell::new(RenderState {
            grid: Grid::new(rows, cols),
            pairs: ColorPairs::new(),
            cursor: Cursor::default(),
            marked: MarkedText::default(),
            dirty: DirtyRegion::new(),
            metrics,
            offset: (0.0, 0.0),
            fonts,
            caches: DrawCaches::new(),
            handler: self.pending_handler.take(),
        }));

        let window = create_window(&self.config.title, content_width, content_height, mtm);
        let view = TtkView::new(Rc::downgrade(&state), mtm);
        window.setContentView(Some(&view));
        let responder: &objc2_app_kit::NSResponder = &view;
        window.makeFirstResponder(Some(responder));

        let delegate = TtkWindowDelegate::new(Rc::downgrade(&state), mtm);
        unsafe {
            let _: () = msg_send![&window, setDelegate: &*delegate];
        }

        window.makeKeyAndOrderFront(None);
        // activate() requires macOS 14+; keep the deprecated variant for 13.
        #[allow(deprecated)]
        app.activateIgnoringOtherApps(true);

        state.borrow_mut().dirty.mark_all(rows, cols);
        unsafe { view.setNeedsDisplay(true) };

        self.state = Some(state);
        self.parts = Some(WindowParts { window, view, _delegate: delegate, mtm });
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Some(parts) = self.parts.take() {
            unsafe {
                let _: () = msg_send![&parts.window, setDelegate: std::ptr::null::<AnyObject>()];
            }
            parts.window.close();
        }
        if let Some(state) = self.state.take() {
            let mut state = state.borrow_mut();
            state.pairs.clear();
            state.caches.clear();
            self.pending_handler = state.handler.take();
        }
    }

    fn dimensions(&self) -> (usize, usize) {
        self.with_state(|state| state.grid.dimensions())
    }

    fn clear(&mut self) {
        self.with_state(|state| state.grid.clear());
    }

    fn clear_region(&mut self, row: i32, col: i32, height: i32, width: i32) {
        self.with_state(|state| state.grid.clear_region(row, col, height, width));
    }

    fn draw_text(&mut self, row: i32, col: i32, text: &str, color_pair: u16, attrs: Attributes) {
        self.with_state(|state| state.grid.draw_text(row, col, text, color_pair, attrs));
    }

    fn draw_hline(&mut self, row: i32, col: i32, ch: char, length: i32, color_pair: u16) {
        self.with_state(|state| state.grid.draw_hline(row, col, ch, length, color_pair));
    }

    fn draw_vline(&mut self, row: i32, col: i32, ch: char, length: i32, color_pair: u16) {
        self.with_state(|state| state.grid.draw_vline(row, col, ch, length, color_pair));
    }

    fn draw_rect(
        &mut self,
        row: i32,
        col: i32,
        height: i32,
        width: i32,
        color_pair: u16,
        filled: bool,
    ) {
        self.with_state(|state| state.grid.draw_rect(row, col, height, width, color_pair, filled));
    }

    fn refresh(&mut self) {
        self.with_state(|state| {
            let (rows, cols) = state.grid.dimensions();
            state.dirty.mark_all(rows, cols);
        });
        self.request_redraw();
    }

    fn refresh_region(&mut self, row: i32, col: i32, height: i32, width: i32) {
        let rect = self.with_state(|state| {
            let (rows, cols) = state.grid.dimensions();
            let rect = CellRect::from_signed(row, col, height, width, rows, cols)?;
            state.dirty.mark(rect);
            Some(rect)
        });
        if let Some(rect) = rect {
            self.request_redraw_rect(rect);
        }
    }

    fn init_color_pair(&mut self, pair: u16, fg: Rgb, bg: Rgb) -> Result<()> {
        match &self.state {
            Some(state) => state.borrow_mut().pairs.set(pair, fg, bg),
            None => Err(Error::ResourceFailure("screen is not initialized".to_string())),
        }
    }

    fn set_cursor_visibility(&mut self, visible: bool) {
        let rect = self.with_state(|state| {
            state.cursor.visible = visible;
            let rect = CellRect::new(state.cursor.row, state.cursor.col, 1, 1);
            state.dirty.mark(rect);
            Some(rect)
        });
        if let Some(rect) = rect {
            self.request_redraw_rect(rect);
        }
    }

    fn move_cursor(&mut self, row: i32, col: i32) {
        let rect = self.with_state(|state| {
            let (rows, cols) = state.grid.dimensions();
            let old = CellRect::new(state.cursor.row, state.cursor.col, 1, 1);
            state.cursor.move_to(row, col, rows, cols);
            if !state.cursor.visible {
                return None;
            }
            // the vacated cell needs a repaint too
            let moved = old.union(CellRect::new(state.cursor.row, state.cursor.col, 1, 1));
            state.dirty.mark(moved);
            Some(moved)
        });
        if let Some(rect) = rect {
            self.request_redraw_rect(rect);
        }
    }

    fn set_event_handler(&mut self, handler: Box<dyn EventHandler>) {
        match &self.state {
            Some(state) => state.borrow_mut().handler = Some(handler),
            None => self.pending_handler = Some(handler),
        }
    }

    fn run_event_loop_iteration(&mut self, timeout_ms: i32) -> Result<()> {
        let Some(parts) = &self.parts else {
            return Ok(());
        };
        let app = NSApplication::sharedApplication(parts.mtm);
        let mode = NSString::from_str("kCFRunLoopDefaultMode");
        unsafe {
            let until: Retained<NSDate> = if timeout_ms < 0 {
                NSDate::distantFuture()
            } else if timeout_ms == 0 {
                NSDate::distantPast()
            } else {
                NSDate::dateWithTimeIntervalSinceNow(f64::from(timeout_ms) / 1000.0)
            };
            let first: Option<Retained<NSEvent>> = msg_send_id![
                &app,
                nextEventMatchingMask: usize::MAX,
                untilDate: &*until,
                inMode: &*mode,
                dequeue: true
            ];
            let Some(first) = first else {
                return Ok(());
            };
            app.sendEvent(&first);
            // drain the rest of the batch without blocking
            loop {
                let past = NSDate::distantPast();
                let next: Option<Retained<NSEvent>> = msg_send_id![
                    &app,
                    nextEventMatchingMask: usize::MAX,
                    untilDate: &*past,
                    inMode: &*mode,
                    dequeue: true
                ];
                match next {
                    Some(event) => app.sendEvent(&event),
                    None => break,
                }
            }
            let _: () = msg_send![&app, updateWindows];
        }
        Ok(())
    }

    fn supports_clipboard(&self) -> bool {
        true
    }

    fn clipboard_text(&self) -> String {
        pasteboard::text()
    }

    fn set_clipboard_text(&mut self, text: &str) -> bool {
        pasteboard::set_text(text)
    }
}

impl Drop for DesktopScreen {
    fn drop(&mut self) {
        self.shutdown();
    }
}
