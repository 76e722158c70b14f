//! Terminal backend: drives a raw-mode terminal through crossterm.
//!
//! The backend keeps a mirror grid with the full wide-character placeholder
//! discipline. The terminal's native read-back is 8-bit lossy (code points
//! above 0xFF are unrecoverable), so the mirror is the only reliable record
//! of what is on screen; every repair decision is made against it before any
//! escape sequences are emitted.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::style::{
    Attribute, Colors, Print, SetAttribute, SetAttributes, SetColors,
};
use crossterm::{cursor, event, execute, queue, terminal};

use ttk_core::{
    Attributes, Cell, CellRect, ColorPairs, Cursor, DirtyRegion, Error, EventHandler, Grid,
    Result, Rgb, Screen, ScreenConfig, SystemEvent,
};

mod input;

/// A `Screen` rendered into the controlling terminal.
pub struct TerminalScreen {
    title: String,
    grid: Grid,
    pairs: ColorPairs,
    cursor: Cursor,
    dirty: DirtyRegion,
    handler: Option<Box<dyn EventHandler>>,
    out: io::Stdout,
    entered: bool,
}

impl TerminalScreen {
    pub fn new(config: &ScreenConfig) -> Self {
        TerminalScreen {
            title: config.title.clone(),
            grid: Grid::new(0, 0),
            pairs: ColorPairs::new(),
            cursor: Cursor::default(),
            dirty: DirtyRegion::new(),
            handler: None,
            out: io::stdout(),
            entered: false,
        }
    }

    // ── Painting ────────────────────────────────

    /// Emit the dirty region. A failed emission drops the frame with a
    /// warning; the mirror grid stays consistent and the next refresh
    /// repaints.
    fn paint(&mut self) {
        if !self.entered {
            self.dirty.take();
            return;
        }
        let Some(rect) = self.dirty.take() else {
            return;
        };
        let Some(rect) = rect.clamp_to(self.grid.rows(), self.grid.cols()) else {
            return;
        };
        if let Err(e) = self.paint_rect(rect) {
            log::warn!("terminal paint failed, frame dropped: {e}");
        }
    }

    fn paint_rect(&mut self, rect: CellRect) -> io::Result<()> {
        queue!(self.out, cursor::Hide)?;
        for row in rect.row..rect.end_row() {
            let Some(cells) = self.grid.row(row) else {
                continue;
            };
            let (start, end) = expand_to_whole_glyphs(cells, rect.col, rect.end_col());
            queue!(self.out, cursor::MoveTo(start as u16, row as u16))?;

            let mut run: Option<(u16, Attributes)> = None;
            let mut text = String::new();
            for cell in &cells[start..end] {
                if cell.is_placeholder() {
                    // the lead's grapheme advances the terminal cursor
                    continue;
                }
                let key = (cell.color_pair, cell.attrs);
                if run != Some(key) {
                    if let Some((pair, attrs)) = run.take() {
                        write_run(&mut self.out, &self.pairs, pair, attrs, &text)?;
                        text.clear();
                    }
                    run = Some(key);
                }
                if let Some(grapheme) = cell.grapheme() {
                    text.push_str(grapheme);
                }
            }
            if let Some((pair, attrs)) = run {
                write_run(&mut self.out, &self.pairs, pair, attrs, &text)?;
            }
        }

        queue!(self.out, SetAttribute(Attribute::Reset))?;
        if self.cursor.visible && self.grid.rows() > 0 {
            queue!(
                self.out,
                cursor::MoveTo(self.cursor.col as u16, self.cursor.row as u16),
                cursor::Show
            )?;
        }
        self.out.flush()
    }

    // ── Event dispatch ──────────────────────────

    fn dispatch(&mut self, native: event::Event) {
        match native {
            event::Event::Key(key) => {
                if let Some(key) = input::translate_key(&key) {
                    if let Some(handler) = self.handler.as_mut() {
                        input::deliver_key(handler.as_mut(), key);
                    }
                }
            }
            event::Event::Resize(cols, rows) => {
                self.grid.resize(rows as usize, cols as usize);
                self.cursor.clamp(self.grid.rows(), self.grid.cols());
                self.dirty.mark_all(self.grid.rows(), self.grid.cols());
                let resize = SystemEvent::Resize {
                    rows: self.grid.rows(),
                    cols: self.grid.cols(),
                };
                if let Some(handler) = self.handler.as_mut() {
                    handler.on_system_event(&resize);
                }
            }
            event::Event::Mouse(mouse) => {
                if let Some(mouse) = input::translate_mouse(&mouse) {
                    if let Some(handler) = self.handler.as_mut() {
                        handler.on_mouse_event(&mouse);
                    }
                }
            }
            event::Event::FocusGained => {
                if let Some(handler) = self.handler.as_mut() {
                    handler.on_system_event(&SystemEvent::FocusGained);
                }
            }
            event::Event::FocusLost => {
                if let Some(handler) = self.handler.as_mut() {
                    handler.on_system_event(&SystemEvent::FocusLost);
                }
            }
            event::Event::Paste(_) => {}
        }
    }
}

impl Screen for TerminalScreen {
    fn initialize(&mut self) -> Result<()> {
        if self.entered {
            return Ok(());
        }
        terminal::enable_raw_mode().map_err(resource)?;
        execute!(
            self.out,
            terminal::EnterAlternateScreen,
            terminal::SetTitle(self.title.as_str()),
            terminal::Clear(terminal::ClearType::All),
            cursor::Hide,
            event::EnableMouseCapture,
        )
        .map_err(resource)?;
        let (cols, rows) = terminal::size().map_err(resource)?;
        self.grid = Grid::new(rows as usize, cols as usize);
        self.pairs = ColorPairs::new();
        self.cursor = Cursor::default();
        self.dirty = DirtyRegion::new();
        self.entered = true;
        Ok(())
    }

    fn shutdown(&mut self) {
        if !self.entered {
            return;
        }
        let _ = execute!(
            self.out,
            event::DisableMouseCapture,
            SetAttribute(Attribute::Reset),
            terminal::LeaveAlternateScreen,
            cursor::Show,
        );
        let _ = terminal::disable_raw_mode();
        self.grid = Grid::new(0, 0);
        self.pairs.clear();
        self.cursor = Cursor::default();
        self.dirty = DirtyRegion::new();
        self.entered = false;
    }

    fn dimensions(&self) -> (usize, usize) {
        self.grid.dimensions()
    }

    fn clear(&mut self) {
        self.grid.clear();
    }

    fn clear_region(&mut self, row: i32, col: i32, height: i32, width: i32) {
        self.grid.clear_region(row, col, height, width);
    }

    fn draw_text(&mut self, row: i32, col: i32, text: &str, color_pair: u16, attrs: Attributes) {
        self.grid.draw_text(row, col, text, color_pair, attrs);
    }

    fn draw_hline(&mut self, row: i32, col: i32, ch: char, length: i32, color_pair: u16) {
        self.grid.draw_hline(row, col, ch, length, color_pair);
    }

    fn draw_vline(&mut self, row: i32, col: i32, ch: char, length: i32, color_pair: u16) {
        self.grid.draw_vline(row, col, ch, length, color_pair);
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
        self.grid.draw_rect(row, col, height, width, color_pair, filled);
    }

    fn refresh(&mut self) {
        self.dirty.mark_all(self.grid.rows(), self.grid.cols());
        self.paint();
    }

    fn refresh_region(&mut self, row: i32, col: i32, height: i32, width: i32) {
        if let Some(rect) =
            CellRect::from_signed(row, col, height, width, self.grid.rows(), self.grid.cols())
        {
            self.dirty.mark(rect);
        }
        self.paint();
    }

    fn init_color_pair(&mut self, pair: u16, fg: Rgb, bg: Rgb) -> Result<()> {
        self.pairs.set(pair, fg, bg)
    }

    fn set_cursor_visibility(&mut self, visible: bool) {
        self.cursor.visible = visible;
        if visible {
            self.refresh_region(self.cursor.row as i32, self.cursor.col as i32, 1, 1);
        } else if self.entered {
            if let Err(e) = execute!(self.out, cursor::Hide) {
                log::warn!("cursor hide failed: {e}");
            }
        }
    }

    fn move_cursor(&mut self, row: i32, col: i32) {
        self.cursor.move_to(row, col, self.grid.rows(), self.grid.cols());
        if self.cursor.visible {
            self.refresh_region(self.cursor.row as i32, self.cursor.col as i32, 1, 1);
        }
    }

    fn set_event_handler(&mut self, handler: Box<dyn EventHandler>) {
        self.handler = Some(handler);
    }

    fn run_event_loop_iteration(&mut self, timeout_ms: i32) -> Result<()> {
        if !self.entered {
            return Ok(());
        }
        if timeout_ms >= 0 {
            let ready =
                event::poll(Duration::from_millis(timeout_ms as u64)).map_err(resource)?;
            if !ready {
                return Ok(());
            }
        }
        let native = event::read().map_err(resource)?;
        self.dispatch(native);
        Ok(())
    }
}

impl Drop for TerminalScreen {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn resource(e: io::Error) -> Error {
    Error::ResourceFailure(e.to_string())
}

/// Widen a row span so it never starts on a placeholder or ends on a cut
/// wide lead.
fn expand_to_whole_glyphs(cells: &[Cell], start: usize, end: usize) -> (usize, usize) {
    let mut start = start;
    if start > 0 && start < cells.len() && cells[start].is_placeholder() {
        start -= 1;
    }
    let mut end = end;
    if end > 0 && end < cells.len() && cells[end - 1].is_wide_lead() {
        end += 1;
    }
    (start, end)
}

fn write_run(
    out: &mut io::Stdout,
    pairs: &ColorPairs,
    pair: u16,
    attrs: Attributes,
    text: &str,
) -> io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    // REVERSE resolves to a color swap here, matching the desktop renderer;
    // the terminal's own reverse attribute is never used.
    let (fg, bg) = pairs.effective(pair, attrs);
    let mut native = crossterm::style::Attributes::default();
    if attrs.contains(Attributes::BOLD) {
        native.set(Attribute::Bold);
    }
    if attrs.contains(Attributes::UNDERLINE) {
        native.set(Attribute::Underlined);
    }
    queue!(
        out,
        SetAttribute(Attribute::Reset),
        SetColors(Colors::new(to_native_color(fg), to_native_color(bg))),
        SetAttributes(native),
        Print(text),
    )
}

fn to_native_color(rgb: Rgb) -> crossterm::style::Color {
    crossterm::style::Color::Rgb { r: rgb.0, g: rgb.1, b: rgb.2 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_before_initialize_is_a_noop() {
        let mut screen = TerminalScreen::new(&ScreenConfig::default());
        screen.shutdown();
        screen.shutdown();
        assert_eq!(screen.dimensions(), (0, 0));
    }

    #[test]
    fn drawing_without_a_terminal_mutates_only_the_mirror() {
        // The grid starts 0×0 until initialize(); every primitive clips away.
        let mut screen = TerminalScreen::new(&ScreenConfig::default());
        screen.draw_text(0, 0, "hello", 1, Attributes::empty());
        screen.refresh();
        assert_eq!(screen.dimensions(), (0, 0));
    }

    #[test]
    fn color_pair_validation_propagates() {
        let mut screen = TerminalScreen::new(&ScreenConfig::default());
        assert!(screen.init_color_pair(1, Rgb(1, 2, 3), Rgb(4, 5, 6)).is_ok());
        assert!(matches!(
            screen.init_color_pair(0, Rgb::WHITE, Rgb::BLACK),
            Err(Error::InvalidPairId(0))
        ));
    }

    #[test]
    fn clipboard_is_unsupported() {
        let mut screen = TerminalScreen::new(&ScreenConfig::default());
        assert!(!screen.supports_clipboard());
        assert_eq!(screen.clipboard_text(), "");
        assert!(!screen.set_clipboard_text("x"));
    }
}
