//! Stub backend for targets without a native desktop implementation.
//!
//! `new` always fails, so no instance ever exists; the `Screen` impl is
//! still required so `Box<DesktopScreen>` coerces to `Box<dyn Screen>` in
//! backend selection.

use ttk_core::{Attributes, Error, EventHandler, Result, Rgb, Screen, ScreenConfig};

pub struct DesktopScreen {
    _private: (),
}

impl DesktopScreen {
    pub fn new(_config: &ScreenConfig) -> Result<Self> {
        Err(unsupported())
    }
}

fn unsupported() -> Error {
    Error::UnsupportedPlatform("the desktop backend is only implemented for macOS")
}

impl Screen for DesktopScreen {
    fn initialize(&mut self) -> Result<()> {
        Err(unsupported())
    }

    fn shutdown(&mut self) {}

    fn dimensions(&self) -> (usize, usize) {
        (0, 0)
    }

    fn clear(&mut self) {}

    fn clear_region(&mut self, _row: i32, _col: i32, _height: i32, _width: i32) {}

    fn draw_text(
        &mut self,
        _row: i32,
        _col: i32,
        _text: &str,
        _color_pair: u16,
        _attrs: Attributes,
    ) {
    }

    fn draw_hline(&mut self, _row: i32, _col: i32, _ch: char, _length: i32, _color_pair: u16) {}

    fn draw_vline(&mut self, _row: i32, _col: i32, _ch: char, _length: i32, _color_pair: u16) {}

    fn draw_rect(
        &mut self,
        _row: i32,
        _col: i32,
        _height: i32,
        _width: i32,
        _color_pair: u16,
        _filled: bool,
    ) {
    }

    fn refresh(&mut self) {}

    fn refresh_region(&mut self, _row: i32, _col: i32, _height: i32, _width: i32) {}

    fn init_color_pair(&mut self, _pair: u16, _fg: Rgb, _bg: Rgb) -> Result<()> {
        Err(unsupported())
    }

    fn set_cursor_visibility(&mut self, _visible: bool) {}

    fn move_cursor(&mut self, _row: i32, _col: i32) {}

    fn set_event_handler(&mut self, _handler: Box<dyn EventHandler>) {}

    fn run_event_loop_iteration(&mut self, _timeout_ms: i32) -> Result<()> {
        Err(unsupported())
    }
}
