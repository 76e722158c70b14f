//! Core types and backend contract for TTK.
//!
//! A TTK screen is a dense grid of character cells drawn by one of two
//! backends (terminal or native desktop window). This crate holds everything
//! the backends share: the grid model and its drawing primitives, the color
//! pair table, the event model with its callback trait, the dirty-region
//! bookkeeping, and the command serialization boundary.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

pub mod color;
pub mod command;
pub mod config;
pub mod dirty;
pub mod grid;
pub mod width;

pub use color::ColorPairs;
pub use command::Command;
pub use config::ScreenConfig;
pub use dirty::{CellRect, DirtyRegion};
pub use grid::{Cell, CellContent, Grid};

// ──────────────────────────────────────────────
// Colors
// ──────────────────────────────────────────────

/// An sRGB color with 8-bit components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Self = Rgb(0, 0, 0);
    pub const WHITE: Self = Rgb(255, 255, 255);
}

// ──────────────────────────────────────────────
// Attributes
// ──────────────────────────────────────────────

bitflags! {
    /// Per-cell rendering attributes.
    ///
    /// REVERSE swaps foreground and background at color lookup time; it never
    /// mutates the color pair table.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Attributes: u8 {
        const BOLD = 1;
        const UNDERLINE = 2;
        const REVERSE = 4;
    }
}

impl Serialize for Attributes {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for Attributes {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let bits = u8::deserialize(deserializer)?;
        Attributes::from_bits(bits)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown attribute bits: {bits:#x}")))
    }
}

bitflags! {
    /// Keyboard modifier state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1;
        const CONTROL = 2;
        const ALT = 4;
        const COMMAND = 8;
    }
}

impl Modifiers {
    /// True when any modifier that suppresses text input is held.
    /// Shift alone still produces characters; Ctrl/Alt/Cmd never do.
    pub fn suppresses_text(self) -> bool {
        self.intersects(Modifiers::CONTROL | Modifiers::ALT | Modifiers::COMMAND)
    }
}

// ──────────────────────────────────────────────
// Cursor
// ──────────────────────────────────────────────

/// Grid cursor state. Coordinates are clamped into the grid on every move;
/// they collapse to zero when the grid is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub row: usize,
    pub col: usize,
    pub visible: bool,
}

impl Cursor {
    pub fn move_to(&mut self, row: i32, col: i32, rows: usize, cols: usize) {
        self.row = clamp_axis(row, rows);
        self.col = clamp_axis(col, cols);
    }

    /// Re-clamp after a grid resize.
    pub fn clamp(&mut self, rows: usize, cols: usize) {
        self.row = self.row.min(rows.saturating_sub(1));
        self.col = self.col.min(cols.saturating_sub(1));
    }
}

fn clamp_axis(value: i32, extent: usize) -> usize {
    if extent == 0 {
        return 0;
    }
    value.clamp(0, (extent - 1) as i32) as usize
}

// ──────────────────────────────────────────────
// Events
// ──────────────────────────────────────────────

/// A key identifier: a printable code point or a key without a character
/// representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Tab,
    Escape,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    F(u8),
}

impl KeyCode {
    /// Numeric identifier for the key. Printable keys map to their code
    /// point, Enter/Tab/Escape/Backspace reuse the ASCII control codes, and
    /// keys with no character representation get identifiers from 1000 up.
    pub fn code(self) -> u32 {
        match self {
            KeyCode::Char(c) => c as u32,
            KeyCode::Enter => 10,
            KeyCode::Tab => 9,
            KeyCode::Escape => 27,
            KeyCode::Backspace => 127,
            KeyCode::Up => 1000,
            KeyCode::Down => 1001,
            KeyCode::Left => 1002,
            KeyCode::Right => 1003,
            KeyCode::F(n) => 1003 + n.clamp(1, 12) as u32,
            KeyCode::Home => 1016,
            KeyCode::End => 1017,
            KeyCode::PageUp => 1018,
            KeyCode::PageDown => 1019,
            KeyCode::Insert => 1020,
            KeyCode::Delete => 1021,
        }
    }

    /// True for keys that represent a printable character.
    pub fn is_printable(self) -> bool {
        matches!(self, KeyCode::Char(c) if !c.is_control())
    }
}

/// A raw key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    /// Text the key would produce, when the platform reports it.
    pub text: Option<String>,
}

impl KeyEvent {
    pub fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        let text = match code {
            KeyCode::Char(c) if !modifiers.suppresses_text() && !c.is_control() => {
                Some(c.to_string())
            }
            _ => None,
        };
        Self { code, modifiers, text }
    }
}

/// Committed text input: exactly one non-empty grapheme cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharEvent {
    pub grapheme: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    Press,
    Release,
    Move,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub x: i32,
    pub y: i32,
    pub button: MouseButton,
    pub action: MouseAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEvent {
    Resize { rows: usize, cols: usize },
    Close,
    FocusGained,
    FocusLost,
}

/// Any event a backend can deliver.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Key(KeyEvent),
    Char(CharEvent),
    Mouse(MouseEvent),
    System(SystemEvent),
}

// ──────────────────────────────────────────────
// Trait: EventHandler
// ──────────────────────────────────────────────

/// Application callback interface. Each method returns `true` when the event
/// was consumed; an unconsumed printable key press is followed by a `Char`
/// delivery (see the backends for the exact discipline).
pub trait EventHandler {
    fn on_key_event(&mut self, event: &KeyEvent) -> bool;
    fn on_char_event(&mut self, event: &CharEvent) -> bool;
    fn on_system_event(&mut self, event: &SystemEvent) -> bool;
    fn on_mouse_event(&mut self, _event: &MouseEvent) -> bool {
        false
    }
}

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("color pair id {0} is out of range (1-255)")]
    InvalidPairId(i64),
    #[error("rgb component {0} is out of range (0-255)")]
    InvalidRgb(i64),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(&'static str),
    #[error("font not found: {0}")]
    FontNotFound(String),
    #[error("font is not monospace: {0}")]
    FontNotMonospace(String),
    #[error("resource failure: {0}")]
    ResourceFailure(String),
    #[error("draw failed: {0}")]
    Draw(String),
}

pub type Result<T> = std::result::Result<T, Error>;

// ──────────────────────────────────────────────
// Trait: Screen
// ──────────────────────────────────────────────

/// The backend-agnostic rendering surface.
///
/// All coordinates are in cells. Out-of-range drawing arguments are clipped,
/// never errors; argument validation failures (`InvalidPairId`) and
/// construction-time failures propagate. Per-frame transient draw failures
/// are logged and swallowed by the backend.
pub trait Screen {
    /// Allocate the grid and the window/terminal resources.
    fn initialize(&mut self) -> Result<()>;

    /// Release all resources and reset dimensions and cursor to zero.
    /// Idempotent.
    fn shutdown(&mut self);

    /// Current grid size as `(rows, cols)`.
    fn dimensions(&self) -> (usize, usize);

    /// Reset every cell to the empty state.
    fn clear(&mut self);

    /// Reset a clipped rectangle of cells to the empty state.
    fn clear_region(&mut self, row: i32, col: i32, height: i32, width: i32);

    fn draw_text(&mut self, row: i32, col: i32, text: &str, color_pair: u16, attrs: Attributes);

    fn draw_hline(&mut self, row: i32, col: i32, ch: char, length: i32, color_pair: u16);

    fn draw_vline(&mut self, row: i32, col: i32, ch: char, length: i32, color_pair: u16);

    fn draw_rect(
        &mut self,
        row: i32,
        col: i32,
        height: i32,
        width: i32,
        color_pair: u16,
        filled: bool,
    );

    /// Mark the whole grid dirty. Pixel emission happens on the backend's
    /// next paint cycle.
    fn refresh(&mut self);

    /// Mark a rectangular cell region dirty. Regions accumulated before the
    /// next paint are unioned.
    fn refresh_region(&mut self, row: i32, col: i32, height: i32, width: i32);

    /// Define color pair `pair` (1-255). Pair 0 is reserved.
    fn init_color_pair(&mut self, pair: u16, fg: Rgb, bg: Rgb) -> Result<()>;

    fn set_cursor_visibility(&mut self, visible: bool);

    /// Move the cursor, clamping into the grid.
    fn move_cursor(&mut self, row: i32, col: i32);

    fn set_event_handler(&mut self, handler: Box<dyn EventHandler>);

    /// Pump one batch of OS events. Negative timeout blocks indefinitely,
    /// zero polls without blocking, positive blocks up to that many
    /// milliseconds. Returning without having delivered an event is normal.
    fn run_event_loop_iteration(&mut self, timeout_ms: i32) -> Result<()>;

    // ── Clipboard capability (optional) ──

    fn supports_clipboard(&self) -> bool {
        false
    }

    fn clipboard_text(&self) -> String {
        String::new()
    }

    fn set_clipboard_text(&mut self, _text: &str) -> bool {
        false
    }
}
