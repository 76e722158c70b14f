//! TTK: a rendering toolkit for character-grid applications.
//!
//! Applications draw on a backend-neutral cell grid through the [`Screen`]
//! contract and receive input through the [`EventHandler`] callbacks. Two
//! backends exist: a crossterm-driven terminal and a native desktop window
//! (macOS). This crate selects the backend and re-exports the public
//! surface.
//!
//! ```no_run
//! use ttk::{create_screen, BackendKind, Screen};
//!
//! let config = ttk::config::load();
//! let mut screen = create_screen(BackendKind::Auto, &config)?;
//! screen.initialize()?;
//! screen.draw_text(0, 0, "hello", 0, ttk::Attributes::empty());
//! screen.refresh();
//! screen.run_event_loop_iteration(16)?;
//! screen.shutdown();
//! # Ok::<(), ttk::Error>(())
//! ```

pub mod config;

pub use ttk_core::{
    width, Attributes, Cell, CellContent, CellRect, CharEvent, ColorPairs, Command, Cursor,
    DirtyRegion, Error, Event, EventHandler, Grid, KeyCode, KeyEvent, Modifiers, MouseAction,
    MouseButton, MouseEvent, Result, Rgb, Screen, ScreenConfig, SystemEvent,
};
pub use ttk_platform::{is_desktop_available, DesktopScreen};
pub use ttk_terminal::TerminalScreen;

/// The frame-planning pipeline, for custom backend implementations.
pub use ttk_renderer as renderer;

/// Which backend to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Desktop window when the platform supports one, terminal otherwise.
    #[default]
    Auto,
    Terminal,
    Desktop,
}

/// Create a screen for the requested backend. The screen still needs
/// [`Screen::initialize`]; construction only fails when the backend cannot
/// exist on this platform at all.
pub fn create_screen(kind: BackendKind, config: &ScreenConfig) -> Result<Box<dyn Screen>> {
    match kind {
        BackendKind::Terminal => Ok(Box::new(TerminalScreen::new(config))),
        BackendKind::Desktop => Ok(Box::new(DesktopScreen::new(config)?)),
        BackendKind::Auto => {
            if is_desktop_available() {
                Ok(Box::new(DesktopScreen::new(config)?))
            } else {
                Ok(Box::new(TerminalScreen::new(config)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_backend_always_constructs() {
        let screen = create_screen(BackendKind::Terminal, &ScreenConfig::default());
        assert!(screen.is_ok());
    }

    #[test]
    fn desktop_backend_errors_off_platform() {
        let result = create_screen(BackendKind::Desktop, &ScreenConfig::default());
        if cfg!(target_os = "macos") {
            assert!(result.is_ok());
        } else {
            assert!(matches!(result, Err(Error::UnsupportedPlatform(_))));
        }
    }

    #[test]
    fn auto_falls_back_to_terminal() {
        if !is_desktop_available() {
            let screen = create_screen(BackendKind::Auto, &ScreenConfig::default());
            assert!(screen.is_ok());
        }
    }
}
