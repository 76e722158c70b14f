//! macOS native desktop backend using objc2 and CoreText.

mod draw;
mod font;
mod pasteboard;
mod screen;
mod view;
mod window;

pub use screen::DesktopScreen;
