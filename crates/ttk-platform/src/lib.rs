//! Desktop backend for TTK.
//!
//! Owns the native window and view, translates input (including IME marked
//! text), and executes the frame plans produced by `ttk-renderer` with the
//! platform's text layout service. Currently implements macOS via `objc2`
//! and CoreText; other desktop platforms report `UnsupportedPlatform`.

#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(target_os = "macos")]
pub use macos::DesktopScreen;

#[cfg(not(target_os = "macos"))]
mod unsupported;
#[cfg(not(target_os = "macos"))]
pub use unsupported::DesktopScreen;

/// Whether this build can host a native desktop window.
pub fn is_desktop_available() -> bool {
    cfg!(target_os = "macos")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_availability_matches_target() {
        assert_eq!(is_desktop_available(), cfg!(target_os = "macos"));
    }
}
