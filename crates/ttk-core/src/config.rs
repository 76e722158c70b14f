//! Screen configuration shared by both backends.

use serde::{Deserialize, Serialize};

/// Backend configuration. The terminal backend uses the title and initial
/// dimensions; the desktop backend additionally uses the font settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    /// Initial grid rows for the desktop window; the terminal backend uses
    /// the terminal's own size.
    #[serde(default = "default_rows")]
    pub rows: usize,
    #[serde(default = "default_cols")]
    pub cols: usize,
}

fn default_title() -> String {
    "TTK".to_string()
}

fn default_font_family() -> String {
    "Menlo".to_string()
}

fn default_font_size() -> f64 {
    13.0
}

fn default_rows() -> usize {
    24
}

fn default_cols() -> usize {
    80
}

impl Default for ScreenConfig {
    fn default() -> Self {
        ScreenConfig {
            title: default_title(),
            font_family: default_font_family(),
            font_size: default_font_size(),
            rows: default_rows(),
            cols: default_cols(),
        }
    }
}
