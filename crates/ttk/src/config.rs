//! Configuration loading.
//!
//! Reads `config.json` from the platform config dir, e.g.
//! `~/Library/Application Support/ttk/config.json` on macOS or
//! `~/.config/ttk/config.json` on Linux. A missing or unreadable file means
//! defaults; a present-but-invalid file is reported and ignored.

use std::path::PathBuf;

use ttk_core::ScreenConfig;

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ttk").join("config.json"))
}

/// Load the configuration, falling back to defaults.
pub fn load() -> ScreenConfig {
    match config_path() {
        Some(path) => load_from(&path),
        None => ScreenConfig::default(),
    }
}

fn load_from(path: &std::path::Path) -> ScreenConfig {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return ScreenConfig::default();
    };
    match serde_json::from_str(&contents) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("ignoring invalid config at {}: {e}", path.display());
            ScreenConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(&dir.path().join("nope.json"));
        assert_eq!(config.font_family, ScreenConfig::default().font_family);
    }

    #[test]
    fn valid_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{"title": "My App", "cols": 120}}"#).unwrap();
        let config = load_from(&path);
        assert_eq!(config.title, "My App");
        assert_eq!(config.cols, 120);
        assert_eq!(config.rows, 24);
    }

    #[test]
    fn invalid_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        let config = load_from(&path);
        assert_eq!(config.title, "TTK");
    }
}
