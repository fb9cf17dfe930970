// src/config.rs

//! Configuration for the `wm-draw` preview binary.
//!
//! The library itself never reads this: every drawing entry point takes its
//! server, font driver and colors as arguments. Only `main.rs` consults
//! [`CONFIG`].
//!
//! The file is JSON, looked up at `$WM_DRAW_CONFIG`, then
//! `$XDG_CONFIG_HOME/wm-draw/config.json`, then `~/.config/wm-draw/config.json`.
//! A missing or unreadable file yields the defaults.

use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

const CONFIG_ENV: &str = "WM_DRAW_CONFIG";
const CONFIG_DIR: &str = "wm-draw";
const CONFIG_FILE: &str = "config.json";

/// Process-wide configuration, loaded on first access.
pub static CONFIG: Lazy<Config> = Lazy::new(Config::load_or_default);

/// Root of the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub font: FontConfig,
    pub colors: ColorConfig,
    pub preview: PreviewConfig,
}

/// Font used when a caller does not name one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Pango-style description, e.g. `"DejaVu Sans Bold 10"`.
    pub description: String,
    /// Resolution used to turn point sizes into pixels.
    pub dpi: f32,
}

impl Default for FontConfig {
    fn default() -> Self {
        FontConfig {
            description: "sans 10".to_string(),
            dpi: 96.0,
        }
    }
}

/// Default color specs, resolved through the color resolver at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub foreground: String,
    pub background: String,
    pub border: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        ColorConfig {
            foreground: "#eeeeec".to_string(),
            background: "#222222".to_string(),
            border: "#535d6c".to_string(),
        }
    }
}

/// Geometry and lifetime of the preview window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub width: u16,
    pub height: u16,
    /// How long the window stays mapped before teardown.
    pub hold_ms: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        PreviewConfig {
            width: 400,
            height: 40,
            hold_ms: 3000,
        }
    }
}

impl Config {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        serde_json::from_str(text).context("Failed to parse configuration JSON")
    }

    /// Reads and parses the file at `path`.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Loads the first configuration file found, or the defaults.
    pub fn load_or_default() -> Self {
        let Some(path) = config_path() else {
            debug!("No configuration file found; using defaults");
            return Config::default();
        };
        match Self::from_file(&path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            Err(err) => {
                warn!("{:#}; using defaults", err);
                Config::default()
            }
        }
    }
}

/// The candidate paths, in lookup order.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
        paths.push(PathBuf::from(explicit));
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|dir| !dir.is_empty()) {
        paths.push(PathBuf::from(xdg).join(CONFIG_DIR).join(CONFIG_FILE));
    }
    if let Some(home) = std::env::var_os("HOME") {
        paths.push(
            PathBuf::from(home)
                .join(".config")
                .join(CONFIG_DIR)
                .join(CONFIG_FILE),
        );
    }
    paths
}

fn config_path() -> Option<PathBuf> {
    candidate_paths().into_iter().find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn empty_object_yields_defaults() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config =
            Config::from_json(r#"{ "font": { "dpi": 120.0 }, "preview": { "hold_ms": 10 } }"#)
                .unwrap();
        assert_eq!(config.font.dpi, 120.0);
        assert_eq!(config.font.description, "sans 10");
        assert_eq!(config.preview.hold_ms, 10);
        assert_eq!(config.preview.width, PreviewConfig::default().width);
        assert_eq!(config.colors, ColorConfig::default());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(Config::from_json("{ \"font\": ").is_err());
        assert!(Config::from_file(Path::new("/nonexistent/wm-draw.json")).is_err());
    }
}
