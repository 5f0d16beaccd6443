//! Application configuration.
//!
//! The configuration is loaded from a JSON file whose path is passed on the
//! command line (`--config-file <path>`).  Every section is optional — a
//! minimal `{}` file (or no file at all) is valid and falls back to the
//! compiled-in defaults, which cover the built-in classification rules.
//!
//! # Example
//!
//! ```json
//! {
//!   "glyphs": { "browser": "🌐", "terminal": "🖥️", "default": "?" },
//!   "separators": { "parts": ":", "glyphs": "" },
//!   "highlight": { "focused_fg": "#ffffff", "focused_bg": "#285577" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application identity → glyph.  The reserved key `"default"` is used
    /// for identities with no entry of their own.
    pub glyphs: HashMap<String, String>,

    /// Separator strings used when composing labels.
    pub separators: SeparatorConfig,

    /// Colors applied to the focused application's glyph.
    pub highlight: HighlightConfig,
}

/// Separators for the label grammar.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparatorConfig {
    /// Between the workspace number, the custom name, and the glyph section.
    pub parts: String,
    /// Between individual glyphs inside the glyph section.
    pub glyphs: String,
}

/// Pango markup colors for the focused glyph.
///
/// Both fields are optional; when neither is set the focused glyph is
/// rendered without any markup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub focused_fg: Option<String>,
    pub focused_bg: Option<String>,
}

impl Default for SeparatorConfig {
    fn default() -> Self {
        Self {
            parts: ":".into(),
            glyphs: String::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let glyphs = [
            ("browser", "🌐"),
            ("terminal", "🖥️"),
            ("editor", "✎"),
            ("file_manager", "🗂"),
            ("media", "♪"),
            ("chat", "💬"),
            ("mail", "✉"),
            ("document", "📄"),
            ("default", "?"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            glyphs,
            separators: SeparatorConfig::default(),
            highlight: HighlightConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
