//! The glyph registry.
//!
//! Pure lookup from [`ApplicationId`] to its display glyph, built once from
//! the configuration and immutable for the process lifetime.  Lookups are
//! total: identities without a configured glyph fall back to the `"default"`
//! entry.
//!
//! The focused application's glyph can be rendered in a highlighted form.
//! Highlighting uses pango `<span>` markup (the format status bars accept in
//! workspace labels) and only when highlight colors are configured —
//! otherwise the plain glyph is returned unchanged.

use crate::classify::ApplicationId;
use crate::config::Config;
use std::collections::HashMap;

/// Fallback used when the config has no `"default"` entry either.
const FALLBACK_GLYPH: &str = "?";

/// Immutable identity → glyph table.
#[derive(Debug, Clone)]
pub struct GlyphRegistry {
    table: HashMap<String, String>,
    default_glyph: String,
    focused_fg: Option<String>,
    focused_bg: Option<String>,
}

impl GlyphRegistry {
    /// Build the registry from configuration.
    pub fn from_config(config: &Config) -> Self {
        let default_glyph = config
            .glyphs
            .get("default")
            .cloned()
            .unwrap_or_else(|| FALLBACK_GLYPH.to_string());
        Self {
            table: config.glyphs.clone(),
            default_glyph,
            focused_fg: config.highlight.focused_fg.clone(),
            focused_bg: config.highlight.focused_bg.clone(),
        }
    }

    /// The glyph for an identity, falling back to the default glyph.
    pub fn glyph_for(&self, app: ApplicationId) -> &str {
        self.table
            .get(app.as_str())
            .map(String::as_str)
            .unwrap_or(&self.default_glyph)
    }

    /// The glyph for an identity in its focused rendering.
    ///
    /// Identical to [`glyph_for`](Self::glyph_for) when no highlight colors
    /// are configured.
    pub fn highlighted_glyph_for(&self, app: ApplicationId) -> String {
        self.highlight(self.glyph_for(app))
    }

    /// Wrap `text` in pango color markup according to the highlight config.
    fn highlight(&self, text: &str) -> String {
        if self.focused_fg.is_none() && self.focused_bg.is_none() {
            return text.to_string();
        }
        let mut attrs = String::new();
        if let Some(fg) = &self.focused_fg {
            attrs.push_str(&format!(" foreground='{}'", fg));
        }
        if let Some(bg) = &self.focused_bg {
            attrs.push_str(&format!(" background='{}'", bg));
        }
        format!("<span{}>{}</span>", attrs, text)
    }

    /// Whether `token` is a glyph this registry can emit, in plain or
    /// highlighted form.  Used by the label codec to recognise glyph runs
    /// it produced itself.
    pub fn is_known_token(&self, token: &str) -> bool {
        self.known_tokens().any(|t| t == token)
    }

    /// Every token this registry can emit, longest first so greedy
    /// tokenization of unseparated glyph runs is unambiguous.
    pub fn tokens_longest_first(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.known_tokens().collect();
        tokens.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        tokens.dedup();
        tokens
    }

    fn known_tokens(&self) -> impl Iterator<Item = String> + '_ {
        ApplicationId::all().into_iter().flat_map(move |app| {
            let plain = self.glyph_for(app).to_string();
            let lit = self.highlight(&plain);
            [plain, lit]
        })
    }
}

//  Tests
