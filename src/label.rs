//! The workspace label grammar.
//!
//! A composed label is
//! `<number><parts_sep><custom name><parts_sep><glyph run>`, where the glyph
//! run joins individual glyphs with the glyph separator.  Absent parts are
//! omitted together with their separator: `"1:🌐"` (no custom name),
//! `"2:work"` (no windows), `"2:work:🖥️✎"` (both).
//!
//! [`LabelCodec::decode`] recovers the custom name from a raw label.  It
//! strips the numeric prefix and then a trailing glyph section — but only a
//! section this codec could itself have produced (every token is a glyph the
//! registry emits, plain or highlighted).  Trailing text the *user* typed,
//! even text containing the separator, stays part of the custom name, so
//! repeated encode/decode cycles never drift.
//!
//! A custom name equal to `"<number>"` or `"<number><parts_sep>"` is
//! reserved: i3 treats a purely numeric label as a renumbering request, and
//! the engine reads those shapes as "no custom name".  Encoding such a name
//! fails with [`LabelError::InvalidCustomName`].

use crate::config::Config;
use crate::glyphs::GlyphRegistry;

/// Encodes and decodes workspace labels.
#[derive(Debug, Clone)]
pub struct LabelCodec {
    part_sep: String,
    glyph_sep: String,
}

/// Error from composing a label.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LabelError {
    /// The custom name collides with the reserved numeric-prefix pattern.
    #[error("custom name {name:?} is reserved on workspace {number}")]
    InvalidCustomName { name: String, number: i32 },
}

impl LabelCodec {
    /// A codec with explicit separators.
    pub fn new(part_sep: impl Into<String>, glyph_sep: impl Into<String>) -> Self {
        Self {
            part_sep: part_sep.into(),
            glyph_sep: glyph_sep.into(),
        }
    }

    /// A codec using the configured separators.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.separators.parts.clone(),
            config.separators.glyphs.clone(),
        )
    }

    /// The separator between number, custom name, and glyph section.
    pub fn part_sep(&self) -> &str {
        &self.part_sep
    }

    /// Check that `custom_name` may be encoded on a workspace with the
    /// given number.
    pub fn validate_custom_name(
        &self,
        number: Option<i32>,
        custom_name: &str,
    ) -> Result<(), LabelError> {
        if let Some(n) = number {
            let num = n.to_string();
            if custom_name == num || custom_name == format!("{}{}", num, self.part_sep) {
                return Err(LabelError::InvalidCustomName {
                    name: custom_name.to_string(),
                    number: n,
                });
            }
        }
        Ok(())
    }

    /// Compose a label from its parts.
    ///
    /// Absent number, empty custom name, and empty glyph sequence are each
    /// omitted (with their separator).
    pub fn encode(
        &self,
        number: Option<i32>,
        custom_name: &str,
        glyphs: &[String],
    ) -> Result<String, LabelError> {
        self.validate_custom_name(number, custom_name)?;
        let number_str = number.map(|n| n.to_string());
        let glyph_run = glyphs.join(&self.glyph_sep);

        let mut parts: Vec<&str> = Vec::with_capacity(3);
        if let Some(num) = number_str.as_deref() {
            parts.push(num);
        }
        if !custom_name.is_empty() {
            parts.push(custom_name);
        }
        if !glyph_run.is_empty() {
            parts.push(&glyph_run);
        }
        Ok(parts.join(&self.part_sep))
    }

    /// Recover the custom name from a raw label.
    ///
    /// Strips one `<number><parts_sep>` prefix (a bare `<number>` decodes
    /// to the empty name), then a trailing glyph section recognised via
    /// `registry`.  Everything else is the custom name.
    ///
    /// Leading and trailing whitespace is normalized away: a name like
    /// `" work "` decodes as `"work"` and is re-encoded without the
    /// padding from then on.
    pub fn decode(&self, raw: &str, number: Option<i32>, registry: &GlyphRegistry) -> String {
        let rest = match number {
            Some(n) => {
                let num = n.to_string();
                if raw == num {
                    return String::new();
                }
                let prefix = format!("{}{}", num, self.part_sep);
                raw.strip_prefix(&prefix).unwrap_or(raw)
            }
            None => raw,
        };

        let custom = if self.is_glyph_run(rest, registry) {
            // The whole remainder is machine-generated: no custom name.
            ""
        } else if self.part_sep.is_empty() {
            rest
        } else {
            match rest.rfind(&self.part_sep) {
                Some(at) if self.is_glyph_run(&rest[at + self.part_sep.len()..], registry) => {
                    &rest[..at]
                }
                _ => rest,
            }
        };
        custom.trim().to_string()
    }

    /// Whether `text` is exactly a glyph run this codec could have emitted.
    fn is_glyph_run(&self, text: &str, registry: &GlyphRegistry) -> bool {
        if text.is_empty() {
            return false;
        }
        if !self.glyph_sep.is_empty() {
            return text
                .split(&self.glyph_sep)
                .all(|tok| !tok.is_empty() && registry.is_known_token(tok));
        }
        // No separator between glyphs: greedy longest-first tokenization.
        let tokens = registry.tokens_longest_first();
        let mut rest = text;
        'outer: while !rest.is_empty() {
            for tok in &tokens {
                if let Some(after) = rest.strip_prefix(tok.as_str()) {
                    rest = after;
                    continue 'outer;
                }
            }
            return false;
        }
        true
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn registry() -> GlyphRegistry {
        GlyphRegistry::from_config(&Config::default())
    }

    fn codec() -> LabelCodec {
        LabelCodec::new(":", "")
    }

    fn glyphs(gs: &[&str]) -> Vec<String> {
        gs.iter().map(|g| g.to_string()).collect()
    }

    #[test]
    fn encode_number_and_glyphs() {
        let label = codec().encode(Some(1), "", &glyphs(&["🌐"])).unwrap();
        assert_eq!(label, "1:🌐");
    }

    #[test]
    fn encode_all_three_parts() {
        let label = codec()
            .encode(Some(2), "work", &glyphs(&["🖥️", "✎"]))
            .unwrap();
        assert_eq!(label, "2:work:🖥️✎");
    }

    #[test]
    fn encode_omits_empty_parts() {
        let c = codec();
        assert_eq!(c.encode(Some(3), "", &[]).unwrap(), "3");
        assert_eq!(c.encode(None, "scratch", &[]).unwrap(), "scratch");
        assert_eq!(c.encode(None, "", &glyphs(&["♪"])).unwrap(), "♪");
    }

    #[test]
    fn encode_rejects_reserved_custom_names() {
        let c = codec();
        assert_eq!(
            c.encode(Some(2), "2", &[]),
            Err(LabelError::InvalidCustomName {
                name: "2".into(),
                number: 2,
            })
        );
        assert!(c.encode(Some(2), "2:", &[]).is_err());
        // Only the workspace's own number is reserved.
        assert!(c.encode(Some(2), "3", &[]).is_ok());
        // Without a number there is nothing to collide with.
        assert!(c.encode(None, "2", &[]).is_ok());
    }

    #[test]
    fn decode_bare_number_is_no_custom_name() {
        assert_eq!(codec().decode("2", Some(2), &registry()), "");
    }

    #[test]
    fn decode_strips_prefix_and_glyph_section() {
        let c = codec();
        let r = registry();
        assert_eq!(c.decode("2:work:🖥️✎", Some(2), &r), "work");
        assert_eq!(c.decode("1:🌐", Some(1), &r), "");
        assert_eq!(c.decode("2:work", Some(2), &r), "work");
    }

    #[test]
    fn decode_keeps_user_trailing_text() {
        let c = codec();
        let r = registry();
        // "notes!" is not a glyph run, so it is user intent.
        assert_eq!(c.decode("2:work:notes!", Some(2), &r), "work:notes!");
        // A glyph embedded in other text is not a glyph section either.
        assert_eq!(c.decode("2:mail ✉ day", Some(2), &r), "mail ✉ day");
    }

    #[test]
    fn decode_custom_name_may_contain_separator() {
        let c = codec();
        let r = registry();
        assert_eq!(c.decode("2:a:b:🌐", Some(2), &r), "a:b");
        assert_eq!(c.decode("2:a:b", Some(2), &r), "a:b");
    }

    #[test]
    fn decode_strips_highlighted_glyphs() {
        let mut config = Config::default();
        config.highlight.focused_fg = Some("#fff".into());
        let r = GlyphRegistry::from_config(&config);
        let c = codec();
        let raw = "2:work:🖥️<span foreground='#fff'>✎</span>";
        assert_eq!(c.decode(raw, Some(2), &r), "work");
    }

    #[test]
    fn decode_without_number() {
        let c = codec();
        let r = registry();
        assert_eq!(c.decode("scratch:🌐", None, &r), "scratch");
        assert_eq!(c.decode("scratch", None, &r), "scratch");
    }

    #[test]
    fn decode_trims_whitespace() {
        assert_eq!(codec().decode("2: work ", Some(2), &registry()), "work");
    }

    #[test]
    fn padded_custom_name_normalizes_once() {
        let c = codec();
        let r = registry();
        // The padding is dropped on the first decode and the name is
        // stable afterwards.
        let label = c.encode(Some(2), " work ", &glyphs(&["🖥️"])).unwrap();
        let decoded = c.decode(&label, Some(2), &r);
        assert_eq!(decoded, "work");
        let re_encoded = c.encode(Some(2), &decoded, &glyphs(&["🖥️"])).unwrap();
        assert_eq!(re_encoded, "2:work:🖥️");
        assert_eq!(c.decode(&re_encoded, Some(2), &r), "work");
    }

    #[test]
    fn glyph_separator_is_honoured() {
        let c = LabelCodec::new(":", "|");
        let r = registry();
        let label = c.encode(Some(4), "av", &glyphs(&["♪", "🌐"])).unwrap();
        assert_eq!(label, "4:av:♪|🌐");
        assert_eq!(c.decode(&label, Some(4), &r), "av");
    }

    #[test]
    fn round_trip_is_stable() {
        let c = codec();
        let r = registry();
        let cases: &[(Option<i32>, &str, &[&str])] = &[
            (Some(1), "", &["🌐"]),
            (Some(2), "work", &["🖥️", "✎"]),
            (Some(10), "a:b c", &["🌐", "💬"]),
            (None, "scratch", &["📄"]),
            (Some(7), "mail ✉ day", &[]),
        ];
        for (number, custom, gs) in cases {
            let encoded = c.encode(*number, custom, &glyphs(gs)).unwrap();
            let decoded = c.decode(&encoded, *number, &r);
            assert_eq!(decoded, *custom, "round trip of {:?}", encoded);
            // And again, to show nothing drifts on a second cycle.
            let re_encoded = c.encode(*number, &decoded, &glyphs(gs)).unwrap();
            assert_eq!(re_encoded, encoded);
        }
    }
}
