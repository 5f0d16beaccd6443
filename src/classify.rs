//! Window classification.
//!
//! Maps window metadata (class, instance, title) to an [`ApplicationId`]
//! through an ordered list of rules.  Rules are evaluated front to back and
//! the first match wins, so more specific rules (exact class matches) come
//! before generic ones (title substrings).  Appending a rule never requires
//! touching the existing ones.
//!
//! Classification is total: every predicate tolerates empty metadata fields,
//! and a window no rule matches is [`ApplicationId::Unknown`] — never an
//! error.

use crate::store::Window;

/// The application category a window belongs to.
///
/// [`as_str`](ApplicationId::as_str) keys into the configured glyph table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationId {
    Browser,
    Terminal,
    Editor,
    FileManager,
    Media,
    Chat,
    Mail,
    Document,
    /// No rule matched.  Rendered with the default glyph.
    Unknown,
}

impl ApplicationId {
    /// The glyph-table key for this identity.
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationId::Browser => "browser",
            ApplicationId::Terminal => "terminal",
            ApplicationId::Editor => "editor",
            ApplicationId::FileManager => "file_manager",
            ApplicationId::Media => "media",
            ApplicationId::Chat => "chat",
            ApplicationId::Mail => "mail",
            ApplicationId::Document => "document",
            ApplicationId::Unknown => "default",
        }
    }

    /// Every identity a rule can produce, in no particular order.
    pub fn all() -> [ApplicationId; 9] {
        [
            ApplicationId::Browser,
            ApplicationId::Terminal,
            ApplicationId::Editor,
            ApplicationId::FileManager,
            ApplicationId::Media,
            ApplicationId::Chat,
            ApplicationId::Mail,
            ApplicationId::Document,
            ApplicationId::Unknown,
        ]
    }
}

/// One classification rule: a predicate and the identity it maps to.
#[derive(Clone, Copy)]
pub struct Rule {
    pub app: ApplicationId,
    pub matches: fn(&Window) -> bool,
}

/// Ordered first-match rule engine.
pub struct Classifier {
    rules: Vec<Rule>,
}

impl Classifier {
    /// A classifier with the built-in rule set.
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    /// A classifier with a caller-supplied rule list, evaluated in order.
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Append a rule with the lowest priority.
    pub fn push_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Classify a window.  The first matching rule wins; no match is
    /// [`ApplicationId::Unknown`].
    pub fn classify(&self, window: &Window) -> ApplicationId {
        self.rules
            .iter()
            .find(|rule| (rule.matches)(window))
            .map(|rule| rule.app)
            .unwrap_or(ApplicationId::Unknown)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

//  Built-in rules

fn class_in(window: &Window, classes: &[&str]) -> bool {
    classes.iter().any(|c| window.class == *c)
}

fn is_terminal(w: &Window) -> bool {
    class_in(
        w,
        &[
            "Gnome-terminal",
            "URxvt",
            "XTerm",
            "st-256color",
            "st",
            "Alacritty",
            "kitty",
            "foot",
        ],
    )
}

fn is_browser(w: &Window) -> bool {
    class_in(
        w,
        &[
            "Firefox",
            "firefox",
            "Chromium",
            "chromium",
            "Google-chrome",
            "qutebrowser",
        ],
    )
}

fn is_editor(w: &Window) -> bool {
    class_in(w, &["gvim", "Gvim", "Emacs", "Code", "code-oss", "Geany"])
}

fn is_file_manager(w: &Window) -> bool {
    class_in(w, &["Thunar", "Nautilus", "Pcmanfm", "dolphin"])
}

fn is_media(w: &Window) -> bool {
    class_in(w, &["mpv", "vlc", "Spotify"])
}

fn is_chat(w: &Window) -> bool {
    class_in(w, &["Slack", "discord", "TelegramDesktop", "Signal"])
}

fn is_mail(w: &Window) -> bool {
    class_in(w, &["Thunderbird", "Evolution"])
}

fn is_document(w: &Window) -> bool {
    class_in(w, &["Zathura", "Evince", "Xreader"])
        || w.class.starts_with("libreoffice")
}

// Generic title fallbacks, lower priority than any class rule.

fn title_says_editor(w: &Window) -> bool {
    w.title.ends_with(" - VIM") || w.title.contains("Visual Studio Code")
}

fn title_says_browser(w: &Window) -> bool {
    w.title.contains("Mozilla Firefox") || w.title.contains("Chromium")
}

/// The built-in rule list, most specific first.
fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            app: ApplicationId::Terminal,
            matches: is_terminal,
        },
        Rule {
            app: ApplicationId::Browser,
            matches: is_browser,
        },
        Rule {
            app: ApplicationId::Editor,
            matches: is_editor,
        },
        Rule {
            app: ApplicationId::FileManager,
            matches: is_file_manager,
        },
        Rule {
            app: ApplicationId::Media,
            matches: is_media,
        },
        Rule {
            app: ApplicationId::Chat,
            matches: is_chat,
        },
        Rule {
            app: ApplicationId::Mail,
            matches: is_mail,
        },
        Rule {
            app: ApplicationId::Document,
            matches: is_document,
        },
        Rule {
            app: ApplicationId::Editor,
            matches: title_says_editor,
        },
        Rule {
            app: ApplicationId::Browser,
            matches: title_says_browser,
        },
    ]
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;

    fn window(class: &str, instance: &str, title: &str) -> Window {
        Window {
            id: 1,
            class: class.into(),
            instance: instance.into(),
            title: title.into(),
        }
    }

    #[test]
    fn classifies_known_classes() {
        let c = Classifier::new();
        assert_eq!(c.classify(&window("Firefox", "", "")), ApplicationId::Browser);
        assert_eq!(c.classify(&window("st", "st", "zsh")), ApplicationId::Terminal);
        assert_eq!(c.classify(&window("gvim", "", "")), ApplicationId::Editor);
    }

    #[test]
    fn unmatched_window_is_unknown() {
        let c = Classifier::new();
        assert_eq!(
            c.classify(&window("SomethingElse", "x", "y")),
            ApplicationId::Unknown
        );
    }

    #[test]
    fn empty_metadata_is_unknown_not_a_panic() {
        let c = Classifier::new();
        assert_eq!(c.classify(&window("", "", "")), ApplicationId::Unknown);
    }

    #[test]
    fn classification_is_deterministic() {
        let c = Classifier::new();
        let w = window("URxvt", "urxvt", "mutt");
        assert_eq!(c.classify(&w), c.classify(&w));
    }

    #[test]
    fn class_rule_beats_title_fallback() {
        // A terminal running vim stays a terminal: the exact class rule has
        // higher priority than the generic title substring rule.
        let c = Classifier::new();
        let w = window("st-256color", "st", "notes.md - VIM");
        assert_eq!(c.classify(&w), ApplicationId::Terminal);
    }

    #[test]
    fn title_fallback_matches_without_class() {
        let c = Classifier::new();
        let w = window("", "", "rust - Mozilla Firefox");
        assert_eq!(c.classify(&w), ApplicationId::Browser);
    }

    #[test]
    fn appended_rule_has_lowest_priority() {
        fn anything(_: &Window) -> bool {
            true
        }
        let mut c = Classifier::new();
        c.push_rule(Rule {
            app: ApplicationId::Media,
            matches: anything,
        });
        // Existing rules still win where they match…
        assert_eq!(c.classify(&window("Firefox", "", "")), ApplicationId::Browser);
        // …and the new rule catches the rest.
        assert_eq!(c.classify(&window("zzz", "", "")), ApplicationId::Media);
    }
}
