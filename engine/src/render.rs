//! Popup HTML for annotations.
//!
//! rustc pretty-prints suggestions and notes with column-aligned carets and
//! underlines, so messages keep their line breaks and runs of spaces.

use std::fmt::Write;

use savecheck_types::{DiagnosticCode, Level};

/// Link target that dismisses every popup when clicked.
pub const HIDE_URL: &str = "hide";

/// Colors used for the popup text, as CSS tokens.
#[derive(Debug, Clone, Copy)]
pub struct Palette<'a> {
    pub error: &'a str,
    pub warning: &'a str,
}

/// Escape markup-significant characters and keep rustc's layout:
/// newline becomes `<br>`, every space becomes `&nbsp;`. Quotes are left
/// alone; the text never lands inside an attribute.
#[must_use]
pub fn escape_message(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    for c in message.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\n' => out.push_str("<br>"),
            ' ' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
    out
}

/// A ` ?` link to the error index, for codes that have an explanation.
#[must_use]
pub fn explanation_link(code: Option<&DiagnosticCode>) -> String {
    match code {
        Some(code) if code.has_explanation() => format!(
            " <a href=\"https://doc.rust-lang.org/error_codes/{}.html\">?</a>",
            code.code
        ),
        _ => String::new(),
    }
}

/// Full popup body for one message.
///
/// `message_html` must already be escaped; `extra` is trusted markup
/// appended after it (e.g. [`explanation_link`]).
#[must_use]
pub fn popup_html(level: Level, message_html: &str, extra: &str, palette: Palette<'_>) -> String {
    let class = if level.is_error() {
        "rust-error"
    } else {
        "rust-additional"
    };

    let mut html = String::new();
    html.push_str("<body id=\"rust-message\">\n<style>\n");
    html.push_str("span { font-family: monospace; }\n");
    let _ = writeln!(html, ".rust-error {{ color: {}; }}", palette.error);
    let _ = writeln!(html, ".rust-additional {{ color: {}; }}", palette.warning);
    html.push_str(
        "a { text-decoration: inherit; padding: 0.35rem 0.5rem 0.45rem 0.5rem; \
         position: relative; font-weight: bold; }\n",
    );
    html.push_str("</style>\n");
    let _ = write!(
        html,
        "<span class=\"{class}\">{level}: {message_html} {extra}<a href=\"{HIDE_URL}\">\u{d7}</a></span>",
        level = level.label(),
    );
    html.push_str("\n</body>");
    html
}
