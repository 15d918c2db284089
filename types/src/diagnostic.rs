//! Structured compiler diagnostics, as emitted by `--error-format=json`.
//!
//! These mirror rustc's wire format closely; fields we never read (byte
//! offsets, source text excerpts, applicability) are dropped at
//! deserialization.

use serde::{Deserialize, Serialize};

/// Severity of a diagnostic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "warning")]
    Warning,
    #[serde(rename = "note", alias = "failure-note")]
    Note,
    #[serde(rename = "help")]
    Help,
    #[serde(rename = "error: internal compiler error")]
    InternalError,
}

impl Level {
    /// Only plain errors are highlighted with the error scope; an ICE is
    /// a toolchain bug rather than something wrong with the user's code.
    #[must_use]
    pub fn is_error(self) -> bool {
        self == Self::Error
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Note => "note",
            Self::Help => "help",
            Self::InternalError => "error: internal compiler error",
        }
    }
}

/// Error code attached to a diagnostic, e.g. `E0308`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticCode {
    pub code: String,
    /// Long-form explanation. Not every code has one.
    #[serde(default)]
    pub explanation: Option<String>,
}

impl DiagnosticCode {
    #[must_use]
    pub fn has_explanation(&self) -> bool {
        self.explanation.as_deref().is_some_and(|e| !e.is_empty())
    }
}

/// One node of a diagnostic tree: a message plus nested notes/help.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    pub level: Level,
    pub message: String,
    #[serde(default)]
    pub code: Option<DiagnosticCode>,
    #[serde(default)]
    pub spans: Vec<Span>,
    #[serde(default)]
    pub children: Vec<DiagnosticRecord>,
    /// The message as rustc would print it to a terminal.
    #[serde(default)]
    pub rendered: Option<String>,
}

impl DiagnosticRecord {
    /// Parse a single JSON line as emitted by rustc.
    pub fn from_json(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// A file-relative text range flagged by a diagnostic.
///
/// Lines and columns are 1-based, as rustc reports them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub file_name: String,
    pub line_start: usize,
    pub line_end: usize,
    pub column_start: usize,
    pub column_end: usize,
    pub is_primary: bool,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub suggested_replacement: Option<String>,
    #[serde(default)]
    pub expansion: Option<Box<SpanExpansion>>,
    /// Source lines covered by the span, as rustc saw them.
    #[serde(default)]
    pub text: Vec<SpanLine>,
}

impl Span {
    /// Whether `file_name` names a macro expansion rather than a file on
    /// disk, e.g. `<std macros>` or `<::core::macros::panic macros>`.
    #[must_use]
    pub fn is_macro_expansion(&self) -> bool {
        let name = self.file_name.as_str();
        name.contains("macros>") || (name.starts_with('<') && name.ends_with('>'))
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref().filter(|l| !l.is_empty())
    }

    /// Replacement text, if non-empty. Pure deletions are not shown.
    #[must_use]
    pub fn suggested_replacement(&self) -> Option<&str> {
        self.suggested_replacement
            .as_deref()
            .filter(|r| !r.is_empty())
    }

    /// The source line(s) covered by this span with the suggested
    /// replacement spliced in.
    ///
    /// Returns `None` without a replacement or without source text.
    #[must_use]
    pub fn corrected_source(&self) -> Option<String> {
        let replacement = self.suggested_replacement()?;
        let first = self.text.first()?;
        let last = self.text.last()?;
        let prefix: String = first
            .text
            .chars()
            .take(first.highlight_start.saturating_sub(1))
            .collect();
        let suffix: String = last
            .text
            .chars()
            .skip(last.highlight_end.saturating_sub(1))
            .collect();
        Some(format!("{prefix}{replacement}{suffix}"))
    }

    /// The span this one was expanded from, if any.
    #[must_use]
    pub fn expanded_from(&self) -> Option<&Span> {
        self.expansion.as_deref().map(|e| &e.span)
    }
}

/// One source line of a span. Highlight offsets are 1-based characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanLine {
    pub text: String,
    pub highlight_start: usize,
    pub highlight_end: usize,
}

/// Link from an expanded span back to the macro invocation that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanExpansion {
    pub span: Span,
    #[serde(default)]
    pub macro_decl_name: Option<String>,
}
