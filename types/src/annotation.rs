//! Rendered, region-anchored annotations ready for presentation.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::diagnostic::Level;
use crate::region::Region;

/// Stable identifier of a file open in the editor.
///
/// Wraps the canonical path the editor reports for the buffer, so two
/// spellings of the same file map to one key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FileId(PathBuf);

impl FileId {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Highlight scope of a region. Themes color these, not the raw level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Regions belonging to error-level diagnostics.
    Error,
    /// Everything else: warnings, notes, help.
    Info,
}

impl Scope {
    #[must_use]
    pub fn for_level(level: Level) -> Self {
        if level.is_error() {
            Self::Error
        } else {
            Self::Info
        }
    }

    /// Theme scope name used when drawing the highlight.
    #[must_use]
    pub const fn theme_scope(self) -> &'static str {
        match self {
            Self::Error => "invalid",
            Self::Info => "info",
        }
    }
}

/// One popup: an HTML-safe message attached below a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    /// Region the popup is laid out under.
    pub region: Region,
    pub level: Level,
    /// Escaped message body, without the surrounding popup template.
    pub message_html: String,
    /// Full popup content.
    pub html: String,
    /// Whether this carries the diagnostic's main message rather than a
    /// label, note, or suggestion.
    pub is_primary: bool,
}

/// All annotations for one file from one check run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnotationGroup {
    highlights: BTreeMap<Scope, Vec<Region>>,
    annotations: Vec<Annotation>,
}

impl AnnotationGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_highlight(&mut self, scope: Scope, region: Region) {
        self.highlights.entry(scope).or_default().push(region);
    }

    pub fn push(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    /// Highlight regions for `scope`, in insertion order.
    #[must_use]
    pub fn highlights(&self, scope: Scope) -> &[Region] {
        self.highlights.get(&scope).map_or(&[], Vec::as_slice)
    }

    /// Iterate scopes with at least one highlight.
    pub fn scopes(&self) -> impl Iterator<Item = (Scope, &[Region])> {
        self.highlights
            .iter()
            .map(|(scope, regions)| (*scope, regions.as_slice()))
    }

    /// Popups in the order they were produced.
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty() && self.highlights.is_empty()
    }

    #[must_use]
    pub fn primary_count(&self) -> usize {
        self.annotations.iter().filter(|a| a.is_primary).count()
    }
}
