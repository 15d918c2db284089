//! Seams to the host editor.
//!
//! The engine never touches text buffers or draws anything itself. It asks
//! an [`Editor`] which files are open and hands finished
//! [`AnnotationGroup`]s to a [`PresentationSink`].

use std::path::Path;

use savecheck_types::{AnnotationGroup, FileId, Point};

/// Read-only view of the editor's open buffers.
pub trait Editor {
    /// The open buffer for `path`, if any. Implementations resolve
    /// symlinks so different spellings of a path find the same buffer.
    fn find_open_file(&self, path: &Path) -> Option<FileId>;

    /// Position just past the last character of an open buffer.
    fn end_point(&self, file: &FileId) -> Point;
}

/// Where annotations end up.
///
/// `clear_all` is always called before a new set is shown, so sinks never
/// need to merge.
pub trait PresentationSink {
    /// Remove every highlight and popup this checker has drawn.
    fn clear_all(&mut self);

    /// Draw one file's annotations.
    fn show_annotations(&mut self, file: &FileId, group: &AnnotationGroup);

    /// Show a transient status message while a check runs.
    fn set_status(&mut self, _message: &str) {}

    fn erase_status(&mut self) {}
}

/// What a click on a popup link should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// The dismiss link was clicked; annotations have been cleared.
    Dismissed,
    /// Any other link; the host should open it.
    Open(String),
}
