//! Filesystem stand-in for an editor: every file on disk counts as open.

use std::path::Path;

use savecheck_engine::Editor;
use savecheck_types::{FileId, Point};

#[derive(Debug, Default, Clone, Copy)]
pub struct FsEditor;

impl Editor for FsEditor {
    fn find_open_file(&self, path: &Path) -> Option<FileId> {
        if !path.is_file() {
            return None;
        }
        path.canonicalize().ok().map(FileId::new)
    }

    fn end_point(&self, file: &FileId) -> Point {
        match std::fs::read_to_string(file.path()) {
            Ok(content) => end_of(&content),
            Err(e) => {
                tracing::warn!(path = %file, "Failed to read file: {e}");
                Point::new(0, 0)
            }
        }
    }
}

fn end_of(content: &str) -> Point {
    let row = content.matches('\n').count();
    let last_line = content.rsplit('\n').next().unwrap_or_default();
    Point::new(row, last_line.chars().count())
}
