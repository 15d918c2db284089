//! Editor coordinates.
//!
//! Everything here is 0-based. The conversion from rustc's 1-based
//! line/column pairs happens exactly once, in [`Region::from_span`].

use serde::Serialize;

use crate::diagnostic::Span;

/// A 0-based `(row, col)` position in a text buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Point {
    pub row: usize,
    pub col: usize,
}

impl Point {
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// A `start..end` range of [`Point`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Region {
    pub start: Point,
    pub end: Point,
}

impl Region {
    #[must_use]
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Zero-width region at `point`.
    #[must_use]
    pub const fn empty_at(point: Point) -> Self {
        Self {
            start: point,
            end: point,
        }
    }

    /// Translate a 1-based rustc span into a 0-based editor region.
    ///
    /// Each of the four values is decremented independently. Zero never
    /// appears in well-formed rustc output; it clamps to zero rather than
    /// wrapping.
    #[must_use]
    pub fn from_span(span: &Span) -> Self {
        Self {
            start: Point::new(
                span.line_start.saturating_sub(1),
                span.column_start.saturating_sub(1),
            ),
            end: Point::new(
                span.line_end.saturating_sub(1),
                span.column_end.saturating_sub(1),
            ),
        }
    }

    #[must_use]
    pub fn is_multiline(&self) -> bool {
        self.start.row != self.end.row
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Region a below-the-line popup should attach to.
    ///
    /// Popups for a multi-line region read better under its last line, so
    /// the region is narrowed to start at column 0 of that line.
    #[must_use]
    pub fn popup_anchor(&self) -> Self {
        if self.is_multiline() {
            Self::new(Point::new(self.end.row, 0), self.end)
        } else {
            *self
        }
    }
}
