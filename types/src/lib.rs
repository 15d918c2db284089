//! Core domain types for savecheck.
//!
//! Pure data: build targets and invocations, rustc's structured diagnostic
//! records, editor coordinates, and the annotation groups handed to a
//! presentation layer. No IO, no async.

mod annotation;
mod diagnostic;
mod region;
mod target;

pub use annotation::{Annotation, AnnotationGroup, FileId, Scope};
pub use diagnostic::{DiagnosticCode, DiagnosticRecord, Level, Span, SpanExpansion, SpanLine};
pub use region::{Point, Region};
pub use target::{BuildTarget, InvocationArgs, TargetInvocation, TargetKind, UnknownTargetKind};
