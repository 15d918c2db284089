//! On-save diagnostic projection for Rust.
//!
//! Given a saved file, find the Cargo target(s) that compile it, run
//! `cargo check` with JSON output, and turn the resulting diagnostic trees
//! into highlight regions and popups for the files the editor has open.

pub mod aggregate;
pub mod editor;
pub mod metadata;
pub mod render;
pub mod resolver;
pub mod span;
pub mod toolchain;

mod checker;

pub use aggregate::{AggregateError, Aggregator, Anchor, CheckRun};
pub use checker::{CheckError, CheckOutcome, Checker, STATUS_RUNNING};
pub use editor::{Editor, Navigation, PresentationSink};
pub use metadata::{Metadata, MetadataError};
pub use resolver::{Resolution, ResolveError, resolve_targets};
pub use span::{ResolvedSpan, resolve_span};
pub use toolchain::{CargoOutput, CargoToolchain, FetchError, Toolchain};
