//! Annotation aggregation: turns diagnostic trees into per-file
//! annotation groups.
//!
//! A diagnostic tree is walked depth-first. The first primary span that
//! lands in an open file becomes the *anchor*; spanless children (notes,
//! help) attach to it instead of floating free. The anchor is threaded
//! explicitly through the walk and shared by siblings, so a child that
//! moves it affects the children after it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use savecheck_config::Settings;
use savecheck_types::{
    Annotation, AnnotationGroup, DiagnosticRecord, FileId, Level, Region, Scope, Span,
};

use crate::editor::Editor;
use crate::metadata::normalize_path;
use crate::render::{Palette, escape_message, explanation_link, popup_html};
use crate::span::resolve_span;

/// Whole-session messages that carry no information worth showing.
const NOISE_PREFIXES: [&str; 2] = ["aborting due to", "cannot continue"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    /// rustc gave a span that is neither primary nor labeled nor a
    /// suggestion, so there is nothing to show for it.
    #[error("span {file}:{line}:{column} has no label, is not primary, and suggests nothing ({message})")]
    MalformedSpan {
        file: String,
        line: usize,
        column: usize,
        message: String,
    },
}

/// Where child messages of the current diagnostic attach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub file: FileId,
    pub region: Region,
}

/// Accumulated state of one check run.
#[derive(Debug)]
pub struct CheckRun {
    triggering_file: FileId,
    found_for_triggering_file: bool,
    per_file: BTreeMap<FileId, AnnotationGroup>,
    errors: Vec<AggregateError>,
}

impl CheckRun {
    #[must_use]
    pub fn new(triggering_file: FileId) -> Self {
        Self {
            triggering_file,
            found_for_triggering_file: false,
            per_file: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn triggering_file(&self) -> &FileId {
        &self.triggering_file
    }

    /// Whether any annotation has landed in the file that was saved.
    #[must_use]
    pub fn found_for_triggering_file(&self) -> bool {
        self.found_for_triggering_file
    }

    #[must_use]
    pub fn group(&self, file: &FileId) -> Option<&AnnotationGroup> {
        self.per_file.get(file)
    }

    #[must_use]
    pub fn per_file(&self) -> &BTreeMap<FileId, AnnotationGroup> {
        &self.per_file
    }

    /// Malformed diagnostics seen during the run.
    #[must_use]
    pub fn errors(&self) -> &[AggregateError] {
        &self.errors
    }

    #[must_use]
    pub fn into_per_file(self) -> BTreeMap<FileId, AnnotationGroup> {
        self.per_file
    }
}

/// Builds annotations for one run.
pub struct Aggregator<'a, E: Editor + ?Sized> {
    editor: &'a E,
    settings: &'a Settings,
    /// Directory rustc's relative file names are resolved against.
    base_dir: &'a Path,
}

impl<'a, E: Editor + ?Sized> Aggregator<'a, E> {
    pub fn new(editor: &'a E, settings: &'a Settings, base_dir: &'a Path) -> Self {
        Self {
            editor,
            settings,
            base_dir,
        }
    }

    /// Add one top-level diagnostic tree to `run`.
    ///
    /// `target_src` is the entry point of the target being checked; spanless
    /// session-wide messages are placed at its end if it is open.
    pub fn add_diagnostic(
        &self,
        record: &DiagnosticRecord,
        run: &mut CheckRun,
        target_src: Option<&Path>,
    ) {
        let mut anchor = None;
        self.walk(record, run, target_src, &mut anchor, 0);
    }

    fn walk(
        &self,
        record: &DiagnosticRecord,
        run: &mut CheckRun,
        target_src: Option<&Path>,
        anchor: &mut Option<Anchor>,
        depth: usize,
    ) {
        // Notes under an error are always kept, even with warnings hidden.
        if depth == 0 && self.settings.hide_warnings && !record.level.is_error() {
            return;
        }

        if record.spans.is_empty() {
            self.add_spanless(record, run, target_src, anchor);
        }

        for span in &record.spans {
            self.add_span(record, span, run, anchor);
        }

        for child in &record.children {
            self.walk(child, run, target_src, anchor, depth + 1);
        }
    }

    fn add_spanless(
        &self,
        record: &DiagnosticRecord,
        run: &mut CheckRun,
        target_src: Option<&Path>,
        anchor: &mut Option<Anchor>,
    ) {
        if let Some(parent) = anchor.as_ref() {
            let (file, region) = (parent.file.clone(), parent.region);
            self.add_message(run, &file, region, record.level, &record.message, false, "");
            return;
        }

        if NOISE_PREFIXES
            .iter()
            .any(|prefix| record.message.starts_with(prefix))
        {
            return;
        }

        // Session-wide messages such as "main function not found" belong to
        // the target's root file; the end of it is as good a place as any.
        let Some(src) = target_src else {
            report_silent(None, record.level, &record.message);
            return;
        };
        match self.editor.find_open_file(src) {
            Some(file) => {
                let region = Region::empty_at(self.editor.end_point(&file));
                self.add_primary(record, run, file, region, anchor);
            }
            None => report_silent(Some(src), record.level, &record.message),
        }
    }

    fn add_span(
        &self,
        record: &DiagnosticRecord,
        span: &Span,
        run: &mut CheckRun,
        anchor: &mut Option<Anchor>,
    ) {
        // Primary-ness belongs to the span rustc reported, not to the
        // invocation site it resolves to.
        let is_primary = span.is_primary;
        let Some(resolved) = resolve_span(span) else {
            tracing::debug!(
                file = %span.file_name,
                message = %record.message,
                "Dropping span with unresolvable macro expansion"
            );
            return;
        };
        let span = resolved.span;
        let path = self.resolve_path(&span.file_name);

        let Some(file) = self.editor.find_open_file(&path) else {
            if is_primary {
                report_silent(Some(&path), record.level, &record.message);
            }
            if let Some(label) = span.label() {
                report_silent(Some(&path), record.level, label);
            }
            return;
        };

        let region = Region::from_span(span);

        match span.label() {
            Some(label) => {
                self.add_message(run, &file, region, record.level, label, false, "");
            }
            None if !is_primary && span.suggested_replacement().is_none() => {
                let err = AggregateError::MalformedSpan {
                    file: span.file_name.clone(),
                    line: span.line_start,
                    column: span.column_start,
                    message: record.message.clone(),
                };
                tracing::error!("{err}");
                run.errors.push(err);
                return;
            }
            None => {}
        }

        if is_primary {
            self.add_primary(record, run, file.clone(), region, anchor);
        }

        if span.suggested_replacement().is_some() {
            // The whole corrected line reads better than the bare
            // replacement text.
            let suggestion = record
                .rendered
                .clone()
                .or_else(|| span.corrected_source())
                .or_else(|| span.suggested_replacement().map(String::from));
            if let Some(text) = suggestion {
                self.add_message(run, &file, region, record.level, &text, false, "");
            }
        }
    }

    fn add_primary(
        &self,
        record: &DiagnosticRecord,
        run: &mut CheckRun,
        file: FileId,
        region: Region,
        anchor: &mut Option<Anchor>,
    ) {
        let extra = explanation_link(record.code.as_ref());
        self.add_message(run, &file, region, record.level, &record.message, true, &extra);
        *anchor = Some(Anchor { file, region });
    }

    #[allow(clippy::too_many_arguments)]
    fn add_message(
        &self,
        run: &mut CheckRun,
        file: &FileId,
        region: Region,
        level: Level,
        message: &str,
        is_primary: bool,
        extra: &str,
    ) {
        if *file == run.triggering_file {
            run.found_for_triggering_file = true;
        }

        let group = run.per_file.entry(file.clone()).or_default();
        group.add_highlight(Scope::for_level(level), region);

        let palette = Palette {
            error: &self.settings.error_color,
            warning: &self.settings.warning_color,
        };
        let message_html = escape_message(message);
        let html = popup_html(level, &message_html, extra, palette);
        group.push(Annotation {
            region: region.popup_anchor(),
            level,
            message_html,
            html,
            is_primary,
        });
    }

    fn resolve_path(&self, file_name: &str) -> PathBuf {
        let path = Path::new(file_name);
        if path.is_absolute() {
            normalize_path(path)
        } else {
            normalize_path(&self.base_dir.join(path))
        }
    }
}

/// Log a message that has nowhere to be drawn.
fn report_silent(path: Option<&Path>, level: Level, message: &str) {
    let path = path.map(|p| p.display().to_string()).unwrap_or_default();
    tracing::info!(path = %path, level = level.label(), "{message}");
}
