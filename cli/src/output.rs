//! Printing annotation sets to a terminal or as JSON.

use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Serialize;

use savecheck_engine::{CheckOutcome, PresentationSink};
use savecheck_types::{AnnotationGroup, FileId, Region};

/// Collects whatever the checker asks to draw.
#[derive(Debug, Default)]
pub struct PrintSink {
    shown: BTreeMap<FileId, AnnotationGroup>,
    verbose: bool,
}

impl PrintSink {
    pub fn new(verbose: bool) -> Self {
        Self {
            shown: BTreeMap::new(),
            verbose,
        }
    }

    pub fn shown(&self) -> &BTreeMap<FileId, AnnotationGroup> {
        &self.shown
    }
}

impl PresentationSink for PrintSink {
    fn clear_all(&mut self) {
        self.shown.clear();
    }

    fn show_annotations(&mut self, file: &FileId, group: &AnnotationGroup) {
        self.shown.insert(file.clone(), group.clone());
    }

    fn set_status(&mut self, message: &str) {
        if self.verbose {
            eprintln!("{message}");
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    outcome: &'static str,
    files: Vec<FileReport<'a>>,
}

#[derive(Serialize)]
struct FileReport<'a> {
    file: &'a FileId,
    #[serde(flatten)]
    group: &'a AnnotationGroup,
}

fn outcome_name(outcome: &CheckOutcome) -> &'static str {
    match outcome {
        CheckOutcome::Disabled => "disabled",
        CheckOutcome::NoTargets => "no_targets",
        CheckOutcome::Checked { .. } => "checked",
    }
}

pub fn render_json(
    outcome: &CheckOutcome,
    shown: &BTreeMap<FileId, AnnotationGroup>,
) -> serde_json::Result<String> {
    let report = Report {
        outcome: outcome_name(outcome),
        files: shown
            .iter()
            .map(|(file, group)| FileReport { file, group })
            .collect(),
    };
    serde_json::to_string_pretty(&report)
}

/// Human-readable listing: one block per file, one line per popup.
pub fn render_text(outcome: &CheckOutcome, shown: &BTreeMap<FileId, AnnotationGroup>) -> String {
    let mut out = String::new();
    match outcome {
        CheckOutcome::Disabled => out.push_str("checking is disabled\n"),
        CheckOutcome::NoTargets => out.push_str("no cargo target covers this file\n"),
        CheckOutcome::Checked { .. } if shown.is_empty() => out.push_str("no diagnostics\n"),
        CheckOutcome::Checked { .. } => {}
    }

    for (file, group) in shown {
        let _ = writeln!(out, "{file}");
        for (scope, regions) in group.scopes() {
            let spans: Vec<String> = regions.iter().map(|r| format_region(*r)).collect();
            let _ = writeln!(out, "  [{}] {}", scope.theme_scope(), spans.join(", "));
        }
        for annotation in group.annotations() {
            let marker = if annotation.is_primary { "*" } else { "-" };
            let text = plain_text(&annotation.message_html);
            let mut lines = text.lines();
            let _ = writeln!(
                out,
                "  {marker} {} {}: {}",
                format_region(annotation.region),
                annotation.level.label(),
                lines.next().unwrap_or_default()
            );
            for line in lines {
                let _ = writeln!(out, "      {line}");
            }
        }
    }
    out
}

/// 1-based `line:col-line:col`, the way compilers print positions.
fn format_region(region: Region) -> String {
    format!(
        "{}:{}-{}:{}",
        region.start.row + 1,
        region.start.col + 1,
        region.end.row + 1,
        region.end.col + 1
    )
}

/// Undo popup escaping for terminal output.
fn plain_text(message_html: &str) -> String {
    message_html
        .replace("<br>", "\n")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
