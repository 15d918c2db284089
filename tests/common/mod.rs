//! Shared test utilities and fixtures
//!
//! Fake collaborators for driving a `Checker` without cargo or an editor.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use savecheck_engine::{CargoOutput, Editor, FetchError, PresentationSink, Toolchain};
use savecheck_types::{AnnotationGroup, FileId, Point};

/// Answers `cargo metadata` with a fixed document and `cargo check` with
/// output keyed by the target arguments (everything between `check` and
/// `--message-format=json`).
#[derive(Default)]
pub struct ScriptedToolchain {
    metadata: Option<String>,
    checks: BTreeMap<String, Vec<serde_json::Value>>,
    calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
}

impl ScriptedToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata.to_string());
        self
    }

    /// Diagnostics emitted when checking with `target_args`, wrapped in
    /// cargo's `compiler-message` envelope.
    pub fn with_check(mut self, target_args: &str, records: Vec<serde_json::Value>) -> Self {
        self.checks.insert(target_args.to_string(), records);
        self
    }

    pub fn calls(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }

    /// Target arguments of each `cargo check` call, in order.
    pub fn checked_targets(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(_, args)| args[0] == "check")
            .map(|(_, args)| target_args(&args))
            .collect()
    }
}

fn target_args(args: &[String]) -> String {
    args.iter()
        .skip(1)
        .take_while(|arg| !arg.starts_with("--message-format"))
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
}

impl Toolchain for ScriptedToolchain {
    async fn run_cargo(&self, dir: &Path, args: &[String]) -> Result<CargoOutput, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((dir.to_path_buf(), args.to_vec()));

        if args[0] == "metadata" {
            return Ok(match &self.metadata {
                Some(stdout) => CargoOutput {
                    success: true,
                    stdout: stdout.clone(),
                    stderr: String::new(),
                },
                None => CargoOutput {
                    success: false,
                    stdout: String::new(),
                    stderr: "error: could not find `Cargo.toml`".to_string(),
                },
            });
        }

        let records = self.checks.get(&target_args(args)).cloned().unwrap_or_default();
        let mut stdout = String::from("   Compiling p v0.1.0 (/p)\n");
        for record in &records {
            let envelope = serde_json::json!({
                "reason": "compiler-message",
                "package_id": "p 0.1.0 (path+file:///p)",
                "message": record,
            });
            stdout.push_str(&envelope.to_string());
            stdout.push('\n');
        }
        stdout.push_str(&serde_json::json!({"reason": "build-finished", "success": records.is_empty()}).to_string());
        Ok(CargoOutput {
            success: records.is_empty(),
            stdout,
            stderr: String::new(),
        })
    }
}

/// An editor with a fixed set of open files. Every file is 30 lines long.
pub struct OpenFiles(BTreeSet<PathBuf>);

impl OpenFiles {
    pub fn new(paths: &[&str]) -> Self {
        Self(paths.iter().map(PathBuf::from).collect())
    }
}

impl Editor for OpenFiles {
    fn find_open_file(&self, path: &Path) -> Option<FileId> {
        self.0.contains(path).then(|| FileId::new(path))
    }

    fn end_point(&self, _file: &FileId) -> Point {
        Point::new(30, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Clear,
    Show(FileId),
    Status(String),
    EraseStatus,
}

/// Records every call and keeps the last drawn state.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
    pub drawn: BTreeMap<FileId, AnnotationGroup>,
}

impl PresentationSink for RecordingSink {
    fn clear_all(&mut self) {
        self.events.push(SinkEvent::Clear);
        self.drawn.clear();
    }

    fn show_annotations(&mut self, file: &FileId, group: &AnnotationGroup) {
        self.events.push(SinkEvent::Show(file.clone()));
        self.drawn.insert(file.clone(), group.clone());
    }

    fn set_status(&mut self, message: &str) {
        self.events.push(SinkEvent::Status(message.to_string()));
    }

    fn erase_status(&mut self) {
        self.events.push(SinkEvent::EraseStatus);
    }
}

/// `cargo metadata` for a single package rooted at `/p`.
pub fn metadata(targets: &[(&str, &str, &str)]) -> serde_json::Value {
    let targets: Vec<serde_json::Value> = targets
        .iter()
        .map(|(kind, name, src_path)| {
            serde_json::json!({"kind": [kind], "name": name, "src_path": src_path})
        })
        .collect();
    serde_json::json!({
        "packages": [{
            "name": "p",
            "version": "0.1.0",
            "manifest_path": "/p/Cargo.toml",
            "targets": targets,
        }],
        "workspace_root": "/p",
        "version": 1
    })
}

/// A single-line span in `file` at 1-based `line`, columns 5..9.
pub fn span(file: &str, line: usize, primary: bool, label: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "file_name": file,
        "byte_start": 0, "byte_end": 4,
        "line_start": line, "line_end": line,
        "column_start": 5, "column_end": 9,
        "is_primary": primary,
        "label": label,
        "suggested_replacement": null,
        "suggestion_applicability": null,
        "expansion": null,
        "text": []
    })
}

pub fn diagnostic(
    level: &str,
    message: &str,
    spans: Vec<serde_json::Value>,
    children: Vec<serde_json::Value>,
) -> serde_json::Value {
    serde_json::json!({
        "$message_type": "diagnostic",
        "level": level,
        "message": message,
        "code": null,
        "spans": spans,
        "children": children,
        "rendered": null
    })
}
