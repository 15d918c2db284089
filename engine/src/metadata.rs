//! `cargo metadata` output: packages and their declared targets.

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use savecheck_types::{BuildTarget, TargetKind, UnknownTargetKind};

use crate::toolchain::FetchError;

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("cargo metadata produced no JSON output")]
    NoOutput,
    #[error("parsing cargo metadata: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The subset of `cargo metadata --no-deps --format-version 1` we read.
#[derive(Debug, Clone, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,
    pub packages: Vec<Package>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Package {
    pub name: String,
    pub manifest_path: PathBuf,
    pub targets: Vec<RawTarget>,
}

/// A target as Cargo spells it. `kind` may list several crate types.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTarget {
    pub kind: Vec<String>,
    pub name: String,
    pub src_path: PathBuf,
}

impl RawTarget {
    /// Resolve into a [`BuildTarget`].
    ///
    /// Only libraries carry several kinds (`crate-type = ["rlib", "dylib"]`),
    /// and those all build with `--lib`, so the first kind decides.
    pub fn to_build_target(&self) -> Result<BuildTarget, UnknownTargetKind> {
        let kind = match self.kind.first() {
            Some(kind) => kind.parse::<TargetKind>()?,
            None => return Err(UnknownTargetKind(String::new())),
        };
        Ok(BuildTarget::new(
            self.src_path.clone(),
            kind,
            self.name.clone(),
        ))
    }
}

impl Metadata {
    /// Parse the combined output of `cargo metadata`.
    ///
    /// Cargo may print warnings before the JSON document; the first line
    /// that looks like a JSON object is the one we want.
    pub fn from_output(output: &str) -> Result<Self, MetadataError> {
        let line = output
            .lines()
            .find(|line| line.starts_with('{'))
            .ok_or(MetadataError::NoOutput)?;
        let mut metadata: Metadata = serde_json::from_str(line)?;
        metadata.normalize();
        Ok(metadata)
    }

    /// Make every target's `src_path` absolute and free of `.`/`..`.
    fn normalize(&mut self) {
        for package in &mut self.packages {
            let root = package
                .manifest_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            for target in &mut package.targets {
                let joined = if target.src_path.is_absolute() {
                    target.src_path.clone()
                } else {
                    root.join(&target.src_path)
                };
                target.src_path = normalize_path(&joined);
            }
        }
    }
}

/// Lexically normalize a path: drop `.` and resolve `..` against the
/// preceding component. Does not touch the filesystem.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = Vec::new();
    for c in path.components() {
        match c {
            Component::ParentDir => {
                if matches!(out.last(), Some(Component::Normal(_))) {
                    out.pop();
                }
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out.iter().collect()
}
