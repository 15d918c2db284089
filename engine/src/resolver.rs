//! Target resolution: which Cargo target(s) to check for a source file.
//!
//! Resolution order, first non-empty result wins:
//!
//! 1. Manual per-project overrides from settings.
//! 2. A target whose entry point *is* the file.
//! 3. Targets whose entry point lives in the nearest ancestor directory of
//!    the file that has any.
//!
//! An empty result means "don't know how to check this file".

use std::path::{Path, PathBuf};

use savecheck_config::Settings;
use savecheck_types::{InvocationArgs, TargetInvocation, UnknownTargetKind};

use crate::metadata::{Metadata, Package, RawTarget};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("target `{target}` in package `{package}`: {source}")]
    UnknownTargetKind {
        package: String,
        target: String,
        #[source]
        source: UnknownTargetKind,
    },
}

/// Invocations to run for a file, plus the directory rustc's relative
/// file names are reported against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub invocations: Vec<TargetInvocation>,
    pub workspace_root: Option<PathBuf>,
}

impl Resolution {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }
}

/// Check settings for a manual target override covering `file`.
#[must_use]
pub fn manual_targets(file: &Path, settings: &Settings) -> Option<Resolution> {
    for project in settings.projects.values() {
        let src_root = project.src_root();
        if !file.starts_with(&src_root) {
            continue;
        }

        let exact = project
            .file_targets()
            .find(|(rel, _)| src_root.join(rel) == file);
        let invocation = match exact {
            Some((rel, args)) => TargetInvocation::new(
                Some(src_root.join(rel)),
                InvocationArgs::Manual(args.to_string()),
            ),
            None => match project.default_target() {
                Some(args) => {
                    TargetInvocation::new(None, InvocationArgs::Manual(args.to_string()))
                }
                None => continue,
            },
        };

        tracing::debug!(
            file = %file.display(),
            args = %invocation.args(),
            "Using manual target override"
        );
        return Some(Resolution {
            invocations: vec![invocation],
            workspace_root: Some(project.root().to_path_buf()),
        });
    }
    None
}

/// Resolve targets for `file` from Cargo metadata.
///
/// Each package is tried in turn: exact match first, then nearest
/// directory.
pub fn metadata_targets(file: &Path, metadata: &Metadata) -> Result<Resolution, ResolveError> {
    for package in &metadata.packages {
        let mut invocations = exact_match(file, package)?;
        if invocations.is_empty() {
            invocations = nearest_directory_match(file, package)?;
        }
        if !invocations.is_empty() {
            return Ok(Resolution {
                invocations,
                workspace_root: metadata.workspace_root.clone(),
            });
        }
    }

    tracing::info!(file = %file.display(), "Failed to find target");
    Ok(Resolution::default())
}

/// Full resolution: manual overrides, then metadata.
pub fn resolve_targets(
    file: &Path,
    settings: &Settings,
    metadata: &Metadata,
) -> Result<Resolution, ResolveError> {
    match manual_targets(file, settings) {
        Some(resolution) => Ok(resolution),
        None => metadata_targets(file, metadata),
    }
}

fn to_invocation(
    package: &Package,
    target: &RawTarget,
) -> Result<Option<TargetInvocation>, ResolveError> {
    let build_target =
        target
            .to_build_target()
            .map_err(|source| ResolveError::UnknownTargetKind {
                package: package.name.clone(),
                target: target.name.clone(),
                source,
            })?;
    Ok(build_target.invocation())
}

fn exact_match(file: &Path, package: &Package) -> Result<Vec<TargetInvocation>, ResolveError> {
    for target in package.targets.iter().filter(|t| t.src_path == file) {
        if let Some(invocation) = to_invocation(package, target)? {
            return Ok(vec![invocation]);
        }
    }
    Ok(Vec::new())
}

fn nearest_directory_match(
    file: &Path,
    package: &Package,
) -> Result<Vec<TargetInvocation>, ResolveError> {
    let mut result = Vec::new();

    for dir in file.ancestors().skip(1) {
        for target in &package.targets {
            if target.src_path.parent() != Some(dir) {
                continue;
            }
            if let Some(invocation) = to_invocation(package, target)? {
                result.push(invocation);
            }
        }
        if !result.is_empty() {
            break;
        }
    }

    // A binary next to a library usually just wraps it; checking both would
    // report every library diagnostic twice.
    let has_lib = result.iter().any(|i| i.args().is_library());
    let has_bin = result.iter().any(|i| i.args().is_bin());
    if has_lib && has_bin {
        result.retain(|i| !i.args().is_bin());
    }

    Ok(result)
}
