//! Build targets and the toolchain invocations derived from them.
//!
//! A [`BuildTarget`] is what Cargo metadata declares; a [`TargetInvocation`]
//! is what we hand to the toolchain to get diagnostics covering that target.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Cargo metadata reported a target kind we don't know how to build.
///
/// This is a configuration problem in the project, not a transient one, so
/// it is never silently skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown target kind `{0}`")]
pub struct UnknownTargetKind(pub String);

/// Kind of a Cargo target, as spelled in `cargo metadata` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Lib,
    Rlib,
    Dylib,
    Staticlib,
    ProcMacro,
    Bin,
    Test,
    Example,
    Bench,
    CustomBuild,
}

impl TargetKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lib => "lib",
            Self::Rlib => "rlib",
            Self::Dylib => "dylib",
            Self::Staticlib => "staticlib",
            Self::ProcMacro => "proc-macro",
            Self::Bin => "bin",
            Self::Test => "test",
            Self::Example => "example",
            Self::Bench => "bench",
            Self::CustomBuild => "custom-build",
        }
    }

    /// All library flavours build with the same `--lib` argument.
    #[must_use]
    pub const fn is_library(self) -> bool {
        matches!(
            self,
            Self::Lib | Self::Rlib | Self::Dylib | Self::Staticlib | Self::ProcMacro
        )
    }
}

impl FromStr for TargetKind {
    type Err = UnknownTargetKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lib" => Ok(Self::Lib),
            "rlib" => Ok(Self::Rlib),
            "dylib" => Ok(Self::Dylib),
            "staticlib" => Ok(Self::Staticlib),
            "proc-macro" => Ok(Self::ProcMacro),
            "bin" => Ok(Self::Bin),
            "test" => Ok(Self::Test),
            "example" => Ok(Self::Example),
            "bench" => Ok(Self::Bench),
            "custom-build" => Ok(Self::CustomBuild),
            other => Err(UnknownTargetKind(other.to_string())),
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, independently buildable unit of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    src_path: PathBuf,
    kind: TargetKind,
    name: String,
}

impl BuildTarget {
    #[must_use]
    pub fn new(src_path: PathBuf, kind: TargetKind, name: String) -> Self {
        Self {
            src_path,
            kind,
            name,
        }
    }

    /// Absolute, normalized path of the target's entry point.
    #[must_use]
    pub fn src_path(&self) -> &Path {
        &self.src_path
    }

    #[must_use]
    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Convert to the invocation that checks this target.
    ///
    /// Build scripts have no invocation.
    #[must_use]
    pub fn invocation(&self) -> Option<TargetInvocation> {
        let args = match self.kind {
            kind if kind.is_library() => InvocationArgs::Library,
            TargetKind::CustomBuild => return None,
            kind => InvocationArgs::Named {
                kind,
                name: self.name.clone(),
            },
        };
        Some(TargetInvocation::new(Some(self.src_path.clone()), args))
    }
}

/// The target-selection arguments passed to the toolchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationArgs {
    /// `--lib`
    Library,
    /// `--<kind> <name>` for bin, test, example and bench targets.
    Named { kind: TargetKind, name: String },
    /// Verbatim arguments from a manual per-project override.
    Manual(String),
}

impl InvocationArgs {
    /// Split into individual command-line arguments.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        match self {
            Self::Library => vec!["--lib".to_string()],
            Self::Named { kind, name } => vec![format!("--{kind}"), name.clone()],
            Self::Manual(raw) => raw.split_whitespace().map(String::from).collect(),
        }
    }

    #[must_use]
    pub fn is_library(&self) -> bool {
        matches!(self, Self::Library)
    }

    #[must_use]
    pub fn is_bin(&self) -> bool {
        matches!(
            self,
            Self::Named {
                kind: TargetKind::Bin,
                ..
            }
        )
    }

    /// Whether these arguments already select a test build.
    #[must_use]
    pub fn targets_tests(&self) -> bool {
        match self {
            Self::Library => false,
            Self::Named { kind, .. } => *kind == TargetKind::Test,
            Self::Manual(raw) => raw.split_whitespace().any(|arg| arg == "--test"),
        }
    }
}

impl fmt::Display for InvocationArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_args().join(" "))
    }
}

/// How to invoke the toolchain so its diagnostics cover one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetInvocation {
    /// Entry point of the target. `None` for `_default` manual overrides,
    /// where the entry point is not known.
    src_path: Option<PathBuf>,
    args: InvocationArgs,
}

impl TargetInvocation {
    #[must_use]
    pub fn new(src_path: Option<PathBuf>, args: InvocationArgs) -> Self {
        Self { src_path, args }
    }

    #[must_use]
    pub fn src_path(&self) -> Option<&Path> {
        self.src_path.as_deref()
    }

    #[must_use]
    pub fn args(&self) -> &InvocationArgs {
        &self.args
    }
}
