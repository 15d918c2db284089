//! Resolved checker settings.
//!
//! Raw TOML deserialization structs stay private to this module and are
//! resolved into [`Settings`] / [`ProjectConfig`] at the parse boundary.
//!
//! ```toml
//! syntax_checking = true
//! include_tests = true
//! hide_warnings = false
//! error_color = "var(--redish)"
//! warning_color = "var(--yellowish)"
//!
//! [projects.myproj]
//! root = "${HOME}/src/myproj"
//! [projects.myproj.targets]
//! "bin/foo.rs" = "--bin foo"
//! "_default" = "--lib"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::expand_env_vars;

/// Key of the fallback entry in a project's `targets` table.
pub const DEFAULT_TARGET_KEY: &str = "_default";

const DEFAULT_ERROR_COLOR: &str = "var(--redish)";
const DEFAULT_WARNING_COLOR: &str = "var(--yellowish)";

const fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProjectConfigError {
    #[error("project root must not be empty")]
    EmptyRoot,
    #[error("target override for `{0}` has no arguments")]
    EmptyArgs(String),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProjectConfig {
    root: String,
    #[serde(default)]
    targets: BTreeMap<String, String>,
}

/// Manual target overrides for one project.
///
/// Invariant: `root` is non-empty and every override carries at least one
/// argument (enforced via `#[serde(try_from)]`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawProjectConfig")]
pub struct ProjectConfig {
    root: PathBuf,
    targets: BTreeMap<String, String>,
}

impl TryFrom<RawProjectConfig> for ProjectConfig {
    type Error = ProjectConfigError;

    fn try_from(raw: RawProjectConfig) -> Result<Self, Self::Error> {
        let root = expand_env_vars(raw.root.trim());
        if root.is_empty() {
            return Err(ProjectConfigError::EmptyRoot);
        }
        if let Some((file, _)) = raw.targets.iter().find(|(_, args)| args.trim().is_empty()) {
            return Err(ProjectConfigError::EmptyArgs(file.clone()));
        }
        Ok(Self {
            root: PathBuf::from(root),
            targets: raw.targets,
        })
    }
}

impl ProjectConfig {
    #[must_use]
    pub fn new(root: PathBuf, targets: BTreeMap<String, String>) -> Self {
        Self { root, targets }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/src`, the directory override keys are relative to.
    #[must_use]
    pub fn src_root(&self) -> PathBuf {
        self.root.join("src")
    }

    /// Overrides keyed by file path relative to [`Self::src_root`],
    /// excluding the `_default` entry.
    pub fn file_targets(&self) -> impl Iterator<Item = (&str, &str)> {
        self.targets
            .iter()
            .filter(|(file, _)| file.as_str() != DEFAULT_TARGET_KEY)
            .map(|(file, args)| (file.as_str(), args.as_str()))
    }

    #[must_use]
    pub fn default_target(&self) -> Option<&str> {
        self.targets.get(DEFAULT_TARGET_KEY).map(String::as_str)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
    #[serde(default = "default_true")]
    syntax_checking: bool,
    #[serde(default = "default_true")]
    include_tests: bool,
    #[serde(default)]
    hide_warnings: bool,
    error_color: Option<String>,
    warning_color: Option<String>,
    #[serde(default)]
    projects: BTreeMap<String, ProjectConfig>,
}

impl From<RawSettings> for Settings {
    fn from(raw: RawSettings) -> Self {
        Self {
            syntax_checking: raw.syntax_checking,
            include_tests: raw.include_tests,
            hide_warnings: raw.hide_warnings,
            error_color: raw
                .error_color
                .unwrap_or_else(|| DEFAULT_ERROR_COLOR.to_string()),
            warning_color: raw
                .warning_color
                .unwrap_or_else(|| DEFAULT_WARNING_COLOR.to_string()),
            projects: raw.projects,
        }
    }
}

/// Fully-resolved checker settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawSettings")]
pub struct Settings {
    /// Run a check on every save.
    pub syntax_checking: bool,
    /// Also check `#[cfg(test)]` code unless the target is already a test.
    pub include_tests: bool,
    /// Drop top-level non-error diagnostics. Children of errors are kept.
    pub hide_warnings: bool,
    /// CSS color token for error popups.
    pub error_color: String,
    /// CSS color token for everything that isn't an error.
    pub warning_color: String,
    /// Manual target overrides, keyed by project name.
    pub projects: BTreeMap<String, ProjectConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            syntax_checking: true,
            include_tests: true,
            hide_warnings: false,
            error_color: DEFAULT_ERROR_COLOR.to_string(),
            warning_color: DEFAULT_WARNING_COLOR.to_string(),
            projects: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
