//! Running cargo and reading back its structured output.

use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use savecheck_config::Settings;
use savecheck_types::{DiagnosticRecord, TargetInvocation};

use crate::metadata::{Metadata, MetadataError};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("cargo not found in PATH: {0}")]
    NotFound(#[from] which::Error),
    #[error("spawning cargo in {}: {source}", dir.display())]
    Spawn {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Captured result of one cargo invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CargoOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Something that can run cargo subcommands.
pub trait Toolchain {
    /// Run `cargo <args>` in `dir` and wait for it to exit.
    fn run_cargo(
        &self,
        dir: &Path,
        args: &[String],
    ) -> impl Future<Output = Result<CargoOutput, FetchError>> + Send;
}

/// The real `cargo` binary.
#[derive(Debug, Clone)]
pub struct CargoToolchain {
    /// `PATH` handed to cargo, with `~/.cargo/bin` in front.
    path: Option<OsString>,
}

impl CargoToolchain {
    #[must_use]
    pub fn new() -> Self {
        Self {
            path: cargo_path(std::env::var_os("PATH"), dirs::home_dir()),
        }
    }
}

impl Default for CargoToolchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Toolchain for CargoToolchain {
    async fn run_cargo(&self, dir: &Path, args: &[String]) -> Result<CargoOutput, FetchError> {
        let cargo = which::which_in("cargo", self.path.as_ref(), dir)?;

        let mut cmd = Command::new(&cargo);
        cmd.args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(path) = &self.path {
            cmd.env("PATH", path);
        }

        tracing::debug!(dir = %dir.display(), args = ?args, "Running cargo");
        let output = cmd.output().await.map_err(|source| FetchError::Spawn {
            dir: dir.to_path_buf(),
            source,
        })?;

        Ok(CargoOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Prefix `~/.cargo/bin` onto `path`. Editors launched from a desktop
/// session often lack it.
fn cargo_path(path: Option<OsString>, home: Option<PathBuf>) -> Option<OsString> {
    let mut dirs: Vec<PathBuf> = home
        .map(|home| home.join(".cargo").join("bin"))
        .into_iter()
        .collect();
    if let Some(path) = &path {
        dirs.extend(std::env::split_paths(path));
    }
    match std::env::join_paths(dirs) {
        Ok(joined) => Some(joined),
        Err(e) => {
            tracing::warn!("Could not extend PATH with ~/.cargo/bin: {e}");
            path
        }
    }
}

/// Arguments for `cargo check` covering `invocation`.
#[must_use]
pub fn check_args(invocation: &TargetInvocation, settings: &Settings) -> Vec<String> {
    let mut args = vec!["check".to_string()];
    args.extend(invocation.args().to_args());
    args.push("--message-format=json".to_string());
    if settings.include_tests && !invocation.args().targets_tests() {
        args.push("--profile".to_string());
        args.push("test".to_string());
    }
    args
}

/// Pull diagnostic records out of cargo's JSON message stream.
///
/// Accepts both cargo's `compiler-message` envelope and bare rustc
/// records. Anything else is skipped.
#[must_use]
pub fn parse_diagnostics(output: &str) -> Vec<DiagnosticRecord> {
    output
        .lines()
        .filter(|line| line.starts_with('{'))
        .filter_map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Option<DiagnosticRecord> {
    let value: serde_json::Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("Skipping unparseable output line: {e}");
            return None;
        }
    };

    let message = match value.get("reason").and_then(serde_json::Value::as_str) {
        Some("compiler-message") => value.get("message")?.clone(),
        Some(_) => return None,
        None => value,
    };

    match serde_json::from_value(message) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::debug!("Skipping malformed diagnostic record: {e}");
            None
        }
    }
}

/// Run `cargo metadata` in `dir`.
pub async fn fetch_metadata<T: Toolchain + ?Sized>(
    toolchain: &T,
    dir: &Path,
) -> Result<Metadata, MetadataError> {
    let args = ["metadata", "--no-deps", "--format-version", "1"].map(String::from);
    let output = toolchain.run_cargo(dir, &args).await?;
    Metadata::from_output(&output.stdout)
}

/// Run `cargo check` for one invocation and collect its diagnostics.
///
/// Never fails: a missing cargo or a build that dies before emitting
/// anything is logged and yields no records.
pub async fn fetch_diagnostics<T: Toolchain + ?Sized>(
    toolchain: &T,
    dir: &Path,
    invocation: &TargetInvocation,
    settings: &Settings,
) -> Vec<DiagnosticRecord> {
    let args = check_args(invocation, settings);
    let output = match toolchain.run_cargo(dir, &args).await {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!(args = %invocation.args(), "{e}");
            return Vec::new();
        }
    };

    let records = parse_diagnostics(&output.stdout);
    if !output.success && records.is_empty() {
        tracing::warn!(
            dir = %dir.display(),
            args = %invocation.args(),
            stderr = %output.stderr.trim(),
            "Failed to run cargo check"
        );
    }
    records
}
