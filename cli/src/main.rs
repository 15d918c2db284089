//! savecheck - run one on-save check from the command line.
//!
//! Every file on disk is treated as open in the editor, so annotations are
//! produced for whichever files the diagnostics point at. The result is
//! printed instead of drawn.

mod editor;
mod output;

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use savecheck_config::{Settings, config_path};
use savecheck_engine::{CargoToolchain, Checker};

use crate::editor::FsEditor;
use crate::output::{PrintSink, render_json, render_text};

#[derive(Parser)]
#[command(name = "savecheck")]
#[command(about = "Check a Rust file with cargo and print the resulting annotations")]
struct Cli {
    /// Settings file (default: ~/.savecheck/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Print the annotation set as JSON
    #[arg(long)]
    json: bool,
    /// Only report errors
    #[arg(long)]
    hide_warnings: bool,
    /// Check without the test profile
    #[arg(long)]
    no_tests: bool,
    /// Print progress to stderr
    #[arg(short, long)]
    verbose: bool,
    /// The file that was saved
    file: PathBuf,
}

fn init_tracing(config: Option<&Path>) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_log_file(config);

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // No log file means no logs; stdout carries the report.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file(config: Option<&Path>) -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates(config) {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new().create(true).append(true).open(&candidate) {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

/// Log locations to try, given the settings file in use.
fn log_file_candidates(config: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: next to the config file, ~/.savecheck/logs/savecheck.log
    if let Some(config_dir) = config.and_then(Path::parent) {
        candidates.push(config_dir.join("logs").join("savecheck.log"));
    }

    candidates.push(PathBuf::from(".savecheck").join("logs").join("savecheck.log"));

    candidates
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let loaded = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    let mut settings = loaded.unwrap_or_default();
    if cli.hide_warnings {
        settings.hide_warnings = true;
    }
    if cli.no_tests {
        settings.include_tests = false;
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config.clone().or_else(config_path);
    init_tracing(config.as_deref());

    let settings = load_settings(&cli).context("loading settings")?;
    let file = cli
        .file
        .canonicalize()
        .with_context(|| format!("{} not found", cli.file.display()))?;

    let checker = Checker::new(
        settings,
        CargoToolchain::new(),
        FsEditor,
        PrintSink::new(cli.verbose),
    );
    let outcome = checker
        .on_save(&file)
        .await
        .with_context(|| format!("checking {}", file.display()))?;

    let sink = checker.into_sink();
    let shown = sink.shown();
    if cli.json {
        println!("{}", render_json(&outcome, shown)?);
    } else {
        print!("{}", render_text(&outcome, shown));
    }
    Ok(())
}
