//! The on-save check session.
//!
//! `Checker` owns the only state that outlives a run: which files have
//! annotations drawn. Everything else lives in a per-run [`CheckRun`].
//!
//! Every method takes `&self`. The drawn state sits behind short-lived
//! locks that are never held across an await, so a host sharing the
//! checker can dismiss or disable it while a fetch is still running.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use savecheck_config::Settings;
use savecheck_types::{AnnotationGroup, FileId};

use crate::aggregate::{Aggregator, CheckRun};
use crate::editor::{Editor, Navigation, PresentationSink};
use crate::metadata::Metadata;
use crate::render::HIDE_URL;
use crate::resolver::{Resolution, ResolveError, manual_targets, metadata_targets};
use crate::toolchain::{Toolchain, fetch_diagnostics, fetch_metadata};

/// Status text shown while a check runs.
pub const STATUS_RUNNING: &str = "Rust syntax check running...";

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// How a save was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Checking is switched off, either before the save or while its fetch
    /// was running; nothing was drawn.
    Disabled,
    /// No target covers the file.
    NoTargets,
    Checked {
        invocations_run: usize,
        /// Files that received annotations.
        files: usize,
        found_for_triggering_file: bool,
        /// Diagnostics that could not be placed because rustc sent a
        /// span with nothing to show.
        malformed: usize,
    },
}

/// A poisoned lock only means a sink panicked mid-draw; the state is
/// still usable for clearing and redrawing.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shows the running status for as long as it lives.
struct StatusGuard<'a, S: PresentationSink> {
    sink: &'a Mutex<S>,
}

impl<'a, S: PresentationSink> StatusGuard<'a, S> {
    fn show(sink: &'a Mutex<S>, message: &str) -> Self {
        lock(sink).set_status(message);
        Self { sink }
    }
}

impl<S: PresentationSink> Drop for StatusGuard<'_, S> {
    fn drop(&mut self) {
        lock(self.sink).erase_status();
    }
}

pub struct Checker<T, E, S> {
    settings: Settings,
    enabled: AtomicBool,
    toolchain: T,
    editor: E,
    /// Lock order: `current` before `sink`.
    current: Mutex<BTreeMap<FileId, AnnotationGroup>>,
    sink: Mutex<S>,
}

impl<T, E, S> Checker<T, E, S>
where
    T: Toolchain,
    E: Editor,
    S: PresentationSink,
{
    pub fn new(settings: Settings, toolchain: T, editor: E, sink: S) -> Self {
        Self {
            enabled: AtomicBool::new(settings.syntax_checking),
            settings,
            toolchain,
            editor,
            current: Mutex::new(BTreeMap::new()),
            sink: Mutex::new(sink),
        }
    }

    /// Settings the checker was created with. See [`Self::is_enabled`] for
    /// the live on/off switch.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn sink(&self) -> MutexGuard<'_, S> {
        lock(&self.sink)
    }

    pub fn into_sink(self) -> S {
        self.sink.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    #[must_use]
    pub fn editor(&self) -> &E {
        &self.editor
    }

    /// Annotations currently drawn, by file.
    pub fn current(&self) -> MutexGuard<'_, BTreeMap<FileId, AnnotationGroup>> {
        lock(&self.current)
    }

    #[must_use]
    pub fn annotations(&self, file: &FileId) -> Option<AnnotationGroup> {
        self.current().get(file).cloned()
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Switch checking on or off. Switching off clears at once; a fetch
    /// already in flight keeps running but its results are discarded.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        if !enabled {
            self.dismiss();
        }
    }

    /// Remove every drawn annotation. Safe to call repeatedly.
    pub fn dismiss(&self) {
        let mut current = lock(&self.current);
        current.clear();
        lock(&self.sink).clear_all();
    }

    /// Handle a click on a popup link.
    pub fn on_navigate(&self, url: &str) -> Navigation {
        if url == HIDE_URL {
            self.dismiss();
            Navigation::Dismissed
        } else {
            Navigation::Open(url.to_string())
        }
    }

    /// Check the target(s) covering `file` and redraw annotations.
    ///
    /// The status text is erased when this returns or when the future is
    /// dropped.
    pub async fn on_save(&self, file: &Path) -> Result<CheckOutcome, CheckError> {
        if !self.is_enabled() {
            self.dismiss();
            return Ok(CheckOutcome::Disabled);
        }

        let _status = StatusGuard::show(&self.sink, STATUS_RUNNING);
        self.dismiss();

        let dir = file.parent().unwrap_or_else(|| Path::new("."));
        let Some(resolution) = self.resolve(file, dir).await? else {
            return Ok(CheckOutcome::NoTargets);
        };

        let (run, invocations_run) = self.collect(file, dir, &resolution).await;
        if !self.is_enabled() {
            tracing::info!(file = %file.display(), "Checking disabled during run, discarding results");
            return Ok(CheckOutcome::Disabled);
        }

        let found_for_triggering_file = run.found_for_triggering_file();
        let malformed = run.errors().len();
        let files = self.apply(run.into_per_file());

        tracing::info!(
            file = %file.display(),
            invocations_run,
            files,
            found_for_triggering_file,
            "Check finished"
        );
        Ok(CheckOutcome::Checked {
            invocations_run,
            files,
            found_for_triggering_file,
            malformed,
        })
    }

    /// Fetch and aggregate. Touches no drawn state.
    async fn collect(&self, file: &Path, dir: &Path, resolution: &Resolution) -> (CheckRun, usize) {
        let triggering = self
            .editor
            .find_open_file(file)
            .unwrap_or_else(|| FileId::new(file));
        let base_dir = resolution.workspace_root.as_deref().unwrap_or(dir);
        let aggregator = Aggregator::new(&self.editor, &self.settings, base_dir);
        let mut run = CheckRun::new(triggering);
        let mut invocations_run = 0;

        for invocation in &resolution.invocations {
            if !self.is_enabled() {
                break;
            }
            let records = fetch_diagnostics(&self.toolchain, dir, invocation, &self.settings).await;
            invocations_run += 1;
            tracing::debug!(
                args = %invocation.args(),
                records = records.len(),
                "Collected diagnostics"
            );
            for record in &records {
                aggregator.add_diagnostic(record, &mut run, invocation.src_path());
            }
            // Later targets would mostly repeat what this one found.
            if run.found_for_triggering_file() {
                break;
            }
        }

        (run, invocations_run)
    }

    /// Replace the drawn state with `per_file`. Returns the file count.
    fn apply(&self, per_file: BTreeMap<FileId, AnnotationGroup>) -> usize {
        let mut current = lock(&self.current);
        let mut sink = lock(&self.sink);
        // An overlapping run may have drawn since this one started.
        if !current.is_empty() {
            sink.clear_all();
        }
        for (file, group) in &per_file {
            sink.show_annotations(file, group);
        }
        let files = per_file.len();
        *current = per_file;
        files
    }

    async fn resolve(&self, file: &Path, dir: &Path) -> Result<Option<Resolution>, CheckError> {
        let metadata = fetch_metadata(&self.toolchain, dir).await;

        if let Some(mut resolution) = manual_targets(file, &self.settings) {
            // rustc names files relative to the workspace root, which is
            // above the project root when the project is a member.
            match metadata {
                Ok(Metadata {
                    workspace_root: Some(root),
                    ..
                }) => resolution.workspace_root = Some(root),
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(dir = %dir.display(), "No cargo metadata for manual target, using project root: {e}");
                }
            }
            return Ok(Some(resolution));
        }

        let metadata = match metadata {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), "Failed to read cargo metadata: {e}");
                return Ok(None);
            }
        };

        let resolution = metadata_targets(file, &metadata)?;
        Ok((!resolution.is_empty()).then_some(resolution))
    }
}
