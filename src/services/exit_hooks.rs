//! Process-wide cleanup that runs when an entry point shuts down.
//!
//! Directories created with [`CleanupMode::AtExit`](super::CleanupMode) are
//! registered here and removed by [`run`], which every entry point triggers
//! through a [`ShutdownGuard`].

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

static PENDING: Mutex<ExitHooks> = Mutex::new(ExitHooks::new());

/// Serializes tests that touch the global registry
#[cfg(test)]
pub(crate) static TEST_LOCK: Mutex<()> = Mutex::new(());

/// Directories waiting to be removed at shutdown
#[derive(Debug, Default)]
pub(crate) struct ExitHooks {
    paths: Vec<PathBuf>,
}

impl ExitHooks {
    pub(crate) const fn new() -> Self {
        Self { paths: Vec::new() }
    }

    pub(crate) fn register(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    /// Remove every registered directory, newest first
    pub(crate) fn run(&mut self) -> usize {
        let paths = std::mem::take(&mut self.paths);
        let count = paths.len();
        for path in paths.iter().rev() {
            super::temp_dir::remove_dir_quietly(path);
        }
        count
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.paths.len()
    }
}

fn pending() -> MutexGuard<'static, ExitHooks> {
    PENDING.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Schedule `path` for recursive removal at shutdown
pub fn register(path: &Path) {
    tracing::debug!("Deferring removal of {:?} to shutdown", path);
    pending().register(path.to_path_buf());
}

/// Run the shutdown cleanup now. Safe to call more than once.
pub fn run() {
    let removed = pending().run();
    if removed > 0 {
        tracing::debug!("Shutdown cleanup removed {} directories", removed);
    }
}

/// Runs the shutdown cleanup when dropped, including while unwinding.
#[must_use = "cleanup runs when the guard is dropped"]
#[derive(Debug)]
pub struct ShutdownGuard {
    _private: (),
}

impl ShutdownGuard {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Default for ShutdownGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        run();
    }
}
