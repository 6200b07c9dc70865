//! Self-cleaning temporary directories.

use super::exit_hooks;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Marker embedded in every directory name so leftovers are easy to spot
pub const DIR_SUFFIX: &str = "docs_versioning";

/// When a [`TempDir`] removes its directory if nobody calls
/// [`TempDir::cleanup`] first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupMode {
    /// As soon as the handle is dropped
    #[default]
    OnDrop,
    /// When the process shuts down (see [`exit_hooks`])
    AtExit,
}

/// A uniquely named directory under the system temp dir, removed
/// recursively exactly when its [`CleanupMode`] says so.
#[derive(Debug)]
pub struct TempDir {
    path: PathBuf,
    mode: CleanupMode,
}

impl TempDir {
    /// Create a new directory under the system temp dir
    pub fn new(mode: CleanupMode) -> io::Result<Self> {
        Self::new_in(std::env::temp_dir(), mode)
    }

    /// Create a new directory under `parent`
    pub fn new_in(parent: impl AsRef<Path>, mode: CleanupMode) -> io::Result<Self> {
        #[allow(deprecated)]
        let path = tempfile::Builder::new()
            .prefix("tmp")
            .suffix(DIR_SUFFIX)
            .tempdir_in(parent)?
            .into_path();

        tracing::debug!("Created temporary directory {:?} ({:?})", path, mode);
        if mode == CleanupMode::AtExit {
            exit_hooks::register(&path);
        }

        Ok(Self { path, mode })
    }

    /// Create a directory, hand its path to `f`, and remove it afterwards.
    ///
    /// Removal happens however `f` finishes, including by panicking, and
    /// regardless of `mode`.
    pub fn scoped<T, F>(mode: CleanupMode, f: F) -> io::Result<T>
    where
        F: FnOnce(&Path) -> T,
    {
        let dir = Self::new(mode)?;
        let _scope = ScopeCleanup(&dir);
        Ok(f(dir.path()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> CleanupMode {
        self.mode
    }

    /// Recursively delete the directory now.
    ///
    /// Calling it again, or after something else removed the directory,
    /// does nothing.
    pub fn cleanup(&self) {
        remove_dir_quietly(&self.path);
    }
}

impl AsRef<Path> for TempDir {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        if self.mode == CleanupMode::OnDrop {
            self.cleanup();
        }
    }
}

struct ScopeCleanup<'a>(&'a TempDir);

impl Drop for ScopeCleanup<'_> {
    fn drop(&mut self) {
        self.0.cleanup();
    }
}

/// Remove `path` recursively. A missing path is fine; other failures are
/// logged and otherwise ignored.
pub(crate) fn remove_dir_quietly(path: &Path) {
    match fs::remove_dir_all(path) {
        Ok(()) => tracing::debug!("Removed temporary directory {:?}", path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove temporary directory {:?}: {}", path, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::PoisonError;

    #[test]
    fn test_new_creates_unique_directories() {
        let a = TempDir::new(CleanupMode::OnDrop).unwrap();
        let b = TempDir::new(CleanupMode::OnDrop).unwrap();

        assert_ne!(a.path(), b.path());
        assert!(a.path().is_dir());
        assert!(b.path().is_dir());
        assert!(a.path().starts_with(std::env::temp_dir()));
    }

    #[test]
    fn test_name_contains_marker() {
        let dir = TempDir::new(CleanupMode::OnDrop).unwrap();
        let name = dir.path().file_name().unwrap().to_string_lossy();
        assert!(name.ends_with(DIR_SUFFIX), "{name}");
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let dir = TempDir::new(CleanupMode::OnDrop).unwrap();
        fs::create_dir_all(dir.path().join("html").join("_static")).unwrap();
        fs::write(dir.path().join("html").join("index.html"), "<html/>").unwrap();

        dir.cleanup();
        assert!(!dir.path().exists());
        dir.cleanup();
        assert!(!dir.path().exists());
    }

    #[test]
    fn test_cleanup_after_external_removal() {
        let dir = TempDir::new(CleanupMode::OnDrop).unwrap();
        fs::remove_dir_all(dir.path()).unwrap();
        dir.cleanup();
    }

    #[test]
    fn test_drop_removes_directory() {
        let dir = TempDir::new(CleanupMode::OnDrop).unwrap();
        let path = dir.path().to_path_buf();
        fs::write(path.join("conf.py"), "project = 'demo'").unwrap();

        drop(dir);
        assert!(!path.exists());
    }

    #[test]
    fn test_at_exit_outlives_handle() {
        let _lock = exit_hooks::TEST_LOCK
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let dir = TempDir::new(CleanupMode::AtExit).unwrap();
        let path = dir.path().to_path_buf();
        assert_eq!(dir.mode(), CleanupMode::AtExit);

        drop(dir);
        assert!(path.is_dir());

        exit_hooks::run();
        assert!(!path.exists());
    }

    #[test]
    fn test_at_exit_after_explicit_cleanup() {
        let _lock = exit_hooks::TEST_LOCK
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let dir = TempDir::new(CleanupMode::AtExit).unwrap();
        dir.cleanup();
        assert!(!dir.path().exists());
        exit_hooks::run();
    }

    #[test]
    fn test_scoped_removes_on_return() {
        let path = TempDir::scoped(CleanupMode::OnDrop, |path| {
            assert!(path.is_dir());
            path.to_path_buf()
        })
        .unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_scoped_removes_on_error() {
        let mut seen = None;
        let result = TempDir::scoped(CleanupMode::AtExit, |path| -> io::Result<()> {
            seen = Some(path.to_path_buf());
            fs::read(path.join("missing.txt"))?;
            Ok(())
        })
        .unwrap();

        assert!(result.is_err());
        assert!(!seen.unwrap().exists());
    }

    #[test]
    fn test_scoped_removes_on_panic() {
        let mut seen = None;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            TempDir::scoped(CleanupMode::OnDrop, |path| {
                seen = Some(path.to_path_buf());
                panic!("build failed");
            })
        }));

        assert!(outcome.is_err());
        assert!(!seen.unwrap().exists());
    }

    #[test]
    fn test_new_in_parent() {
        let parent = tempfile::TempDir::new().unwrap();
        let dir = TempDir::new_in(parent.path(), CleanupMode::OnDrop).unwrap();
        assert_eq!(dir.path().parent(), Some(parent.path()));
    }
}
