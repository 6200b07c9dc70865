//! Infrastructure services for docs-versioning.
//!
//! This module contains:
//! - TempDir: Self-cleaning scratch directories
//! - exit_hooks: Cleanup deferred to process shutdown

pub mod exit_hooks;
mod temp_dir;

pub use exit_hooks::ShutdownGuard;
pub use temp_dir::{CleanupMode, TempDir, DIR_SUFFIX};
