//! docs-versioning: shared runtime plumbing for a versioned documentation
//! build tool.
//!
//! This crate provides the run-time options record, the "already reported"
//! error marker, and self-cleaning scratch directories used by every step
//! of a build.

pub mod app;
pub mod config;
pub mod error;
pub mod services;

pub use config::Config;
pub use error::{AppError, ConfigError, HandledError, Result};
pub use services::{CleanupMode, TempDir};
