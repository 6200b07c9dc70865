//! Entry-point plumbing: logging setup, shutdown cleanup and the final
//! decision on how a failed run is reported.

use crate::config::{find_project_root, Config, ConfigSources};
use crate::error::{AppError, HandledError, Result};
use crate::services::ShutdownGuard;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Printed after an unexpected error
pub const UNEXPECTED_ERROR_NOTICE: &str =
    "An unexpected error occurred. Please report it along with the output above.";

/// How a failed run should be reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The user already saw the message; exit quietly
    Handled,
    /// Print the error and the generic notice
    Unexpected,
}

impl Disposition {
    pub fn of(err: &anyhow::Error) -> Self {
        let handled = err.chain().any(|cause| {
            cause.is::<HandledError>()
                || cause
                    .downcast_ref::<AppError>()
                    .is_some_and(AppError::is_handled)
        });

        if handled {
            Self::Handled
        } else {
            Self::Unexpected
        }
    }
}

/// Write whatever the user still needs to see about `err`
pub fn report(err: &anyhow::Error, out: &mut impl Write) -> io::Result<()> {
    match Disposition::of(err) {
        Disposition::Handled => {
            tracing::debug!("Exiting after handled error: {}", err);
            Ok(())
        }
        Disposition::Unexpected => {
            writeln!(out, "Error: {:#}", err)?;
            writeln!(out, "{}", UNEXPECTED_ERROR_NOTICE)
        }
    }
}

/// Turn the outcome of a run into the process exit status
pub fn finish(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // stderr is gone, nothing left to report to
            let _ = report(&err, &mut io::stderr().lock());
            ExitCode::FAILURE
        }
    }
}

/// Run an entry point with shutdown cleanup in place.
///
/// Directories deferred to shutdown are removed before this returns, even
/// if `entry` panics.
pub fn run<F>(entry: F) -> ExitCode
where
    F: FnOnce() -> anyhow::Result<()>,
{
    let _shutdown = ShutdownGuard::new();
    finish(entry())
}

/// Load the options for the project enclosing the current directory
pub fn load_config() -> Result<Config> {
    let cwd = std::env::current_dir()?;
    let project_root = find_project_root(&cwd);
    config_for_project(&ConfigSources::discover(project_root.as_deref()))
}

fn config_for_project(sources: &ConfigSources) -> Result<Config> {
    let mut config = Config::load_from(sources)?;
    config.resolve_git_root(sources.project_root.as_deref());
    Ok(config)
}

/// Initialize logging with RUST_LOG environment variable support
pub fn init_logging(verbose: bool, no_colors: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(!no_colors),
        )
        .init();
}
