//! docs-versioning: print the effective options for the current project
//!
//! Resolves the layered configuration (defaults, project file, user file,
//! environment) and dumps it as JSON.

use anyhow::Result;
use std::process::ExitCode;

use docs_versioning::{app, HandledError};

fn main() -> ExitCode {
    app::run(run)
}

fn run() -> Result<()> {
    let config = match app::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(HandledError::with_message(e.to_string()).into());
        }
    };

    app::init_logging(config.verbose, config.no_colors);
    tracing::info!("Starting docs-versioning in {:?}", config.git_root);
    tracing::debug!(?config, "Effective configuration");

    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
