//! Diagnostic logging
//!
//! The report owns stdout, so tracing output goes to stderr. A valid
//! `RUST_LOG` overrides the level picked from the CLI or config file.

use crate::{Error, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn parse_filter(directives: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directives)
        .map_err(|e| Error::Config(format!("Invalid log filter '{}': {}", directives, e)))
}

/// Level filter from `RUST_LOG`, or from `default_level` when that is unset or invalid
pub fn log_filter(default_level: &str) -> Result<EnvFilter> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.is_empty() => {
            parse_filter(&directives).or_else(|_| parse_filter(default_level))
        }
        _ => parse_filter(default_level),
    }
}

/// Install the global subscriber
///
/// Fails with `Error::Config` on a bad level or when a subscriber is
/// already installed.
pub fn setup_logging(default_level: &str) -> Result<()> {
    let filter = log_filter(default_level)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
        .map_err(|e| Error::Config(format!("Logging already initialized: {}", e)))?;

    Ok(())
}
