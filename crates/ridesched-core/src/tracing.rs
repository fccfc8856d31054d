//! Tracing setup for the `ridesched` binary.
//!
//! Diagnostics go to stderr so that stdout carries only the JSON result of
//! each command. `RUST_LOG` overrides the preset's level when set.
//!
//! ```ignore
//! use ridesched_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::cli()).expect("failed to initialize tracing");
//! ```

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Crates whose events pass the default filter.
pub const CRATE_TARGETS: [&str; 3] = ["ridesched_core", "ridesched_remote", "ridesched_cli"];

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// Failed to set global subscriber
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// Failed to parse env filter directive
    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// Single-line human-readable format
    #[default]
    Compact,
    /// One JSON object per line, for scheduled runs whose logs are collected
    Json,
}

/// Configuration for tracing initialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Level applied to the ridesched crates when RUST_LOG is not set
    pub default_level: Level,
    pub output_format: TracingOutputFormat,
    pub include_timestamp: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::cli()
    }
}

impl TracingConfig {
    /// Interactive use: warnings only, no timestamps.
    #[must_use]
    pub fn cli() -> Self {
        Self {
            default_level: Level::WARN,
            output_format: TracingOutputFormat::Compact,
            include_timestamp: false,
        }
    }

    /// Interactive use with `--debug`.
    #[must_use]
    pub fn cli_debug() -> Self {
        Self {
            default_level: Level::DEBUG,
            ..Self::cli()
        }
    }

    /// Scheduled runs (cron, CI): JSON lines with timestamps.
    #[must_use]
    pub fn unattended() -> Self {
        Self {
            default_level: Level::INFO,
            output_format: TracingOutputFormat::Json,
            include_timestamp: true,
        }
    }

    /// Filter directives used when RUST_LOG is absent, e.g.
    /// `ridesched_core=warn,ridesched_remote=warn,ridesched_cli=warn`.
    pub fn default_directives(&self) -> String {
        let level = self.default_level.to_string().to_ascii_lowercase();
        CRATE_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Initialize tracing with the given configuration.
///
/// Call once at startup.
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set or if
/// the default directives fail to parse.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.default_directives())?,
    };

    let layer = match config.output_format {
        TracingOutputFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_target(true);
            if config.include_timestamp {
                layer.boxed()
            } else {
                layer.without_time().boxed()
            }
        }
        TracingOutputFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(env_filter).with(layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
