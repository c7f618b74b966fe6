//! # Process-wide log subscriber setup.
//!
//! Reads two variables (see [`env_name`](crate::config::env_name) for prefix rules):
//!
//! | Variable             | Values                                          | Default |
//! |----------------------|-------------------------------------------------|---------|
//! | `{PREFIX}_LOG_LEVEL`  | `trace`, `debug`, `info`, `warn`, `error`         | `info`  |
//! | `{PREFIX}_LOG_FORMAT` | `text`/`pretty`/`console`, `json`/`structured`  | `json`  |
//!
//! `RUST_LOG` directives, when present, refine the level filter.

use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

use crate::config::EnvSnapshot;

/// Output format of log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per record.
    #[default]
    Json,
    /// Human-readable text.
    Text,
}

/// Level and format of the process log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOptions {
    /// Most verbose level emitted.
    pub level: LevelFilter,
    /// Record format.
    pub format: LogFormat,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            format: LogFormat::Json,
        }
    }
}

impl LogOptions {
    /// Reads `{PREFIX}_LOG_LEVEL` and `{PREFIX}_LOG_FORMAT` from `env`.
    pub fn from_env(env: &EnvSnapshot, prefix: &str) -> Self {
        let level = match env.get(prefix, "LOG_LEVEL").to_ascii_lowercase().as_str() {
            "trace" => LevelFilter::TRACE,
            "debug" => LevelFilter::DEBUG,
            "warn" => LevelFilter::WARN,
            "error" => LevelFilter::ERROR,
            _ => LevelFilter::INFO,
        };
        let format = match env.get(prefix, "LOG_FORMAT").to_ascii_lowercase().as_str() {
            "text" | "pretty" | "console" => LogFormat::Text,
            _ => LogFormat::Json,
        };
        Self { level, format }
    }
}

/// Log subscriber installation failed.
#[derive(Error, Debug)]
#[error("failed to install log subscriber: {0}")]
pub struct LoggingError(#[from] TryInitError);

/// Installs the global `tracing` subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init_logging(opts: LogOptions) -> Result<(), LoggingError> {
    let filter = EnvFilter::builder()
        .with_default_directive(opts.level.into())
        .from_env_lossy();

    let json = (opts.format == LogFormat::Json).then(|| fmt::layer().json());
    let text = (opts.format == LogFormat::Text).then(fmt::layer);

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_env() {
        let env: EnvSnapshot = [("MYAPP_LOG_LEVEL", "DEBUG"), ("MYAPP_LOG_FORMAT", "pretty")]
            .into_iter()
            .collect();
        let opts = LogOptions::from_env(&env, "myapp");
        assert_eq!(opts.level, LevelFilter::DEBUG);
        assert_eq!(opts.format, LogFormat::Text);
    }

    #[test]
    fn test_options_defaults_on_garbage() {
        let env: EnvSnapshot = [("SERVICE_LOG_LEVEL", "loud"), ("SERVICE_LOG_FORMAT", "xml")]
            .into_iter()
            .collect();
        assert_eq!(LogOptions::from_env(&env, ""), LogOptions::default());
    }
}
