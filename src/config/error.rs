//! Errors raised while resolving layered configuration.

use std::path::PathBuf;

use thiserror::Error;

/// # Errors produced by configuration loading.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A config file could not be read.
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A config file was read but no parser accepted it.
    #[error("failed to parse config file {path:?}: {reason}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Parser messages, joined.
        reason: String,
    },

    /// The merged configuration does not fit the requested type.
    #[error("failed to decode configuration: {0}")]
    Decode(#[from] serde_json::Error),

    /// A required environment variable is unset.
    #[error("environment variable must be set: {name}")]
    MissingEnv {
        /// Normalized variable name.
        name: String,
    },
}
