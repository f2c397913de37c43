use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, parsing or validating the
/// configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No home directory to put the config directory under.
    #[error("could not determine config directory")]
    NoConfigDir,

    /// Failed to create the default config file.
    #[error("failed to create default config at {path}: {reason}")]
    CreateDefault {
        /// Where the file was to be written.
        path: PathBuf,
        /// Underlying failure.
        reason: String,
    },

    /// TOML parsing failed.
    #[error("TOML parse error: {0}")]
    Parse(String),

    /// A config value failed validation.
    #[error("validation error: {field}: {message}")]
    Validation {
        /// The dotted field path (e.g. `session.verbosity`).
        field: String,
        /// Human-readable description of the violation.
        message: String,
    },

    /// An I/O error occurred while reading or writing config files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
