//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// ConfigError
// ============================================================================

/// Configuration-related errors
///
/// Any of these detected at startup aborts the run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("unknown output format `{format}` (configured: {known})")]
    UnknownFormat { format: String, known: String },

    #[error("malformed override `{token}`: {reason}")]
    MalformedOverride { token: String, reason: String },

    #[error("invalid value for `{key}` in [{section}]: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown citation processor `{0}` (expected integrated, external, bibtex or biber)")]
    UnknownProcessor(String),

    #[error("Config validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    pub(crate) fn malformed(token: &str, reason: impl Into<String>) -> Self {
        Self::MalformedOverride {
            token: token.to_string(),
            reason: reason.into(),
        }
    }
}
