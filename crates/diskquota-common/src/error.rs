//! Unified error type for the diskquota workspace.
//!
//! Every failure is local to a single container or namespace event; the
//! lifecycle hook logs these and never lets them block a container start.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum DiskQuotaError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path (file or binary) where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Mount metadata, a project identifier, or a limit could not be parsed.
    #[error("parse error: {message}")]
    Parse {
        /// Description of the malformed input.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// The quota management command exited unsuccessfully.
    #[error("quota command `{command}` failed: {output}")]
    Command {
        /// The quota subcommand that was issued.
        command: String,
        /// Combined stdout and stderr of the invocation.
        output: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl DiskQuotaError {
    /// Builds a [`DiskQuotaError::Parse`] from any displayable message.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, DiskQuotaError>;
