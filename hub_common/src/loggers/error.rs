use std::path::PathBuf;

use thiserror::Error;

use crate::configs::ConfigError;

#[derive(Debug, Error)]
/// # Sink Error
///
/// Failures while resolving a category's log file. Everything except
/// [`SinkError::Fallback`] is recoverable and only ever triggers the local
/// fallback; it never reaches a caller of the registry.
pub enum SinkError {
    /// The system log directory was missing and could not be created.
    #[error("Failed to create log directory {path}: {source}")]
    CreateDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The freshly created directory could not be handed to the process user.
    #[error("Failed to set ownership of {path}: {source}")]
    Ownership {
        /// Directory whose owner could not be changed.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The log file inside the system directory could not be opened.
    #[error("Failed to open log file {path}: {source}")]
    Open {
        /// File that could not be opened.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Even the local fallback file could not be opened. Fatal.
    #[error("Failed to create log file: {path}: {source}")]
    Fallback {
        /// Fallback file that could not be opened.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl SinkError {
    /// True when no log destination exists at all.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SinkError::Fallback { .. })
    }
}

#[derive(Debug, Error)]
/// # Logger Error
///
/// Errors raised while constructing a [`LoggerRegistry`](super::LoggerRegistry).
pub enum LoggerError {
    /// No tokio runtime was available to host the relay tasks.
    #[error("A tokio runtime is required to start log relays: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    /// The supplied configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
