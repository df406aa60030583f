//! Error types for tvdeck core

use crate::playback::PlaybackState;
use thiserror::Error;

/// Result type alias for deck operations
pub type Result<T> = std::result::Result<T, Error>;

/// How a failure is reported when it is absorbed at an operation boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Logged with `warn!`, never surfaced to the user
    Warning,
    /// Logged with `error!`
    Error,
}

/// Deck error types
#[derive(Error, Debug)]
pub enum Error {
    // Transport errors
    #[error("Transport rejected source {url}: {reason}")]
    SourceRejected { url: String, reason: String },

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("{operation} not allowed in state {state}")]
    InvalidState {
        operation: &'static str,
        state: PlaybackState,
    },

    // UI errors
    #[error("UI target not found: {0}")]
    MissingTarget(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Catalog errors
    #[error("Catalog unavailable: {0}")]
    Catalog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Error::Transport(msg.into())
    }

    /// Create a missing UI target error
    pub fn missing(target: impl Into<String>) -> Self {
        Error::MissingTarget(target.into())
    }

    /// Returns true if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InvalidState { .. } | Error::Transport(_) | Error::Catalog(_)
        )
    }

    /// Log level used when the error is absorbed
    pub fn severity(&self) -> Severity {
        match self {
            Error::InvalidState { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Returns the error code for logs
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::SourceRejected { .. } => "SOURCE_REJECTED",
            Error::Transport(_) => "TRANSPORT",
            Error::InvalidState { .. } => "INVALID_STATE",
            Error::MissingTarget(_) => "MISSING_TARGET",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Catalog(_) => "CATALOG",
            Error::Io(_) => "IO",
            Error::Json(_) => "JSON",
        }
    }
}
