//! Error types for object version control.

use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for staging and catalog operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Local precondition failed; the remote boundary was never contacted.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Query or mutation boundary failed (connectivity, timeout, permission).
    #[error("Remote error: {0}")]
    Remote(String),

    /// A fetch resolved after a newer one superseded it.
    #[error("Stale result discarded: generation {generation} superseded by {current}")]
    StaleResult { generation: u64, current: u64 },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a validation failure.
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Shorthand for a remote boundary failure.
    pub fn remote(msg: impl Into<String>) -> Self {
        Error::Remote(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Error::Remote(_))
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Error::StaleResult { .. })
    }

    /// Message suitable for the transient status line.
    ///
    /// Validation messages are shown verbatim; everything else keeps its
    /// category prefix.
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
