//! Error types for bindman
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for bindman operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for bindman
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Record name outside of the managed zone
    #[error("the record name '{name}' is not allowed. Must obey the following pattern: '<subdomain>.{zone}'")]
    BadRequest {
        /// Offending record name
        name: String,
        /// Zone the name was checked against
        zone: String,
    },

    /// Record name or type that cannot be used as a cache key
    #[error("Invalid record key: {0}")]
    InvalidKey(String),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// The update utility failed or could not be started
    #[error("Execution error: {message}: {output}")]
    Execution {
        /// What went wrong
        message: String,
        /// Captured stdout/stderr of the update utility
        output: String,
    },

    /// Filesystem errors from the record store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a bad request error for a name outside `zone`
    pub fn bad_request(name: impl Into<String>, zone: impl Into<String>) -> Self {
        Self::BadRequest {
            name: name.into(),
            zone: zone.into(),
        }
    }

    /// Create an invalid key error
    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::InvalidKey(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an execution error
    pub fn execution(message: impl Into<String>, output: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
            output: output.into(),
        }
    }

    /// Whether this error means the record does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// HTTP status a webhook layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest { .. } | Self::InvalidKey(_) => 400,
            Self::NotFound(_) => 404,
            _ => 500,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
