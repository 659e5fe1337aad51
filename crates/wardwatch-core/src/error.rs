//! Error types for wardwatch.

use thiserror::Error;

/// Result type alias using wardwatch's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for wardwatch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Remote store operation failed (write, read, or subscription setup)
    #[error("Store error: {0}")]
    Store(String),

    /// A remote subscription terminated with an error
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// Platform location provider failed to deliver a fix
    #[error("Location provider error: {0}")]
    Provider(String),

    /// Platform geofencing engine rejected a register/clear request
    #[error("Geofencing error: {0}")]
    Geofencing(String),

    /// Platform alarm facility rejected a schedule/cancel request
    #[error("Alarm error: {0}")]
    Alarm(String),

    /// A runtime capability was denied (location, exact-alarm, network callback)
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl Error {
    /// Whether this error represents a denied runtime capability.
    ///
    /// Capability denials are never retried; callers log and skip the
    /// operation instead of substituting a fallback.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Error::PermissionDenied(_))
    }
}
