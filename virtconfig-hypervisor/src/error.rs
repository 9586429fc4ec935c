//! Error types for the collaborator layer.

use thiserror::Error;

/// Errors raised by hypervisor and guest-introspection backends.
#[derive(Error, Debug)]
pub enum HypervisorError {
    /// Failed to connect to the hypervisor.
    #[error("Failed to connect to hypervisor: {0}")]
    ConnectionFailed(String),

    /// Query against the hypervisor failed.
    #[error("Failed to query: {0}")]
    QueryFailed(String),

    /// A guest-introspection operation failed.
    #[error("Guest filesystem operation failed: {0}")]
    GuestFs(String),

    /// Session used out of order (e.g. write before mount).
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for collaborator operations.
pub type Result<T> = std::result::Result<T, HypervisorError>;
