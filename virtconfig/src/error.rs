//! Error types for guest network editing.

use thiserror::Error;
use virtconfig_hypervisor::HypervisorError;

/// Errors that abort an edit run.
#[derive(Error, Debug)]
pub enum EditError {
    /// No domain by that name is defined or running.
    #[error("Domain not found: {0}")]
    NotFound(String),

    /// The domain is running; its disks cannot be edited.
    #[error("Domain is running: {0}")]
    Running(String),

    /// Introspection found no operating system on the domain's disks.
    #[error("No operating system found: {0}")]
    NoOperatingSystem(String),

    /// The guest distribution has no known network config dialect.
    #[error("Unsupported OS: {0}")]
    UnsupportedDistro(String),

    /// An expected marker line is missing from a guest config file.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Malformed IP address or hostname.
    #[error("{0}")]
    InvalidArgument(String),

    /// Hypervisor or guest-introspection failure.
    #[error(transparent)]
    Hypervisor(#[from] HypervisorError),
}

/// Result type alias for editor operations.
pub type Result<T> = std::result::Result<T, EditError>;
