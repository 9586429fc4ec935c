//! Type definitions shared by the backends.

use serde::{Deserialize, Serialize};

/// Power state of a domain as seen by the hypervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainState {
    /// No domain by that name is defined or running
    Undefined,
    /// Defined and powered off
    Inactive,
    /// Running (or otherwise active)
    Active,
}

impl DomainState {
    /// Only powered-off domains may have their disks edited.
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Inactive)
    }
}

/// Where a guest filesystem device gets mounted.
pub const ROOT_MOUNTPOINT: &str = "/";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_inactive_is_editable() {
        assert!(DomainState::Inactive.is_editable());
        assert!(!DomainState::Active.is_editable());
        assert!(!DomainState::Undefined.is_editable());
    }
}
