//! Libvirt backend implementation.

use async_trait::async_trait;
use tracing::{debug, info, instrument};
use virt::connect::Connect;
use virt::domain::Domain;

use crate::error::{HypervisorError, Result};
use crate::traits::Hypervisor;

/// Libvirt/QEMU hypervisor backend.
pub struct LibvirtBackend {
    connection: Connect,
}

impl LibvirtBackend {
    /// Create a new libvirt backend connected to the specified URI.
    ///
    /// Common URIs:
    /// - `qemu:///system` - System-wide QEMU/KVM
    /// - `qemu:///session` - User session QEMU
    /// - `qemu+ssh://user@host/system` - Remote via SSH
    pub async fn new(uri: &str) -> Result<Self> {
        info!(uri = %uri, "Connecting to libvirt");

        let connection = Connect::open(Some(uri))
            .map_err(|e| HypervisorError::ConnectionFailed(e.to_string()))?;

        debug!("Connected to libvirt");

        Ok(Self { connection })
    }

    fn lookup_by_name(&self, name: &str) -> Result<Domain> {
        Domain::lookup_by_name(&self.connection, name)
            .map_err(|e| HypervisorError::QueryFailed(format!("{}: {}", name, e)))
    }
}

#[async_trait]
impl Hypervisor for LibvirtBackend {
    #[instrument(skip(self))]
    async fn list_defined_domains(&self) -> Result<Vec<String>> {
        self.connection
            .list_defined_domains()
            .map_err(|e| HypervisorError::QueryFailed(e.to_string()))
    }

    #[instrument(skip(self))]
    async fn list_active_domains(&self) -> Result<Vec<String>> {
        let ids = self
            .connection
            .list_domains()
            .map_err(|e| HypervisorError::QueryFailed(e.to_string()))?;

        let mut names = Vec::with_capacity(ids.len());
        for id in ids {
            let domain = Domain::lookup_by_id(&self.connection, id)
                .map_err(|e| HypervisorError::QueryFailed(format!("domain id {}: {}", id, e)))?;
            let name = domain
                .get_name()
                .map_err(|e| HypervisorError::QueryFailed(e.to_string()))?;
            names.push(name);
        }

        debug!(count = names.len(), "Listed active domains");
        Ok(names)
    }

    #[instrument(skip(self))]
    async fn is_active(&self, name: &str) -> Result<bool> {
        self.lookup_by_name(name)?
            .is_active()
            .map_err(|e| HypervisorError::QueryFailed(e.to_string()))
    }
}
