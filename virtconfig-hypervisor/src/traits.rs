//! Core collaborator abstraction traits.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::DomainState;

/// Hypervisor abstraction used to locate a domain and check its power state.
///
/// Backends only need to answer three questions; [`Hypervisor::domain_state`]
/// combines them into the state the editor acts on.
#[async_trait]
pub trait Hypervisor: Send + Sync {
    /// Names of all defined but inactive domains.
    async fn list_defined_domains(&self) -> Result<Vec<String>>;

    /// Names of all running domains (enumerated by ID).
    async fn list_active_domains(&self) -> Result<Vec<String>>;

    /// Whether the named domain is currently active.
    async fn is_active(&self, name: &str) -> Result<bool>;

    /// Check if a domain with this name is defined or running.
    async fn domain_exists(&self, name: &str) -> Result<bool> {
        if self.list_defined_domains().await?.iter().any(|d| d == name) {
            return Ok(true);
        }
        Ok(self.list_active_domains().await?.iter().any(|d| d == name))
    }

    /// Resolve the editable state of a domain.
    async fn domain_state(&self, name: &str) -> Result<DomainState> {
        if !self.domain_exists(name).await? {
            return Ok(DomainState::Undefined);
        }
        if self.is_active(name).await? {
            Ok(DomainState::Active)
        } else {
            Ok(DomainState::Inactive)
        }
    }
}

/// Guest-introspection session over the disks of one domain.
///
/// The call order mirrors libguestfs: `add_domain`, `launch`, inspect,
/// `mount`, then file operations. Paths are guest paths.
#[async_trait]
pub trait GuestFs: Send + Sync {
    /// Attach the disks of a libvirt domain to the session.
    async fn add_domain(&mut self, name: &str, readonly: bool) -> Result<()>;

    /// Start the introspection appliance.
    async fn launch(&mut self) -> Result<()>;

    /// Device names of the inspected operating system roots.
    async fn inspect_os(&self) -> Result<Vec<String>>;

    /// Distribution short name (e.g. "ubuntu", "centos") for an inspected root.
    async fn inspect_get_distro(&self, root: &str) -> Result<String>;

    /// Mount a device read-write at a guest mountpoint.
    async fn mount(&mut self, device: &str, mountpoint: &str) -> Result<()>;

    /// Read a whole file. Contents are returned as is, without any
    /// encoding check.
    async fn read_file(&self, path: &str) -> Result<Vec<u8>>;

    /// Create or replace a file with `content`.
    async fn write(&self, path: &str, content: &[u8]) -> Result<()>;

    /// Whether `path` exists and is a regular file.
    async fn is_file(&self, path: &str) -> Result<bool>;

    /// Unmount and shut the appliance down.
    async fn close(&mut self) -> Result<()>;
}
