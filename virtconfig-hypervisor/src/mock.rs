//! Mock backends for testing and development.
//!
//! Both mocks keep their state in memory. [`MockGuestFs`] is cheaply
//! cloneable and clones share the same filesystem, so a test can hand one
//! clone to the editor and inspect the files through another.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, instrument};

use crate::error::{HypervisorError, Result};
use crate::traits::{GuestFs, Hypervisor};

fn poisoned<T>(_: T) -> HypervisorError {
    HypervisorError::Internal("Lock poisoned".to_string())
}

/// Mock hypervisor backend.
///
/// Domains are defined powered off and can be started or stopped.
pub struct MockBackend {
    domains: RwLock<HashMap<String, MockDomain>>,
}

struct MockDomain {
    id: u32,
    active: bool,
}

impl MockBackend {
    /// Create a new mock backend with no domains.
    pub fn new() -> Self {
        info!("Creating mock hypervisor backend");
        Self {
            domains: RwLock::new(HashMap::new()),
        }
    }

    /// Define a powered-off domain.
    pub fn define_domain(&self, name: &str) {
        if let Ok(mut domains) = self.domains.write() {
            let id = domains.len() as u32 + 1;
            domains.insert(name.to_string(), MockDomain { id, active: false });
        }
    }

    /// Power a defined domain on.
    pub fn start_domain(&self, name: &str) -> Result<()> {
        self.set_active(name, true)
    }

    /// Power a domain off.
    pub fn stop_domain(&self, name: &str) -> Result<()> {
        self.set_active(name, false)
    }

    fn set_active(&self, name: &str, active: bool) -> Result<()> {
        let mut domains = self.domains.write().map_err(poisoned)?;
        let domain = domains
            .get_mut(name)
            .ok_or_else(|| HypervisorError::QueryFailed(format!("no domain {}", name)))?;
        domain.active = active;
        Ok(())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Hypervisor for MockBackend {
    async fn list_defined_domains(&self) -> Result<Vec<String>> {
        let domains = self.domains.read().map_err(poisoned)?;
        Ok(domains
            .iter()
            .filter(|(_, d)| !d.active)
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn list_active_domains(&self) -> Result<Vec<String>> {
        let domains = self.domains.read().map_err(poisoned)?;
        let mut active: Vec<_> = domains.iter().filter(|(_, d)| d.active).collect();
        active.sort_by_key(|(_, d)| d.id);
        Ok(active.into_iter().map(|(name, _)| name.clone()).collect())
    }

    async fn is_active(&self, name: &str) -> Result<bool> {
        let domains = self.domains.read().map_err(poisoned)?;
        domains
            .get(name)
            .map(|d| d.active)
            .ok_or_else(|| HypervisorError::QueryFailed(format!("no domain {}", name)))
    }
}

/// Mock guest-introspection session backed by an in-memory file map.
#[derive(Clone, Default)]
pub struct MockGuestFs {
    state: Arc<RwLock<MockGuestState>>,
}

#[derive(Default)]
struct MockGuestState {
    /// (device, distro) per inspected root, in inspection order
    roots: Vec<(String, String)>,
    files: HashMap<String, Vec<u8>>,
    domain: Option<String>,
    readonly: bool,
    launched: bool,
    mounted: Option<String>,
    writes: usize,
}

impl MockGuestFs {
    /// Create an empty guest with no operating system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an inspectable OS root.
    pub fn with_root(self, device: &str, distro: &str) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.roots.push((device.to_string(), distro.to_string()));
        }
        self
    }

    /// Seed a guest file.
    pub fn with_file(self, path: &str, content: impl AsRef<[u8]>) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.files.insert(path.to_string(), content.as_ref().to_vec());
        }
        self
    }

    /// Current content of a guest file, lossily decoded.
    pub fn file(&self, path: &str) -> Option<String> {
        self.file_bytes(path)
            .map(|data| String::from_utf8_lossy(&data).into_owned())
    }

    /// Current raw content of a guest file.
    pub fn file_bytes(&self, path: &str) -> Option<Vec<u8>> {
        self.state.read().ok()?.files.get(path).cloned()
    }

    /// Domain attached with `add_domain`, if any.
    pub fn domain(&self) -> Option<String> {
        self.state.read().ok()?.domain.clone()
    }

    /// Device mounted at `/`, if any.
    pub fn mounted_root(&self) -> Option<String> {
        self.state.read().ok()?.mounted.clone()
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.state.read().map(|s| s.writes).unwrap_or(0)
    }

    fn require_launched(state: &MockGuestState) -> Result<()> {
        if !state.launched {
            return Err(HypervisorError::InvalidState("appliance not launched".to_string()));
        }
        Ok(())
    }

    fn require_mounted(state: &MockGuestState) -> Result<()> {
        if state.mounted.is_none() {
            return Err(HypervisorError::InvalidState("no filesystem mounted".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl GuestFs for MockGuestFs {
    #[instrument(skip(self))]
    async fn add_domain(&mut self, name: &str, readonly: bool) -> Result<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.domain = Some(name.to_string());
        state.readonly = readonly;
        Ok(())
    }

    async fn launch(&mut self) -> Result<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        if state.domain.is_none() {
            return Err(HypervisorError::InvalidState("no disks added".to_string()));
        }
        state.launched = true;
        debug!("Mock appliance launched");
        Ok(())
    }

    async fn inspect_os(&self) -> Result<Vec<String>> {
        let state = self.state.read().map_err(poisoned)?;
        Self::require_launched(&state)?;
        Ok(state.roots.iter().map(|(dev, _)| dev.clone()).collect())
    }

    async fn inspect_get_distro(&self, root: &str) -> Result<String> {
        let state = self.state.read().map_err(poisoned)?;
        Self::require_launched(&state)?;
        state
            .roots
            .iter()
            .find(|(dev, _)| dev == root)
            .map(|(_, distro)| distro.clone())
            .ok_or_else(|| HypervisorError::GuestFs(format!("{}: not an inspected root", root)))
    }

    async fn mount(&mut self, device: &str, _mountpoint: &str) -> Result<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        Self::require_launched(&state)?;
        state.mounted = Some(device.to_string());
        Ok(())
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let state = self.state.read().map_err(poisoned)?;
        Self::require_mounted(&state)?;
        state
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| HypervisorError::GuestFs(format!("{}: No such file or directory", path)))
    }

    async fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        Self::require_mounted(&state)?;
        if state.readonly {
            return Err(HypervisorError::GuestFs(format!("{}: Read-only file system", path)));
        }
        state.files.insert(path.to_string(), content.to_vec());
        state.writes += 1;
        Ok(())
    }

    async fn is_file(&self, path: &str) -> Result<bool> {
        let state = self.state.read().map_err(poisoned)?;
        Self::require_mounted(&state)?;
        Ok(state.files.contains_key(path))
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.mounted = None;
        state.launched = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DomainState;

    #[tokio::test]
    async fn test_domain_states() {
        let backend = MockBackend::new();
        backend.define_domain("web1");
        backend.define_domain("db1");
        backend.start_domain("db1").unwrap();

        assert_eq!(backend.domain_state("web1").await.unwrap(), DomainState::Inactive);
        assert_eq!(backend.domain_state("db1").await.unwrap(), DomainState::Active);
        assert_eq!(backend.domain_state("nope").await.unwrap(), DomainState::Undefined);

        backend.stop_domain("db1").unwrap();
        assert_eq!(backend.domain_state("db1").await.unwrap(), DomainState::Inactive);
    }

    #[tokio::test]
    async fn test_guest_session_order() {
        let mut guest = MockGuestFs::new()
            .with_root("/dev/sda1", "ubuntu")
            .with_file("/etc/hostname", "old\n");

        assert!(guest.launch().await.is_err());
        guest.add_domain("web1", false).await.unwrap();
        guest.launch().await.unwrap();

        assert!(guest.read_file("/etc/hostname").await.is_err());
        let roots = guest.inspect_os().await.unwrap();
        assert_eq!(roots, vec!["/dev/sda1".to_string()]);
        assert_eq!(guest.inspect_get_distro("/dev/sda1").await.unwrap(), "ubuntu");

        guest.mount("/dev/sda1", "/").await.unwrap();
        assert_eq!(guest.read_file("/etc/hostname").await.unwrap(), b"old\n".to_vec());
        assert!(!guest.is_file("/etc/hosts").await.unwrap());
    }

    #[tokio::test]
    async fn test_clones_share_files() {
        let mut guest = MockGuestFs::new().with_root("/dev/sda1", "centos");
        let observer = guest.clone();

        guest.add_domain("web1", false).await.unwrap();
        guest.launch().await.unwrap();
        guest.mount("/dev/sda1", "/").await.unwrap();
        guest.write("/etc/hostname", b"web1").await.unwrap();

        assert_eq!(observer.file("/etc/hostname").as_deref(), Some("web1"));
        assert_eq!(observer.write_count(), 1);
        assert_eq!(observer.domain().as_deref(), Some("web1"));
    }
}
