//! Guest network editor.
//!
//! ```text
//! open ──► domain_state ──► connect ──► add_domain ──► launch
//!                                                       │
//!          dialect ◄── inspect_get_distro ◄── inspect_os┘
//!             │
//!             └──► mount ──► update_* / read_config ──► close
//! ```

use std::future::Future;
use tracing::{debug, info, instrument};
use virtconfig_hypervisor::{
    DomainState, Distro, GuestFs, Hypervisor, HypervisorError, ROOT_MOUNTPOINT,
};

use crate::dialect::{self, Dialect, DialectOptions, GuestNetConfig};
use crate::error::{EditError, Result};
use crate::hosts;
use crate::validate::EditRequest;

/// A mounted, writable view of one powered-off guest.
pub struct GuestNetEditor<G: GuestFs> {
    domain: String,
    root: String,
    guest: G,
    dialect: Box<dyn Dialect>,
}

impl<G: GuestFs> GuestNetEditor<G> {
    /// Open an editing session on `domain`.
    ///
    /// The domain must exist and be powered off. `connect` is only called
    /// once that is established, so nothing touches the disks of a running
    /// guest. The first inspected OS root is mounted at `/`.
    #[instrument(skip(hypervisor, options, connect))]
    pub async fn open<F, Fut>(
        hypervisor: &dyn Hypervisor,
        domain: &str,
        options: &DialectOptions,
        connect: F,
    ) -> Result<Self>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<G, HypervisorError>>,
    {
        let state = hypervisor.domain_state(domain).await?;
        if !state.is_editable() {
            return Err(match state {
                DomainState::Undefined => EditError::NotFound(domain.to_string()),
                _ => EditError::Running(domain.to_string()),
            });
        }
        debug!(?state, "Domain is powered off");

        let mut guest = connect().await?;
        guest.add_domain(domain, false).await?;
        guest.launch().await?;

        let root = guest
            .inspect_os()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EditError::NoOperatingSystem(domain.to_string()))?;

        let distro_name = guest.inspect_get_distro(&root).await?;
        let distro = Distro::from_inspected(&distro_name)
            .ok_or(EditError::UnsupportedDistro(distro_name))?;

        guest.mount(&root, ROOT_MOUNTPOINT).await?;
        info!(root = %root, distro = %distro, "Guest filesystem mounted");

        Ok(Self {
            domain: domain.to_string(),
            root,
            guest,
            dialect: dialect::for_distro(distro, options),
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Device of the mounted OS root.
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn distro(&self) -> Distro {
        self.dialect.distro()
    }

    pub async fn update_ipaddr(&self, ipaddr: &str) -> Result<()> {
        self.dialect.update_ipaddr(&self.guest, ipaddr).await
    }

    pub async fn update_hostname(&self, fqdn: &str) -> Result<()> {
        self.dialect.update_hostname(&self.guest, fqdn).await
    }

    pub async fn update_hosts(&self, ipaddr: &str, fqdn: &str) -> Result<()> {
        hosts::update_hosts(&self.guest, ipaddr, fqdn).await
    }

    /// Apply a validated request: address, then hostname, then the hosts
    /// entry when both were given. Stops at the first failure; edits already
    /// written stay in place.
    #[instrument(skip(self), fields(domain = %self.domain))]
    pub async fn apply(&self, request: &EditRequest) -> Result<()> {
        if let Some(ipaddr) = request.ipaddr() {
            self.update_ipaddr(ipaddr).await?;
        }
        if let Some(hostname) = request.hostname() {
            self.update_hostname(hostname).await?;
        }
        if let (Some(ipaddr), Some(hostname)) = (request.ipaddr(), request.hostname()) {
            self.update_hosts(ipaddr, hostname).await?;
        }
        Ok(())
    }

    /// Read back the address and hostname currently configured in the guest.
    pub async fn read_config(&self) -> Result<GuestNetConfig> {
        self.dialect.read_config(&self.guest).await
    }

    /// Unmount and release the guest session.
    pub async fn close(mut self) -> Result<()> {
        self.guest.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use virtconfig_hypervisor::{MockBackend, MockGuestFs};

    fn backend_with(name: &str) -> MockBackend {
        let backend = MockBackend::new();
        backend.define_domain(name);
        backend
    }

    async fn open(
        backend: &MockBackend,
        domain: &str,
        guest: &MockGuestFs,
    ) -> Result<GuestNetEditor<MockGuestFs>> {
        let guest = guest.clone();
        GuestNetEditor::open(backend, domain, &DialectOptions::default(), move || async move {
            Ok(guest)
        })
        .await
    }

    #[tokio::test]
    async fn test_open_mounts_first_root() {
        let backend = backend_with("web1");
        let guest = MockGuestFs::new()
            .with_root("/dev/sda1", "ubuntu")
            .with_root("/dev/sdb1", "centos");

        let editor = open(&backend, "web1", &guest).await.unwrap();
        assert_eq!(editor.distro(), Distro::Ubuntu);
        assert_eq!(editor.root(), "/dev/sda1");
        assert_eq!(guest.mounted_root().as_deref(), Some("/dev/sda1"));
        assert_eq!(guest.domain().as_deref(), Some("web1"));
    }

    #[tokio::test]
    async fn test_open_unknown_domain() {
        let backend = backend_with("web1");
        let guest = MockGuestFs::new().with_root("/dev/sda1", "ubuntu");

        let err = open(&backend, "db1", &guest).await.err().unwrap();
        assert!(matches!(err, EditError::NotFound(ref name) if name == "db1"));
        assert!(guest.domain().is_none());
    }

    #[tokio::test]
    async fn test_open_running_domain() {
        let backend = backend_with("web1");
        backend.start_domain("web1").unwrap();
        let guest = MockGuestFs::new().with_root("/dev/sda1", "ubuntu");

        let err = open(&backend, "web1", &guest).await.err().unwrap();
        assert_eq!(err.to_string(), "Domain is running: web1");
        assert!(guest.domain().is_none());
        assert!(guest.mounted_root().is_none());
    }

    #[tokio::test]
    async fn test_open_unsupported_distro() {
        let backend = backend_with("web1");
        let guest = MockGuestFs::new().with_root("/dev/sda1", "fedora");

        let err = open(&backend, "web1", &guest).await.err().unwrap();
        assert_eq!(err.to_string(), "Unsupported OS: fedora");
        assert!(guest.mounted_root().is_none());
    }

    #[tokio::test]
    async fn test_open_without_os() {
        let backend = backend_with("web1");
        let guest = MockGuestFs::new();

        let err = open(&backend, "web1", &guest).await.err().unwrap();
        assert!(matches!(err, EditError::NoOperatingSystem(_)));
    }

    #[tokio::test]
    async fn test_failed_update_keeps_earlier_edits() {
        let backend = backend_with("web1");
        let guest = MockGuestFs::new()
            .with_root("/dev/sda1", "centos")
            .with_file("/etc/sysconfig/network-scripts/ifcfg-eth0", "IPADDR=10.0.0.5\n")
            .with_file("/etc/sysconfig/network", "NETWORKING=yes\n");

        let editor = open(&backend, "web1", &guest).await.unwrap();
        let request = EditRequest::new(Some("10.0.0.9".into()), Some("web1".into())).unwrap();

        let err = editor.apply(&request).await.unwrap_err();
        assert_eq!(err.to_string(), "Unsupported format: /etc/sysconfig/network");
        assert_eq!(
            guest.file("/etc/sysconfig/network-scripts/ifcfg-eth0").as_deref(),
            Some("IPADDR=\"10.0.0.9\"\n")
        );
    }
}
