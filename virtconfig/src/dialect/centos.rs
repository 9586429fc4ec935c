//! CentOS (network-scripts) dialect.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use tracing::{info, instrument};
use virtconfig_hypervisor::{Distro, GuestFs};

use super::{first_capture, read_if_file, rewrite_lines, Dialect, GuestNetConfig};
use crate::error::{EditError, Result};

pub const NETWORK_SCRIPTS_DIR: &str = "/etc/sysconfig/network-scripts";
pub const NETWORK_PATH: &str = "/etc/sysconfig/network";
pub const PERSISTENT_NET_RULES: &str = "/etc/udev/rules.d/70-persistent-net.rules";

static IPADDR_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?-u)^IPADDR=.*$").expect("valid regex"));
static HWADDR_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?-u)^HWADDR=.*$").expect("valid regex"));
static HOSTNAME_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)^HOSTNAME=.*$").expect("valid regex"));

static IPADDR_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?-u)^IPADDR=["']?([^"']*)["']?$"#).expect("valid regex"));
static HOSTNAME_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?-u)^HOSTNAME=["']?([^"']*)["']?$"#).expect("valid regex"));

/// Set `IPADDR` and comment out `HWADDR` in an ifcfg script.
///
/// A stale `HWADDR` would pin the config to the old NIC once udev renames
/// it. Returns `None` if there is no `IPADDR` line.
pub fn rewrite_ifcfg(text: &[u8], ipaddr: &str) -> Option<Vec<u8>> {
    let mut found = false;
    let (out, _) = rewrite_lines(text, |line| {
        if IPADDR_LINE.is_match(line) {
            found = true;
            Some(format!("IPADDR=\"{}\"", ipaddr).into_bytes())
        } else if HWADDR_LINE.is_match(line) {
            Some([&b"#"[..], line].concat())
        } else {
            None
        }
    });
    found.then_some(out)
}

/// Set `HOSTNAME` in `/etc/sysconfig/network`.
pub fn rewrite_network(text: &[u8], fqdn: &str) -> Option<Vec<u8>> {
    let (out, replaced) = rewrite_lines(text, |line| {
        HOSTNAME_LINE
            .is_match(line)
            .then(|| format!("HOSTNAME=\"{}\"", fqdn).into_bytes())
    });
    replaced.then_some(out)
}

/// First `IPADDR` value, unquoted.
pub fn parse_ipaddr(text: &[u8]) -> Option<String> {
    first_capture(&IPADDR_VALUE, text)
}

/// First `HOSTNAME` value, unquoted.
pub fn parse_hostname(text: &[u8]) -> Option<String> {
    first_capture(&HOSTNAME_VALUE, text)
}

/// CentOS network configuration dialect.
#[derive(Debug, Clone)]
pub struct CentosDialect {
    ifcfg_path: String,
}

impl CentosDialect {
    /// Dialect editing `ifcfg-<interface>`.
    pub fn new(interface: &str) -> Self {
        Self {
            ifcfg_path: format!("{}/ifcfg-{}", NETWORK_SCRIPTS_DIR, interface),
        }
    }

    /// Path of the interface script being edited.
    pub fn ifcfg_path(&self) -> &str {
        &self.ifcfg_path
    }
}

impl Default for CentosDialect {
    fn default() -> Self {
        Self::new("eth0")
    }
}

#[async_trait]
impl Dialect for CentosDialect {
    fn distro(&self) -> Distro {
        Distro::Centos
    }

    #[instrument(skip(self, guest), fields(path = %self.ifcfg_path))]
    async fn update_ipaddr(&self, guest: &dyn GuestFs, ipaddr: &str) -> Result<()> {
        let data = guest.read_file(&self.ifcfg_path).await?;
        let new_data = rewrite_ifcfg(&data, ipaddr)
            .ok_or_else(|| EditError::UnsupportedFormat(self.ifcfg_path.clone()))?;

        guest.write(&self.ifcfg_path, &new_data).await?;
        info!("Updated IPADDR");

        // Forces udev to regenerate interface names on next boot.
        guest.write(PERSISTENT_NET_RULES, b"").await?;
        info!(path = PERSISTENT_NET_RULES, "Cleared persistent net rules");
        Ok(())
    }

    #[instrument(skip(self, guest))]
    async fn update_hostname(&self, guest: &dyn GuestFs, fqdn: &str) -> Result<()> {
        let data = guest.read_file(NETWORK_PATH).await?;
        let new_data = rewrite_network(&data, fqdn)
            .ok_or_else(|| EditError::UnsupportedFormat(NETWORK_PATH.to_string()))?;

        guest.write(NETWORK_PATH, &new_data).await?;
        info!(path = NETWORK_PATH, "Updated HOSTNAME");
        Ok(())
    }

    async fn read_config(&self, guest: &dyn GuestFs) -> Result<GuestNetConfig> {
        let mut config = GuestNetConfig::default();

        if let Some(data) = read_if_file(guest, &self.ifcfg_path).await? {
            if let Some(ipaddr) = parse_ipaddr(&data) {
                config.ipaddr = ipaddr;
            }
        }

        if let Some(data) = read_if_file(guest, NETWORK_PATH).await? {
            if let Some(hostname) = parse_hostname(&data) {
                config.hostname = hostname;
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IFCFG: &[u8] = b"\
DEVICE=\"eth0\"
BOOTPROTO=\"static\"
HWADDR=\"aa:bb:cc\"
IPADDR=\"10.0.0.5\"
NETMASK=\"255.255.255.0\"
ONBOOT=\"yes\"
";

    #[test]
    fn test_rewrite_ifcfg() {
        let out = String::from_utf8(rewrite_ifcfg(IFCFG, "10.0.0.9").unwrap()).unwrap();
        assert!(out.contains("IPADDR=\"10.0.0.9\"\n"));
        assert!(out.contains("#HWADDR=\"aa:bb:cc\"\n"));
        assert!(!out.contains("10.0.0.5"));
        assert!(out.contains("NETMASK=\"255.255.255.0\"\n"));
        assert_eq!(out.lines().count(), IFCFG.split(|b| *b == b'\n').count() - 1);
    }

    #[test]
    fn test_rewrite_ifcfg_keeps_non_utf8_lines() {
        let text = b"NAME=\"carte r\xe9seau\"\nHWADDR=aa:\xff\nIPADDR=10.0.0.5\n";
        let out = rewrite_ifcfg(text, "10.0.0.9").unwrap();
        assert_eq!(out, b"NAME=\"carte r\xe9seau\"\n#HWADDR=aa:\xff\nIPADDR=\"10.0.0.9\"\n");
    }

    #[test]
    fn test_rewrite_ifcfg_requires_ipaddr() {
        assert!(rewrite_ifcfg(b"DEVICE=eth0\nHWADDR=aa:bb:cc\nBOOTPROTO=dhcp\n", "10.0.0.9").is_none());
    }

    #[test]
    fn test_rewrite_network() {
        let out = rewrite_network(b"NETWORKING=yes\nHOSTNAME=old.example.com\n", "web1.example.com").unwrap();
        assert_eq!(out, b"NETWORKING=yes\nHOSTNAME=\"web1.example.com\"\n");
        assert!(rewrite_network(b"NETWORKING=yes\n", "web1").is_none());
    }

    #[test]
    fn test_parse_values() {
        assert_eq!(parse_ipaddr(IFCFG).as_deref(), Some("10.0.0.5"));
        assert_eq!(parse_ipaddr(b"IPADDR='10.1.1.1'").as_deref(), Some("10.1.1.1"));
        assert_eq!(parse_ipaddr(b"IPADDR=10.2.2.2\n").as_deref(), Some("10.2.2.2"));
        assert_eq!(parse_hostname(b"HOSTNAME=\"web1.example.com\"\n").as_deref(), Some("web1.example.com"));
        assert_eq!(parse_hostname(b"NETWORKING=yes\n"), None);
    }

    #[test]
    fn test_ifcfg_path() {
        assert_eq!(CentosDialect::default().ifcfg_path(), "/etc/sysconfig/network-scripts/ifcfg-eth0");
        assert_eq!(CentosDialect::new("ens3").ifcfg_path(), "/etc/sysconfig/network-scripts/ifcfg-ens3");
    }
}
