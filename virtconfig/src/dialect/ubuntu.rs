//! Ubuntu (ifupdown) dialect.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use tracing::{info, instrument};
use virtconfig_hypervisor::{Distro, GuestFs};

use super::{first_capture, read_if_file, rewrite_lines, Dialect, GuestNetConfig};
use crate::error::{EditError, Result};

pub const INTERFACES_PATH: &str = "/etc/network/interfaces";
pub const HOSTNAME_PATH: &str = "/etc/hostname";

static ADDRESS_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)^(\s+address)\s+[0-9.]+").expect("valid regex"));

static ADDRESS_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)^\s+address\s+([0-9.]+)$").expect("valid regex"));

/// Replace the value of every indented `address` directive.
///
/// Returns `None` if the file has no such directive.
pub fn rewrite_interfaces(text: &[u8], ipaddr: &str) -> Option<Vec<u8>> {
    let (out, replaced) = rewrite_lines(text, |line| {
        ADDRESS_LINE
            .captures(line)
            .map(|caps| [&caps[1], &b" "[..], ipaddr.as_bytes()].concat())
    });
    replaced.then_some(out)
}

/// First address configured in an interfaces file.
pub fn parse_address(text: &[u8]) -> Option<String> {
    first_capture(&ADDRESS_VALUE, text)
}

/// Hostname written to `/etc/hostname`: the FQDN minus its last two labels.
///
/// `web1.prod.example.com` gives `web1.prod`, `host.example` gives `host`,
/// and a bare name is kept as is.
pub fn short_hostname(fqdn: &str) -> &str {
    fqdn.rsplitn(3, '.').last().unwrap_or(fqdn)
}

/// Ubuntu network configuration dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct UbuntuDialect;

#[async_trait]
impl Dialect for UbuntuDialect {
    fn distro(&self) -> Distro {
        Distro::Ubuntu
    }

    #[instrument(skip(self, guest))]
    async fn update_ipaddr(&self, guest: &dyn GuestFs, ipaddr: &str) -> Result<()> {
        let data = guest.read_file(INTERFACES_PATH).await?;
        let new_data = rewrite_interfaces(&data, ipaddr)
            .ok_or_else(|| EditError::UnsupportedFormat(INTERFACES_PATH.to_string()))?;

        guest.write(INTERFACES_PATH, &new_data).await?;
        info!(path = INTERFACES_PATH, "Updated address");
        Ok(())
    }

    #[instrument(skip(self, guest))]
    async fn update_hostname(&self, guest: &dyn GuestFs, fqdn: &str) -> Result<()> {
        let hostname = short_hostname(fqdn);
        guest.write(HOSTNAME_PATH, hostname.as_bytes()).await?;
        info!(path = HOSTNAME_PATH, hostname = %hostname, "Updated hostname");
        Ok(())
    }

    async fn read_config(&self, guest: &dyn GuestFs) -> Result<GuestNetConfig> {
        let mut config = GuestNetConfig::default();

        if let Some(data) = read_if_file(guest, INTERFACES_PATH).await? {
            if let Some(ipaddr) = parse_address(&data) {
                config.ipaddr = ipaddr;
            }
        }

        if let Some(data) = read_if_file(guest, HOSTNAME_PATH).await? {
            let first = data.split(|b| *b == b'\n').next().unwrap_or_default();
            config.hostname = String::from_utf8_lossy(first).into_owned();
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERFACES: &[u8] = b"\
auto lo
iface lo inet loopback

auto eth0
iface eth0 inet static
    address 10.0.0.5
    netmask 255.255.255.0
    gateway 10.0.0.1
";

    #[test]
    fn test_rewrite_interfaces() {
        let out = rewrite_interfaces(INTERFACES, "10.0.0.9").unwrap();
        let expected = String::from_utf8_lossy(INTERFACES)
            .replace("    address 10.0.0.5", "    address 10.0.0.9");
        assert_eq!(out, expected.as_bytes());
    }

    #[test]
    fn test_rewrite_interfaces_keeps_indent() {
        let out = rewrite_interfaces(b"iface eth0 inet static\n\taddress 1.2.3.4\n", "5.6.7.8").unwrap();
        assert_eq!(out, b"iface eth0 inet static\n\taddress 5.6.7.8\n");
    }

    #[test]
    fn test_rewrite_interfaces_requires_address() {
        assert!(rewrite_interfaces(b"auto eth0\niface eth0 inet dhcp\n", "10.0.0.9").is_none());
        // Unindented directives are not matched.
        assert!(rewrite_interfaces(b"address 10.0.0.5\n", "10.0.0.9").is_none());
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address(INTERFACES).as_deref(), Some("10.0.0.5"));
        assert_eq!(parse_address(b"iface eth0 inet dhcp\n"), None);
    }

    #[test]
    fn test_rewrite_interfaces_with_latin1_comment() {
        let text = b"# r\xe9seau\niface eth0 inet static\n    address 10.0.0.5\n";
        let out = rewrite_interfaces(text, "10.0.0.9").unwrap();
        assert_eq!(out, b"# r\xe9seau\niface eth0 inet static\n    address 10.0.0.9\n");
        assert_eq!(parse_address(text).as_deref(), Some("10.0.0.5"));
    }

    #[test]
    fn test_short_hostname() {
        assert_eq!(short_hostname("web1.prod.example.com"), "web1.prod");
        assert_eq!(short_hostname("host.sub.example.com"), "host.sub");
        assert_eq!(short_hostname("host.example.com"), "host");
        assert_eq!(short_hostname("host.example"), "host");
        assert_eq!(short_hostname("host"), "host");
    }
}
