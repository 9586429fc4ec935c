//! Distribution config dialects.
//!
//! Each supported distro keeps its network settings in a different set of
//! files and line formats. A [`Dialect`] bundles the three operations the
//! editor needs for one distro; the dialect is chosen once, right after the
//! guest OS is detected.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use virtconfig_hypervisor::{Distro, GuestFs};

use crate::error::Result;

pub mod centos;
pub mod ubuntu;

pub use centos::CentosDialect;
pub use ubuntu::UbuntuDialect;

/// Value reported for settings that could not be read back.
pub const UNKNOWN: &str = "unknown";

/// Network settings as currently written in the guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestNetConfig {
    pub ipaddr: String,
    pub hostname: String,
}

impl Default for GuestNetConfig {
    fn default() -> Self {
        Self {
            ipaddr: UNKNOWN.to_string(),
            hostname: UNKNOWN.to_string(),
        }
    }
}

impl fmt::Display for GuestNetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ipaddr: {}", self.ipaddr)?;
        write!(f, "hostname: {}", self.hostname)
    }
}

/// Tunables for the dialects.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DialectOptions {
    /// Interface whose `ifcfg-*` script is edited on CentOS guests
    pub centos_interface: String,
}

impl Default for DialectOptions {
    fn default() -> Self {
        Self {
            centos_interface: "eth0".to_string(),
        }
    }
}

/// File-format policy for one distribution.
#[async_trait]
pub trait Dialect: Send + Sync {
    /// Distribution this dialect edits.
    fn distro(&self) -> Distro;

    /// Rewrite the primary interface address.
    async fn update_ipaddr(&self, guest: &dyn GuestFs, ipaddr: &str) -> Result<()>;

    /// Rewrite the persistent hostname.
    async fn update_hostname(&self, guest: &dyn GuestFs, fqdn: &str) -> Result<()>;

    /// Read back the current address and hostname.
    async fn read_config(&self, guest: &dyn GuestFs) -> Result<GuestNetConfig>;
}

/// Select the dialect for a detected distribution.
pub fn for_distro(distro: Distro, options: &DialectOptions) -> Box<dyn Dialect> {
    match distro {
        Distro::Ubuntu => Box::new(UbuntuDialect),
        Distro::Centos => Box::new(CentosDialect::new(&options.centos_interface)),
    }
}

/// Run `f` over every line of `text`.
///
/// Lines for which `f` returns a replacement are swapped in; the rest are
/// kept byte for byte, as is the file's trailing newline. Returns the new
/// text and whether any line was replaced.
pub(crate) fn rewrite_lines<F>(text: &[u8], mut f: F) -> (Vec<u8>, bool)
where
    F: FnMut(&[u8]) -> Option<Vec<u8>>,
{
    let mut replaced = false;
    let lines: Vec<Vec<u8>> = text
        .split(|b| *b == b'\n')
        .map(|line| match f(line) {
            Some(new_line) => {
                replaced = true;
                new_line
            }
            None => line.to_vec(),
        })
        .collect();

    (lines.join(&b'\n'), replaced)
}

/// First line of `text` whose pattern match has a first capture group.
pub(crate) fn first_capture(re: &regex::bytes::Regex, text: &[u8]) -> Option<String> {
    text.split(|b| *b == b'\n').find_map(|line| {
        re.captures(line)
            .map(|caps| String::from_utf8_lossy(&caps[1]).into_owned())
    })
}

/// Read a guest file if it exists.
pub(crate) async fn read_if_file(guest: &dyn GuestFs, path: &str) -> Result<Option<Vec<u8>>> {
    if !guest.is_file(path).await? {
        return Ok(None);
    }
    Ok(Some(guest.read_file(path).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_lines_keeps_layout() {
        let text = b"a\nb\nc\n";
        let (out, replaced) = rewrite_lines(text, |l| (l == b"b").then(|| b"B".to_vec()));
        assert!(replaced);
        assert_eq!(out, b"a\nB\nc\n");

        let (out, replaced) = rewrite_lines(b"a\nb", |_| None);
        assert!(!replaced);
        assert_eq!(out, b"a\nb");
    }

    #[test]
    fn test_rewrite_lines_keeps_invalid_utf8() {
        let text = b"# caf\xe9\nb\n";
        let (out, replaced) = rewrite_lines(text, |l| (l == b"b").then(|| b"B".to_vec()));
        assert!(replaced);
        assert_eq!(out, b"# caf\xe9\nB\n");
    }

    #[test]
    fn test_for_distro() {
        let options = DialectOptions::default();
        assert_eq!(for_distro(Distro::Ubuntu, &options).distro(), Distro::Ubuntu);
        assert_eq!(for_distro(Distro::Centos, &options).distro(), Distro::Centos);
    }

    #[test]
    fn test_config_display() {
        let config = GuestNetConfig {
            ipaddr: "10.0.0.9".to_string(),
            hostname: "web1".to_string(),
        };
        assert_eq!(config.to_string(), "ipaddr: 10.0.0.9\nhostname: web1");
        assert_eq!(
            GuestNetConfig::default().to_string(),
            "ipaddr: unknown\nhostname: unknown"
        );
    }
}
