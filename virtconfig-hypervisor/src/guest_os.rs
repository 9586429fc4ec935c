//! Guest distribution detection.
//!
//! Introspection reports a distro short name for each OS root. Only the
//! distributions whose network configuration layout is known are accepted;
//! everything else is rejected before any file is touched.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported guest distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distro {
    /// Ubuntu - ifupdown `/etc/network/interfaces`, `/etc/hostname`
    Ubuntu,
    /// CentOS - `ifcfg-*` network scripts, `/etc/sysconfig/network`
    Centos,
}

impl Distro {
    /// Parse an introspection distro name. Matching is exact, as reported
    /// by libguestfs (`inspect-get-distro`).
    pub fn from_inspected(name: &str) -> Option<Self> {
        match name {
            "ubuntu" => Some(Self::Ubuntu),
            "centos" => Some(Self::Centos),
            _ => None,
        }
    }

    /// Introspection name of the distro.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ubuntu => "ubuntu",
            Self::Centos => "centos",
        }
    }
}

impl fmt::Display for Distro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
