//! Command-line value validation.
//!
//! Both checks are purely lexical. IP groups are not range checked, so
//! `999.1.1.1` is accepted.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{EditError, Result};

static IPADDR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}$").expect("valid regex")
});

static HOSTNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9.\-_]+$").expect("valid regex"));

/// Dotted quad of 1-3 digit groups.
pub fn is_valid_ipaddr(ipaddr: &str) -> bool {
    IPADDR_RE.is_match(ipaddr)
}

/// Letters, digits, dot, hyphen and underscore only.
pub fn is_valid_hostname(hostname: &str) -> bool {
    HOSTNAME_RE.is_match(hostname)
}

/// A validated set of edits for one domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditRequest {
    ipaddr: Option<String>,
    hostname: Option<String>,
}

impl EditRequest {
    /// Validate the requested values.
    pub fn new(ipaddr: Option<String>, hostname: Option<String>) -> Result<Self> {
        if let Some(ip) = &ipaddr {
            if !is_valid_ipaddr(ip) {
                return Err(EditError::InvalidArgument(format!("Invalid ip-address: {}", ip)));
            }
        }
        if let Some(name) = &hostname {
            if !is_valid_hostname(name) {
                return Err(EditError::InvalidArgument(format!("Invalid hostname: {}", name)));
            }
        }
        Ok(Self { ipaddr, hostname })
    }

    pub fn ipaddr(&self) -> Option<&str> {
        self.ipaddr.as_deref()
    }

    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// True when nothing would be written.
    pub fn is_empty(&self) -> bool {
        self.ipaddr.is_none() && self.hostname.is_none()
    }
}
