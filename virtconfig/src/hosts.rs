//! `/etc/hosts` editing. Same format on every supported distro.

use regex::bytes::Regex;
use tracing::{info, instrument};
use virtconfig_hypervisor::GuestFs;

use crate::dialect::rewrite_lines;
use crate::error::{EditError, Result};

pub const HOSTS_PATH: &str = "/etc/hosts";

/// Hosts entry for an address: `<ip>\t<short> <fqdn>`, or `<ip>\t<name>`
/// when the name has no domain part.
pub fn hosts_entry(ipaddr: &str, hostname: &str) -> String {
    match hostname.split_once('.') {
        Some((short, _)) => format!("{}\t{} {}", ipaddr, short, hostname),
        None => format!("{}\t{}", ipaddr, hostname),
    }
}

/// Point every line for `ipaddr` at `hostname`, appending an entry if the
/// address is not listed yet.
pub fn rewrite_hosts(text: &[u8], ipaddr: &str, hostname: &str) -> Result<Vec<u8>> {
    let entry = hosts_entry(ipaddr, hostname).into_bytes();
    let pattern = format!(r"(?-u)^{}\s", regex::escape(ipaddr));
    let re = Regex::new(&pattern)
        .map_err(|e| EditError::InvalidArgument(format!("Invalid ip-address: {} ({})", ipaddr, e)))?;

    let (mut out, replaced) = rewrite_lines(text, |line| re.is_match(line).then(|| entry.clone()));

    if !replaced {
        if !out.is_empty() && !out.ends_with(b"\n") {
            out.push(b'\n');
        }
        out.extend_from_slice(&entry);
        out.push(b'\n');
    }

    Ok(out)
}

/// Rewrite the guest's `/etc/hosts`.
#[instrument(skip(guest))]
pub async fn update_hosts(guest: &dyn GuestFs, ipaddr: &str, hostname: &str) -> Result<()> {
    let data = guest.read_file(HOSTS_PATH).await?;
    let new_data = rewrite_hosts(&data, ipaddr, hostname)?;
    guest.write(HOSTS_PATH, &new_data).await?;
    info!(path = HOSTS_PATH, "Updated hosts entry");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOSTS: &str = "127.0.0.1\tlocalhost\n127.0.1.1\told\n";

    fn rewrite(text: &str, ipaddr: &str, hostname: &str) -> String {
        let out = rewrite_hosts(text.as_bytes(), ipaddr, hostname).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_hosts_entry() {
        assert_eq!(hosts_entry("10.0.0.9", "host.example.com"), "10.0.0.9\thost host.example.com");
        assert_eq!(hosts_entry("10.0.0.9", "host"), "10.0.0.9\thost");
    }

    #[test]
    fn test_appends_missing_entry() {
        let out = rewrite(HOSTS, "10.0.0.9", "host.example.com");
        assert_eq!(out, format!("{}10.0.0.9\thost host.example.com\n", HOSTS));

        let out = rewrite("127.0.0.1 localhost", "10.0.0.9", "host");
        assert_eq!(out, "127.0.0.1 localhost\n10.0.0.9\thost\n");

        assert_eq!(rewrite("", "10.0.0.9", "host"), "10.0.0.9\thost\n");
    }

    #[test]
    fn test_replaces_existing_entry() {
        let first = rewrite(HOSTS, "10.0.0.9", "host.example.com");
        let second = rewrite(&first, "10.0.0.9", "web2.example.com");

        assert_eq!(second.matches("10.0.0.9").count(), 1);
        assert!(second.contains("10.0.0.9\tweb2 web2.example.com\n"));
        assert!(!second.contains("host.example.com"));
    }

    #[test]
    fn test_dots_match_literally() {
        // 10a0b0c9 must not be taken for 10.0.0.9
        let out = rewrite("10a0b0c9 other\n", "10.0.0.9", "host");
        assert_eq!(out, "10a0b0c9 other\n10.0.0.9\thost\n");

        // a longer address sharing the prefix is a different entry
        let out = rewrite("10.0.0.99 other\n", "10.0.0.9", "host");
        assert_eq!(out, "10.0.0.99 other\n10.0.0.9\thost\n");
    }

    #[test]
    fn test_non_utf8_hosts_file() {
        let text = b"127.0.0.1\tlocalhost # caf\xe9\n10.0.0.9\tol\xffd\n";
        let out = rewrite_hosts(text, "10.0.0.9", "web1.example.com").unwrap();
        assert_eq!(out, b"127.0.0.1\tlocalhost # caf\xe9\n10.0.0.9\tweb1 web1.example.com\n");
    }
}
