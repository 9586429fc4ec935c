//! Command-line argument parsing.

use clap::{ArgAction, Parser};

/// Edit IP address, hostname and /etc/hosts of a powered-off libvirt guest
#[derive(Parser, Debug)]
#[command(name = "virtconfig")]
#[command(about = "Edit IP address, hostname and /etc/hosts of a powered-off libvirt guest")]
#[command(version)]
#[command(disable_help_flag = true)]
pub struct Args {
    /// New IP address (dotted quad)
    #[arg(short = 'i', long = "ipaddr", value_name = "NEW_IPADDR")]
    pub ipaddr: Option<String>,

    /// New hostname (FQDN)
    #[arg(short = 'h', long = "hostname", value_name = "NEW_HOSTNAME")]
    pub hostname: Option<String>,

    /// Print the resulting configuration
    #[arg(short = 'c', long = "confirm")]
    pub confirm: bool,

    /// Print the confirmation as JSON
    #[arg(long, requires = "confirm")]
    pub json: bool,

    /// Path to configuration file (optional, defaults used if not found)
    #[arg(long)]
    pub config: Option<String>,

    /// Libvirt connection URI
    #[arg(long, env = "LIBVIRT_DEFAULT_URI")]
    pub uri: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,

    /// Name of the libvirt domain to edit
    #[arg(value_name = "DOMNAME")]
    pub domname: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_short_flags() {
        let args = Args::try_parse_from([
            "virtconfig", "-i", "10.0.0.9", "-h", "web1.example.com", "-c", "web1",
        ])
        .unwrap();

        assert_eq!(args.ipaddr.as_deref(), Some("10.0.0.9"));
        assert_eq!(args.hostname.as_deref(), Some("web1.example.com"));
        assert!(args.confirm);
        assert!(!args.json);
        assert_eq!(args.domname, "web1");
    }

    #[test]
    fn test_options_after_domname() {
        let args = Args::try_parse_from(["virtconfig", "web1", "-c", "--json"]).unwrap();
        assert_eq!(args.domname, "web1");
        assert!(args.confirm && args.json);
        assert!(args.ipaddr.is_none());
    }

    #[test]
    fn test_missing_domname() {
        let err = Args::try_parse_from(["virtconfig", "-i", "10.0.0.9"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_json_requires_confirm() {
        assert!(Args::try_parse_from(["virtconfig", "--json", "web1"]).is_err());
    }

    #[test]
    fn test_long_help() {
        let err = Args::try_parse_from(["virtconfig", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }
}
