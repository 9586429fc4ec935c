//! Configuration management.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use virtconfig_common::LogFormat;
use virtconfig_hypervisor::guestfs::DEFAULT_GUESTFISH;
use virtconfig_hypervisor::libvirt::DEFAULT_URI;

use crate::cli::Args;
use crate::dialect::DialectOptions;

/// Location checked when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/virtconfig/config.yaml";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hypervisor connection
    pub hypervisor: HypervisorConfig,
    /// Guest introspection
    pub guestfs: GuestFsConfig,
    /// Distro dialect tunables
    pub dialect: DialectOptions,
    /// Log output
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).with_context(|| "Failed to parse config file")
    }

    /// Load the file named by `--config`, or the default file if present.
    pub fn resolve(args: &Args) -> Result<Self> {
        let config = match &args.config {
            Some(path) => Self::load(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::load(DEFAULT_CONFIG_PATH)?,
            None => Self::default(),
        };
        Ok(config.with_cli_overrides(args))
    }

    /// Apply CLI argument overrides to the configuration.
    pub fn with_cli_overrides(mut self, args: &Args) -> Self {
        if let Some(ref uri) = args.uri {
            self.hypervisor.libvirt_uri = uri.clone();
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }

        self
    }
}

/// Hypervisor connection configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HypervisorConfig {
    /// Libvirt connection URI
    pub libvirt_uri: String,
}

impl Default for HypervisorConfig {
    fn default() -> Self {
        Self {
            libvirt_uri: DEFAULT_URI.to_string(),
        }
    }
}

/// Guest introspection configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GuestFsConfig {
    /// guestfish binary
    pub guestfish_path: String,
}

impl Default for GuestFsConfig {
    fn default() -> Self {
        Self {
            guestfish_path: DEFAULT_GUESTFISH.to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format: pretty or json
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Install the global tracing subscriber.
    pub fn init(&self) -> Result<()> {
        match self.format.parse::<LogFormat>()? {
            LogFormat::Pretty => virtconfig_common::init_logging(&self.level),
            LogFormat::Json => virtconfig_common::init_logging_json(&self.level),
        }
    }
}
