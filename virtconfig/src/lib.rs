//! # virtconfig
//!
//! Edit the network identity of a powered-off libvirt guest in place: the
//! interface address, the hostname, and the matching `/etc/hosts` entry.
//!
//! The guest disk is opened with libguestfs, the OS root is inspected, and
//! the distro's own config files are patched line by line. Supported guests:
//!
//! | Distro | Address | Hostname |
//! |--------|---------|----------|
//! | ubuntu | `/etc/network/interfaces` | `/etc/hostname` |
//! | centos | `/etc/sysconfig/network-scripts/ifcfg-eth0` | `/etc/sysconfig/network` |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use virtconfig::{EditRequest, GuestNetEditor, DialectOptions};
//! use virtconfig_hypervisor::{GuestfishSession, LibvirtBackend};
//!
//! let hypervisor = LibvirtBackend::new("qemu:///system").await?;
//! let editor = GuestNetEditor::open(&hypervisor, "web1", &DialectOptions::default(), || {
//!     GuestfishSession::start("guestfish", Some("qemu:///system"))
//! })
//! .await?;
//!
//! let request = EditRequest::new(Some("10.0.0.9".into()), Some("web1.example.com".into()))?;
//! editor.apply(&request).await?;
//! println!("{}", editor.read_config().await?);
//! ```

pub mod cli;
pub mod config;
pub mod dialect;
pub mod editor;
pub mod error;
pub mod hosts;
pub mod validate;

pub use dialect::{Dialect, DialectOptions, GuestNetConfig};
pub use editor::GuestNetEditor;
pub use error::EditError;
pub use validate::EditRequest;
