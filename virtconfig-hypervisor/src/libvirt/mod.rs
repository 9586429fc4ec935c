//! Libvirt hypervisor backend.
//!
//! Requires the `libvirt` feature and a system libvirt installation.

#[cfg(feature = "libvirt")]
mod backend;

#[cfg(feature = "libvirt")]
pub use backend::LibvirtBackend;

/// Default connection URI for the system QEMU/KVM daemon.
pub const DEFAULT_URI: &str = "qemu:///system";
