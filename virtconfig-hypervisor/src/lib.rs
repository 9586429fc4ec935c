//! # virtconfig Hypervisor
//!
//! Collaborator seams for editing an offline guest.
//!
//! Two traits describe everything the editor needs from the outside world:
//! - [`Hypervisor`] - domain lookup and power-state queries
//! - [`GuestFs`] - a guest-introspection session over a domain's disks
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐      ┌──────────────────────┐
//! │   Hypervisor Trait   │      │    GuestFs Trait     │
//! │ (domains, is_active) │      │ (inspect, mount, rw) │
//! └──────────┬───────────┘      └──────────┬───────────┘
//!            │                             │
//!     ┌──────┴──────┐               ┌──────┴───────┐
//!     ▼             ▼               ▼              ▼
//! ┌─────────┐ ┌───────────┐ ┌──────────────┐ ┌─────────────┐
//! │ Libvirt │ │   Mock    │ │  Guestfish   │ │ MockGuestFs │
//! │ Backend │ │  Backend  │ │   Session    │ │             │
//! └─────────┘ └───────────┘ └──────────────┘ └─────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use virtconfig_hypervisor::{DomainState, Hypervisor, MockBackend};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = MockBackend::new();
//!     backend.define_domain("web1");
//!
//!     let state = backend.domain_state("web1").await.unwrap();
//!     assert_eq!(state, DomainState::Inactive);
//! }
//! ```

pub mod error;
pub mod traits;
pub mod types;
pub mod mock;
pub mod libvirt;
pub mod guestfs;
pub mod guest_os;

pub use error::HypervisorError;
pub use traits::{GuestFs, Hypervisor};
pub use types::*;
pub use mock::{MockBackend, MockGuestFs};
pub use guestfs::GuestfishSession;
pub use guest_os::Distro;

// Re-export libvirt backend when available
#[cfg(feature = "libvirt")]
pub use libvirt::LibvirtBackend;
