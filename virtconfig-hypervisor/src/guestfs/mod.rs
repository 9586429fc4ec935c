//! libguestfs-backed guest introspection.
//!
//! The session drives a long-lived `guestfish --listen` server and issues
//! each operation through `guestfish --remote`, so the appliance is launched
//! once per session rather than once per call.

mod guestfish;

pub use guestfish::GuestfishSession;

/// Default guestfish binary, resolved through `PATH`.
pub const DEFAULT_GUESTFISH: &str = "guestfish";
