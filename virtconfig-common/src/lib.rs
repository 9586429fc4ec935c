//! # virtconfig Common
//!
//! Shared utilities for the virtconfig crates.
//!
//! ## Logging
//!
//! ```rust,no_run
//! use virtconfig_common::init_logging;
//!
//! init_logging("info").unwrap();
//! tracing::info!(domain = "web1", "Editing guest");
//! ```

pub mod logging;

pub use logging::{init_logging, init_logging_json, LogFormat};
