//! carewatch-cli library root.
//!
//! Re-exports the config layer so integration tests can exercise loading,
//! migration and env overrides without going through the binary.

pub mod config;
