//! Routesync - a backend route registry that keeps nginx configuration in sync
//!
//! This library manages a registry of reverse-proxied application backends and
//! regenerates the gateway's declarative configuration whenever the registry
//! changes:
//! - Stores route records (host, port, URL path, static root, SSL flag) in SQLite
//! - Renders each route and the combined active set into nginx server blocks
//! - Persists artifacts atomically so the gateway never reads a partial file
//! - Re-synchronizes on every create/update/delete, with `regenerate_all` as
//!   the recovery path when the filesystem falls behind the registry

pub mod config;
pub mod db;
pub mod envfile;
pub mod error;
pub mod manager;
pub mod render;
pub mod sync;
pub mod writer;

pub use error::{Result, SyncError};

/// Package name reported by the CLI
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
/// Package version reported by the CLI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
