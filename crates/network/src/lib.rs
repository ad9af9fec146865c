//! # GSEmu Networking Layer
//!
//! Tokio-based UDP transport for the status query.
//!
//! ## Modules
//!
//! - [`config`] - Socket and worker settings
//! - [`server`] - Query server: receive, encode under the read lock, reply

pub mod config;
pub mod server;

// Re-export commonly used items
pub use config::NetworkConfig;
pub use server::QueryServer;
