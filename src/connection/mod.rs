//! Connection management for the gateway FTP client
//!
//! Handles the control connection and passive data connections.

pub mod command;
pub mod data;

// Re-export main types
pub use command::CommandConnection;
pub use data::DataConnection;
