//! Hanami Core Library
//!
//! Shared types, wire models, and errors for the Hanami control API client.
//! This crate has no I/O of its own; the `hanamictl` crate builds the HTTP
//! client and CLI on top of it.

pub mod api;
pub mod config;
pub mod error;
pub mod query;
pub mod types;

// Re-export commonly used types
pub use config::default_config_path;
pub use error::*;
pub use query::Query;
pub use types::*;
