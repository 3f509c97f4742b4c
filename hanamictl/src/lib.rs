//! Hanami CLI Library
//!
//! Client-side access layer for the Hanami control API. Requests carry a
//! short-lived bearer token that is acquired on first use and refreshed once
//! when the server reports it expired.
//!
//! # Public API
//!
//! The primary public API is [`client::AuthenticatedClient`]. Its verb
//! methods return an [`hanami_core::Outcome`], a `(success, body)` pair that
//! never carries an error. Configuration types are available via
//! [`config::CliConfig`] and [`config::ConfigBuilder`], and the HTTP seam via
//! [`transport::Transport`].
//!
//! ```no_run
//! use hanamictl::client::AuthenticatedClient;
//! use hanamictl::config::CliConfig;
//! use hanami_core::Query;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = CliConfig::builder()
//!     .with_address("https://hanami.local")?
//!     .with_port(443)?
//!     .with_user("alice")
//!     .with_password("secret")
//!     .build()?;
//! let client = AuthenticatedClient::from_config(&config)?;
//!
//! let (success, body) = client
//!     .get("control/misaki/v1/user", &Query::new().param("id", "alice"))
//!     .await
//!     .into_parts();
//! println!("{}: {}", success, body);
//! # Ok(())
//! # }
//! ```

// Internal CLI implementation - not part of public API
#[doc(hidden)]
pub mod cli;

/// Authenticated client for the control API.
pub mod client;

/// Configuration types for the CLI tool.
pub mod config;

// Internal formatting functions - not part of public API
#[doc(hidden)]
pub mod format;

/// Typed helpers for users, projects, clusters, templates, tasks and data sets.
pub mod resources;

/// Token storage shared by clones of a client.
pub mod token;

/// HTTP transport seam.
pub mod transport;

#[cfg(test)]
pub mod test_utils;
