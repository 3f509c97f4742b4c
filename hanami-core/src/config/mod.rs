//! Configuration paths for Hanami tools
//!
//! The CLI configuration itself lives in `hanamictl`; this module only
//! resolves where it is stored.

mod paths;

pub use paths::default_config_path;
