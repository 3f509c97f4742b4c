//! Error types for the Hanami client

use thiserror::Error;

/// Core error type for Hanami client operations
#[derive(Error, Debug)]
pub enum HanamiError {
    /// Configuration-related errors (address, port, missing credentials)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication failed or the token response was unusable
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Connection failures and unreadable responses
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request exceeded the configured timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Invalid input or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Hanami operations
pub type Result<T> = std::result::Result<T, HanamiError>;

impl From<serde_json::Error> for HanamiError {
    fn from(err: serde_json::Error) -> Self {
        HanamiError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for HanamiError {
    fn from(err: url::ParseError) -> Self {
        HanamiError::Config(format!("invalid URL: {}", err))
    }
}

impl HanamiError {
    /// Whether this error was raised before any request reached the network.
    pub fn is_config(&self) -> bool {
        matches!(self, HanamiError::Config(_) | HanamiError::InvalidInput(_))
    }
}
