//! CLI configuration management
//!
//! Handles loading configuration from the TOML file, environment variables,
//! and command-line overrides.

use anyhow::{anyhow, Context, Result};
use hanami_core::api::DEFAULT_AUTH_SERVICE;
use hanami_core::{Credentials, Endpoint, HanamiError, Token};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::transport::TlsOptions;

const ENV_ADDRESS: &str = "HANAMI_ADDRESS";
const ENV_PORT: &str = "HANAMI_PORT";
const ENV_USER: &str = "HANAMI_USER";
const ENV_PASSWORD: &str = "HANAMI_PW";
const ENV_TOKEN: &str = "HANAMI_TOKEN";
const ENV_SERVICE: &str = "HANAMI_SERVICE";
const ENV_CACERT: &str = "HANAMI_CACERT";
const ENV_INSECURE: &str = "HANAMI_INSECURE";
const ENV_TIMEOUT: &str = "HANAMI_TIMEOUT";
const ENV_FORMAT: &str = "HANAMI_FORMAT";
const ENV_VERBOSE: &str = "HANAMI_VERBOSE";

/// Every environment variable read by [`ConfigBuilder::with_env_overrides`]
pub const ENV_VARS: [&str; 11] = [
    ENV_ADDRESS,
    ENV_PORT,
    ENV_USER,
    ENV_PASSWORD,
    ENV_TOKEN,
    ENV_SERVICE,
    ENV_CACERT,
    ENV_INSECURE,
    ENV_TIMEOUT,
    ENV_FORMAT,
    ENV_VERBOSE,
];

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CliConfig {
    /// Base address of the control API (scheme and host)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Port of the control API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// User name for token requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Password for token requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Pre-acquired token to start the session with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Service that issues tokens (`control/<service>/token`)
    pub service: String,

    /// Additional trusted root certificate (PEM)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Skip certificate verification for https addresses
    pub accept_invalid_certs: bool,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Default output format
    pub output_format: String,

    /// Enable verbose logging by default
    pub verbose: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            address: None,
            port: None,
            user: None,
            password: None,
            token: None,
            service: DEFAULT_AUTH_SERVICE.to_string(),
            ca_cert: None,
            accept_invalid_certs: true,
            timeout: 10,
            output_format: "table".to_string(),
            verbose: false,
        }
    }
}

impl CliConfig {
    /// Load configuration from `path`, or return defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read CLI config file {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse CLI config file {}", path.display()))
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize CLI config")?;

        std::fs::write(path, content).context("Failed to write CLI config file")?;

        Ok(())
    }

    /// Default configuration file path
    pub fn config_path() -> PathBuf {
        hanami_core::default_config_path()
    }

    /// Create a new builder for constructing configuration
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Endpoint derived from `address` and `port`
    ///
    /// Both must be configured; there is no default server.
    pub fn endpoint(&self) -> hanami_core::Result<Endpoint> {
        let address = self.address.as_deref().ok_or_else(|| {
            HanamiError::Config(format!(
                "No server address configured; set {} or pass --address",
                ENV_ADDRESS
            ))
        })?;
        let port = self.port.ok_or_else(|| {
            HanamiError::Config(format!(
                "No server port configured; set {} or pass --port",
                ENV_PORT
            ))
        })?;
        Endpoint::new(address, port)
    }

    /// Credentials, if both user and password are set
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.user, &self.password) {
            (Some(user), Some(password)) => Some(Credentials::new(user, password)),
            _ => None,
        }
    }

    /// Seed token, if configured and non-empty
    pub fn seed_token(&self) -> Option<Token> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(Token::new)
    }

    /// Request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// TLS settings for the HTTP transport
    pub fn tls_options(&self) -> TlsOptions {
        TlsOptions {
            accept_invalid_certs: self.accept_invalid_certs,
            ca_cert: self.ca_cert.clone(),
        }
    }
}

/// Builder for CLI configuration with validation and priority chain support
///
/// Priority chain (lowest to highest):
/// 1. Defaults (none for address and port)
/// 2. Config file
/// 3. Environment variables
/// 4. CLI arguments
///
/// Values set first win, so apply CLI arguments before calling
/// [`ConfigBuilder::with_env_overrides`] and [`ConfigBuilder::with_config_file`],
/// or in any order since each layer only fills unset fields.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    address: Option<String>,
    port: Option<u16>,
    user: Option<String>,
    password: Option<String>,
    token: Option<String>,
    service: Option<String>,
    ca_cert: Option<PathBuf>,
    accept_invalid_certs: Option<bool>,
    timeout: Option<u64>,
    output_format: Option<String>,
    verbose: Option<bool>,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set server address (with validation)
    pub fn with_address(mut self, address: impl Into<String>) -> Result<Self> {
        let address = address.into();
        Self::validate_address(&address)?;
        self.address = Some(address);
        Ok(self)
    }

    /// Set server port (with validation)
    pub fn with_port(mut self, port: u16) -> Result<Self> {
        Self::validate_port(port)?;
        self.port = Some(port);
        Ok(self)
    }

    /// Set user name
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Set password
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the token issuing service (with validation)
    pub fn with_service(mut self, service: impl Into<String>) -> Result<Self> {
        let service = service.into();
        Self::validate_service(&service)?;
        self.service = Some(service);
        Ok(self)
    }

    /// Set timeout (with validation)
    pub fn with_timeout(mut self, timeout: u64) -> Result<Self> {
        Self::validate_timeout(timeout)?;
        self.timeout = Some(timeout);
        Ok(self)
    }

    /// Set output format (with validation)
    pub fn with_output_format(mut self, format: impl Into<String>) -> Result<Self> {
        let format = format.into();
        Self::validate_output_format(&format)?;
        self.output_format = Some(format);
        Ok(self)
    }

    /// Set verbose flag
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Fill unset fields from the config file at `path`.
    ///
    /// A missing file is not an error; an unreadable or malformed one is.
    pub fn with_config_file(self, path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(self);
        };

        let config = CliConfig::load_from(path)?;
        let builder = self;
        // Only use file values if they weren't already set (preserving priority)
        Ok(Self {
            address: builder.address.or(config.address),
            port: builder.port.or(config.port),
            user: builder.user.or(config.user),
            password: builder.password.or(config.password),
            token: builder.token.or(config.token),
            service: builder.service.or(Some(config.service)),
            ca_cert: builder.ca_cert.or(config.ca_cert),
            accept_invalid_certs: builder
                .accept_invalid_certs
                .or(Some(config.accept_invalid_certs)),
            timeout: builder.timeout.or(Some(config.timeout)),
            output_format: builder.output_format.or(Some(config.output_format)),
            verbose: builder.verbose.or(Some(config.verbose)),
        })
    }

    /// Apply environment variable overrides
    ///
    /// An empty variable counts as unset. A set but invalid one is an error
    /// naming the variable.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        let invalid = |key: &str, value: &str, e: anyhow::Error| {
            anyhow!("Invalid {} '{}': {}", key, value, e)
        };

        // Only apply env vars if values weren't already set (preserving priority)
        if self.address.is_none() {
            if let Some(address) = env(ENV_ADDRESS) {
                Self::validate_address(&address).map_err(|e| invalid(ENV_ADDRESS, &address, e))?;
                self.address = Some(address);
            }
        }

        if self.port.is_none() {
            if let Some(value) = env(ENV_PORT) {
                let port = value
                    .parse::<u16>()
                    .map_err(|e| invalid(ENV_PORT, &value, e.into()))?;
                Self::validate_port(port).map_err(|e| invalid(ENV_PORT, &value, e))?;
                self.port = Some(port);
            }
        }

        if self.user.is_none() {
            self.user = env(ENV_USER);
        }

        if self.password.is_none() {
            self.password = env(ENV_PASSWORD);
        }

        if self.token.is_none() {
            self.token = env(ENV_TOKEN);
        }

        if self.service.is_none() {
            if let Some(service) = env(ENV_SERVICE) {
                Self::validate_service(&service).map_err(|e| invalid(ENV_SERVICE, &service, e))?;
                self.service = Some(service);
            }
        }

        if self.ca_cert.is_none() {
            self.ca_cert = env(ENV_CACERT).map(PathBuf::from);
        }

        if self.accept_invalid_certs.is_none() {
            if let Some(insecure) = env(ENV_INSECURE) {
                let value = parse_bool(&insecure).map_err(|e| invalid(ENV_INSECURE, &insecure, e))?;
                self.accept_invalid_certs = Some(value);
            }
        }

        if self.timeout.is_none() {
            if let Some(value) = env(ENV_TIMEOUT) {
                let timeout = value
                    .parse::<u64>()
                    .map_err(|e| invalid(ENV_TIMEOUT, &value, e.into()))?;
                Self::validate_timeout(timeout).map_err(|e| invalid(ENV_TIMEOUT, &value, e))?;
                self.timeout = Some(timeout);
            }
        }

        if self.output_format.is_none() {
            if let Some(format) = env(ENV_FORMAT) {
                Self::validate_output_format(&format)
                    .map_err(|e| invalid(ENV_FORMAT, &format, e))?;
                self.output_format = Some(format);
            }
        }

        if self.verbose.is_none() {
            if let Some(verbose) = env(ENV_VERBOSE) {
                let value = parse_bool(&verbose).map_err(|e| invalid(ENV_VERBOSE, &verbose, e))?;
                self.verbose = Some(value);
            }
        }

        Ok(self)
    }

    /// Build the final configuration with validation
    pub fn build(self) -> Result<CliConfig> {
        let defaults = CliConfig::default();

        let service = self.service.unwrap_or(defaults.service);
        let timeout = self.timeout.unwrap_or(defaults.timeout);
        let output_format = self.output_format.unwrap_or(defaults.output_format);

        // Validate final values; address and port stay unset if nobody set them
        if let Some(address) = &self.address {
            Self::validate_address(address)?;
        }
        if let Some(port) = self.port {
            Self::validate_port(port)?;
        }
        Self::validate_service(&service)?;
        Self::validate_timeout(timeout)?;
        Self::validate_output_format(&output_format)?;

        Ok(CliConfig {
            address: self.address,
            port: self.port,
            user: self.user,
            password: self.password,
            token: self.token,
            service,
            ca_cert: self.ca_cert,
            accept_invalid_certs: self
                .accept_invalid_certs
                .unwrap_or(defaults.accept_invalid_certs),
            timeout,
            output_format,
            verbose: self.verbose.unwrap_or(defaults.verbose),
        })
    }

    /// Validate address format
    fn validate_address(address: &str) -> Result<()> {
        if address.is_empty() {
            return Err(anyhow!("Server address cannot be empty"));
        }

        if !address.starts_with("http://") && !address.starts_with("https://") {
            return Err(anyhow!(
                "Server address must start with http:// or https://"
            ));
        }

        Ok(())
    }

    /// Validate port value
    fn validate_port(port: u16) -> Result<()> {
        if port == 0 {
            return Err(anyhow!("Port must be greater than 0"));
        }

        Ok(())
    }

    /// Validate token service name
    fn validate_service(service: &str) -> Result<()> {
        if service.trim_matches('/').is_empty() {
            return Err(anyhow!("Token service cannot be empty"));
        }

        if service.contains(['?', '#', '&']) {
            return Err(anyhow!(
                "Token service '{}' must be a plain path segment",
                service
            ));
        }

        Ok(())
    }

    /// Validate output format
    fn validate_output_format(format: &str) -> Result<()> {
        match format {
            "table" | "json" => Ok(()),
            _ => Err(anyhow!(
                "Invalid output format '{}'. Must be 'table' or 'json'",
                format
            )),
        }
    }

    /// Validate timeout value
    fn validate_timeout(timeout: u64) -> Result<()> {
        if timeout == 0 {
            return Err(anyhow!("Timeout must be greater than 0"));
        }

        if timeout > 300 {
            return Err(anyhow!(
                "Timeout must be less than or equal to 300 seconds"
            ));
        }

        Ok(())
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(anyhow!("expected true or false")),
    }
}
