//! Wire-level HTTP exchange.
//!
//! A [`Transport`] sends one fully built request and hands back the status and
//! body text. It knows nothing about tokens or retries; that is the job of
//! [`crate::client::AuthenticatedClient`].

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use hanami_core::{Endpoint, HanamiError, Outcome, Result, Verb};
use reqwest::{Client, Method, StatusCode, Url};
use tracing::debug;

/// One request as it goes on the wire
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub verb: Verb,
    pub url: Url,
    pub body: Option<String>,
}

/// Status and body of a response that was fully read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    /// Create a response
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is `200 OK`
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK.as_u16()
    }
}

impl From<RawResponse> for Outcome {
    fn from(response: RawResponse) -> Self {
        Outcome::new(response.is_ok(), response.body)
    }
}

/// Sends a single request.
///
/// Implementations return `Err` only when no response could be obtained or
/// read (connection refused, timeout, broken body). Any HTTP status,
/// including errors, is an `Ok` response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: WireRequest) -> Result<RawResponse>;
}

/// TLS settings for [`HttpTransport`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsOptions {
    /// Skip certificate verification for `https` endpoints
    pub accept_invalid_certs: bool,
    /// PEM file with an additional trusted root certificate
    pub ca_cert: Option<PathBuf>,
}

/// [`Transport`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport for `endpoint`.
    ///
    /// Certificate verification is disabled only when the endpoint is secure,
    /// `accept_invalid_certs` is set, and no CA certificate is configured.
    ///
    /// # Errors
    ///
    /// Returns [`HanamiError::Config`] if the CA certificate cannot be read or
    /// parsed, or if the HTTP client cannot be created.
    pub fn new(endpoint: &Endpoint, timeout: Duration, tls: &TlsOptions) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hanamictl/", env!("CARGO_PKG_VERSION")));

        if let Some(path) = &tls.ca_cert {
            let pem = std::fs::read(path).map_err(|e| {
                HanamiError::Config(format!(
                    "Failed to read CA certificate {}: {}",
                    path.display(),
                    e
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                HanamiError::Config(format!(
                    "Invalid CA certificate {}: {}",
                    path.display(),
                    e
                ))
            })?;
            builder = builder.add_root_certificate(cert);
        } else if endpoint.is_secure() && tls.accept_invalid_certs {
            debug!("certificate verification disabled for {}", endpoint);
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| HanamiError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    fn method(verb: Verb) -> Method {
        match verb {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Delete => Method::DELETE,
        }
    }

    /// Classify a reqwest error into a HanamiError variant.
    fn classify_error(e: reqwest::Error) -> HanamiError {
        if e.is_timeout() {
            HanamiError::Timeout(e.to_string())
        } else if e.is_connect() {
            HanamiError::Transport(format!("connection failed: {}", e))
        } else {
            HanamiError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: WireRequest) -> Result<RawResponse> {
        let mut builder = self
            .client
            .request(Self::method(request.verb), request.url.clone());

        if let Some(body) = request.body.filter(|b| !b.is_empty()) {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = builder.send().await.map_err(Self::classify_error)?;
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            HanamiError::Transport(format!("Failed to read response body: {}", e))
        })?;

        debug!("{} {} -> {}", request.verb, request.url.path(), status);

        Ok(RawResponse::new(status.as_u16(), body))
    }
}
