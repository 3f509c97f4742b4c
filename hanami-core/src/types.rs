//! Core types for the Hanami client

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::api::EXPIRED_TOKEN_SENTINEL;
use crate::error::{HanamiError, Result};
use crate::query::Query;

/// HTTP verb used by a dispatched request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    /// Canonical upper-case method name
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        }
    }

    /// Whether requests with this verb carry a body
    pub fn has_body(&self) -> bool {
        matches!(self, Verb::Post | Verb::Put)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Verb {
    type Err = HanamiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Verb::Get),
            "POST" => Ok(Verb::Post),
            "PUT" => Ok(Verb::Put),
            "DELETE" => Ok(Verb::Delete),
            _ => Err(HanamiError::InvalidInput(format!(
                "Unknown verb '{}'. Must be one of: get, post, put, delete",
                s
            ))),
        }
    }
}

/// Login credentials used to request a token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    user: String,
    secret: String,
}

impl Credentials {
    /// Create credentials from a user name and password
    pub fn new(user: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            secret: secret.into(),
        }
    }

    /// User name sent as `user_name`
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Password sent as `pw`
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("secret", &"***")
            .finish()
    }
}

/// Opaque bearer token issued by the login endpoint.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// Wrap a raw token string
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw token value, as sent on the wire
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the token string is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never leak the token into logs
        write!(f, "Token(*** {} chars)", self.0.len())
    }
}

/// Address of the control API: scheme, host, and port.
///
/// Resolved once when the client is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: Url,
}

impl Endpoint {
    /// Build an endpoint from a base address (`http://host` or `https://host`)
    /// and a port.
    ///
    /// # Errors
    ///
    /// Returns [`HanamiError::Config`] if the address is empty, uses another
    /// scheme, has no host, or the port is zero.
    pub fn new(address: &str, port: u16) -> Result<Self> {
        let address = address.trim();
        if address.is_empty() {
            return Err(HanamiError::Config("Server address cannot be empty".into()));
        }
        if !address.starts_with("http://") && !address.starts_with("https://") {
            return Err(HanamiError::Config(format!(
                "Server address '{}' must start with http:// or https://",
                address
            )));
        }
        if port == 0 {
            return Err(HanamiError::Config("Port must be greater than 0".into()));
        }

        let mut base = Url::parse(address)?;
        if base.host_str().map_or(true, str::is_empty) {
            return Err(HanamiError::Config(format!(
                "Server address '{}' has no host",
                address
            )));
        }
        base.set_port(Some(port))
            .map_err(|_| HanamiError::Config(format!("Cannot set port {} on '{}'", port, address)))?;
        base.set_path("/");
        base.set_query(None);
        base.set_fragment(None);

        Ok(Self { base })
    }

    /// Whether the scheme is `https`
    pub fn is_secure(&self) -> bool {
        self.base.scheme() == "https"
    }

    /// Host name or IP address
    pub fn host(&self) -> &str {
        self.base.host_str().unwrap_or_default()
    }

    /// Port the API listens on
    pub fn port(&self) -> u16 {
        self.base.port_or_known_default().unwrap_or_default()
    }

    /// Base URL, always ending in `/`
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Build the full URL for `path`.
    ///
    /// The token, when given, is always the first query parameter; `query`
    /// follows it. `path` is always relative to the base address: a leading
    /// `/` is ignored, and absolute URLs, dot segments, inline queries and
    /// fragments are rejected so the token can only ever go to this endpoint.
    pub fn url(&self, path: &str, token: Option<&Token>, query: &Query) -> Result<Url> {
        let invalid = |reason: &str| {
            HanamiError::InvalidInput(format!("Path '{}' {}", path, reason))
        };
        if path.contains(['?', '#']) {
            return Err(invalid(
                "must not contain a query or fragment; pass parameters separately",
            ));
        }
        if path.contains("://") || path.starts_with("//") {
            return Err(invalid("must be relative to the server address"));
        }

        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| invalid("cannot be joined to the server address"))?;
            segments.clear();
            for segment in path.split('/').filter(|s| !s.is_empty()) {
                if segment == "." || segment == ".." {
                    return Err(invalid("must not contain '.' or '..' segments"));
                }
                segments.push(segment);
            }
        }

        if url.origin() != self.base.origin() {
            return Err(invalid("resolves outside the server address"));
        }

        if token.is_some() || !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            if let Some(token) = token {
                pairs.append_pair("token", token.as_str());
            }
            pairs.extend_pairs(query.iter());
        }
        Ok(url)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base.as_str().trim_end_matches('/'))
    }
}

/// A verb operation against a resource path.
///
/// The token is not part of the request; it is attached when the URL is built
/// for each attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub verb: Verb,
    pub path: String,
    pub query: Query,
    pub body: Option<String>,
}

impl Request {
    /// Create a request without query or body
    pub fn new(verb: Verb, path: impl Into<String>) -> Self {
        Self {
            verb,
            path: path.into(),
            query: Query::new(),
            body: None,
        }
    }

    /// Set the query parameters
    pub fn with_query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    /// Set the JSON body text
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Final result of a dispatched operation: success flag and body text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Outcome {
    /// Whether the server answered with an OK status
    pub success: bool,
    /// Response body, verbatim
    pub body: String,
}

impl Outcome {
    /// Create an outcome
    pub fn new(success: bool, body: impl Into<String>) -> Self {
        Self {
            success,
            body: body.into(),
        }
    }

    /// The `(false, "")` outcome used for every error that never reached a
    /// usable response.
    pub fn failure() -> Self {
        Self::default()
    }

    /// Whether the body is exactly the expired-token sentinel
    pub fn is_expired_token(&self) -> bool {
        self.body == EXPIRED_TOKEN_SENTINEL
    }

    /// Parse the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Split into the `(success, body)` pair.
    pub fn into_parts(self) -> (bool, String) {
        (self.success, self.body)
    }
}

impl From<Result<Outcome>> for Outcome {
    fn from(result: Result<Outcome>) -> Self {
        result.unwrap_or_else(|_| Outcome::failure())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_verb_parsing() {
        assert_eq!("get".parse::<Verb>().unwrap(), Verb::Get);
        assert_eq!("DELETE".parse::<Verb>().unwrap(), Verb::Delete);
        assert!("patch".parse::<Verb>().is_err());
        assert!(Verb::Put.has_body());
        assert!(!Verb::Get.has_body());
    }

    #[test]
    fn test_secrets_are_redacted() {
        let creds = Credentials::new("alice", "pw1");
        assert!(!format!("{:?}", creds).contains("pw1"));

        let token = Token::new("secret-token");
        assert!(!format!("{:?}", token).contains("secret-token"));
    }

    #[test]
    fn test_endpoint_validation() {
        assert!(Endpoint::new("", 8080).is_err());
        assert!(Endpoint::new("ftp://host", 8080).is_err());
        assert!(Endpoint::new("host", 8080).is_err());
        assert!(Endpoint::new("http://host", 0).is_err());

        let endpoint = Endpoint::new("https://example.com/", 443).unwrap();
        assert!(endpoint.is_secure());
        assert_eq!(endpoint.host(), "example.com");

        let endpoint = Endpoint::new("http://host", 8080).unwrap();
        assert!(!endpoint.is_secure());
        assert_eq!(endpoint.port(), 8080);
        assert_eq!(endpoint.to_string(), "http://host:8080");
    }

    #[test]
    fn test_url_puts_token_first() {
        let endpoint = Endpoint::new("http://host", 8080).unwrap();
        let token = Token::new("T1");
        let query = Query::new().param("id", "42");

        let url = endpoint
            .url("control/svc/user", Some(&token), &query)
            .unwrap();
        assert_eq!(url.as_str(), "http://host:8080/control/svc/user?token=T1&id=42");

        let url = endpoint
            .url("/control/svc/users", Some(&token), &Query::new())
            .unwrap();
        assert_eq!(url.as_str(), "http://host:8080/control/svc/users?token=T1");
    }

    #[test]
    fn test_url_without_token_or_query() {
        let endpoint = Endpoint::new("http://host", 8080).unwrap();
        let url = endpoint.url("control/svc/users", None, &Query::new()).unwrap();
        assert_eq!(url.as_str(), "http://host:8080/control/svc/users");
    }

    #[test]
    fn test_url_rejects_inline_query() {
        let endpoint = Endpoint::new("http://host", 8080).unwrap();
        assert!(endpoint
            .url("control/svc/user?id=1", None, &Query::new())
            .is_err());
    }

    #[test]
    fn test_url_never_leaves_the_endpoint() {
        let endpoint = Endpoint::new("http://host", 8080).unwrap();
        let token = Token::new("SECRET");

        for path in [
            "http://evil.example/steal",
            "https://evil.example",
            "//evil.example/steal",
            "/control/../../steal",
            "control/./svc",
        ] {
            let err = endpoint.url(path, Some(&token), &Query::new()).unwrap_err();
            assert!(matches!(err, HanamiError::InvalidInput(_)), "{}", path);
        }
    }

    #[test]
    fn test_url_keeps_scheme_like_segments_relative() {
        let endpoint = Endpoint::new("http://host", 8080).unwrap();

        let url = endpoint.url("user:1", None, &Query::new()).unwrap();
        assert_eq!(url.as_str(), "http://host:8080/user:1");
        assert_eq!(url.host_str(), Some("host"));

        let url = endpoint
            .url("control//svc/users/", None, &Query::new())
            .unwrap();
        assert_eq!(url.as_str(), "http://host:8080/control/svc/users");
    }

    #[test]
    fn test_url_encodes_segments() {
        let endpoint = Endpoint::new("http://host", 8080).unwrap();
        let url = endpoint.url("control/my project", None, &Query::new()).unwrap();
        assert_eq!(url.path(), "/control/my%20project");
    }

    #[test]
    fn test_outcome_helpers() {
        assert!(Outcome::new(true, "Token is expired").is_expired_token());
        assert!(!Outcome::new(true, "token is expired").is_expired_token());
        assert_eq!(Outcome::failure().into_parts(), (false, String::new()));

        let failed: Outcome = Err(HanamiError::Transport("refused".into())).into();
        assert_eq!(failed, Outcome::failure());

        let parsed: Vec<u32> = Outcome::new(true, "[1,2]").json().unwrap();
        assert_eq!(parsed, vec![1, 2]);
    }
}
