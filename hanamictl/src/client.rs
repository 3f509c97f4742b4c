//! Authenticated client for the Hanami control API.
//!
//! Every verb operation goes through the same dispatch path:
//!
//! 1. Make sure a token exists, logging in if there is none.
//! 2. Send the request with the token as the first query parameter.
//! 3. If the body is exactly `Token is expired`, log in again and resend once.
//!
//! The verb methods ([`AuthenticatedClient::get`] and friends) never return an
//! error: anything that prevents a usable response becomes
//! `Outcome { success: false, body: "" }`. Callers that want to know *why*
//! can use [`AuthenticatedClient::dispatch`] instead.

use std::sync::Arc;

use hanami_core::api::{paths, TokenResponse, DEFAULT_AUTH_SERVICE};
use hanami_core::{
    Credentials, Endpoint, HanamiError, Outcome, Query, Request, Result, Token, Verb,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::CliConfig;
use crate::token::TokenStore;
use crate::transport::{HttpTransport, Transport, WireRequest};

/// Client that attaches a bearer token to every request and refreshes it once
/// when the server reports it expired.
///
/// Cloning is cheap and clones share the same token store and transport.
///
/// # Examples
///
/// ```no_run
/// use hanamictl::client::AuthenticatedClient;
/// use hanamictl::config::CliConfig;
/// use hanami_core::Query;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = CliConfig::builder().with_env_overrides()?.build()?;
/// let client = AuthenticatedClient::from_config(&config)?;
///
/// let (success, body) = client
///     .get("control/misaki/v1/user/all", &Query::new())
///     .await
///     .into_parts();
/// println!("{} {}", success, body);
/// # Ok(())
/// # }
/// ```
pub struct AuthenticatedClient<T = HttpTransport> {
    transport: Arc<T>,
    endpoint: Endpoint,
    credentials: Option<Credentials>,
    auth_service: String,
    tokens: TokenStore,
    // Serialises "read token or log in" so concurrent callers log in once
    auth_lock: Arc<Mutex<()>>,
}

impl<T> Clone for AuthenticatedClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            endpoint: self.endpoint.clone(),
            credentials: self.credentials.clone(),
            auth_service: self.auth_service.clone(),
            tokens: self.tokens.clone(),
            auth_lock: Arc::clone(&self.auth_lock),
        }
    }
}

impl<T> std::fmt::Debug for AuthenticatedClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("endpoint", &self.endpoint)
            .field("credentials", &self.credentials)
            .field("auth_service", &self.auth_service)
            .finish_non_exhaustive()
    }
}

impl AuthenticatedClient<HttpTransport> {
    /// Create a client over HTTP from CLI configuration.
    ///
    /// A configured token seeds the token store; credentials are only needed
    /// once a login is required.
    ///
    /// # Errors
    ///
    /// Returns [`HanamiError::Config`] if the address or port is invalid or the
    /// HTTP client cannot be built (for example an unreadable CA certificate).
    pub fn from_config(config: &CliConfig) -> Result<Self> {
        let endpoint = config.endpoint()?;
        let transport =
            HttpTransport::new(&endpoint, config.request_timeout(), &config.tls_options())?;

        let tokens = match config.seed_token() {
            Some(token) => TokenStore::with_token(token),
            None => TokenStore::new(),
        };

        Ok(Self::with_transport(endpoint, config.credentials(), transport)
            .with_auth_service(config.service.clone())
            .with_token_store(tokens))
    }
}

impl<T: Transport> AuthenticatedClient<T> {
    /// Create a client over an arbitrary transport with an empty token store.
    pub fn with_transport(
        endpoint: Endpoint,
        credentials: Option<Credentials>,
        transport: T,
    ) -> Self {
        Self {
            transport: Arc::new(transport),
            endpoint,
            credentials,
            auth_service: DEFAULT_AUTH_SERVICE.to_string(),
            tokens: TokenStore::new(),
            auth_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Use `service` for token requests (`control/<service>/token`).
    pub fn with_auth_service(mut self, service: impl Into<String>) -> Self {
        self.auth_service = service.into();
        self
    }

    /// Use an existing token store, e.g. one seeded with a token.
    pub fn with_token_store(mut self, tokens: TokenStore) -> Self {
        self.tokens = tokens;
        self
    }

    /// The endpoint requests are sent to
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The token store backing this session
    pub fn token_store(&self) -> &TokenStore {
        &self.tokens
    }

    /// Send a GET request.
    pub async fn get(&self, path: &str, query: &Query) -> Outcome {
        self.run(Request::new(Verb::Get, path).with_query(query.clone()))
            .await
    }

    /// Send a POST request with a JSON body.
    pub async fn post(&self, path: &str, query: &Query, body: &str) -> Outcome {
        self.run(
            Request::new(Verb::Post, path)
                .with_query(query.clone())
                .with_body(body),
        )
        .await
    }

    /// Send a PUT request with a JSON body.
    pub async fn put(&self, path: &str, query: &Query, body: &str) -> Outcome {
        self.run(
            Request::new(Verb::Put, path)
                .with_query(query.clone())
                .with_body(body),
        )
        .await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str, query: &Query) -> Outcome {
        self.run(Request::new(Verb::Delete, path).with_query(query.clone()))
            .await
    }

    /// Dispatch `request`, folding every error into the failure outcome.
    async fn run(&self, request: Request) -> Outcome {
        let verb = request.verb;
        let path = request.path.clone();
        match self.dispatch(request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("{} {} failed: {}", verb, path, e);
                Outcome::failure()
            }
        }
    }

    /// Dispatch `request` and report why it failed, if it did.
    ///
    /// A response that arrived is always `Ok`, even with a non-OK status; its
    /// body is returned verbatim. `Err` means no usable response exists:
    /// the path or configuration is invalid, login failed, or the transport
    /// failed.
    pub async fn dispatch(&self, request: Request) -> Result<Outcome> {
        // Reject bad paths before anything touches the network
        self.endpoint.url(&request.path, None, &request.query)?;

        let token = match self.tokens.get().await {
            Some(token) => token,
            None => self.ensure_token().await?,
        };

        let outcome = self.send_with_token(&request, &token).await?;
        if !outcome.is_expired_token() {
            return Ok(outcome);
        }

        warn!(
            "token expired on {} {}, requesting a new one",
            request.verb, request.path
        );
        let fresh = match self.refresh(&token).await {
            Ok(fresh) => fresh,
            Err(e) => {
                self.tokens.invalidate(&token).await;
                return Err(e);
            }
        };

        // Single retry: whatever comes back now is final
        self.send_with_token(&request, &fresh).await
    }

    /// Log in unconditionally and store the new token.
    pub async fn authenticate(&self) -> Result<Token> {
        let _guard = self.auth_lock.lock().await;
        self.login().await
    }

    /// Return the current token, logging in if there is none.
    async fn ensure_token(&self) -> Result<Token> {
        let _guard = self.auth_lock.lock().await;
        if let Some(token) = self.tokens.get().await {
            return Ok(token);
        }
        self.login().await
    }

    /// Replace `stale` with a new token.
    ///
    /// If another caller already replaced it while we waited for the lock,
    /// that newer token is used without logging in again.
    async fn refresh(&self, stale: &Token) -> Result<Token> {
        let _guard = self.auth_lock.lock().await;
        match self.tokens.get().await {
            Some(current) if &current != stale => {
                debug!("token already refreshed by another request");
                Ok(current)
            }
            _ => self.login().await,
        }
    }

    /// Request a token from the login endpoint. Caller must hold `auth_lock`.
    async fn login(&self) -> Result<Token> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            HanamiError::Config(
                "No credentials configured; set HANAMI_USER and HANAMI_PW".to_string(),
            )
        })?;

        let query = Query::new()
            .param("user_name", credentials.user())
            .param("pw", credentials.secret());
        let url = self
            .endpoint
            .url(&paths::token(&self.auth_service), None, &query)?;

        debug!("requesting token for user '{}'", credentials.user());
        let response = self
            .transport
            .send(WireRequest {
                verb: Verb::Get,
                url,
                body: None,
            })
            .await?;

        if !response.is_ok() {
            return Err(HanamiError::Auth(format!(
                "token request returned status {}: {}",
                response.status, response.body
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&response.body)
            .map_err(|e| HanamiError::Auth(format!("failed to parse token response: {}", e)))?;
        let token = parsed
            .token()
            .map(Token::new)
            .ok_or_else(|| HanamiError::Auth("token response has no token field".to_string()))?;

        info!("authenticated as '{}'", credentials.user());
        self.tokens.set(token.clone()).await;
        Ok(token)
    }

    async fn send_with_token(&self, request: &Request, token: &Token) -> Result<Outcome> {
        let url = self
            .endpoint
            .url(&request.path, Some(token), &request.query)?;
        debug!("{} {}", request.verb, request.path);

        let response = self
            .transport
            .send(WireRequest {
                verb: request.verb,
                url,
                body: request.body.clone(),
            })
            .await?;

        Ok(response.into())
    }
}
