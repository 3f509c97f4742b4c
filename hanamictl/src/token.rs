//! Bearer token storage for one client session.

use std::sync::Arc;

use hanami_core::Token;
use tokio::sync::RwLock;

/// Holder of the current bearer token.
///
/// Cloning yields another handle to the same slot, so every clone of a client
/// observes the token set by any of them. The slot starts empty unless seeded
/// and is only ever replaced, except by [`TokenStore::invalidate`].
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    current: Arc<RwLock<Option<Token>>>,
}

impl TokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with an externally supplied token.
    pub fn with_token(token: Token) -> Self {
        Self {
            current: Arc::new(RwLock::new(Some(token))),
        }
    }

    /// Current token, if one has been acquired.
    pub async fn get(&self) -> Option<Token> {
        self.current.read().await.clone()
    }

    /// Replace the current token unconditionally.
    pub async fn set(&self, token: Token) {
        *self.current.write().await = Some(token);
    }

    /// Whether a token is present
    pub async fn is_present(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Drop the current token if it is still `stale`.
    ///
    /// Returns `true` when the slot was cleared. A token set by someone else
    /// in the meantime is kept.
    pub async fn invalidate(&self, stale: &Token) -> bool {
        let mut guard = self.current.write().await;
        if guard.as_ref() == Some(stale) {
            *guard = None;
            true
        } else {
            false
        }
    }
}
