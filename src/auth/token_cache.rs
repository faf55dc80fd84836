//! Cached bearer credential with coalesced refresh

use super::AuthError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info};

/// A freshly issued token as reported by the token endpoint
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Opaque bearer string
    pub access_token: String,
    /// Validity window counted from the moment of issue
    pub expires_in: Duration,
}

/// Performs one credential exchange against an OAuth endpoint
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    /// Obtain a new token; called only when the cache needs one
    async fn exchange(&self) -> Result<IssuedToken, AuthError>;
}

/// A token held by the cache
#[derive(Debug, Clone)]
pub struct CachedCredential {
    /// Opaque bearer string
    pub token: String,
    /// Instant after which the token must not be handed out
    pub expires_at: Instant,
}

impl CachedCredential {
    fn is_fresh(&self, now: Instant, safety_margin: Duration) -> bool {
        now + safety_margin < self.expires_at
    }
}

/// Caches a bearer credential and re-issues it only when expired
///
/// Readers take the fast path through the `RwLock`. A refresh is
/// serialized by `refresh_lock`: callers that arrive while one is in flight
/// wait for it and then find the new token on the re-check, so N concurrent
/// callers cause one exchange.
pub struct TokenCache {
    exchanger: Arc<dyn TokenExchanger>,
    cached: RwLock<Option<CachedCredential>>,
    refresh_lock: Mutex<()>,
    safety_margin: Duration,
}

impl TokenCache {
    /// Create an empty cache in front of `exchanger`
    pub fn new(exchanger: Arc<dyn TokenExchanger>, safety_margin: Duration) -> Self {
        Self {
            exchanger,
            cached: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            safety_margin,
        }
    }

    /// Return a valid bearer token, exchanging for a new one if needed
    pub async fn get_token(&self) -> Result<String, AuthError> {
        if let Some(token) = self.fresh_token().await {
            return Ok(token);
        }

        let _refresh = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited.
        if let Some(token) = self.fresh_token().await {
            debug!("Reusing credential refreshed by a concurrent caller");
            return Ok(token);
        }

        let issued = self.exchanger.exchange().await?;
        let expires_at = Instant::now().checked_add(issued.expires_in).ok_or_else(|| {
            AuthError::MalformedResponse(format!(
                "expires_in of {}s is out of range",
                issued.expires_in.as_secs()
            ))
        })?;
        let credential = CachedCredential {
            token: issued.access_token,
            expires_at,
        };

        info!(
            expires_in_secs = issued.expires_in.as_secs(),
            "Obtained new provider credential"
        );

        let token = credential.token.clone();
        *self.cached.write().await = Some(credential);
        Ok(token)
    }

    /// Drop the cached credential so the next call performs an exchange
    pub async fn invalidate(&self) {
        let _refresh = self.refresh_lock.lock().await;
        *self.cached.write().await = None;
        debug!("Cached provider credential invalidated");
    }

    async fn fresh_token(&self) -> Option<String> {
        let cached = self.cached.read().await;
        cached
            .as_ref()
            .filter(|c| c.is_fresh(Instant::now(), self.safety_margin))
            .map(|c| c.token.clone())
    }
}
