//! Per-request token cache facade
//!
//! One [`TokenCacheService`] is constructed per request (or per session)
//! scope over the shared store singleton. It resolves the authenticated
//! principal to its cache key, loads the [`TokenCache`] once, and hands the
//! same instance back for the rest of the scope.

use crate::cache::{LoadOutcome, TokenCache};
use crate::core::{AuthError, Principal};
use crate::store::TokenStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves principals to their token cache
///
/// The service owns the cache it constructs; the injected store is the
/// shared backend whose entries outlive this instance. Not shared across
/// concurrent tasks: each request scope builds its own service.
pub struct TokenCacheService {
    store: Arc<dyn TokenStore>,
    cache: Option<TokenCache>,
}

impl TokenCacheService {
    /// Build a service over the shared store
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store, cache: None }
    }

    /// Get the token cache for an authenticated principal
    ///
    /// The first call resolves the key and loads from the store; repeated
    /// calls within this service's lifetime return the same in-memory
    /// instance without touching the store again.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotAuthenticated`] (before any store access)
    /// when the principal lacks the sign-in claim, [`AuthError::Validation`]
    /// when a second principal resolves to a different key, and
    /// [`AuthError::StoreUnavailable`] when the backend read fails.
    pub async fn get_cache(&mut self, principal: &Principal) -> Result<&mut TokenCache, AuthError> {
        let key = principal.resolve_key()?;

        let cache = match self.cache.take() {
            // One service instance serves one principal. A different key
            // here means the host wired one request scope to two identities.
            Some(existing) => {
                if existing.key() != &key {
                    let bound = existing.key().to_string();
                    self.cache = Some(existing);
                    return Err(AuthError::validation(
                        "principal",
                        format!("service already bound to '{bound}', got '{key}'"),
                    ));
                }
                existing
            }
            None => {
                let cache = TokenCache::load(Arc::clone(&self.store), key).await?;
                if cache.load_outcome() == LoadOutcome::Corrupt {
                    warn!(key = %cache.key(), "Token cache was corrupt, user must re-authenticate");
                }
                cache
            }
        };

        Ok(self.cache.insert(cache))
    }

    /// Clear the principal's token cache, on sign-out
    ///
    /// # Errors
    ///
    /// Same failure modes as [`TokenCacheService::get_cache`], plus
    /// [`AuthError::StoreUnavailable`] when the backend delete fails.
    pub async fn clear_cache(&mut self, principal: &Principal) -> Result<(), AuthError> {
        let cache = self.get_cache(principal).await?;
        cache.clear().await?;
        debug!("Token cache cleared on sign-out");
        Ok(())
    }

    /// What the lazily-performed load found, if it happened yet
    pub fn last_load_outcome(&self) -> Option<LoadOutcome> {
        self.cache.as_ref().map(TokenCache::load_outcome)
    }
}
