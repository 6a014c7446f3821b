//! Per-key token working set with dirty tracking
//!
//! A [`TokenCache`] shadows one backend entry for the lifetime of a
//! logical unit of work (a request or a session). Reads never touch the
//! store after the initial load; writes go back through [`TokenCache::persist`]
//! only when something actually changed, so a read-only request costs zero
//! store writes.

use crate::core::{AuthError, TokenCacheKey, TokenSet};
use crate::store::TokenStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// What the initial load found at the key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A valid token set was loaded
    Hit,
    /// No entry existed; the cache starts empty
    Miss,
    /// Bytes existed but did not decode; the cache starts empty and the
    /// caller should force a fresh token acquisition
    Corrupt,
}

/// The in-memory working set for one (user, client) pair
///
/// Owned by the service that constructed it; never shared across
/// concurrent tasks. The backend entry outlives this instance and remains
/// the source of truth.
pub struct TokenCache {
    key: TokenCacheKey,
    store: Arc<dyn TokenStore>,
    tokens: Option<TokenSet>,
    has_state_changed: bool,
    load_outcome: LoadOutcome,
}

impl TokenCache {
    /// Load the cache for a key from its backend store
    ///
    /// A missing entry initializes an empty set. Corrupt bytes are logged
    /// at warn, reported through [`TokenCache::load_outcome`], and treated
    /// as "no valid tokens" rather than failing the request; the stale blob
    /// is simply overwritten by the next persist.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::StoreUnavailable`] when the backend read fails.
    pub async fn load(store: Arc<dyn TokenStore>, key: TokenCacheKey) -> Result<Self, AuthError> {
        let (tokens, load_outcome) = match store.load(&key).await? {
            None => (None, LoadOutcome::Miss),
            Some(bytes) => match TokenSet::from_bytes(&bytes) {
                Ok(set) => (Some(set), LoadOutcome::Hit),
                Err(e) => {
                    warn!(
                        key = %key,
                        error = %e,
                        "Cached token set is corrupt, starting empty"
                    );
                    (None, LoadOutcome::Corrupt)
                }
            },
        };
        debug!(key = %key, outcome = ?load_outcome, "Loaded token cache");
        Ok(Self {
            key,
            store,
            tokens,
            has_state_changed: false,
            load_outcome,
        })
    }

    /// Key this cache shadows
    pub fn key(&self) -> &TokenCacheKey {
        &self.key
    }

    /// What the initial load found
    pub fn load_outcome(&self) -> LoadOutcome {
        self.load_outcome
    }

    /// The corruption error the initial load swallowed, if any
    ///
    /// Lets callers surface [`AuthError::CacheCorrupt`] when they need a
    /// concrete error to answer with re-authentication.
    pub fn corruption(&self) -> Option<AuthError> {
        (self.load_outcome == LoadOutcome::Corrupt).then(|| AuthError::CacheCorrupt {
            key: self.key.storage_key(),
            reason: "stored bytes failed to deserialize".to_string(),
        })
    }

    /// Current token set, if one is cached
    pub fn tokens(&self) -> Option<&TokenSet> {
        self.tokens.as_ref()
    }

    /// Replace the token set, marking the cache dirty
    pub fn set_tokens(&mut self, tokens: TokenSet) {
        self.tokens = Some(tokens);
        self.has_state_changed = true;
    }

    /// Mutate the token set in place, marking the cache dirty
    ///
    /// Used by the refresh path, which updates expiry and tokens inside the
    /// existing set.
    pub fn update_tokens<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&mut TokenSet),
    {
        match self.tokens.as_mut() {
            Some(set) => {
                f(set);
                self.has_state_changed = true;
                true
            }
            None => false,
        }
    }

    /// Drop the token set from memory, marking the cache dirty
    pub fn remove_tokens(&mut self) {
        if self.tokens.take().is_some() {
            self.has_state_changed = true;
        }
    }

    /// Whether the in-memory set diverged from the store since the load
    pub fn has_state_changed(&self) -> bool {
        self.has_state_changed
    }

    /// Write the token set back to the store if and only if it changed
    ///
    /// Called at the end of the unit of work; many mutations still cost a
    /// single write, and a read-only request costs none.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::StoreUnavailable`] when the backend write
    /// fails; the dirty flag stays set so a retry persists again.
    pub async fn persist(&mut self) -> Result<(), AuthError> {
        if !self.has_state_changed {
            return Ok(());
        }
        match &self.tokens {
            Some(set) => {
                let bytes = set.to_bytes()?;
                self.store.save(&self.key, &bytes).await?;
            }
            None => {
                self.store.delete(&self.key).await?;
            }
        }
        self.has_state_changed = false;
        debug!(key = %self.key, "Persisted token cache");
        Ok(())
    }

    /// Empty the in-memory set and delete the backend entry
    ///
    /// Used on sign-out so a re-login starts from an empty cache.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::StoreUnavailable`] when the backend delete
    /// fails.
    pub async fn clear(&mut self) -> Result<(), AuthError> {
        self.tokens = None;
        self.has_state_changed = false;
        self.store.delete(&self.key).await?;
        debug!(key = %self.key, "Cleared token cache");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{TokenResponse, unix_now};
    use crate::store::InMemoryTokenStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store double that counts backend traffic
    struct CountingStore {
        inner: Arc<InMemoryTokenStore>,
        loads: AtomicUsize,
        saves: AtomicUsize,
        deletes: AtomicUsize,
    }

    impl CountingStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: InMemoryTokenStore::new(),
                loads: AtomicUsize::new(0),
                saves: AtomicUsize::new(0),
                deletes: AtomicUsize::new(0),
            })
        }

        fn saves(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl TokenStore for CountingStore {
        async fn load(&self, key: &TokenCacheKey) -> Result<Option<Vec<u8>>, AuthError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load(key).await
        }

        async fn save(&self, key: &TokenCacheKey, bytes: &[u8]) -> Result<(), AuthError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner.save(key, bytes).await
        }

        async fn delete(&self, key: &TokenCacheKey) -> Result<(), AuthError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.inner.delete(key).await
        }
    }

    fn key() -> TokenCacheKey {
        TokenCacheKey::new("u1", "c1").unwrap()
    }

    fn token_set(access: &str) -> TokenSet {
        TokenSet::from_token_response(TokenResponse {
            access_token: access.to_string(),
            refresh_token: Some("R1".to_string()),
            expires_in: Some(3600),
            token_type: Some("Bearer".to_string()),
            scope: None,
        })
    }

    #[tokio::test]
    async fn test_load_miss_starts_empty() {
        let store = CountingStore::new();
        let cache = TokenCache::load(store, key()).await.unwrap();
        assert_eq!(cache.load_outcome(), LoadOutcome::Miss);
        assert!(cache.tokens().is_none());
        assert!(!cache.has_state_changed());
        assert!(cache.corruption().is_none());
    }

    #[tokio::test]
    async fn test_persist_without_mutation_writes_nothing() {
        let store = CountingStore::new();
        let mut cache = TokenCache::load(store.clone(), key()).await.unwrap();
        cache.persist().await.unwrap();
        cache.persist().await.unwrap();
        assert_eq!(store.saves(), 0);
    }

    #[tokio::test]
    async fn test_many_mutations_cost_one_write() {
        let store = CountingStore::new();
        let mut cache = TokenCache::load(store.clone(), key()).await.unwrap();

        cache.set_tokens(token_set("A1"));
        cache.set_tokens(token_set("A2"));
        cache.update_tokens(|set| set.expires_at += 60);
        assert!(cache.has_state_changed());

        cache.persist().await.unwrap();
        assert_eq!(store.saves(), 1);
        assert!(!cache.has_state_changed());

        // Clean persist after the flag resets is free
        cache.persist().await.unwrap();
        assert_eq!(store.saves(), 1);
    }

    #[tokio::test]
    async fn test_persisted_set_round_trips_through_store() {
        let store = CountingStore::new();
        let mut writer = TokenCache::load(store.clone(), key()).await.unwrap();
        writer.set_tokens(token_set("A1"));
        writer.persist().await.unwrap();

        let reader = TokenCache::load(store, key()).await.unwrap();
        assert_eq!(reader.load_outcome(), LoadOutcome::Hit);
        assert_eq!(reader.tokens().unwrap().access_token.expose(), "A1");
    }

    #[tokio::test]
    async fn test_corrupt_bytes_become_empty_set() {
        let store = CountingStore::new();
        store.save(&key(), b"{definitely not a token set").await.unwrap();

        let cache = TokenCache::load(store, key()).await.unwrap();
        assert_eq!(cache.load_outcome(), LoadOutcome::Corrupt);
        assert!(cache.tokens().is_none());
        let err = cache.corruption().unwrap();
        assert!(matches!(err, AuthError::CacheCorrupt { .. }));
    }

    #[tokio::test]
    async fn test_fresh_tokens_overwrite_corrupt_entry() {
        let store = CountingStore::new();
        store.save(&key(), b"\xff\xfe").await.unwrap();

        let mut cache = TokenCache::load(store.clone(), key()).await.unwrap();
        cache.set_tokens(token_set("A1"));
        cache.persist().await.unwrap();

        let reader = TokenCache::load(store, key()).await.unwrap();
        assert_eq!(reader.load_outcome(), LoadOutcome::Hit);
    }

    #[tokio::test]
    async fn test_clear_deletes_entry_and_resets_state() {
        let store = CountingStore::new();
        let mut cache = TokenCache::load(store.clone(), key()).await.unwrap();
        cache.set_tokens(token_set("A1"));
        cache.persist().await.unwrap();

        cache.clear().await.unwrap();
        assert!(cache.tokens().is_none());
        assert!(!cache.has_state_changed());

        // NotFound after clear is a plain miss, not corruption
        let reader = TokenCache::load(store, key()).await.unwrap();
        assert_eq!(reader.load_outcome(), LoadOutcome::Miss);
    }

    #[tokio::test]
    async fn test_remove_tokens_persists_as_delete() {
        let store = CountingStore::new();
        let mut cache = TokenCache::load(store.clone(), key()).await.unwrap();
        cache.set_tokens(token_set("A1"));
        cache.persist().await.unwrap();

        cache.remove_tokens();
        assert!(cache.has_state_changed());
        cache.persist().await.unwrap();
        assert_eq!(store.deletes.load(Ordering::SeqCst), 1);
        assert!(store.inner.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_refresh_is_last_writer_wins() {
        let store = CountingStore::new();
        let mut seed = TokenCache::load(store.clone(), key()).await.unwrap();
        let mut expired = token_set("A1");
        expired.expires_at = unix_now() - 1;
        seed.set_tokens(expired);
        seed.persist().await.unwrap();

        // Two overlapping requests load the same entry, refresh
        // independently, and save in turn.
        let mut first = TokenCache::load(store.clone(), key()).await.unwrap();
        let mut second = TokenCache::load(store.clone(), key()).await.unwrap();
        first.set_tokens(token_set("A2"));
        second.set_tokens(token_set("A3"));
        first.persist().await.unwrap();
        second.persist().await.unwrap();

        // Whichever save landed last owns the entry wholesale
        let reader = TokenCache::load(store, key()).await.unwrap();
        assert_eq!(reader.load_outcome(), LoadOutcome::Hit);
        assert_eq!(reader.tokens().unwrap().access_token.expose(), "A3");
    }
}
