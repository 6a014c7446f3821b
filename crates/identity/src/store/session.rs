//! Session-scoped token store
//!
//! Backs onto one HTTP session's server-side state: entries are visible
//! only to the originating session and disappear with it. Acceptable only
//! for single-instance deployments. Concurrent requests inside one session
//! are serialized by the host's session layer, not here.

use crate::core::{AuthError, TokenCacheKey};
use crate::store::TokenStore;
use dashmap::DashMap;
use std::sync::Arc;

/// Cloneable handle to one HTTP session's server-side bag
///
/// The host framework owns the session lifecycle; this layer only reads
/// and writes the token entries inside it.
#[derive(Clone, Default)]
pub struct Session {
    values: Arc<DashMap<String, Vec<u8>>>,
}

impl Session {
    /// Create a fresh session bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of values held by the session
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the session bag is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Session-scoped implementation of [`TokenStore`]
pub struct SessionTokenStore {
    session: Session,
}

impl SessionTokenStore {
    /// Bind a store to the current request's session
    pub fn new(session: Session) -> Arc<Self> {
        Arc::new(Self { session })
    }
}

#[async_trait::async_trait]
impl TokenStore for SessionTokenStore {
    async fn load(&self, key: &TokenCacheKey) -> Result<Option<Vec<u8>>, AuthError> {
        Ok(self
            .session
            .values
            .get(&key.storage_key())
            .map(|entry| entry.value().clone()))
    }

    async fn save(&self, key: &TokenCacheKey, bytes: &[u8]) -> Result<(), AuthError> {
        self.session.values.insert(key.storage_key(), bytes.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &TokenCacheKey) -> Result<(), AuthError> {
        self.session.values.remove(&key.storage_key());
        Ok(())
    }
}
