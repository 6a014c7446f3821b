//! Process-wide in-memory token store
//!
//! Shared by every session on one server instance; fastest of the
//! variants, lost on restart. Unsuitable for multi-instance deployments
//! unless sticky routing is guaranteed.

use crate::core::{AuthError, TokenCacheKey};
use crate::store::TokenStore;
use dashmap::DashMap;
use std::sync::Arc;

/// In-process implementation of [`TokenStore`]
pub struct InMemoryTokenStore {
    entries: Arc<DashMap<String, Vec<u8>>>,
}

impl InMemoryTokenStore {
    /// Create new in-memory store
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Drop all entries
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for InMemoryTokenStore {
    fn default() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn load(&self, key: &TokenCacheKey) -> Result<Option<Vec<u8>>, AuthError> {
        Ok(self
            .entries
            .get(&key.storage_key())
            .map(|entry| entry.value().clone()))
    }

    async fn save(&self, key: &TokenCacheKey, bytes: &[u8]) -> Result<(), AuthError> {
        self.entries.insert(key.storage_key(), bytes.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &TokenCacheKey) -> Result<(), AuthError> {
        self.entries.remove(&key.storage_key());
        Ok(())
    }
}
