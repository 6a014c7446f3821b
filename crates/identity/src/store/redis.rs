//! Redis-backed token store
//!
//! The distributed variant: one `ConnectionManager` created at process
//! start and shared by every request, entries visible to all server
//! instances. Network failures and timeouts surface as retryable
//! [`AuthError::StoreUnavailable`]; nothing is swallowed. Only available
//! with the `store-redis` feature.

use crate::core::{AuthError, TokenCacheKey};
use crate::store::TokenStore;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Configuration for the Redis store
#[derive(Debug, Clone, Deserialize)]
pub struct RedisStoreConfig {
    /// TTL hint applied to each entry, if any
    #[serde(default, with = "humantime_serde")]
    pub entry_ttl: Option<Duration>,
    /// Upper bound on any single store operation
    #[serde(default = "default_op_timeout", with = "humantime_serde")]
    pub op_timeout: Duration,
}

fn default_op_timeout() -> Duration {
    Duration::from_secs(5)
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            entry_ttl: None,
            op_timeout: default_op_timeout(),
        }
    }
}

/// Redis implementation of [`TokenStore`]
pub struct RedisTokenStore {
    conn: ConnectionManager,
    config: RedisStoreConfig,
}

impl RedisTokenStore {
    /// Connect to Redis and build the store
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::StoreUnavailable`] when the client cannot be
    /// created or the initial connection fails.
    pub async fn connect(url: &str, config: RedisStoreConfig) -> Result<Arc<Self>, AuthError> {
        let client = redis::Client::open(url)
            .map_err(|e| AuthError::store_unavailable("connect", e.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AuthError::store_unavailable("connect", e.to_string()))?;
        debug!(op_timeout = ?config.op_timeout, "Connected to Redis token store");
        Ok(Arc::new(Self { conn, config }))
    }

    /// Build a store over an existing connection
    ///
    /// The connection is created once at process start and passed in, so
    /// the host can share it with other cache consumers and choose its own
    /// connection settings.
    pub fn with_connection(conn: ConnectionManager, config: RedisStoreConfig) -> Arc<Self> {
        Arc::new(Self { conn, config })
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, AuthError>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.config.op_timeout, fut).await {
            Ok(result) => result.map_err(|e| map_redis_error(operation, &e)),
            Err(_) => Err(AuthError::store_unavailable(
                operation,
                format!("timed out after {:?}", self.config.op_timeout),
            )),
        }
    }
}

/// Map a redis failure to the retryable store error
fn map_redis_error(operation: &'static str, error: &redis::RedisError) -> AuthError {
    AuthError::store_unavailable(operation, error.to_string())
}

#[async_trait::async_trait]
impl TokenStore for RedisTokenStore {
    async fn load(&self, key: &TokenCacheKey) -> Result<Option<Vec<u8>>, AuthError> {
        let mut conn = self.conn.clone();
        let storage_key = key.storage_key();
        self.bounded("load", async move { conn.get(storage_key).await })
            .await
    }

    async fn save(&self, key: &TokenCacheKey, bytes: &[u8]) -> Result<(), AuthError> {
        let mut conn = self.conn.clone();
        let storage_key = key.storage_key();
        let bytes = bytes.to_vec();
        let ttl = self.config.entry_ttl;
        self.bounded("save", async move {
            match ttl {
                Some(ttl) => conn.set_ex(storage_key, bytes, ttl.as_secs()).await,
                None => conn.set(storage_key, bytes).await,
            }
        })
        .await
    }

    async fn delete(&self, key: &TokenCacheKey) -> Result<(), AuthError> {
        let mut conn = self.conn.clone();
        let storage_key = key.storage_key();
        // DEL of a missing key is a no-op in Redis, which matches the
        // idempotent delete contract.
        self.bounded("delete", async move { conn.del(storage_key).await })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_errors_map_to_retryable() {
        let err = redis::RedisError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        let mapped = map_redis_error("save", &err);
        assert!(mapped.is_retryable());
        assert!(mapped.to_string().contains("save"));
    }

    #[test]
    fn test_config_defaults() {
        let config = RedisStoreConfig::default();
        assert_eq!(config.op_timeout, Duration::from_secs(5));
        assert!(config.entry_ttl.is_none());
    }

    #[tokio::test]
    async fn test_connect_with_malformed_url_fails_retryable() {
        let result =
            RedisTokenStore::connect("not-a-redis-url", RedisStoreConfig::default()).await;
        match result {
            Err(err) => assert!(err.is_retryable()),
            Ok(_) => panic!("connect should not succeed"),
        }
    }
}
