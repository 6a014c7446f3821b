//! Pluggable backend storage for serialized token sets
//!
//! Three variants share one contract: per-HTTP-session state
//! ([`SessionTokenStore`]), a process-wide map ([`InMemoryTokenStore`]),
//! and a networked Redis store ([`redis::RedisTokenStore`], behind the
//! `store-redis` feature). All of them persist the token set as the same
//! opaque byte blob, so the cache layer never cares which one is wired in.

mod memory;
mod session;

#[cfg(feature = "store-redis")]
pub mod redis;

pub use memory::InMemoryTokenStore;
pub use session::{Session, SessionTokenStore};

use crate::core::{AuthError, TokenCacheKey};
use async_trait::async_trait;

/// Trait for token set persistence
///
/// A missing entry is `Ok(None)`, never an error, and `delete` of a missing
/// entry succeeds (sign-out must be idempotent). `save` is
/// last-writer-wins per key: two concurrent refreshes for the same user may
/// overlap and the blob written last replaces the other wholesale. That
/// race is accepted: any valid unexpired token set is equally usable, and
/// serializing writers would put a lock across a network call.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Load the serialized token set for a key
    async fn load(&self, key: &TokenCacheKey) -> Result<Option<Vec<u8>>, AuthError>;

    /// Replace the serialized token set for a key
    async fn save(&self, key: &TokenCacheKey, bytes: &[u8]) -> Result<(), AuthError>;

    /// Remove the entry for a key, succeeding when it was already absent
    async fn delete(&self, key: &TokenCacheKey) -> Result<(), AuthError>;
}
