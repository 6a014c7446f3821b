//! Token cache key with validation
//!
//! A [`TokenCacheKey`] identifies one cache entry by the pair
//! (user object id, client application id). Two principals or two client
//! applications never collide: equality and hashing are structural over
//! both fields.

use crate::core::AuthError;
use std::fmt;

/// Maximum length for either key component (prevents oversized backend keys)
const MAX_COMPONENT_LENGTH: usize = 255;

/// Namespace prefix for backend storage keys
const KEY_PREFIX: &str = "surveys:tokens";

/// Identifies a cached token set by (user, client application)
///
/// Constructed once per authenticated request scope from claims on the
/// principal; immutable afterwards. Used only as a lookup key, never
/// persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenCacheKey {
    user_id: String,
    client_id: String,
}

impl TokenCacheKey {
    /// Creates a validated cache key
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if either component is empty,
    /// oversized, or contains the `:` namespace separator.
    pub fn new(user_id: impl Into<String>, client_id: impl Into<String>) -> Result<Self, AuthError> {
        let user_id = validate_component("user_id", user_id.into())?;
        let client_id = validate_component("client_id", client_id.into())?;
        Ok(Self { user_id, client_id })
    }

    /// User object identifier from the identity provider
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Client application identifier the tokens were issued for
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Namespaced key under which the serialized token set is stored
    pub fn storage_key(&self) -> String {
        format!("{KEY_PREFIX}:{}:{}", self.user_id, self.client_id)
    }
}

fn validate_component(field: &'static str, value: String) -> Result<String, AuthError> {
    if value.is_empty() {
        return Err(AuthError::validation(field, "cannot be empty"));
    }
    if value.len() > MAX_COMPONENT_LENGTH {
        return Err(AuthError::validation(
            field,
            format!("exceeds maximum length of {MAX_COMPONENT_LENGTH} characters"),
        ));
    }
    if value.contains(':') {
        return Err(AuthError::validation(
            field,
            "must not contain the ':' separator",
        ));
    }
    Ok(value)
}

impl fmt::Display for TokenCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user_id, self.client_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(key: &TokenCacheKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_equality_is_structural() {
        let a = TokenCacheKey::new("u1", "c1").unwrap();
        let b = TokenCacheKey::new("u1", "c1").unwrap();
        let other_user = TokenCacheKey::new("u2", "c1").unwrap();
        let other_client = TokenCacheKey::new("u1", "c2").unwrap();

        // Reflexive, symmetric, and distinguishes either field
        assert_eq!(a, a);
        assert_eq!(a, b);
        assert_eq!(b, a);
        assert_ne!(a, other_user);
        assert_ne!(a, other_client);
        assert_ne!(other_user, other_client);
    }

    #[test]
    fn test_equal_keys_hash_equal() {
        let a = TokenCacheKey::new("u1", "c1").unwrap();
        let b = TokenCacheKey::new("u1", "c1").unwrap();
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_transitivity() {
        let a = TokenCacheKey::new("user", "client").unwrap();
        let b = TokenCacheKey::new("user", "client").unwrap();
        let c = TokenCacheKey::new("user", "client").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a, c);
    }

    #[test]
    fn test_empty_components_rejected() {
        assert!(matches!(
            TokenCacheKey::new("", "c1"),
            Err(AuthError::Validation { field: "user_id", .. })
        ));
        assert!(matches!(
            TokenCacheKey::new("u1", ""),
            Err(AuthError::Validation { field: "client_id", .. })
        ));
    }

    #[test]
    fn test_separator_rejected() {
        assert!(TokenCacheKey::new("u:1", "c1").is_err());
        assert!(TokenCacheKey::new("u1", "c:1").is_err());
    }

    #[test]
    fn test_oversized_component_rejected() {
        let long = "a".repeat(256);
        assert!(TokenCacheKey::new(long.clone(), "c1").is_err());
        assert!(TokenCacheKey::new("a".repeat(255), "c1").is_ok());
    }

    #[test]
    fn test_storage_key_is_namespaced() {
        let key = TokenCacheKey::new("u1", "c1").unwrap();
        assert_eq!(key.storage_key(), "surveys:tokens:u1:c1");
    }
}
