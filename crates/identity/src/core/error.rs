//! Error types for identity and token cache operations
//!
//! One top-level [`AuthError`] covers the whole layer:
//! - [`AuthError::NotAuthenticated`]: cache requested for a principal that
//!   never signed in to this application
//! - [`AuthError::CacheCorrupt`]: stored bytes exist but do not decode
//! - [`AuthError::StoreUnavailable`]: backend I/O failure, retryable
//! - [`AuthError::TokenExchange`]: the identity provider rejected a code
//!   or refresh exchange
//! - [`AuthError::Validation`]: malformed cache key or claims

use thiserror::Error;

/// Top-level error for identity and token cache operations
#[derive(Debug, Error)]
pub enum AuthError {
    /// Principal lacks the application sign-in claim
    #[error("principal is not signed in to this application")]
    NotAuthenticated,

    /// Stored bytes exist but fail to deserialize
    #[error("cached token set for '{key}' is corrupt: {reason}")]
    CacheCorrupt {
        /// Storage key of the corrupt entry
        key: String,
        /// Decode failure detail
        reason: String,
    },

    /// Backend I/O failure (timeout, connection refused); retryable
    #[error("token store unavailable during {operation}: {reason}")]
    StoreUnavailable {
        /// Store operation that failed
        operation: &'static str,
        /// Underlying failure detail
        reason: String,
    },

    /// Token endpoint rejected the exchange
    #[error("token exchange failed: {reason}")]
    TokenExchange {
        /// Provider or transport failure detail
        reason: String,
    },

    /// Malformed cache key or claims
    #[error("invalid {field}: {reason}")]
    Validation {
        /// Field that failed validation
        field: &'static str,
        /// Reason for invalidity
        reason: String,
    },
}

impl AuthError {
    /// Build a [`AuthError::Validation`] error
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Build a [`AuthError::StoreUnavailable`] error
    pub fn store_unavailable(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            operation,
            reason: reason.into(),
        }
    }

    /// Build a [`AuthError::TokenExchange`] error
    pub fn token_exchange(reason: impl Into<String>) -> Self {
        Self::TokenExchange {
            reason: reason.into(),
        }
    }

    /// Whether a caller-directed retry with backoff is worthwhile.
    ///
    /// Only transient store failures qualify; authentication and exchange
    /// failures need a new sign-in, not a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }
}

/// Result type alias for identity operations
pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_authenticated_display() {
        let err = AuthError::NotAuthenticated;
        assert_eq!(
            err.to_string(),
            "principal is not signed in to this application"
        );
    }

    #[test]
    fn test_cache_corrupt_display() {
        let err = AuthError::CacheCorrupt {
            key: "surveys:tokens:u1:c1".to_string(),
            reason: "expected value at line 1".to_string(),
        };
        assert!(err.to_string().contains("surveys:tokens:u1:c1"));
        assert!(err.to_string().contains("corrupt"));
    }

    #[test]
    fn test_store_unavailable_display() {
        let err = AuthError::store_unavailable("save", "connection refused");
        assert!(err.to_string().contains("save"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_only_store_unavailable_is_retryable() {
        assert!(AuthError::store_unavailable("load", "timeout").is_retryable());
        assert!(!AuthError::NotAuthenticated.is_retryable());
        assert!(!AuthError::token_exchange("expired code").is_retryable());
        assert!(
            !AuthError::CacheCorrupt {
                key: "k".to_string(),
                reason: "bad".to_string(),
            }
            .is_retryable()
        );
        assert!(!AuthError::validation("user_id", "empty").is_retryable());
    }
}
