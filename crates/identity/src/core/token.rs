//! Cached token set and the token endpoint wire shape

use crate::core::{AuthError, SecureString, expiry_timestamp, unix_now};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Expiry applied when the provider omits `expires_in` (one hour)
pub(crate) const DEFAULT_EXPIRES_IN: u64 = 3600;

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// The bundle of tokens issued for one (user, client application) pair
///
/// Created on a successful authorization-code exchange, mutated in place on
/// refresh, deleted on sign-out. An expired set is not implicitly dropped
/// from the cache; it is refreshed or replaced by the next acquisition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    /// Access token presented to downstream APIs
    pub access_token: SecureString,
    /// Refresh token, when the provider issued one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<SecureString>,
    /// Unix timestamp after which the access token is stale
    pub expires_at: u64,
    /// Token type, normally `Bearer`
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Resource or scope the set was issued for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

impl TokenSet {
    /// Build a token set from a token endpoint response
    pub fn from_token_response(response: TokenResponse) -> Self {
        let expires_in = response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN);
        Self {
            access_token: SecureString::new(response.access_token),
            refresh_token: response.refresh_token.map(SecureString::new),
            expires_at: expiry_timestamp(expires_in),
            token_type: response.token_type.unwrap_or_else(default_token_type),
            resource: response.scope,
        }
    }

    /// Whether the access token has passed its expiry
    pub fn is_expired(&self) -> bool {
        self.expires_at <= unix_now()
    }

    /// Remaining lifetime of the access token, if any
    pub fn ttl(&self) -> Option<Duration> {
        let now = unix_now();
        (self.expires_at > now).then(|| Duration::from_secs(self.expires_at - now))
    }

    /// Serialize for backend storage.
    ///
    /// Every store variant persists exactly these bytes so the in-memory
    /// layer stays backend-agnostic.
    pub fn to_bytes(&self) -> Result<Vec<u8>, AuthError> {
        serde_json::to_vec(self)
            .map_err(|e| AuthError::validation("token_set", format!("failed to encode: {e}")))
    }

    /// Deserialize from backend storage
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Success body of the identity provider's token endpoint
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// Issued access token
    pub access_token: String,
    /// Issued refresh token, if any
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Token type, normally `Bearer`
    #[serde(default)]
    pub token_type: Option<String>,
    /// Granted scope
    #[serde(default)]
    pub scope: Option<String>,
}
