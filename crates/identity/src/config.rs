//! OIDC client and store backend configuration
//!
//! Loaded once at process start; opaque to the cache layer itself. Only
//! the authentication event handler reads the OIDC settings, for its token
//! endpoint calls.

use crate::core::AuthError;
use crate::store::{InMemoryTokenStore, TokenStore};
use secrecy::SecretString;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

#[cfg(feature = "store-redis")]
pub use crate::store::redis::RedisStoreConfig;

/// Settings for the OIDC client application
#[derive(Debug, Clone, Deserialize)]
pub struct OidcConfig {
    /// Application (client) identifier registered with the provider
    pub client_id: String,
    /// Client secret, when the registration uses one
    #[serde(default)]
    pub client_secret: Option<SecretString>,
    /// Issuer/authority base URL
    pub authority: Url,
    /// Redirect URI registered for the authorization-code round trip
    pub redirect_uri: Url,
    /// Scopes requested at sign-in
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl OidcConfig {
    /// The provider's token endpoint, rooted at the authority
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] when the authority URL cannot
    /// carry path segments.
    pub fn token_endpoint(&self) -> Result<Url, AuthError> {
        let mut endpoint = self.authority.clone();
        endpoint
            .path_segments_mut()
            .map_err(|()| AuthError::validation("authority", "cannot be a base URL"))?
            .pop_if_empty()
            .extend(["oauth2", "token"]);
        Ok(endpoint)
    }
}

/// Which backend the shared token store uses
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Per-HTTP-session server-side state; single-instance only
    Session,
    /// Process-wide in-memory map; single-instance only, lost on restart
    Memory,
    /// Networked Redis store, shared across instances
    #[cfg(feature = "store-redis")]
    Redis {
        /// Connection URL (`redis://...`)
        url: String,
        /// TTL hint and operation timeout
        #[serde(flatten)]
        options: RedisStoreConfig,
    },
}

impl StoreConfig {
    /// Whether the backend binds to individual HTTP sessions
    pub fn is_session_scoped(&self) -> bool {
        matches!(self, Self::Session)
    }

    /// Build the process-wide store singleton for this configuration
    ///
    /// The session variant has no process-wide singleton: the host builds a
    /// [`crate::store::SessionTokenStore`] per request from the live
    /// session handle, so `connect` refuses it.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for the session variant and
    /// [`AuthError::StoreUnavailable`] when the Redis connection fails.
    pub async fn connect(&self) -> Result<Arc<dyn TokenStore>, AuthError> {
        match self {
            Self::Session => Err(AuthError::validation(
                "store",
                "session-scoped store is built per request from the session handle",
            )),
            Self::Memory => {
                let store: Arc<dyn TokenStore> = InMemoryTokenStore::new();
                Ok(store)
            }
            #[cfg(feature = "store-redis")]
            Self::Redis { url, options } => {
                let store: Arc<dyn TokenStore> =
                    crate::store::redis::RedisTokenStore::connect(url, options.clone()).await?;
                Ok(store)
            }
        }
    }
}
