//! OIDC lifecycle handlers and token acquisition
//!
//! The OIDC client library drives the handshake; this module owns every
//! cache mutation it triggers. Handlers are named after the round-trip
//! transitions: [`AuthenticationEventHandler::on_code_received`],
//! [`AuthenticationEventHandler::on_token_validated`],
//! [`AuthenticationEventHandler::on_remote_failure`], and the
//! framework-triggered [`AuthenticationEventHandler::on_sign_out`].

use crate::cache::TokenCache;
use crate::config::OidcConfig;
use crate::core::{
    AuthError, DEFAULT_EXPIRES_IN, Principal, SecureString, TokenResponse, TokenSet,
    expiry_timestamp, unix_now,
};
use crate::service::TokenCacheService;
use secrecy::ExposeSecret;
use tracing::{debug, error, info, warn};

/// Maximum length for error response body to log (prevents log flooding)
const MAX_ERROR_BODY_LOG_LENGTH: usize = 500;

/// Sanitize response body for logging - truncate and remove potential secrets
fn sanitize_response_for_logging(body: &str) -> String {
    let truncated = if body.len() > MAX_ERROR_BODY_LOG_LENGTH {
        // Providers localize error bodies; the cut must land on a char
        // boundary, not a raw byte offset.
        let mut end = MAX_ERROR_BODY_LOG_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} total bytes]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    if let Ok(mut json) = serde_json::from_str::<serde_json::Value>(&truncated) {
        for field in ["access_token", "refresh_token", "id_token", "token", "secret"] {
            if json.get(field).is_some() {
                json[field] = serde_json::json!("[REDACTED]");
            }
        }
        json.to_string()
    } else {
        truncated
    }
}

/// Consumes the OIDC library's lifecycle callbacks
///
/// Exchanges authorization codes and refresh tokens at the provider's
/// token endpoint and keeps the token cache in step with the sign-in
/// state. Construct once at process start and share by reference.
pub struct AuthenticationEventHandler {
    config: OidcConfig,
    http: reqwest::Client,
}

impl AuthenticationEventHandler {
    /// Build a handler with its own HTTP client
    pub fn new(config: OidcConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Build a handler over a shared HTTP client
    pub fn with_http_client(config: OidcConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    /// Authorization code arrived: exchange it and populate the cache
    ///
    /// The exchange completes before any cache access, so a rejected code
    /// leaves the cache untouched and a token set is never partially
    /// committed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TokenExchange`] when the provider rejects the
    /// code, plus the usual cache failure modes once the exchange
    /// succeeded.
    pub async fn on_code_received(
        &self,
        service: &mut TokenCacheService,
        principal: &Principal,
        code: &str,
    ) -> Result<(), AuthError> {
        debug!(client_id = %self.config.client_id, "Exchanging authorization code");
        let tokens = self.exchange_code(code).await?;

        let cache = service.get_cache(principal).await?;
        cache.set_tokens(tokens);
        cache.persist().await?;
        info!("Sign-in completed, token set cached");
        Ok(())
    }

    /// Identity token validated: confirm the principal resolves cleanly
    ///
    /// No cache interaction; only checks that the claims the cache key
    /// needs are present on the principal used downstream.
    ///
    /// # Errors
    ///
    /// Propagates the key-resolution failure for a principal the cache
    /// could never serve.
    pub fn on_token_validated(&self, principal: &Principal) -> Result<(), AuthError> {
        principal.resolve_key().map(|_| ())
    }

    /// Remote round trip failed: log and surface an authentication failure
    ///
    /// Does not touch the cache.
    pub fn on_remote_failure(&self, reason: &str) -> AuthError {
        error!(reason = %reason, "Authentication round trip failed");
        AuthError::token_exchange(reason)
    }

    /// Sign-out: clear the cache before local sign-out completes
    ///
    /// A re-login then starts from an empty cache rather than stale tokens.
    ///
    /// # Errors
    ///
    /// Propagates cache resolution and store failures.
    pub async fn on_sign_out(
        &self,
        service: &mut TokenCacheService,
        principal: &Principal,
    ) -> Result<(), AuthError> {
        service.clear_cache(principal).await
    }

    /// Make sure the cached access token is usable, refreshing if needed
    ///
    /// A fresh token is a no-op. An expired token with a refresh token is
    /// refreshed in place and persisted. Expired without a refresh token
    /// (or nothing cached at all) fails, and the caller answers with
    /// re-authentication.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TokenExchange`] when no usable token can be
    /// produced, [`AuthError::StoreUnavailable`] when persisting the
    /// refreshed set fails.
    pub async fn ensure_fresh(&self, cache: &mut TokenCache) -> Result<(), AuthError> {
        let Some(tokens) = cache.tokens() else {
            return Err(AuthError::token_exchange("no token set cached"));
        };
        if !tokens.is_expired() {
            return Ok(());
        }
        let Some(refresh_token) = tokens.refresh_token.as_ref() else {
            warn!(key = %cache.key(), "Access token expired with no refresh token");
            return Err(AuthError::token_exchange(
                "access token expired and no refresh token available",
            ));
        };

        debug!(key = %cache.key(), "Access token expired, refreshing");
        let response = self.refresh_grant(refresh_token.expose()).await?;

        cache.update_tokens(|set| {
            set.access_token = SecureString::new(response.access_token.clone());
            if let Some(new_refresh) = response.refresh_token.clone() {
                set.refresh_token = Some(SecureString::new(new_refresh));
            }
            set.expires_at = expiry_timestamp(response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN));
            if let Some(token_type) = response.token_type.clone() {
                set.token_type = token_type;
            }
        });
        cache.persist().await?;
        info!(key = %cache.key(), "Token set refreshed");
        Ok(())
    }

    /// Access token for a downstream API call, refreshed when necessary
    ///
    /// # Errors
    ///
    /// Same failure modes as [`AuthenticationEventHandler::ensure_fresh`].
    pub async fn access_token(&self, cache: &mut TokenCache) -> Result<SecureString, AuthError> {
        self.ensure_fresh(cache).await?;
        cache
            .tokens()
            .map(|set| set.access_token.clone())
            .ok_or_else(|| AuthError::token_exchange("no token set cached"))
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenSet, AuthError> {
        let mut form = vec![
            ("grant_type", "authorization_code".to_string()),
            ("code", code.to_string()),
            ("redirect_uri", self.config.redirect_uri.to_string()),
            ("client_id", self.config.client_id.clone()),
        ];
        if !self.config.scopes.is_empty() {
            form.push(("scope", self.config.scopes.join(" ")));
        }
        if let Some(secret) = &self.config.client_secret {
            form.push(("client_secret", secret.expose_secret().to_string()));
        }

        let response = self.post_token_endpoint(&form).await?;
        Ok(TokenSet::from_token_response(response))
    }

    async fn refresh_grant(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        let mut form = vec![
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", refresh_token.to_string()),
            ("client_id", self.config.client_id.clone()),
        ];
        if let Some(secret) = &self.config.client_secret {
            form.push(("client_secret", secret.expose_secret().to_string()));
        }

        self.post_token_endpoint(&form).await
    }

    async fn post_token_endpoint(
        &self,
        form: &[(&str, String)],
    ) -> Result<TokenResponse, AuthError> {
        let endpoint = self.config.token_endpoint()?;
        let response = self
            .http
            .post(endpoint)
            .form(form)
            .send()
            .await
            .map_err(|e| AuthError::token_exchange(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::token_exchange(e.to_string()))?;

        if !status.is_success() {
            let sanitized = sanitize_response_for_logging(&body);
            error!(status = %status, body = %sanitized, "Token endpoint rejected the exchange");
            return Err(AuthError::token_exchange(format!("HTTP {status}")));
        }

        serde_json::from_str(&body).map_err(|e| {
            let sanitized = sanitize_response_for_logging(&body);
            error!(error = %e, body = %sanitized, "Failed to parse token response");
            AuthError::token_exchange(format!("failed to parse token response: {e}"))
        })
    }
}
