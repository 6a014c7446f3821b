//! Authenticated principal and claim resolution
//!
//! The surrounding authentication framework hands this layer a bag of
//! claims per request. [`Principal::resolve_key`] is the single place
//! claims become a [`TokenCacheKey`].

use crate::core::{AuthError, TokenCacheKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Well-known claim names consumed by this layer
pub mod claims {
    /// Stable user object identifier issued by the identity provider
    pub const OBJECT_ID: &str = "oid";
    /// Client application the principal authenticated through
    pub const CLIENT_ID: &str = "azp";
    /// Application-specific flag set once local sign-in completed
    pub const SIGNED_IN: &str = "signed_in";
}

/// The authenticated identity associated with a request
///
/// Carries claims only; the framework that validated the incoming identity
/// token owns everything else about the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Principal {
    claims: HashMap<String, String>,
}

impl Principal {
    /// Create an empty principal
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a claim, replacing any existing value
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.insert(name.into(), value.into());
        self
    }

    /// Look up a claim by name
    pub fn find_claim(&self, name: &str) -> Option<&str> {
        self.claims.get(name).map(String::as_str)
    }

    /// Whether the principal completed sign-in to this application
    pub fn is_signed_in(&self) -> bool {
        self.find_claim(claims::SIGNED_IN)
            .is_some_and(|v| v == "true")
    }

    /// User object identifier claim
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] when the claim is absent.
    pub fn object_id(&self) -> Result<&str, AuthError> {
        self.find_claim(claims::OBJECT_ID)
            .ok_or_else(|| AuthError::validation("oid", "claim missing from principal"))
    }

    /// Client application identifier claim
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] when the claim is absent.
    pub fn client_id(&self) -> Result<&str, AuthError> {
        self.find_claim(claims::CLIENT_ID)
            .ok_or_else(|| AuthError::validation("azp", "claim missing from principal"))
    }

    /// Resolve this principal to its cache key
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotAuthenticated`] when the sign-in claim is
    /// missing, and [`AuthError::Validation`] when the id claims are absent
    /// or malformed.
    pub fn resolve_key(&self) -> Result<TokenCacheKey, AuthError> {
        if !self.is_signed_in() {
            return Err(AuthError::NotAuthenticated);
        }
        TokenCacheKey::new(self.object_id()?, self.client_id()?)
    }
}

/// Build a fully signed-in principal for the given user and client
pub fn signed_in_principal(user_id: &str, client_id: &str) -> Principal {
    Principal::new()
        .with_claim(claims::OBJECT_ID, user_id)
        .with_claim(claims::CLIENT_ID, client_id)
        .with_claim(claims::SIGNED_IN, "true")
}
