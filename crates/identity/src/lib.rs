//! Surveys Identity
//!
//! The identity layer of the Surveys web application: per-user OAuth token
//! sets cached across requests behind a pluggable backend store.
//!
//! # Features
//!
//! - **Pluggable token storage** - Session-scoped, process-wide, or Redis
//! - **Write-through dirty tracking** - One store write per mutated request
//! - **Claims-based key resolution** - One cache entry per (user, client)
//! - **OIDC lifecycle hooks** - Code exchange, refresh, and sign-out handlers
//! - **Redacted secrets** - Tokens never reach logs or `Debug` output

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Per-key working set with dirty tracking
pub mod cache;
/// OIDC and store backend configuration
pub mod config;
/// Core types, errors, and primitives
pub mod core;
/// OIDC lifecycle handlers and token acquisition
pub mod events;
/// Per-request token cache facade
pub mod service;
/// Pluggable backend storage
pub mod store;

/// Commonly used types and traits
pub mod prelude {
    pub use crate::cache::{LoadOutcome, TokenCache};
    pub use crate::config::{OidcConfig, StoreConfig};
    pub use crate::core::{
        AuthError, Principal, Result, SecureString, TokenCacheKey, TokenResponse, TokenSet,
    };
    pub use crate::events::AuthenticationEventHandler;
    pub use crate::service::TokenCacheService;
    pub use crate::store::{InMemoryTokenStore, Session, SessionTokenStore, TokenStore};
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
}
