//! Core types for the identity layer
mod error;
mod key;
mod principal;
mod secure;
mod time;
mod token;

pub use error::{AuthError, Result};
pub use key::TokenCacheKey;
pub use principal::{Principal, claims, signed_in_principal};
pub use secure::SecureString;
pub use time::{expiry_timestamp, unix_now};
pub(crate) use token::DEFAULT_EXPIRES_IN;
pub use token::{TokenResponse, TokenSet};
