//! Token expiry clock helpers
//!
//! Expiry is tracked as whole Unix seconds, matching the `expires_in`
//! lifetimes the token endpoint hands out.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current Unix timestamp in whole seconds
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Expiry timestamp `lifetime_secs` from now
///
/// Saturates instead of wrapping: `expires_in` comes off the wire, and an
/// absurd lifetime must clamp to "never expires", not overflow into the
/// past.
pub fn expiry_timestamp(lifetime_secs: u64) -> u64 {
    unix_now().saturating_add(lifetime_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_is_in_the_future() {
        let expiry = expiry_timestamp(3600);
        assert!(expiry >= unix_now() + 3599);
    }

    #[test]
    fn test_oversized_lifetime_saturates() {
        assert_eq!(expiry_timestamp(u64::MAX), u64::MAX);
    }
}
