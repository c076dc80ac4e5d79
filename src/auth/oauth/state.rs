//! State parameter handling for OAuth CSRF protection.
//!
//! The state parameter proves that a callback was initiated by a legitimate
//! authorization request: a nonce is generated when the authorization URL is
//! issued, stored in the `oauth_state` cookie, and cross-checked against the
//! `state` query parameter when the callback arrives.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fmt;

/// OAuth state parameter for CSRF protection.
///
/// Generated via a cryptographically secure random source. The value is a
/// 15-character alphanumeric nonce, safe for use in URLs and cookies without
/// further encoding.
///
/// # Example
///
/// ```rust
/// use biolink_gateway::auth::oauth::StateParam;
///
/// let state = StateParam::new();
/// assert_eq!(state.as_ref().len(), 15);
/// assert!(state.as_ref().chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateParam {
    value: String,
}

// Verify StateParam is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StateParam>();
};

impl StateParam {
    /// The length of generated nonces.
    const NONCE_LENGTH: usize = 15;

    /// Creates a new state parameter with a cryptographically secure nonce.
    #[must_use]
    pub fn new() -> Self {
        let value: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(Self::NONCE_LENGTH)
            .map(char::from)
            .collect();

        Self { value }
    }

    /// Creates a state parameter from a raw string.
    ///
    /// This allows callers to supply their own state value. The string is
    /// used as-is without any processing or validation.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self { value: raw.into() }
    }
}

impl Default for StateParam {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StateParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl AsRef<str> for StateParam {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_generates_15_char_alphanumeric_nonce() {
        let state = StateParam::new();
        assert_eq!(state.as_ref().len(), 15);
        assert!(state.as_ref().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_new_generates_unique_nonces() {
        let state1 = StateParam::new();
        let state2 = StateParam::new();

        // Extremely unlikely to generate the same nonce twice
        assert_ne!(state1, state2);
    }

    #[test]
    fn test_from_raw_wraps_string_unchanged() {
        let state = StateParam::from_raw("custom-state-123");
        assert_eq!(state.as_ref(), "custom-state-123");
    }

    #[test]
    fn test_display_returns_state_string() {
        let state = StateParam::from_raw("display-test");
        assert_eq!(format!("{state}"), "display-test");
    }
}
