//! OAuth-specific error types.
//!
//! Every validation failure at the callback stage surfaces a specific reason
//! so the presentation layer can show an actionable message (and pick the
//! right machine-readable redirect code — see
//! [`AuthErrorCode`](crate::http::AuthErrorCode)).

use thiserror::Error;

/// Errors that can occur during OAuth operations.
///
/// # Thread Safety
///
/// `OAuthError` is `Send + Sync`, making it safe to use across async
/// boundaries.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// The callback did not include a shop parameter, or the value did not
    /// look like a shop domain at all.
    #[error("No shop provided in the OAuth callback")]
    MissingShop,

    /// The shop parameter is present but not a valid shop domain.
    #[error("Invalid shop domain: {shop}")]
    InvalidShop {
        /// The rejected shop value.
        shop: String,
    },

    /// One or more required callback parameters are missing.
    #[error("Invalid callback: missing parameter '{param}'")]
    MissingParam {
        /// The name of the missing query parameter.
        param: &'static str,
    },

    /// HMAC signature validation failed.
    ///
    /// The callback request's HMAC signature does not match the expected
    /// value computed with the API secret key. This could indicate a
    /// tampered request or a misconfigured secret key.
    #[error("HMAC signature validation failed")]
    InvalidHmac,

    /// OAuth state cross-check failed.
    ///
    /// The `state` query parameter does not match the value stored in the
    /// `oauth_state` cookie when the authorization URL was issued (or the
    /// cookie is absent). This is the CSRF gate.
    #[error("State parameter mismatch or missing state cookie")]
    StateMismatch,

    /// The `oauth_shop` cookie does not match the callback's shop parameter.
    #[error("Shop cookie mismatch: expected '{expected}', received '{received}'")]
    ShopMismatch {
        /// The shop stored when the flow began.
        expected: String,
        /// The shop received in the callback.
        received: String,
    },

    /// Token exchange request failed.
    ///
    /// The POST exchanging the authorization code for an access token
    /// returned a non-success HTTP status (the upstream error body is
    /// carried as the failure detail), or the request itself failed.
    #[error("Token exchange failed with status {status}: {message}")]
    TokenExchangeFailed {
        /// The HTTP status code returned (0 for transport failures).
        status: u16,
        /// The error message or upstream response body.
        message: String,
    },

    /// Host URL is not configured in [`GatewayConfig`](crate::GatewayConfig).
    ///
    /// Building an authorization URL requires the public host to construct
    /// the redirect URI.
    #[error("Host URL must be configured for OAuth")]
    MissingHostConfig,
}

// Verify OAuthError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OAuthError>();
};
