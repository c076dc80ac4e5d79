//! Session management for authenticated merchant connections.
//!
//! A [`Session`] is created at a successful OAuth code exchange, immediately
//! serialized into a signed token (see [`crate::auth::session_token`]), and
//! never mutated in place — a new session replaces the old one.

use crate::auth::{AssociatedUser, AuthScopes};
use crate::config::ShopDomain;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt;

/// An authenticated connection between a merchant's shop and the platform.
///
/// # Security
///
/// The access token must never be logged or returned in plaintext API
/// responses; the `Debug` implementation masks it. The only sanctioned
/// serialized form is inside a signed session token.
///
/// # Example
///
/// ```rust
/// use biolink_gateway::{Session, ShopDomain, AuthScopes};
///
/// let session = Session::new(
///     ShopDomain::new("my-store").unwrap(),
///     "access-token".to_string(),
///     "read_products".parse().unwrap(),
///     None, // no expiration
///     None, // no associated user
/// );
///
/// assert!(session.is_active());
/// assert!(!session.expired());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// The shop this session is for.
    pub shop: ShopDomain,

    /// The access token for upstream API authentication.
    pub access_token: String,

    /// The OAuth scopes granted to this session.
    pub scopes: AuthScopes,

    /// When this session expires, if applicable.
    pub expires: Option<DateTime<Utc>>,

    /// The admin user who authorized an online token, if applicable.
    pub associated_user: Option<AssociatedUser>,
}

impl Session {
    /// Creates a new session with the specified parameters.
    #[must_use]
    pub const fn new(
        shop: ShopDomain,
        access_token: String,
        scopes: AuthScopes,
        expires: Option<DateTime<Utc>>,
        associated_user: Option<AssociatedUser>,
    ) -> Self {
        Self {
            shop,
            access_token,
            scopes,
            expires,
            associated_user,
        }
    }

    /// Builds a session from a token-exchange response.
    ///
    /// A relative `expires_in` (seconds) in the response is converted to an
    /// absolute expiry anchored at `now`.
    #[must_use]
    pub fn from_access_token_response(
        shop: ShopDomain,
        response: &AccessTokenResponse,
        now: DateTime<Utc>,
    ) -> Self {
        let expires = response
            .expires_in
            .map(|secs| now + Duration::seconds(secs));

        Self {
            shop,
            access_token: response.access_token.clone(),
            scopes: response.scope.clone(),
            expires,
            associated_user: response.associated_user.clone(),
        }
    }

    /// Returns `true` if this session has expired.
    ///
    /// Sessions without an expiration time are considered never expired.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.expires.is_some_and(|expires| Utc::now() > expires)
    }

    /// Returns `true` if this session is active (not expired and has a token).
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.access_token.is_empty() && !self.expired()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("shop", &self.shop)
            .field("access_token", &"*****")
            .field("scopes", &self.scopes)
            .field("expires", &self.expires)
            .field("associated_user", &self.associated_user)
            .finish()
    }
}

// Verify Session is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Session>();
};

/// The body of a successful access-token exchange response.
///
/// Unknown fields in the upstream response are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenResponse {
    /// The granted access token.
    pub access_token: String,

    /// The granted scopes, comma-separated.
    pub scope: AuthScopes,

    /// Relative expiry in seconds, present for expiring (online) tokens.
    pub expires_in: Option<i64>,

    /// The authorizing admin user, present for online tokens.
    pub associated_user: Option<AssociatedUser>,
}
