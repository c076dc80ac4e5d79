//! Signed session-token codec.
//!
//! The platform's session credential is a compact signed claims token
//! (JWT, HS256) carrying the shop, the access token, the granted scopes, an
//! optional session expiry, and the issued-at time. The token is stateless:
//! it is verified by recomputing the signature, not by server-side lookup,
//! and there is no revocation list — a stolen token stays valid until it
//! expires.
//!
//! # Invariants
//!
//! - The signature is checked strictly before any payload field is treated
//!   as authoritative for expiry or identity decisions.
//! - [`decode_session_token`] returns `None` on any failure (bad signature,
//!   malformed token, expired session, unparseable claims) — it never
//!   reconstructs a session from an unverified payload.
//!
//! # Example
//!
//! ```rust
//! use biolink_gateway::{GatewayConfig, ApiKey, SecretKey, Session, ShopDomain};
//! use biolink_gateway::auth::session_token::{encode_session_token, decode_session_token};
//!
//! let config = GatewayConfig::builder()
//!     .api_key(ApiKey::new("key").unwrap())
//!     .api_secret_key(SecretKey::new("signing-secret").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let session = Session::new(
//!     ShopDomain::new("demo").unwrap(),
//!     "access-token".to_string(),
//!     "read_products".parse().unwrap(),
//!     None,
//!     None,
//! );
//!
//! let token = encode_session_token(&config, &session).unwrap();
//! let decoded = decode_session_token(&config, &token).unwrap();
//! assert_eq!(decoded.shop, session.shop);
//! ```

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{AssociatedUser, AuthScopes, Session};
use crate::config::{GatewayConfig, SecretKey, ShopDomain};

/// Errors that can occur while encoding a session token.
///
/// Decoding deliberately does not error — an invalid token is indistinct
/// from an absent one and yields `None`.
#[derive(Debug, Error)]
pub enum SessionTokenError {
    /// The underlying JWT library rejected the claims or key.
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// The claim set carried inside a session token.
#[derive(Debug, Serialize, Deserialize)]
struct SessionTokenClaims {
    /// The shop domain this session belongs to.
    shop: String,

    /// The upstream access token.
    access_token: String,

    /// Granted scopes, comma-separated.
    scope: AuthScopes,

    /// Session expiry as epoch milliseconds, if the session expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    expires: Option<i64>,

    /// Issued-at as epoch seconds.
    iat: i64,

    /// The authorizing admin user, for online sessions.
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<AssociatedUser>,
}

/// Encodes a session into a signed token using the server-held secret.
///
/// # Errors
///
/// Returns [`SessionTokenError::Jwt`] if serialization or signing fails.
pub fn encode_session_token(
    config: &GatewayConfig,
    session: &Session,
) -> Result<String, SessionTokenError> {
    let claims = SessionTokenClaims {
        shop: session.shop.as_ref().to_string(),
        access_token: session.access_token.clone(),
        scope: session.scopes.clone(),
        expires: session.expires.map(|e| e.timestamp_millis()),
        iat: Utc::now().timestamp(),
        user: session.associated_user.clone(),
    };

    let key = EncodingKey::from_secret(config.api_secret_key().as_ref().as_bytes());
    let token = encode(&Header::new(Algorithm::HS256), &claims, &key)?;
    Ok(token)
}

/// Verifies a session token and reconstructs the session.
///
/// Verification tries the primary API secret first and falls back to the old
/// secret if configured (key rotation support). After the signature checks
/// out, the `expires` claim is compared against the current time: an expired
/// session is rejected even though its signature is valid.
///
/// # Returns
///
/// `Some(Session)` for a valid, unexpired token; `None` otherwise. This
/// function never panics and never partially trusts an unverified payload.
#[must_use]
pub fn decode_session_token(config: &GatewayConfig, token: &str) -> Option<Session> {
    let claims = decode_claims(token, config.api_secret_key()).or_else(|| {
        config
            .old_api_secret_key()
            .and_then(|old| decode_claims(token, old))
    })?;

    // Expiry check happens only after the signature has verified
    if let Some(expires_ms) = claims.expires {
        if Utc::now().timestamp_millis() > expires_ms {
            return None;
        }
    }

    let shop = ShopDomain::new(&claims.shop).ok()?;
    let expires = claims
        .expires
        .and_then(millis_to_datetime);

    Some(Session::new(
        shop,
        claims.access_token,
        claims.scope,
        expires,
        claims.user,
    ))
}

/// Decodes and signature-checks a token with one specific secret.
fn decode_claims(token: &str, secret: &SecretKey) -> Option<SessionTokenClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    // The session's own `expires` claim is checked manually after signature
    // verification; the standard `exp` claim is not used.
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let key = DecodingKey::from_secret(secret.as_ref().as_bytes());
    decode::<SessionTokenClaims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims)
}

fn millis_to_datetime(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}
