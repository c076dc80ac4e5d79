//! OAuth 2.0 authorization code flow for app installation.
//!
//! The install flow walks a fixed state machine:
//!
//! ```text
//! UNAUTHENTICATED
//!   -> (authorization URL issued)            begin_auth
//! AWAITING_CALLBACK
//!   -> (code received, state + HMAC valid)   validate_auth_callback
//! TOKEN_EXCHANGED
//!   -> (session shaped from response)
//! SESSION_ESTABLISHED
//! ```
//!
//! Any validation failure at the callback stage returns to
//! `UNAUTHENTICATED` with a specific [`OAuthError`], so the presentation
//! layer can show an actionable message instead of a generic failure.
//!
//! # Security Features
//!
//! - **HMAC Validation**: callbacks are verified with HMAC-SHA256 over the
//!   sorted query string
//! - **CSRF Protection**: the state nonce round-trips through the
//!   `oauth_state` cookie and is compared in constant time
//! - **Constant-Time Comparison**: all signature and state comparisons use
//!   constant-time algorithms to prevent timing attacks
//! - **Key Rotation Support**: an old API secret can be configured so
//!   in-flight flows survive rotation
//!
//! # Example
//!
//! ```rust,ignore
//! use biolink_gateway::auth::oauth::{begin_auth, validate_auth_callback};
//!
//! // Step 1: Begin authorization
//! let result = begin_auth(&config, &shop, "/auth/callback", None)?;
//! // Set oauth_state / oauth_shop cookies, redirect to result.auth_url
//!
//! // Step 2: Handle the callback
//! let session = validate_auth_callback(&config, &query, &cookies).await?;
//! // Encode the session into a signed token and set the session cookie
//! ```

mod begin_auth;
mod callback;
mod error;
pub mod hmac;
mod state;

pub use begin_auth::{begin_auth, BeginAuthResult};
pub use callback::{
    exchange_code_for_token, validate_auth_callback, CallbackCookies, CallbackQuery,
};
pub use error::OAuthError;
pub use hmac::{compute_signature, compute_signature_base64, constant_time_compare};
pub use state::StateParam;
