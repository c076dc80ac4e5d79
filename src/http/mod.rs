//! HTTP-surface value types for the host application.
//!
//! The gateway is framework-agnostic: instead of mounting routes it
//! describes, as plain values, what the host router should send back.
//! [`CallbackOutcome`] captures the OAuth callback endpoint's side effects
//! (cookies to set and clear, where to redirect); [`AuthErrorCode`] is the
//! fixed enumeration of machine-readable error codes the error page
//! understands.
//!
//! OAuth failures redirect to a human-readable error page rather than
//! returning raw JSON, so an interactive flow is never dead-ended; webhook
//! failures return JSON only (see [`crate::webhooks`]), since the caller is
//! a machine.

pub mod cookies;

use crate::auth::oauth::OAuthError;
use crate::auth::session_token::encode_session_token;
use crate::auth::Session;
use crate::config::GatewayConfig;
use crate::http::cookies::{
    clear_cookie, session_cookie, OAUTH_SHOP_COOKIE, OAUTH_STATE_COOKIE,
};

/// Machine-readable error codes for the OAuth error page redirect.
///
/// The error page receives the code as the `error` query parameter. The set
/// is fixed; adding a code means updating the error page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthErrorCode {
    /// A signature, state, or shop cross-check failed.
    AuthenticationFailed,
    /// The callback carried no usable shop.
    NoShopProvided,
    /// The upstream exchange or server-side processing failed.
    AuthenticationError,
    /// The callback request was malformed.
    InvalidRequest,
}

impl AuthErrorCode {
    /// The wire form used in the `error` query parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::NoShopProvided => "no_shop_provided",
            Self::AuthenticationError => "authentication_error",
            Self::InvalidRequest => "invalid_request",
        }
    }

    /// Maps a callback failure to its redirect code.
    #[must_use]
    pub const fn from_oauth_error(error: &OAuthError) -> Self {
        match error {
            OAuthError::InvalidHmac
            | OAuthError::StateMismatch
            | OAuthError::ShopMismatch { .. } => Self::AuthenticationFailed,
            OAuthError::MissingShop | OAuthError::InvalidShop { .. } => Self::NoShopProvided,
            OAuthError::MissingParam { .. } => Self::InvalidRequest,
            OAuthError::TokenExchangeFailed { .. } | OAuthError::MissingHostConfig => {
                Self::AuthenticationError
            }
        }
    }
}

impl std::fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the host router should do after an OAuth callback.
///
/// On success: set the session cookie, clear both OAuth cookies, redirect to
/// the admin dashboard. On failure: clear the OAuth cookies, set nothing
/// else, redirect to the error page with a machine-readable code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackOutcome {
    /// Where to redirect the merchant (a path on this host).
    pub redirect_to: String,
    /// `Set-Cookie` values to attach.
    pub set_cookies: Vec<String>,
    /// `Set-Cookie` values clearing the transient OAuth cookies.
    pub clear_cookies: Vec<String>,
}

impl CallbackOutcome {
    /// Returns `true` if this outcome establishes a session.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.set_cookies.is_empty()
    }
}

/// Path the merchant lands on after a successful install.
const ADMIN_PATH: &str = "/admin";

/// Path of the human-readable error page.
const ERROR_PATH: &str = "/auth/error";

/// Folds a callback validation result into the endpoint's response shape.
///
/// `embedded` selects the session cookie's `SameSite`/lifetime profile;
/// `secure` marks cookies `Secure` (always set it in production).
///
/// A session that fails to encode is folded into the
/// [`AuthErrorCode::AuthenticationError`] failure path rather than
/// panicking; the merchant can re-initiate the flow.
#[must_use]
pub fn complete_callback(
    config: &GatewayConfig,
    result: Result<Session, OAuthError>,
    embedded: bool,
    secure: bool,
) -> CallbackOutcome {
    let clear_cookies = vec![
        clear_cookie(OAUTH_STATE_COOKIE),
        clear_cookie(OAUTH_SHOP_COOKIE),
    ];

    match result {
        Ok(session) => match encode_session_token(config, &session) {
            Ok(token) => CallbackOutcome {
                redirect_to: ADMIN_PATH.to_string(),
                set_cookies: vec![session_cookie(&token, embedded, secure)],
                clear_cookies,
            },
            Err(error) => {
                tracing::error!(
                    shop = session.shop.as_ref(),
                    error = %error,
                    "failed to encode session token"
                );
                failure_outcome(AuthErrorCode::AuthenticationError, clear_cookies)
            }
        },
        Err(error) => {
            let code = AuthErrorCode::from_oauth_error(&error);
            tracing::warn!(error = %error, code = code.as_str(), "oauth callback rejected");
            failure_outcome(code, clear_cookies)
        }
    }
}

fn failure_outcome(code: AuthErrorCode, clear_cookies: Vec<String>) -> CallbackOutcome {
    CallbackOutcome {
        redirect_to: format!("{ERROR_PATH}?error={}", code.as_str()),
        set_cookies: Vec::new(),
        clear_cookies,
    }
}
