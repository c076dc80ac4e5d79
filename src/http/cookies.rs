//! Cookie construction for the session and OAuth flows.
//!
//! The gateway does not own an HTTP framework; it produces `Set-Cookie`
//! header values for the host application to attach. Three cookies exist:
//!
//! - the session cookie, carrying the signed session token
//! - `oauth_state` and `oauth_shop`, which live only for the duration of an
//!   install flow and are cleared at the callback

use std::fmt;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "biolink_session";

/// Name of the OAuth CSRF state cookie.
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// Name of the OAuth shop cookie.
pub const OAUTH_SHOP_COOKIE: &str = "oauth_shop";

/// Session lifetime for the embedded OAuth flow (30 days).
pub const EMBEDDED_SESSION_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

/// Session lifetime for interactive sign-in (7 days).
pub const INTERACTIVE_SESSION_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

/// Lifetime of the transient OAuth cookies (10 minutes).
pub const OAUTH_COOKIE_MAX_AGE_SECS: i64 = 10 * 60;

/// `SameSite` policy for a cookie.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SameSite {
    /// Sent only for same-site requests.
    Strict,
    /// Sent for same-site requests and top-level navigations.
    Lax,
    /// Sent cross-site; requires `Secure`.
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        })
    }
}

/// Attributes applied when building a `Set-Cookie` value.
#[derive(Clone, Copy, Debug)]
pub struct CookieOptions {
    /// Marks the cookie `HttpOnly`.
    pub http_only: bool,
    /// Marks the cookie `Secure` (required in production).
    pub secure: bool,
    /// The `SameSite` policy.
    pub same_site: SameSite,
    /// Lifetime in seconds; zero expires the cookie immediately.
    pub max_age_secs: i64,
}

/// Builds a `Set-Cookie` header value.
///
/// The caller is responsible for ensuring `value` needs no encoding; session
/// tokens (base64url) and state nonces (alphanumeric) never do.
///
/// # Example
///
/// ```rust
/// use biolink_gateway::http::cookies::{build_set_cookie, CookieOptions, SameSite};
///
/// let cookie = build_set_cookie(
///     "biolink_session",
///     "token-value",
///     &CookieOptions {
///         http_only: true,
///         secure: true,
///         same_site: SameSite::Lax,
///         max_age_secs: 3600,
///     },
/// );
/// assert_eq!(
///     cookie,
///     "biolink_session=token-value; Path=/; Max-Age=3600; SameSite=Lax; Secure; HttpOnly"
/// );
/// ```
#[must_use]
pub fn build_set_cookie(name: &str, value: &str, options: &CookieOptions) -> String {
    let mut cookie = format!(
        "{name}={value}; Path=/; Max-Age={}; SameSite={}",
        options.max_age_secs, options.same_site
    );
    if options.secure {
        cookie.push_str("; Secure");
    }
    if options.http_only {
        cookie.push_str("; HttpOnly");
    }
    cookie
}

/// Builds the session cookie carrying a signed session token.
///
/// The embedded OAuth flow requires `SameSite=None` (the admin iframe is
/// cross-site) and gets the 30-day lifetime; interactive sign-in uses
/// `SameSite=Lax` with the 7-day lifetime.
#[must_use]
pub fn session_cookie(token: &str, embedded: bool, secure: bool) -> String {
    let options = CookieOptions {
        http_only: true,
        // SameSite=None is only honored on secure cookies
        secure: secure || embedded,
        same_site: if embedded { SameSite::None } else { SameSite::Lax },
        max_age_secs: if embedded {
            EMBEDDED_SESSION_MAX_AGE_SECS
        } else {
            INTERACTIVE_SESSION_MAX_AGE_SECS
        },
    };
    build_set_cookie(SESSION_COOKIE, token, &options)
}

/// Builds the two transient OAuth cookies set when the install flow begins.
#[must_use]
pub fn oauth_flow_cookies(state: &str, shop: &str, secure: bool) -> [String; 2] {
    let options = CookieOptions {
        http_only: true,
        secure,
        same_site: SameSite::Lax,
        max_age_secs: OAUTH_COOKIE_MAX_AGE_SECS,
    };
    [
        build_set_cookie(OAUTH_STATE_COOKIE, state, &options),
        build_set_cookie(OAUTH_SHOP_COOKIE, shop, &options),
    ]
}

/// Builds a `Set-Cookie` value that clears the named cookie.
#[must_use]
pub fn clear_cookie(name: &str) -> String {
    format!("{name}=; Path=/; Max-Age=0")
}
