//! OAuth authorization URL generation.
//!
//! [`begin_auth`] is the first step of the install flow. It generates a
//! cryptographically secure state nonce and the authorization URL to
//! redirect the merchant to. The caller stores the state (and the shop) in
//! the OAuth cookies and issues the redirect.

use crate::auth::oauth::error::OAuthError;
use crate::auth::oauth::state::StateParam;
use crate::auth::AuthScopes;
use crate::config::{GatewayConfig, ShopDomain};

/// Result of initiating OAuth authorization.
///
/// The `state` value **must** be persisted (in the `oauth_state` cookie) and
/// cross-checked when the callback is received. This is essential for CSRF
/// protection.
#[derive(Clone, Debug)]
pub struct BeginAuthResult {
    /// The full authorization URL to redirect the merchant to.
    pub auth_url: String,

    /// The state parameter generated for this authorization request.
    pub state: StateParam,
}

/// Initiates the OAuth authorization code flow.
///
/// Composes the upstream authorize endpoint with the client id, the
/// requested scope list, the redirect URI, and a CSRF state token. If
/// `state` is `None`, a nonce is generated via a cryptographically secure
/// random source.
///
/// # Arguments
///
/// * `config` - Gateway configuration (must have `host` configured)
/// * `shop` - The shop domain to authorize against
/// * `redirect_path` - Path on the app receiving the callback (e.g., "/auth/callback")
/// * `state` - Optional caller-supplied state (generated if `None`)
///
/// # Errors
///
/// Returns [`OAuthError::MissingHostConfig`] if `config.host()` is `None`.
///
/// # Example
///
/// ```rust
/// use biolink_gateway::{GatewayConfig, ApiKey, SecretKey, ShopDomain, HostUrl};
/// use biolink_gateway::auth::oauth::begin_auth;
///
/// let config = GatewayConfig::builder()
///     .api_key(ApiKey::new("api-key").unwrap())
///     .api_secret_key(SecretKey::new("secret").unwrap())
///     .host(HostUrl::new("https://admin.biolink.example").unwrap())
///     .scopes("read_products".parse().unwrap())
///     .build()
///     .unwrap();
///
/// let shop = ShopDomain::new("test-shop").unwrap();
/// let result = begin_auth(&config, &shop, "/auth/callback", None).unwrap();
/// assert!(result.auth_url.contains("test-shop.myshopify.com"));
/// assert!(result.auth_url.contains("oauth/authorize"));
/// ```
pub fn begin_auth(
    config: &GatewayConfig,
    shop: &ShopDomain,
    redirect_path: &str,
    state: Option<StateParam>,
) -> Result<BeginAuthResult, OAuthError> {
    let host = config.host().ok_or(OAuthError::MissingHostConfig)?;

    let state = state.unwrap_or_default();

    let redirect_uri = format!("{}{}", host.as_ref(), redirect_path);
    let scopes = config.scopes().to_string();

    let params = [
        ("client_id", config.api_key().as_ref()),
        ("scope", scopes.as_str()),
        ("redirect_uri", redirect_uri.as_str()),
        ("state", state.as_ref()),
    ];

    // URL-encode both keys and values
    let query_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let auth_url = format!(
        "https://{}/admin/oauth/authorize?{}",
        shop.as_ref(),
        query_string
    );

    Ok(BeginAuthResult { auth_url, state })
}

// Verify BeginAuthResult is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<BeginAuthResult>();
};
