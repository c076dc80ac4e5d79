//! OAuth callback validation and token exchange.
//!
//! After the merchant authorizes the app, Shopify redirects them to the
//! callback URL with query parameters including an authorization code. This
//! module gates that callback and performs the code-for-token exchange:
//!
//! 1. The shop parameter is validated as a shop domain
//! 2. The HMAC signature proves the request came from Shopify
//! 3. The state and shop cookies cross-check against the query (CSRF gate)
//! 4. The authorization code is exchanged for an access token
//! 5. The resulting [`Session`] is returned, ready to be encoded into a
//!    signed session token
//!
//! Any validation failure returns a specific [`OAuthError`], so the
//! presentation layer can redirect with an actionable machine-readable code
//! instead of a generic failure.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;

use crate::auth::oauth::error::OAuthError;
use crate::auth::oauth::hmac::{constant_time_compare, validate_callback_hmac};
use crate::auth::session::AccessTokenResponse;
use crate::auth::Session;
use crate::config::{GatewayConfig, ShopDomain};

/// Timeout for the server-to-server token exchange.
///
/// On timeout the exchange is treated as a failure, never as
/// success-by-default.
const EXCHANGE_TIMEOUT_SECS: u64 = 10;

/// The query parameters of an OAuth callback request.
///
/// Parameters are held in lexicographic key order so the signable string for
/// HMAC verification falls out of iteration directly: every parameter except
/// `hmac` and `signature`, joined as `key=value` pairs with `&`.
///
/// # Example
///
/// ```rust
/// use biolink_gateway::auth::oauth::CallbackQuery;
///
/// let query = CallbackQuery::from_pairs([
///     ("shop", "demo.myshopify.com"),
///     ("code", "abc123"),
///     ("state", "nonce"),
///     ("hmac", "sig"),
/// ]);
///
/// assert_eq!(query.code(), Some("abc123"));
/// assert_eq!(
///     query.to_signable_string(),
///     "code=abc123&shop=demo.myshopify.com&state=nonce"
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackQuery {
    params: BTreeMap<String, String>,
}

impl CallbackQuery {
    /// Builds a query from decoded key/value pairs.
    ///
    /// Later duplicates of a key overwrite earlier ones.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let params = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { params }
    }

    /// Inserts or replaces a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Returns a parameter value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Returns the authorization code, if present.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.get("code")
    }

    /// Returns the shop parameter, if present.
    #[must_use]
    pub fn shop(&self) -> Option<&str> {
        self.get("shop")
    }

    /// Returns the state parameter, if present.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.get("state")
    }

    /// Returns the supplied HMAC, if present.
    #[must_use]
    pub fn hmac(&self) -> Option<&str> {
        self.get("hmac")
    }

    /// Builds the string the HMAC is computed over.
    ///
    /// The `hmac` and `signature` parameters are excluded; the remaining
    /// keys are joined as `key=value` pairs with `&` in lexicographic order.
    #[must_use]
    pub fn to_signable_string(&self) -> String {
        self.params
            .iter()
            .filter(|(k, _)| k.as_str() != "hmac" && k.as_str() != "signature")
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// The OAuth cookies read back at the callback for CSRF cross-checking.
///
/// `state` comes from the `oauth_state` cookie, `shop` from `oauth_shop`.
/// Both are set by the host application when the flow begins.
#[derive(Clone, Debug, Default)]
pub struct CallbackCookies {
    /// Value of the `oauth_state` cookie, if present.
    pub state: Option<String>,
    /// Value of the `oauth_shop` cookie, if present.
    pub shop: Option<String>,
}

/// Request body for the code-for-token exchange.
#[derive(Serialize)]
struct TokenExchangeRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

/// Validates an OAuth callback and exchanges the code for an access token.
///
/// # Gate order
///
/// 1. **Shop**: the `shop` parameter must be present
///    ([`OAuthError::MissingShop`]) and a valid shop domain
///    ([`OAuthError::InvalidShop`])
/// 2. **Parameters**: `code`, `state`, and `hmac` must be present
///    ([`OAuthError::MissingParam`] — missing input is a distinct
///    diagnostic from a signature mismatch)
/// 3. **HMAC**: the query signature must verify
///    ([`OAuthError::InvalidHmac`])
/// 4. **State cookie**: the `oauth_state` cookie must be present and match
///    the `state` parameter under constant-time comparison
///    ([`OAuthError::StateMismatch`])
/// 5. **Shop cookie**: the `oauth_shop` cookie, when present, must match the
///    `shop` parameter ([`OAuthError::ShopMismatch`])
/// 6. **Exchange**: the code is POSTed to the shop's token endpoint; a
///    non-success status surfaces the upstream error body
///    ([`OAuthError::TokenExchangeFailed`])
///
/// # Errors
///
/// See the gate list above. Each failure is terminal for the request; this
/// layer never retries — the merchant re-initiates the flow.
pub async fn validate_auth_callback(
    config: &GatewayConfig,
    query: &CallbackQuery,
    cookies: &CallbackCookies,
) -> Result<Session, OAuthError> {
    // Step 1: Shop parameter present and well-formed
    let shop_param = query.shop().ok_or(OAuthError::MissingShop)?;
    let shop = ShopDomain::new(shop_param).map_err(|_| OAuthError::InvalidShop {
        shop: shop_param.to_string(),
    })?;

    // Step 2: Remaining required parameters
    let code = query.code().ok_or(OAuthError::MissingParam { param: "code" })?;
    let state = query
        .state()
        .ok_or(OAuthError::MissingParam { param: "state" })?;
    if query.hmac().is_none() {
        return Err(OAuthError::MissingParam { param: "hmac" });
    }

    // Step 3: HMAC signature
    if !validate_callback_hmac(query, config) {
        return Err(OAuthError::InvalidHmac);
    }

    // Step 4: State cookie cross-check (constant-time)
    let Some(expected_state) = cookies.state.as_deref() else {
        return Err(OAuthError::StateMismatch);
    };
    if !constant_time_compare(state, expected_state) {
        return Err(OAuthError::StateMismatch);
    }

    // Step 5: Shop cookie cross-check
    if let Some(cookie_shop) = cookies.shop.as_deref() {
        if cookie_shop != shop.as_ref() {
            return Err(OAuthError::ShopMismatch {
                expected: cookie_shop.to_string(),
                received: shop.as_ref().to_string(),
            });
        }
    }

    // Step 6: Exchange the authorization code for an access token
    let token_url = format!("https://{}/admin/oauth/access_token", shop.as_ref());
    let request_body = TokenExchangeRequest {
        client_id: config.api_key().as_ref(),
        client_secret: config.api_secret_key().as_ref(),
        code,
    };

    let token_response = request_access_token(&token_url, &request_body).await?;

    Ok(Session::from_access_token_response(
        shop,
        &token_response,
        Utc::now(),
    ))
}

/// POSTs a token-exchange request to the given endpoint.
///
/// Factored out of [`validate_auth_callback`] so the endpoint is injectable
/// in tests; production callers always derive the URL from the shop domain.
async fn request_access_token(
    token_url: &str,
    request_body: &TokenExchangeRequest<'_>,
) -> Result<AccessTokenResponse, OAuthError> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(EXCHANGE_TIMEOUT_SECS))
        .build()
        .map_err(|e| OAuthError::TokenExchangeFailed {
            status: 0,
            message: format!("Failed to build HTTP client: {e}"),
        })?;

    let response = client
        .post(token_url)
        .json(request_body)
        .send()
        .await
        .map_err(|e| OAuthError::TokenExchangeFailed {
            status: 0,
            message: format!("Network error: {e}"),
        })?;

    let status = response.status().as_u16();

    if !response.status().is_success() {
        let error_body = response.text().await.unwrap_or_default();
        return Err(OAuthError::TokenExchangeFailed {
            status,
            message: error_body,
        });
    }

    response
        .json()
        .await
        .map_err(|e| OAuthError::TokenExchangeFailed {
            status,
            message: format!("Failed to parse token response: {e}"),
        })
}

/// Exchanges an authorization code against an explicit token endpoint.
///
/// This is the low-level exchange used by [`validate_auth_callback`]. It is
/// exposed so deployments that route the exchange through a proxy (and
/// tests, which point it at a mock server) can drive it directly.
///
/// # Errors
///
/// Returns [`OAuthError::TokenExchangeFailed`] on transport errors,
/// non-success statuses (carrying the upstream body), or unparseable
/// responses.
pub async fn exchange_code_for_token(
    config: &GatewayConfig,
    token_url: &str,
    code: &str,
) -> Result<AccessTokenResponse, OAuthError> {
    let request_body = TokenExchangeRequest {
        client_id: config.api_key().as_ref(),
        client_secret: config.api_secret_key().as_ref(),
        code,
    };
    request_access_token(token_url, &request_body).await
}
