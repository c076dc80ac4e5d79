//! Webhook signature verification.
//!
//! Shopify signs webhook requests with HMAC-SHA256 over the raw request
//! body, using the webhook signing secret, and sends the base64-encoded
//! signature in the `X-Shopify-Hmac-SHA256` header. Verification recomputes
//! the signature over the exact raw bytes (never a re-serialized body) and
//! compares in constant time.
//!
//! # Example
//!
//! ```rust
//! use biolink_gateway::webhooks::{WebhookRequest, verify_webhook, verify_hmac};
//! use biolink_gateway::{GatewayConfig, ApiKey, SecretKey};
//! use biolink_gateway::auth::oauth::hmac::compute_signature_base64;
//!
//! let config = GatewayConfig::builder()
//!     .api_key(ApiKey::new("key").unwrap())
//!     .api_secret_key(SecretKey::new("api-secret").unwrap())
//!     .webhook_secret(SecretKey::new("hook-secret").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let body = br#"{"id":1}"#;
//! let hmac = compute_signature_base64(body, "hook-secret");
//!
//! let request = WebhookRequest::new(
//!     body.to_vec(),
//!     Some(hmac),
//!     Some("example.myshopify.com".to_string()),
//!     Some("orders/create".to_string()),
//!     None,
//! );
//!
//! let context = verify_webhook(&config, &request).unwrap();
//! assert_eq!(context.shop().as_ref(), "example.myshopify.com");
//! assert_eq!(context.topic(), "orders/create");
//! ```

use crate::auth::oauth::hmac::{compute_signature_base64, constant_time_compare};
use crate::config::{GatewayConfig, ShopDomain};
use crate::webhooks::WebhookError;

/// HTTP header name for the HMAC-SHA256 signature.
///
/// The value is a base64-encoded HMAC-SHA256 signature of the raw request
/// body.
pub const HEADER_HMAC: &str = "X-Shopify-Hmac-SHA256";

/// HTTP header name for the webhook topic (e.g., "orders/create").
pub const HEADER_TOPIC: &str = "X-Shopify-Topic";

/// HTTP header name for the shop domain that triggered the webhook.
pub const HEADER_SHOP_DOMAIN: &str = "X-Shopify-Shop-Domain";

/// HTTP header name for the unique webhook delivery id.
///
/// Useful for idempotency, since deliveries are at-least-once.
pub const HEADER_WEBHOOK_ID: &str = "X-Shopify-Webhook-Id";

/// An inbound webhook request, before any gate has run.
///
/// The body is stored as raw bytes to preserve the exact payload for HMAC
/// computation. Header fields are optional because gate (a) of the router —
/// required headers present — has not run yet.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    /// Raw request body as bytes.
    body: Vec<u8>,
    /// Value of the `X-Shopify-Hmac-SHA256` header.
    hmac_header: Option<String>,
    /// Value of the `X-Shopify-Shop-Domain` header.
    shop_domain: Option<String>,
    /// Value of the `X-Shopify-Topic` header.
    topic: Option<String>,
    /// Value of the `X-Shopify-Webhook-Id` header.
    webhook_id: Option<String>,
}

impl WebhookRequest {
    /// Creates a new webhook request from the raw body and header values.
    #[must_use]
    pub const fn new(
        body: Vec<u8>,
        hmac_header: Option<String>,
        shop_domain: Option<String>,
        topic: Option<String>,
        webhook_id: Option<String>,
    ) -> Self {
        Self {
            body,
            hmac_header,
            shop_domain,
            topic,
            webhook_id,
        }
    }

    /// Returns the raw request body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the signature header value, if present.
    #[must_use]
    pub fn hmac_header(&self) -> Option<&str> {
        self.hmac_header.as_deref()
    }

    /// Returns the shop-domain header value, if present.
    #[must_use]
    pub fn shop_domain(&self) -> Option<&str> {
        self.shop_domain.as_deref()
    }

    /// Returns the topic header value, if present.
    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// Returns the webhook delivery id, if present.
    #[must_use]
    pub fn webhook_id(&self) -> Option<&str> {
        self.webhook_id.as_deref()
    }
}

/// Verified webhook metadata, produced after the signature gate has passed.
///
/// Transient: exists only for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookContext {
    shop: ShopDomain,
    topic: String,
    webhook_id: Option<String>,
}

impl WebhookContext {
    /// Returns the validated shop domain.
    #[must_use]
    pub const fn shop(&self) -> &ShopDomain {
        &self.shop
    }

    /// Returns the topic string as received in the header.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the delivery id, if present.
    #[must_use]
    pub fn webhook_id(&self) -> Option<&str> {
        self.webhook_id.as_deref()
    }
}

/// Verifies the HMAC signature of a webhook body.
///
/// Low-level, single-secret verification. Most callers want
/// [`verify_webhook`], which also checks headers and validates the shop.
///
/// # Example
///
/// ```rust
/// use biolink_gateway::webhooks::verify_hmac;
/// use biolink_gateway::auth::oauth::hmac::compute_signature_base64;
///
/// let body = b"webhook payload";
/// let hmac = compute_signature_base64(body, "my-secret");
///
/// assert!(verify_hmac(body, &hmac, "my-secret"));
/// assert!(!verify_hmac(body, "invalid", "my-secret"));
/// ```
#[must_use]
pub fn verify_hmac(raw_body: &[u8], hmac_header: &str, secret: &str) -> bool {
    let computed = compute_signature_base64(raw_body, secret);
    constant_time_compare(&computed, hmac_header)
}

/// Verifies a webhook request and returns the verified context.
///
/// Gate order:
///
/// 1. The webhook signing secret must be configured
///    ([`WebhookError::MissingWebhookSecret`] — a configuration error,
///    never reported as an authentication failure)
/// 2. The signature, shop-domain, and topic headers must be present
///    ([`WebhookError::MissingHeader`])
/// 3. The shop-domain header must be a valid shop domain
///    ([`WebhookError::InvalidShopDomain`])
/// 4. The body HMAC must verify ([`WebhookError::InvalidSignature`])
///
/// # Errors
///
/// See the gate list above.
pub fn verify_webhook(
    config: &GatewayConfig,
    request: &WebhookRequest,
) -> Result<WebhookContext, WebhookError> {
    let secret = config
        .webhook_secret()
        .ok_or(WebhookError::MissingWebhookSecret)?;

    let hmac_header = request
        .hmac_header()
        .ok_or(WebhookError::MissingHeader { name: HEADER_HMAC })?;
    let shop_domain = request.shop_domain().ok_or(WebhookError::MissingHeader {
        name: HEADER_SHOP_DOMAIN,
    })?;
    let topic = request.topic().ok_or(WebhookError::MissingHeader {
        name: HEADER_TOPIC,
    })?;

    let shop = ShopDomain::new(shop_domain).map_err(|_| WebhookError::InvalidShopDomain {
        domain: shop_domain.to_string(),
    })?;

    if !verify_hmac(request.body(), hmac_header, secret.as_ref()) {
        return Err(WebhookError::InvalidSignature);
    }

    Ok(WebhookContext {
        shop,
        topic: topic.to_string(),
        webhook_id: request.webhook_id().map(ToString::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, SecretKey};

    fn config_with_webhook_secret(secret: &str) -> GatewayConfig {
        GatewayConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(SecretKey::new("api-secret").unwrap())
            .webhook_secret(SecretKey::new(secret).unwrap())
            .build()
            .unwrap()
    }

    fn signed_request(body: &[u8], secret: &str) -> WebhookRequest {
        WebhookRequest::new(
            body.to_vec(),
            Some(compute_signature_base64(body, secret)),
            Some("example.myshopify.com".to_string()),
            Some("orders/create".to_string()),
            Some("delivery-1".to_string()),
        )
    }

    #[test]
    fn test_verify_hmac_accepts_valid_signature() {
        let body = b"webhook payload";
        let hmac = compute_signature_base64(body, "secret");
        assert!(verify_hmac(body, &hmac, "secret"));
    }

    #[test]
    fn test_verify_hmac_rejects_corrupted_body() {
        let body = br#"{"a":1}"#;
        let hmac = compute_signature_base64(body, "secret");

        assert!(verify_hmac(body, &hmac, "secret"));
        assert!(!verify_hmac(br#"{"a":2}"#, &hmac, "secret"));
    }

    #[test]
    fn test_verify_hmac_rejects_wrong_secret() {
        let body = b"payload";
        let hmac = compute_signature_base64(body, "secret-a");
        assert!(!verify_hmac(body, &hmac, "secret-b"));
    }

    #[test]
    fn test_verify_webhook_returns_context() {
        let config = config_with_webhook_secret("hook-secret");
        let request = signed_request(br#"{"id":42}"#, "hook-secret");

        let context = verify_webhook(&config, &request).unwrap();
        assert_eq!(context.shop().as_ref(), "example.myshopify.com");
        assert_eq!(context.topic(), "orders/create");
        assert_eq!(context.webhook_id(), Some("delivery-1"));
    }

    #[test]
    fn test_verify_webhook_requires_secret() {
        let config = GatewayConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(SecretKey::new("api-secret").unwrap())
            .build()
            .unwrap();

        let request = signed_request(b"{}", "hook-secret");
        let result = verify_webhook(&config, &request);
        assert!(matches!(result, Err(WebhookError::MissingWebhookSecret)));
    }

    #[test]
    fn test_verify_webhook_requires_hmac_header() {
        let config = config_with_webhook_secret("hook-secret");
        let request = WebhookRequest::new(
            b"{}".to_vec(),
            None,
            Some("example.myshopify.com".to_string()),
            Some("orders/create".to_string()),
            None,
        );

        let result = verify_webhook(&config, &request);
        assert!(matches!(
            result,
            Err(WebhookError::MissingHeader { name }) if name == HEADER_HMAC
        ));
    }

    #[test]
    fn test_verify_webhook_requires_shop_and_topic_headers() {
        let config = config_with_webhook_secret("hook-secret");

        let no_shop = WebhookRequest::new(
            b"{}".to_vec(),
            Some(compute_signature_base64(b"{}", "hook-secret")),
            None,
            Some("orders/create".to_string()),
            None,
        );
        assert!(matches!(
            verify_webhook(&config, &no_shop),
            Err(WebhookError::MissingHeader { name }) if name == HEADER_SHOP_DOMAIN
        ));

        let no_topic = WebhookRequest::new(
            b"{}".to_vec(),
            Some(compute_signature_base64(b"{}", "hook-secret")),
            Some("example.myshopify.com".to_string()),
            None,
            None,
        );
        assert!(matches!(
            verify_webhook(&config, &no_topic),
            Err(WebhookError::MissingHeader { name }) if name == HEADER_TOPIC
        ));
    }

    #[test]
    fn test_verify_webhook_rejects_invalid_shop_domain() {
        let config = config_with_webhook_secret("hook-secret");
        let request = WebhookRequest::new(
            b"{}".to_vec(),
            Some(compute_signature_base64(b"{}", "hook-secret")),
            Some("evil.example.com".to_string()),
            Some("orders/create".to_string()),
            None,
        );

        let result = verify_webhook(&config, &request);
        assert!(matches!(result, Err(WebhookError::InvalidShopDomain { .. })));
    }

    #[test]
    fn test_verify_webhook_rejects_bad_signature() {
        let config = config_with_webhook_secret("hook-secret");
        let mut request = signed_request(b"{}", "hook-secret");
        request.hmac_header = Some("AAAA".to_string());

        let result = verify_webhook(&config, &request);
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }
}
