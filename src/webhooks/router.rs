//! Webhook routing: gates, admission control, and topic dispatch.
//!
//! Each inbound request walks a fixed gate sequence with early exits:
//!
//! ```text
//! RECEIVED
//!   -> HEADERS_CHECKED        required headers present        (else 401)
//!   -> SIGNATURE_VERIFIED     raw-body HMAC valid             (else 401)
//!   -> RATE_LIMIT_CHECKED     per-(shop, topic) window open   (else 429)
//!   -> BODY_PARSED            body parses as JSON             (else 400)
//!   -> DISPATCHED
//!        -> HANDLED           registered handler ran          (200 success)
//!        -> UNHANDLED_TOPIC   no handler for topic            (200 received)
//! ```
//!
//! Signature failures additionally emit a `tracing` warning as a potential
//! attack indicator, distinguishable from ordinary errors. Handler failures
//! are reported to the tracing sink with shop/topic context and returned as
//! 500 without retry — redelivery is the sender's responsibility.
//!
//! # Example
//!
//! ```rust
//! use biolink_gateway::webhooks::{WebhookRouter, WebhookHandler, BoxFuture, HandlerError};
//! use biolink_gateway::limiter::RateLimitPolicy;
//! use biolink_gateway::ShopDomain;
//!
//! struct UninstallHandler;
//!
//! impl WebhookHandler for UninstallHandler {
//!     fn handle<'a>(
//!         &'a self,
//!         _shop: &'a ShopDomain,
//!         _payload: serde_json::Value,
//!     ) -> BoxFuture<'a, Result<(), HandlerError>> {
//!         Box::pin(async { Ok(()) })
//!     }
//! }
//!
//! let router = WebhookRouter::builder()
//!     .on("app/uninstalled", UninstallHandler)
//!     .topic_limit("app/uninstalled", RateLimitPolicy::new(10, 60_000))
//!     .build();
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::limiter::{Clock, MemoryStore, RateLimitPolicy, RateLimiter, SystemClock};
use crate::webhooks::types::{WebhookHandler, WebhookResponse};
use crate::webhooks::verification::{verify_webhook, WebhookRequest};
use crate::webhooks::WebhookError;

/// Default admission policy for topics without an explicit limit.
///
/// Sized for high-volume topics like order updates. The exact threshold is
/// configuration, not contract.
pub const DEFAULT_TOPIC_LIMIT: RateLimitPolicy = RateLimitPolicy::new(120, 60_000);

/// Default admission policy for the uninstall topic.
///
/// Legitimate uninstalls for one shop are rare, so the budget is strict.
pub const UNINSTALL_TOPIC_LIMIT: RateLimitPolicy = RateLimitPolicy::new(10, 60_000);

/// Routes verified webhook deliveries to topic-keyed handlers.
///
/// Construct once at process start via [`WebhookRouter::builder`] and share
/// by reference across requests; the router holds the per-topic rate
/// limiters, so a fresh router means fresh windows.
pub struct WebhookRouter {
    handlers: HashMap<String, Box<dyn WebhookHandler>>,
    limiters: HashMap<String, RateLimiter>,
    default_limiter: RateLimiter,
}

impl std::fmt::Debug for WebhookRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookRouter")
            .field("handlers", &format!("<{} handlers>", self.handlers.len()))
            .field("limiters", &format!("<{} limiters>", self.limiters.len()))
            .finish()
    }
}

// Verify WebhookRouter is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WebhookRouter>();
};

impl WebhookRouter {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> WebhookRouterBuilder {
        WebhookRouterBuilder::new()
    }

    /// Handles one inbound webhook request to a terminal response.
    ///
    /// This method never returns an error: every rejection is folded into a
    /// structured [`WebhookResponse`] with the status from
    /// [`WebhookError::status`]. Validation failures are terminal for the
    /// request — no retry happens at this layer.
    pub async fn handle(
        &self,
        config: &GatewayConfig,
        request: &WebhookRequest,
    ) -> WebhookResponse {
        match self.process(config, request).await {
            Ok(response) => response,
            Err(error) => WebhookResponse::error(error.status(), &error.to_string()),
        }
    }

    /// Walks the gate sequence, returning the first rejection.
    async fn process(
        &self,
        config: &GatewayConfig,
        request: &WebhookRequest,
    ) -> Result<WebhookResponse, WebhookError> {
        // Gates (a) + (b): headers, then raw-body signature
        let context = verify_webhook(config, request).map_err(|error| {
            if matches!(error, WebhookError::InvalidSignature) {
                // Potential attack indicator, not an ordinary error
                tracing::warn!(
                    shop = request.shop_domain().unwrap_or("<unknown>"),
                    topic = request.topic().unwrap_or("<unknown>"),
                    "webhook signature verification failed"
                );
            }
            error
        })?;

        let shop = context.shop();
        let topic = context.topic();

        // Gate (c): per-(shop, topic) admission
        let limiter = self.limiters.get(topic).unwrap_or(&self.default_limiter);
        let identifier = format!("{}:{}", shop.as_ref(), topic);
        if !limiter.is_allowed(&identifier) {
            return Err(WebhookError::RateLimited {
                retry_after_secs: limiter.time_until_reset(&identifier).as_secs(),
            });
        }

        // Gate (d): body parses as JSON
        let payload: serde_json::Value = serde_json::from_slice(request.body()).map_err(|e| {
            WebhookError::InvalidPayload {
                message: e.to_string(),
            }
        })?;

        // Dispatch
        let Some(handler) = self.handlers.get(topic) else {
            // Acknowledge so the sender does not retry indefinitely
            tracing::debug!(shop = shop.as_ref(), topic, "unhandled webhook topic");
            return Ok(WebhookResponse::received());
        };

        match handler.handle(shop, payload).await {
            Ok(()) => {
                tracing::debug!(shop = shop.as_ref(), topic, "webhook handled");
                Ok(WebhookResponse::success())
            }
            Err(error) => {
                tracing::error!(
                    shop = shop.as_ref(),
                    topic,
                    error = %error,
                    "webhook handler failed"
                );
                Err(WebhookError::HandlerFailed {
                    topic: topic.to_string(),
                    message: error.to_string(),
                })
            }
        }
    }

    /// Sweeps all limiter stores, removing long-expired windows.
    ///
    /// Call periodically to bound memory growth.
    pub fn sweep_limiters(&self) {
        for limiter in self.limiters.values() {
            limiter.sweep();
        }
        self.default_limiter.sweep();
    }
}

/// Builder for [`WebhookRouter`].
///
/// Handlers are registered per topic string; rate-limit policies default to
/// [`DEFAULT_TOPIC_LIMIT`] (and [`UNINSTALL_TOPIC_LIMIT`] for
/// `app/uninstalled`) and can be overridden per topic.
pub struct WebhookRouterBuilder {
    handlers: HashMap<String, Box<dyn WebhookHandler>>,
    topic_limits: HashMap<String, RateLimitPolicy>,
    default_limit: RateLimitPolicy,
    clock: Arc<dyn Clock>,
}

impl Default for WebhookRouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WebhookRouterBuilder {
    /// Creates a builder with the default per-topic policies.
    #[must_use]
    pub fn new() -> Self {
        let mut topic_limits = HashMap::new();
        topic_limits.insert("app/uninstalled".to_string(), UNINSTALL_TOPIC_LIMIT);

        Self {
            handlers: HashMap::new(),
            topic_limits,
            default_limit: DEFAULT_TOPIC_LIMIT,
            clock: Arc::new(SystemClock),
        }
    }

    /// Registers a handler for a topic, replacing any previous one.
    #[must_use]
    pub fn on(mut self, topic: impl Into<String>, handler: impl WebhookHandler + 'static) -> Self {
        self.handlers.insert(topic.into(), Box::new(handler));
        self
    }

    /// Overrides the rate-limit policy for one topic.
    #[must_use]
    pub fn topic_limit(mut self, topic: impl Into<String>, policy: RateLimitPolicy) -> Self {
        self.topic_limits.insert(topic.into(), policy);
        self
    }

    /// Overrides the rate-limit policy for topics without an explicit one.
    #[must_use]
    pub fn default_limit(mut self, policy: RateLimitPolicy) -> Self {
        self.default_limit = policy;
        self
    }

    /// Overrides the limiter clock (tests use a deterministic clock).
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builds the router, instantiating one limiter per configured topic.
    #[must_use]
    pub fn build(self) -> WebhookRouter {
        let limiters = self
            .topic_limits
            .into_iter()
            .map(|(topic, policy)| {
                let limiter = RateLimiter::with_parts(
                    policy,
                    self.clock.clone(),
                    Box::new(MemoryStore::new()),
                );
                (topic, limiter)
            })
            .collect();

        let default_limiter = RateLimiter::with_parts(
            self.default_limit,
            self.clock,
            Box::new(MemoryStore::new()),
        );

        WebhookRouter {
            handlers: self.handlers,
            limiters,
            default_limiter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::oauth::hmac::compute_signature_base64;
    use crate::config::{ApiKey, SecretKey, ShopDomain};
    use crate::webhooks::types::{BoxFuture, HandlerError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        invocations: Arc<AtomicUsize>,
    }

    impl WebhookHandler for CountingHandler {
        fn handle<'a>(
            &'a self,
            _shop: &'a ShopDomain,
            _payload: serde_json::Value,
        ) -> BoxFuture<'a, Result<(), HandlerError>> {
            let invocations = self.invocations.clone();
            Box::pin(async move {
                invocations.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        }
    }

    struct FailingHandler;

    impl WebhookHandler for FailingHandler {
        fn handle<'a>(
            &'a self,
            _shop: &'a ShopDomain,
            _payload: serde_json::Value,
        ) -> BoxFuture<'a, Result<(), HandlerError>> {
            Box::pin(async { Err("database unavailable".into()) })
        }
    }

    fn test_config() -> GatewayConfig {
        GatewayConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(SecretKey::new("api-secret").unwrap())
            .webhook_secret(SecretKey::new("hook-secret").unwrap())
            .build()
            .unwrap()
    }

    fn signed_request(body: &[u8], topic: &str) -> WebhookRequest {
        WebhookRequest::new(
            body.to_vec(),
            Some(compute_signature_base64(body, "hook-secret")),
            Some("example.myshopify.com".to_string()),
            Some(topic.to_string()),
            None,
        )
    }

    #[tokio::test]
    async fn test_handled_topic_returns_success_and_invokes_handler_once() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let router = WebhookRouter::builder()
            .on(
                "app/uninstalled",
                CountingHandler {
                    invocations: invocations.clone(),
                },
            )
            .build();

        let request = signed_request(br#"{"id":1}"#, "app/uninstalled");
        let response = router.handle(&test_config(), &request).await;

        assert_eq!(response.status, 200);
        assert_eq!(response.body["success"], true);
        assert_eq!(invocations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_topic_is_acknowledged() {
        let router = WebhookRouter::builder().build();

        let request = signed_request(br#"{"id":1}"#, "carts/update");
        let response = router.handle(&test_config(), &request).await;

        assert_eq!(response.status, 200);
        assert_eq!(response.body["received"], true);
    }

    #[tokio::test]
    async fn test_missing_header_is_rejected_401() {
        let router = WebhookRouter::builder().build();

        let body = br#"{"id":1}"#;
        let request = WebhookRequest::new(
            body.to_vec(),
            Some(compute_signature_base64(body, "hook-secret")),
            Some("example.myshopify.com".to_string()),
            None, // topic header absent
            None,
        );

        let response = router.handle(&test_config(), &request).await;
        assert_eq!(response.status, 401);
        assert!(response.body["error"].as_str().unwrap().contains("Missing"));
    }

    #[tokio::test]
    async fn test_invalid_signature_is_rejected_401() {
        let router = WebhookRouter::builder().build();

        let mut request = signed_request(br#"{"id":1}"#, "app/uninstalled");
        request = WebhookRequest::new(
            request.body().to_vec(),
            Some("bm90LXRoZS1yaWdodC1zaWduYXR1cmU=".to_string()),
            request.shop_domain().map(ToString::to_string),
            request.topic().map(ToString::to_string),
            None,
        );

        let response = router.handle(&test_config(), &request).await;
        assert_eq!(response.status, 401);
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected_400() {
        let router = WebhookRouter::builder().build();

        let request = signed_request(b"not json {", "orders/updated");
        let response = router.handle(&test_config(), &request).await;

        assert_eq!(response.status, 400);
    }

    #[tokio::test]
    async fn test_missing_webhook_secret_is_500() {
        let router = WebhookRouter::builder().build();
        let config = GatewayConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(SecretKey::new("api-secret").unwrap())
            .build()
            .unwrap();

        let request = signed_request(br#"{"id":1}"#, "app/uninstalled");
        let response = router.handle(&config, &request).await;

        assert_eq!(response.status, 500);
    }

    #[tokio::test]
    async fn test_handler_failure_is_500_with_error_body() {
        let router = WebhookRouter::builder()
            .on("orders/create", FailingHandler)
            .build();

        let request = signed_request(br#"{"id":1}"#, "orders/create");
        let response = router.handle(&test_config(), &request).await;

        assert_eq!(response.status, 500);
        assert!(response.body["error"]
            .as_str()
            .unwrap()
            .contains("database unavailable"));
    }

    #[tokio::test]
    async fn test_per_topic_rate_limit_returns_429() {
        let router = WebhookRouter::builder()
            .topic_limit("app/uninstalled", RateLimitPolicy::new(2, 60_000))
            .build();
        let config = test_config();

        let request = signed_request(br#"{"id":1}"#, "app/uninstalled");

        assert_eq!(router.handle(&config, &request).await.status, 200);
        assert_eq!(router.handle(&config, &request).await.status, 200);

        let denied = router.handle(&config, &request).await;
        assert_eq!(denied.status, 429);
        assert!(denied.body["error"]
            .as_str()
            .unwrap()
            .contains("Rate limit"));
    }

    #[tokio::test]
    async fn test_rate_limit_keys_are_per_shop_and_topic() {
        let router = WebhookRouter::builder()
            .default_limit(RateLimitPolicy::new(1, 60_000))
            .build();
        let config = test_config();

        let body = br#"{"id":1}"#;
        let hmac = compute_signature_base64(body, "hook-secret");

        let shop_a = WebhookRequest::new(
            body.to_vec(),
            Some(hmac.clone()),
            Some("shop-a.myshopify.com".to_string()),
            Some("orders/updated".to_string()),
            None,
        );
        let shop_b = WebhookRequest::new(
            body.to_vec(),
            Some(hmac),
            Some("shop-b.myshopify.com".to_string()),
            Some("orders/updated".to_string()),
            None,
        );

        // Each shop has its own window under the same topic
        assert_eq!(router.handle(&config, &shop_a).await.status, 200);
        assert_eq!(router.handle(&config, &shop_b).await.status, 200);
        assert_eq!(router.handle(&config, &shop_a).await.status, 429);
    }

    #[tokio::test]
    async fn test_signature_gate_runs_before_rate_limit() {
        // Unsigned traffic must not consume a shop's admission budget
        let router = WebhookRouter::builder()
            .topic_limit("orders/create", RateLimitPolicy::new(1, 60_000))
            .build();
        let config = test_config();

        let forged = WebhookRequest::new(
            br#"{"id":1}"#.to_vec(),
            Some("Zm9yZ2Vk".to_string()),
            Some("example.myshopify.com".to_string()),
            Some("orders/create".to_string()),
            None,
        );
        assert_eq!(router.handle(&config, &forged).await.status, 401);

        // The legitimate delivery still fits the window
        let genuine = signed_request(br#"{"id":1}"#, "orders/create");
        assert_eq!(router.handle(&config, &genuine).await.status, 200);
    }

    #[test]
    fn test_builder_seeds_uninstall_policy() {
        let router = WebhookRouter::builder().build();
        let limiter = router.limiters.get("app/uninstalled").unwrap();
        assert_eq!(limiter.policy(), UNINSTALL_TOPIC_LIMIT);
    }
}
