//! End-to-end tests for the webhook endpoint semantics.
//!
//! Each test drives the router exactly the way the host HTTP layer does:
//! raw body bytes plus header values in, a terminal status + JSON body out.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use biolink_gateway::auth::oauth::hmac::compute_signature_base64;
use biolink_gateway::limiter::RateLimitPolicy;
use biolink_gateway::webhooks::{
    BoxFuture, HandlerError, WebhookHandler, WebhookRequest, WebhookRouter,
};
use biolink_gateway::{ApiKey, GatewayConfig, SecretKey, ShopDomain};

const WEBHOOK_SECRET: &str = "test-webhook-secret";

struct RecordingHandler {
    invocations: Arc<AtomicUsize>,
    payloads: Arc<Mutex<Vec<serde_json::Value>>>,
    shops: Arc<Mutex<Vec<String>>>,
}

impl WebhookHandler for RecordingHandler {
    fn handle<'a>(
        &'a self,
        shop: &'a ShopDomain,
        payload: serde_json::Value,
    ) -> BoxFuture<'a, Result<(), HandlerError>> {
        let invocations = self.invocations.clone();
        let payloads = self.payloads.clone();
        let shops = self.shops.clone();
        let shop = shop.as_ref().to_string();
        Box::pin(async move {
            invocations.fetch_add(1, Ordering::SeqCst);
            payloads.lock().unwrap().push(payload);
            shops.lock().unwrap().push(shop);
            Ok(())
        })
    }
}

fn test_config() -> GatewayConfig {
    GatewayConfig::builder()
        .api_key(ApiKey::new("api-key").unwrap())
        .api_secret_key(SecretKey::new("api-secret").unwrap())
        .webhook_secret(SecretKey::new(WEBHOOK_SECRET).unwrap())
        .build()
        .unwrap()
}

fn signed_request(body: &[u8], shop: &str, topic: &str) -> WebhookRequest {
    WebhookRequest::new(
        body.to_vec(),
        Some(compute_signature_base64(body, WEBHOOK_SECRET)),
        Some(shop.to_string()),
        Some(topic.to_string()),
        Some("delivery-id-1".to_string()),
    )
}

#[tokio::test]
async fn uninstall_webhook_for_new_shop_invokes_handler_exactly_once() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let payloads = Arc::new(Mutex::new(Vec::new()));
    let shops = Arc::new(Mutex::new(Vec::new()));

    let router = WebhookRouter::builder()
        .on(
            "app/uninstalled",
            RecordingHandler {
                invocations: invocations.clone(),
                payloads: payloads.clone(),
                shops: shops.clone(),
            },
        )
        .build();

    let body = br#"{"id":4567,"name":"fresh-shop"}"#;
    let request = signed_request(body, "fresh-shop.myshopify.com", "app/uninstalled");

    let response = router.handle(&test_config(), &request).await;

    assert_eq!(response.status, 200);
    assert_eq!(response.body["success"], true);

    assert_eq!(invocations.load(Ordering::SeqCst), 1);
    assert_eq!(shops.lock().unwrap()[0], "fresh-shop.myshopify.com");
    assert_eq!(payloads.lock().unwrap()[0]["name"], "fresh-shop");
}

#[tokio::test]
async fn missing_signature_header_is_401_and_handler_never_runs() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let router = WebhookRouter::builder()
        .on(
            "app/uninstalled",
            RecordingHandler {
                invocations: invocations.clone(),
                payloads: Arc::new(Mutex::new(Vec::new())),
                shops: Arc::new(Mutex::new(Vec::new())),
            },
        )
        .build();

    let request = WebhookRequest::new(
        br#"{"id":1}"#.to_vec(),
        None,
        Some("shop.myshopify.com".to_string()),
        Some("app/uninstalled".to_string()),
        None,
    );

    let response = router.handle(&test_config(), &request).await;

    assert_eq!(response.status, 401);
    assert!(response.body["error"].is_string());
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn tampered_body_is_401() {
    let router = WebhookRouter::builder().build();

    // Signature computed over the original body, body altered in flight
    let original = br#"{"id":1}"#;
    let request = WebhookRequest::new(
        br#"{"id":2}"#.to_vec(),
        Some(compute_signature_base64(original, WEBHOOK_SECRET)),
        Some("shop.myshopify.com".to_string()),
        Some("orders/create".to_string()),
        None,
    );

    let response = router.handle(&test_config(), &request).await;
    assert_eq!(response.status, 401);
}

#[tokio::test]
async fn unknown_topic_is_acknowledged_not_rejected() {
    let router = WebhookRouter::builder().build();

    let request = signed_request(
        br#"{"id":1}"#,
        "shop.myshopify.com",
        "collections/delete",
    );
    let response = router.handle(&test_config(), &request).await;

    assert_eq!(response.status, 200);
    assert_eq!(response.body["received"], true);
}

#[tokio::test]
async fn malformed_json_is_400() {
    let router = WebhookRouter::builder().build();

    let request = signed_request(b"{not-json", "shop.myshopify.com", "orders/create");
    let response = router.handle(&test_config(), &request).await;

    assert_eq!(response.status, 400);
}

#[tokio::test]
async fn invalid_shop_domain_header_is_401() {
    let router = WebhookRouter::builder().build();

    let request = signed_request(br#"{"id":1}"#, "bad_shop!.example.com", "orders/create");
    let response = router.handle(&test_config(), &request).await;

    assert_eq!(response.status, 401);
}

#[tokio::test]
async fn missing_webhook_secret_is_a_distinct_500() {
    let router = WebhookRouter::builder().build();
    let config = GatewayConfig::builder()
        .api_key(ApiKey::new("api-key").unwrap())
        .api_secret_key(SecretKey::new("api-secret").unwrap())
        .build()
        .unwrap();

    let request = signed_request(br#"{"id":1}"#, "shop.myshopify.com", "orders/create");
    let response = router.handle(&config, &request).await;

    // Operator error, not an authentication failure
    assert_eq!(response.status, 500);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("not configured"));
}

#[tokio::test]
async fn topic_rate_limit_is_enforced_per_shop() {
    let router = WebhookRouter::builder()
        .topic_limit("app/uninstalled", RateLimitPolicy::new(3, 60_000))
        .build();
    let config = test_config();

    let request = signed_request(br#"{"id":1}"#, "busy-shop.myshopify.com", "app/uninstalled");

    for _ in 0..3 {
        assert_eq!(router.handle(&config, &request).await.status, 200);
    }

    let denied = router.handle(&config, &request).await;
    assert_eq!(denied.status, 429);

    // A different shop is unaffected
    let other = signed_request(br#"{"id":1}"#, "calm-shop.myshopify.com", "app/uninstalled");
    assert_eq!(router.handle(&config, &other).await.status, 200);
}

#[tokio::test]
async fn redelivery_of_the_same_webhook_runs_the_handler_again() {
    // Delivery is at-least-once; idempotency lives in the handler, not here
    let invocations = Arc::new(AtomicUsize::new(0));
    let router = WebhookRouter::builder()
        .on(
            "orders/updated",
            RecordingHandler {
                invocations: invocations.clone(),
                payloads: Arc::new(Mutex::new(Vec::new())),
                shops: Arc::new(Mutex::new(Vec::new())),
            },
        )
        .build();
    let config = test_config();

    let request = signed_request(br#"{"id":9}"#, "shop.myshopify.com", "orders/updated");
    assert_eq!(router.handle(&config, &request).await.status, 200);
    assert_eq!(router.handle(&config, &request).await.status, 200);

    assert_eq!(invocations.load(Ordering::SeqCst), 2);
}
