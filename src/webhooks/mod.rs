//! Webhook ingestion: verification, admission control, and dispatch.
//!
//! This module receives the asynchronous, at-least-once HTTP callbacks
//! Shopify sends when remote state changes (orders, products, app
//! uninstalls) and routes them to topic-keyed handlers after a fixed gate
//! sequence:
//!
//! 1. Required headers present
//! 2. Raw-body HMAC signature valid
//! 3. Per-(shop, topic) rate limit not exceeded
//! 4. Body parses as JSON
//!
//! See [`WebhookRouter`] for the gate semantics and
//! [`verification`](self::verification) for the signature primitives.
//!
//! # Example
//!
//! ```rust,ignore
//! use biolink_gateway::webhooks::{WebhookRouter, WebhookRequest};
//!
//! let router = WebhookRouter::builder()
//!     .on("app/uninstalled", UninstallHandler { db })
//!     .on("orders/updated", OrderSyncHandler { db })
//!     .build();
//!
//! // In the HTTP layer, per request:
//! let request = WebhookRequest::new(body, hmac, shop, topic, webhook_id);
//! let response = router.handle(&config, &request).await;
//! // write response.status + response.body
//! ```

mod errors;
mod router;
mod types;
pub mod verification;

pub use errors::WebhookError;
pub use router::{
    WebhookRouter, WebhookRouterBuilder, DEFAULT_TOPIC_LIMIT, UNINSTALL_TOPIC_LIMIT,
};
pub use types::{BoxFuture, HandlerError, WebhookHandler, WebhookResponse};
pub use verification::{
    verify_hmac, verify_webhook, WebhookContext, WebhookRequest, HEADER_HMAC, HEADER_SHOP_DOMAIN,
    HEADER_TOPIC, HEADER_WEBHOOK_ID,
};
