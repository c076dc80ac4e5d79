//! Handler and response types for the webhook router.

use std::future::Future;
use std::pin::Pin;

use crate::config::ShopDomain;

/// A boxed future, as returned by [`WebhookHandler::handle`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The error type handlers report failures with.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// A handler invoked for a verified, parsed webhook delivery.
///
/// Handlers must be idempotent-safe against at-least-once delivery: the
/// upstream sender redelivers on timeout, and no ordering is guaranteed
/// between deliveries for different topics or shops.
///
/// # Example
///
/// ```rust
/// use biolink_gateway::webhooks::{WebhookHandler, BoxFuture, HandlerError};
/// use biolink_gateway::ShopDomain;
///
/// struct UninstallHandler;
///
/// impl WebhookHandler for UninstallHandler {
///     fn handle<'a>(
///         &'a self,
///         shop: &'a ShopDomain,
///         _payload: serde_json::Value,
///     ) -> BoxFuture<'a, Result<(), HandlerError>> {
///         Box::pin(async move {
///             // mark the shop's pages as uninstalled
///             let _ = shop;
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait WebhookHandler: Send + Sync {
    /// Handles one delivery for `shop` with the parsed JSON body.
    fn handle<'a>(
        &'a self,
        shop: &'a ShopDomain,
        payload: serde_json::Value,
    ) -> BoxFuture<'a, Result<(), HandlerError>>;
}

/// The terminal response for one webhook request.
///
/// Every gate failure and every dispatch outcome maps to exactly one of
/// these; the host HTTP layer writes `status` and serializes `body` as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    /// HTTP status code to return.
    pub status: u16,
    /// JSON body to return.
    pub body: serde_json::Value,
}

impl WebhookResponse {
    /// 200 response for a handled topic.
    #[must_use]
    pub fn success() -> Self {
        Self {
            status: 200,
            body: serde_json::json!({ "success": true }),
        }
    }

    /// 200 acknowledgement for a topic this deployment does not handle.
    ///
    /// Unknown topics are acknowledged rather than rejected so the sender
    /// does not retry indefinitely.
    #[must_use]
    pub fn received() -> Self {
        Self {
            status: 200,
            body: serde_json::json!({ "received": true }),
        }
    }

    /// Error response with the given status and message.
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: serde_json::json!({ "error": message }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_shape() {
        let response = WebhookResponse::success();
        assert_eq!(response.status, 200);
        assert_eq!(response.body["success"], true);
    }

    #[test]
    fn test_received_shape() {
        let response = WebhookResponse::received();
        assert_eq!(response.status, 200);
        assert_eq!(response.body["received"], true);
    }

    #[test]
    fn test_error_shape() {
        let response = WebhookResponse::error(401, "Webhook signature verification failed");
        assert_eq!(response.status, 401);
        assert_eq!(
            response.body["error"],
            "Webhook signature verification failed"
        );
    }
}
