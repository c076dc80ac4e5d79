//! Webhook-specific error types.
//!
//! Each variant corresponds to one rejection gate of the router, and
//! [`WebhookError::status`] maps it onto the response taxonomy: malformed
//! input is 400, authentication failures are 401, admission-control denials
//! are 429, and configuration or handler failures are 500.

use thiserror::Error;

/// Error type for webhook verification and dispatch.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// A required header is absent.
    #[error("Missing required webhook header: {name}")]
    MissingHeader {
        /// The canonical name of the missing header.
        name: &'static str,
    },

    /// The shop-domain header is present but not a valid shop domain.
    #[error("Invalid shop domain in webhook headers: {domain}")]
    InvalidShopDomain {
        /// The rejected header value.
        domain: String,
    },

    /// Webhook signature verification failed.
    ///
    /// The HMAC in the request header does not match the signature computed
    /// over the raw body. The message is intentionally generic to avoid
    /// leaking security details.
    #[error("Webhook signature verification failed")]
    InvalidSignature,

    /// The per-(shop, topic) rate limit was exceeded.
    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited {
        /// Seconds until the current window resets.
        retry_after_secs: u64,
    },

    /// The request body is not valid JSON.
    #[error("Invalid webhook payload: {message}")]
    InvalidPayload {
        /// The parse failure detail.
        message: String,
    },

    /// No webhook signing secret is configured.
    ///
    /// This is an operator-facing configuration error, deliberately
    /// distinct from [`WebhookError::InvalidSignature`].
    #[error("Webhook secret is not configured")]
    MissingWebhookSecret,

    /// A registered handler failed.
    #[error("Webhook handler for '{topic}' failed: {message}")]
    HandlerFailed {
        /// The topic whose handler failed.
        topic: String,
        /// The handler's error rendering.
        message: String,
    },
}

impl WebhookError {
    /// The HTTP status this rejection maps to.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::InvalidPayload { .. } => 400,
            Self::MissingHeader { .. } | Self::InvalidShopDomain { .. } | Self::InvalidSignature => {
                401
            }
            Self::RateLimited { .. } => 429,
            Self::MissingWebhookSecret | Self::HandlerFailed { .. } => 500,
        }
    }
}

// Verify WebhookError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WebhookError>();
};
