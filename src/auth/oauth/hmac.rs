//! HMAC computation and validation for OAuth callbacks and webhooks.
//!
//! Two verification modes share one primitive:
//!
//! - **Query-string HMAC** (hex output): the OAuth callback's parameters,
//!   minus the signature itself, joined as `key=value` pairs in
//!   lexicographic key order.
//! - **Body HMAC** (base64 output): the exact raw bytes of a webhook body.
//!   The raw, unparsed body must be used because re-serializing JSON can
//!   alter byte-for-byte content and invalidate legitimate signatures.
//!
//! # Security
//!
//! All HMAC comparisons use constant-time comparison to prevent timing
//! side-channels from leaking partial signature matches. Query-string
//! validation supports key rotation by falling back to an old secret key if
//! validation with the primary key fails.
//!
//! # Example
//!
//! ```rust
//! use biolink_gateway::auth::oauth::hmac::{compute_signature, compute_signature_base64};
//!
//! // Hex-encoded signature for OAuth callbacks
//! let message = "code=abc123&shop=example.myshopify.com&state=xyz";
//! let signature = compute_signature(message, "my-api-secret");
//! assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
//!
//! // Base64-encoded signature for webhook bodies
//! let webhook_sig = compute_signature_base64(b"webhook payload", "my-api-secret");
//! assert_eq!(webhook_sig.len(), 44); // Base64 of 32 bytes
//! ```

use base64::prelude::*;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::auth::oauth::CallbackQuery;
use crate::config::GatewayConfig;

type HmacSha256 = Hmac<Sha256>;

/// Computes an HMAC-SHA256 signature for the given message.
///
/// The signature is returned as a lowercase hexadecimal string, matching the
/// format Shopify uses for OAuth callback `hmac` parameters.
///
/// # Note
///
/// This function uses `expect()` internally but this will never panic because
/// HMAC-SHA256 accepts keys of any length.
///
/// # Example
///
/// ```rust
/// use biolink_gateway::auth::oauth::hmac::compute_signature;
///
/// let sig = compute_signature("test-message", "secret-key");
/// assert_eq!(sig.len(), 64); // SHA256 produces 32 bytes = 64 hex chars
/// ```
#[must_use]
#[allow(clippy::missing_panics_doc)] // HMAC accepts any key size, so this never panics
pub fn compute_signature(message: &str, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    let result = mac.finalize();
    hex::encode(result.into_bytes())
}

/// Computes an HMAC-SHA256 signature for raw bytes, returning base64 output.
///
/// This is the webhook-body signature format: Shopify sends base64-encoded
/// HMAC signatures in the `X-Shopify-Hmac-SHA256` header.
///
/// The message is accepted as raw bytes (not a string) to preserve the exact
/// payload without UTF-8 interpretation.
///
/// # Example
///
/// ```rust
/// use biolink_gateway::auth::oauth::hmac::compute_signature_base64;
///
/// let sig = compute_signature_base64(b"webhook payload", "secret-key");
/// assert_eq!(sig.len(), 44); // SHA256 produces 32 bytes = 44 base64 chars
/// ```
#[must_use]
#[allow(clippy::missing_panics_doc)] // HMAC accepts any key size, so this never panics
pub fn compute_signature_base64(message: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message);
    let result = mac.finalize();
    BASE64_STANDARD.encode(result.into_bytes())
}

/// Performs constant-time comparison of two strings.
///
/// Used for security-sensitive comparisons like HMAC verification and state
/// parameter validation to prevent timing attacks.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    // ConstantTimeEq handles different lengths securely
    a_bytes.ct_eq(b_bytes).into()
}

/// Validates the HMAC signature of an OAuth callback.
///
/// Computes the expected signature over the callback's signable string (all
/// parameters except `hmac` and `signature`, sorted lexicographically) and
/// compares it to the supplied `hmac` value in constant time.
///
/// # Key Rotation Support
///
/// If the primary `api_secret_key` fails validation, the function tries
/// `old_api_secret_key` if configured, so in-flight OAuth flows survive key
/// rotation.
///
/// # Returns
///
/// `true` if the HMAC is valid, `false` otherwise (including when the query
/// carries no `hmac` parameter at all).
#[must_use]
pub fn validate_callback_hmac(query: &CallbackQuery, config: &GatewayConfig) -> bool {
    let Some(received_hmac) = query.hmac() else {
        return false;
    };
    let signable = query.to_signable_string();

    // Try primary secret key first
    let computed = compute_signature(&signable, config.api_secret_key().as_ref());
    if constant_time_compare(&computed, received_hmac) {
        return true;
    }

    // Fall back to old secret key if configured
    if let Some(old_secret) = config.old_api_secret_key() {
        let computed_old = compute_signature(&signable, old_secret.as_ref());
        if constant_time_compare(&computed_old, received_hmac) {
            return true;
        }
    }

    false
}

// Internal hex encoding since we don't want to add another dependency
mod hex {
    const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";

    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        let bytes = bytes.as_ref();
        let mut result = String::with_capacity(bytes.len() * 2);
        for &byte in bytes {
            result.push(HEX_CHARS[(byte >> 4) as usize] as char);
            result.push(HEX_CHARS[(byte & 0x0f) as usize] as char);
        }
        result
    }
}
