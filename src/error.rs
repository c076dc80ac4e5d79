//! Configuration error types for the gateway.
//!
//! All configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation. A `ConfigError` is always operator-facing: it means
//! the process is misconfigured, and must never be conflated with a
//! client-supplied validation failure.
//!
//! # Example
//!
//! ```rust
//! use biolink_gateway::{ApiKey, ConfigError};
//!
//! let result = ApiKey::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyApiKey)));
//! ```

use thiserror::Error;

/// Errors that can occur while constructing or loading gateway configuration.
///
/// Each variant carries a clear, actionable message. Callers that translate
/// errors into HTTP responses should map every variant to a 500-class
/// response, since all of them indicate a server-side misconfiguration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// API key cannot be empty.
    #[error("API key cannot be empty. Please provide the app's Shopify API key.")]
    EmptyApiKey,

    /// A secret key cannot be empty.
    #[error("Secret key cannot be empty. Please provide a valid secret value.")]
    EmptySecretKey,

    /// Shop domain is invalid.
    #[error("Invalid shop domain '{domain}'. Expected format: 'shop-name' or 'shop-name.myshopify.com'.")]
    InvalidShopDomain {
        /// The invalid domain that was provided.
        domain: String,
    },

    /// Host URL is invalid.
    #[error("Invalid host URL '{url}'. Please provide a valid URL with scheme (e.g., 'https://admin.biolink.example').")]
    InvalidHostUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// Scopes are invalid.
    #[error("Invalid scopes: {reason}")]
    InvalidScopes {
        /// The reason the scopes are invalid.
        reason: String,
    },

    /// A required builder field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// A required environment variable is absent.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// The name of the missing variable.
        name: &'static str,
    },
}
