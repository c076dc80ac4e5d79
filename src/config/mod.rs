//! Configuration types for the gateway.
//!
//! The gateway has no global state: a [`GatewayConfig`] is constructed once
//! at process start (from explicit values or from the environment) and passed
//! by reference to every request handler. Tests substitute their own
//! instances.
//!
//! # Environment Variables
//!
//! [`GatewayConfig::from_env`] reads:
//!
//! - `BIOLINK_API_KEY` (required) - Shopify app client id
//! - `BIOLINK_API_SECRET` (required) - Shopify app client secret
//! - `BIOLINK_API_SECRET_OLD` (optional) - previous secret, for key rotation
//! - `BIOLINK_WEBHOOK_SECRET` (optional) - webhook signing secret
//! - `BIOLINK_HOST` (optional) - public base URL of the app
//! - `BIOLINK_SCOPES` (optional) - comma-separated OAuth scopes
//!
//! A missing required variable is a [`ConfigError::MissingEnvVar`], which the
//! host application must surface as an operator-facing 500, never as a
//! client validation error.
//!
//! # Example
//!
//! ```rust
//! use biolink_gateway::{GatewayConfig, ApiKey, SecretKey};
//!
//! let config = GatewayConfig::builder()
//!     .api_key(ApiKey::new("my-api-key").unwrap())
//!     .api_secret_key(SecretKey::new("my-secret").unwrap())
//!     .build()
//!     .unwrap();
//! ```

mod newtypes;

pub use newtypes::{is_valid_shop, ApiKey, HostUrl, SecretKey, ShopDomain};

use crate::auth::AuthScopes;
use crate::error::ConfigError;

/// Configuration for the gateway.
///
/// Holds the app credentials, the webhook signing secret, the public host
/// URL, and the OAuth scopes the platform requests at install time.
///
/// # Thread Safety
///
/// `GatewayConfig` is `Clone`, `Send`, and `Sync`, making it safe to share
/// across threads and async tasks.
///
/// # Key Rotation
///
/// The `old_api_secret_key` field supports seamless key rotation. When
/// validating OAuth HMAC signatures or decoding session tokens, the gateway
/// tries the primary key first, then falls back to the old key if
/// configured. This allows in-flight flows to complete during rotation.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    api_key: ApiKey,
    api_secret_key: SecretKey,
    old_api_secret_key: Option<SecretKey>,
    webhook_secret: Option<SecretKey>,
    scopes: AuthScopes,
    host: Option<HostUrl>,
}

impl GatewayConfig {
    /// Creates a new builder for constructing a `GatewayConfig`.
    #[must_use]
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::new()
    }

    /// Loads configuration from the documented environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if a required variable is
    /// absent, or a validation error if a present value is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("BIOLINK_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar {
                name: "BIOLINK_API_KEY",
            })
            .and_then(ApiKey::new)?;
        let api_secret_key = std::env::var("BIOLINK_API_SECRET")
            .map_err(|_| ConfigError::MissingEnvVar {
                name: "BIOLINK_API_SECRET",
            })
            .and_then(SecretKey::new)?;

        let mut builder = Self::builder()
            .api_key(api_key)
            .api_secret_key(api_secret_key);

        if let Ok(old) = std::env::var("BIOLINK_API_SECRET_OLD") {
            builder = builder.old_api_secret_key(SecretKey::new(old)?);
        }
        if let Ok(secret) = std::env::var("BIOLINK_WEBHOOK_SECRET") {
            builder = builder.webhook_secret(SecretKey::new(secret)?);
        }
        if let Ok(host) = std::env::var("BIOLINK_HOST") {
            builder = builder.host(HostUrl::new(host)?);
        }
        if let Ok(scopes) = std::env::var("BIOLINK_SCOPES") {
            builder = builder.scopes(scopes.parse()?);
        }

        builder.build()
    }

    /// Returns the API key.
    #[must_use]
    pub const fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Returns the API secret key.
    #[must_use]
    pub const fn api_secret_key(&self) -> &SecretKey {
        &self.api_secret_key
    }

    /// Returns the old API secret key, if configured.
    ///
    /// This is used during key rotation to validate signatures created with
    /// the previous secret key.
    #[must_use]
    pub const fn old_api_secret_key(&self) -> Option<&SecretKey> {
        self.old_api_secret_key.as_ref()
    }

    /// Returns the webhook signing secret, if configured.
    ///
    /// Webhook signature verification requires this secret; its absence is a
    /// configuration error, not an authentication failure.
    #[must_use]
    pub const fn webhook_secret(&self) -> Option<&SecretKey> {
        self.webhook_secret.as_ref()
    }

    /// Returns the OAuth scopes requested at install time.
    #[must_use]
    pub const fn scopes(&self) -> &AuthScopes {
        &self.scopes
    }

    /// Returns the public host URL, if configured.
    #[must_use]
    pub const fn host(&self) -> Option<&HostUrl> {
        self.host.as_ref()
    }
}

// Verify GatewayConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<GatewayConfig>();
};

/// Builder for constructing [`GatewayConfig`] instances.
///
/// Required fields are `api_key` and `api_secret_key`. All other fields
/// default to unset.
#[derive(Debug, Default)]
pub struct GatewayConfigBuilder {
    api_key: Option<ApiKey>,
    api_secret_key: Option<SecretKey>,
    old_api_secret_key: Option<SecretKey>,
    webhook_secret: Option<SecretKey>,
    scopes: Option<AuthScopes>,
    host: Option<HostUrl>,
}

impl GatewayConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the API secret key (required).
    #[must_use]
    pub fn api_secret_key(mut self, key: SecretKey) -> Self {
        self.api_secret_key = Some(key);
        self
    }

    /// Sets the old API secret key for key rotation support.
    #[must_use]
    pub fn old_api_secret_key(mut self, key: SecretKey) -> Self {
        self.old_api_secret_key = Some(key);
        self
    }

    /// Sets the webhook signing secret.
    #[must_use]
    pub fn webhook_secret(mut self, secret: SecretKey) -> Self {
        self.webhook_secret = Some(secret);
        self
    }

    /// Sets the OAuth scopes.
    #[must_use]
    pub fn scopes(mut self, scopes: AuthScopes) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Sets the public host URL.
    #[must_use]
    pub fn host(mut self, host: HostUrl) -> Self {
        self.host = Some(host);
        self
    }

    /// Builds the [`GatewayConfig`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `api_key` or
    /// `api_secret_key` are not set.
    pub fn build(self) -> Result<GatewayConfig, ConfigError> {
        let api_key = self
            .api_key
            .ok_or(ConfigError::MissingRequiredField { field: "api_key" })?;
        let api_secret_key = self
            .api_secret_key
            .ok_or(ConfigError::MissingRequiredField {
                field: "api_secret_key",
            })?;

        Ok(GatewayConfig {
            api_key,
            api_secret_key,
            old_api_secret_key: self.old_api_secret_key,
            webhook_secret: self.webhook_secret,
            scopes: self.scopes.unwrap_or_default(),
            host: self.host,
        })
    }
}
