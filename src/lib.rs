//! # Biolink Gateway
//!
//! The security pipeline of the Biolink link-in-bio commerce platform: the
//! Shopify OAuth installation flow, signed session tokens, webhook signature
//! verification and routing, and the fixed-window admission control gating
//! all of it.
//!
//! ## Overview
//!
//! This crate provides:
//! - Instance-based configuration via [`GatewayConfig`] (no global state)
//! - Validated newtypes for credentials and domain values
//! - OAuth 2.0 authorization code flow via [`auth::oauth`]
//! - A signed session-token codec via [`auth::session_token`]
//! - Webhook verification and topic-keyed dispatch via [`webhooks`]
//! - Fixed-window rate limiting via [`limiter`]
//! - `Set-Cookie` / redirect value types for the host HTTP layer via
//!   [`http`]
//!
//! ## Install Flow
//!
//! ```rust,ignore
//! use biolink_gateway::{GatewayConfig, ShopDomain};
//! use biolink_gateway::auth::oauth::{begin_auth, validate_auth_callback};
//! use biolink_gateway::http::{complete_callback, cookies::oauth_flow_cookies};
//!
//! // Step 1: Configure once at process start
//! let config = GatewayConfig::from_env()?;
//!
//! // Step 2: Begin authorization
//! let shop = ShopDomain::new("example-shop")?;
//! let begin = begin_auth(&config, &shop, "/auth/callback", None)?;
//! // Set oauth_flow_cookies(begin.state.as_ref(), shop.as_ref(), true)
//! // and redirect to begin.auth_url
//!
//! // Step 3: Handle the callback
//! let result = validate_auth_callback(&config, &query, &cookies).await;
//! let outcome = complete_callback(&config, result, false, true);
//! // Apply outcome.set_cookies / outcome.clear_cookies, redirect to
//! // outcome.redirect_to
//! ```
//!
//! ## Webhook Ingestion
//!
//! ```rust,ignore
//! use biolink_gateway::webhooks::{WebhookRouter, WebhookRequest};
//!
//! let router = WebhookRouter::builder()
//!     .on("app/uninstalled", UninstallHandler { db })
//!     .build();
//!
//! // Per request, from the raw body and headers:
//! let response = router.handle(&config, &request).await;
//! ```
//!
//! ## Verifying Requests
//!
//! Every request after install carries the session cookie; decode it
//! statelessly:
//!
//! ```rust,ignore
//! use biolink_gateway::auth::session_token::decode_session_token;
//!
//! let Some(session) = decode_session_token(&config, cookie_value) else {
//!     // expired, tampered, or absent: re-run the install flow
//!     return redirect_to_login();
//! };
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: Configuration is instance-based and passed
//!   explicitly
//! - **Fail-fast validation**: All newtypes validate on construction
//! - **Constant-time comparisons**: signature and state checks never leak
//!   timing
//! - **Thread-safe**: All types are `Send + Sync`
//! - **Async-first**: Designed for use with the Tokio runtime

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod limiter;
pub mod webhooks;

// Re-export public types at crate root for convenience
pub use auth::{AccessTokenResponse, AssociatedUser, AuthScopes, Session};
pub use config::{
    is_valid_shop, ApiKey, GatewayConfig, GatewayConfigBuilder, HostUrl, SecretKey, ShopDomain,
};
pub use error::ConfigError;

// Re-export OAuth types for convenience
pub use auth::oauth::{
    begin_auth, validate_auth_callback, BeginAuthResult, CallbackCookies, CallbackQuery,
    OAuthError, StateParam,
};

// Re-export session-token codec
pub use auth::session_token::{decode_session_token, encode_session_token, SessionTokenError};

// Re-export the webhook surface
pub use webhooks::{WebhookHandler, WebhookRequest, WebhookResponse, WebhookRouter};
