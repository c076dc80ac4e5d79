//! Authentication for the gateway: sessions, scopes, OAuth, session tokens.
//!
//! This module provides:
//!
//! - [`Session`]: an authenticated merchant connection
//! - [`AssociatedUser`]: the admin user attached to an online session
//! - [`AuthScopes`]: a set of granted permission scopes
//! - [`oauth`]: the OAuth authorization code flow (install)
//! - [`session_token`]: the signed session-token codec used on every
//!   subsequent request

mod associated_user;
mod scopes;
mod session;

pub mod oauth;
pub mod session_token;

pub use associated_user::AssociatedUser;
pub use scopes::AuthScopes;
pub use session::{AccessTokenResponse, Session};
