//! Associated user types for online sessions.
//!
//! When a merchant installs the app with an online (user-specific) token,
//! the token-exchange response includes information about the admin user who
//! authorized it. That record is carried on the [`Session`](crate::Session)
//! and inside session-token claims.

use serde::{Deserialize, Serialize};

/// The Shopify admin user associated with an online session.
///
/// # Example
///
/// ```rust
/// use biolink_gateway::AssociatedUser;
///
/// let user = AssociatedUser::new(
///     12345,
///     "Jane".to_string(),
///     "Doe".to_string(),
///     "jane@example.com".to_string(),
///     true, // account_owner
/// );
///
/// assert_eq!(user.id, 12345);
/// assert!(user.account_owner);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociatedUser {
    /// The Shopify user ID (numeric).
    pub id: u64,

    /// The user's first name.
    pub first_name: String,

    /// The user's last name.
    pub last_name: String,

    /// The user's email address.
    pub email: String,

    /// Whether the user is the account owner.
    pub account_owner: bool,
}

impl AssociatedUser {
    /// Creates a new `AssociatedUser`.
    #[must_use]
    pub const fn new(
        id: u64,
        first_name: String,
        last_name: String,
        email: String,
        account_owner: bool,
    ) -> Self {
        Self {
            id,
            first_name,
            last_name,
            email,
            account_owner,
        }
    }
}

// Verify AssociatedUser is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AssociatedUser>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_round_trip() {
        let user = AssociatedUser::new(
            42,
            "Jane".to_string(),
            "Doe".to_string(),
            "jane@example.com".to_string(),
            false,
        );

        let json = serde_json::to_string(&user).unwrap();
        let restored: AssociatedUser = serde_json::from_str(&json).unwrap();
        assert_eq!(user, restored);
    }

    #[test]
    fn test_deserializes_from_token_exchange_shape() {
        // Field subset of Shopify's associated_user object
        let json = r#"{
            "id": 902541635,
            "first_name": "John",
            "last_name": "Smith",
            "email": "john@example.com",
            "account_owner": true
        }"#;

        let user: AssociatedUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, 902_541_635);
        assert!(user.account_owner);
    }
}
