//! OAuth scope handling.
//!
//! This module provides the [`AuthScopes`] type for managing the set of
//! permission scopes granted to a session.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// A set of OAuth scopes.
///
/// Parsing deduplicates and trims whitespace; `Display` renders the scopes
/// as a canonical comma-separated string in sorted order.
///
/// # Serialization
///
/// `AuthScopes` serializes to and deserializes from a comma-separated string
/// for compact JSON representation:
///
/// ```rust
/// use biolink_gateway::AuthScopes;
///
/// let scopes: AuthScopes = "write_products,read_orders".parse().unwrap();
/// let json = serde_json::to_string(&scopes).unwrap();
/// assert_eq!(json, "\"read_orders,write_products\"");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AuthScopes {
    scopes: HashSet<String>,
}

impl AuthScopes {
    /// Creates an empty scope set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the scope set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Returns the number of scopes in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Returns `true` if this scope set contains the given scope.
    #[must_use]
    pub fn contains(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    /// Returns `true` if this scope set covers all scopes in `other`.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        other.scopes.iter().all(|s| self.scopes.contains(s))
    }

    /// Returns an iterator over the scopes.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }
}

impl FromStr for AuthScopes {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut scopes = HashSet::new();
        for raw in s.split(',') {
            let scope = raw.trim();
            if scope.is_empty() {
                continue;
            }
            if scope.contains(char::is_whitespace) {
                return Err(ConfigError::InvalidScopes {
                    reason: format!("scope '{scope}' contains whitespace"),
                });
            }
            scopes.insert(scope.to_string());
        }
        Ok(Self { scopes })
    }
}

impl fmt::Display for AuthScopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sorted: Vec<&str> = self.scopes.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        f.write_str(&sorted.join(","))
    }
}

impl Serialize for AuthScopes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AuthScopes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
