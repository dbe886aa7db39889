//! User data models.

use rand::Rng;
use rand_distr::Alphanumeric;
use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct AuthTokenValue(pub String);

impl AuthTokenValue {
    pub fn generate() -> AuthTokenValue {
        let value: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(64)
            .map(char::from)
            .collect();
        AuthTokenValue(value)
    }
}

/// Session token provisioned when the external identity provider completes a
/// sign-in. The server only checks tokens, it never issues credentials.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct AuthToken {
    pub user_id: usize,
    pub value: AuthTokenValue,
    /// Unix timestamp of token creation.
    pub created: i64,
    /// Unix timestamp of the token's last use, if any.
    pub last_used: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Admin,
    Regular,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::Regular => "Regular",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(UserRole::Admin),
            "regular" => Some(UserRole::Regular),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_values_are_long_and_distinct() {
        let a = AuthTokenValue::generate();
        let b = AuthTokenValue::generate();
        assert_eq!(a.0.len(), 64);
        assert_ne!(a, b);
    }

    #[test]
    fn role_string_roundtrip() {
        for role in [UserRole::Admin, UserRole::Regular] {
            assert_eq!(UserRole::from_str(role.as_str()), Some(role));
        }
        assert_eq!(UserRole::from_str("superuser"), None);
    }
}
