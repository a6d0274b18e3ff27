//! Authentication types carried by credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role name granted full access.
pub const ROLE_ADMIN: &str = "admin";

/// Role name for regular staff.
pub const ROLE_USER: &str = "user";

/// Purpose of single-use password reset tokens.
pub const PURPOSE_PASSWORD_RESET: &str = "password_reset";

/// JWT claims for access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// User email.
    pub email: String,
    /// User role.
    pub role: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
    /// Restricts the token to one flow. Access tokens carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// Token id for single-use tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<Uuid>,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: Uuid, email: &str, role: &str, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            email: email.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            purpose: None,
            jti: None,
        }
    }

    /// Restricts the claims to `purpose` and tags them with a token id.
    #[must_use]
    pub fn for_purpose(mut self, purpose: &str, token_id: Uuid) -> Self {
        self.purpose = Some(purpose.to_string());
        self.jti = Some(token_id);
        self
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Returns true if the role grants administrative access.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Returns true for plain access tokens.
    #[must_use]
    pub const fn is_access(&self) -> bool {
        self.purpose.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_access_claims_omit_purpose() {
        let claims = Claims::new(Uuid::new_v4(), "a@b.c", ROLE_USER, Utc::now());
        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("purpose").is_none());
        assert!(json.get("jti").is_none());
        assert!(claims.is_access());
    }

    #[test]
    fn test_purpose_claims_round_trip() {
        let id = Uuid::new_v4();
        let claims = Claims::new(Uuid::new_v4(), "a@b.c", ROLE_USER, Utc::now() + Duration::hours(1))
            .for_purpose(PURPOSE_PASSWORD_RESET, id);
        let json = serde_json::to_string(&claims).unwrap();
        let back: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(back.purpose.as_deref(), Some(PURPOSE_PASSWORD_RESET));
        assert_eq!(back.jti, Some(id));
        assert!(!back.is_access());
    }
}
