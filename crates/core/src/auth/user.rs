//! User accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_shared::auth::{ROLE_ADMIN, ROLE_USER};
use tally_shared::types::UserId;
use uuid::Uuid;

/// User roles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full access, including settings and manual journal entries.
    Admin,
    /// Day-to-day quoting, invoicing and payment registration.
    #[default]
    User,
}

impl UserRole {
    /// Returns the role name used in credentials and storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => ROLE_ADMIN,
            Self::User => ROLE_USER,
        }
    }

    /// Parses a stored role name. Unknown names get the least privilege.
    #[must_use]
    pub fn parse(role: &str) -> Self {
        if role.eq_ignore_ascii_case(ROLE_ADMIN) {
            Self::Admin
        } else {
            Self::User
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// User ID.
    pub id: UserId,
    /// Lowercased, unique email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Argon2 PHC hash.
    pub password_hash: String,
    /// Role.
    pub role: UserRole,
    /// Inactive users cannot log in.
    pub active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last successful login.
    pub last_login_at: Option<DateTime<Utc>>,
    /// Id of the one outstanding password reset token, if any.
    pub reset_token_id: Option<Uuid>,
}

/// Public projection of a user, without the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    /// User ID.
    pub id: UserId,
    /// Email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Role.
    pub role: UserRole,
    /// Whether the account is active.
    pub active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last successful login.
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            active: user.active,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// Normalizes an email for storage and lookup.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimal shape check for an email address.
#[must_use]
pub fn looks_like_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_role_parse() {
        assert_eq!(UserRole::parse("admin"), UserRole::Admin);
        assert_eq!(UserRole::parse("ADMIN"), UserRole::Admin);
        assert_eq!(UserRole::parse("user"), UserRole::User);
        assert_eq!(UserRole::parse("owner"), UserRole::User);
    }

    #[rstest]
    #[case("ana@example.com", true)]
    #[case(" ana@example.com ", true)]
    #[case("ana.example.com", false)]
    #[case("@example.com", false)]
    #[case("ana@localhost", false)]
    #[case("ana@example.", false)]
    fn test_email_shape(#[case] email: &str, #[case] expected: bool) {
        assert_eq!(looks_like_email(email), expected);
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ana@Example.COM "), "ana@example.com");
    }
}
