//! The authenticated caller of a core operation.

use tally_shared::Claims;
use tally_shared::types::UserId;

use super::user::UserRole;

/// Verified identity attached to a request by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// User ID.
    pub user_id: UserId,
    /// User email.
    pub email: String,
    /// User role.
    pub role: UserRole,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub fn new(user_id: UserId, email: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id,
            email: email.into(),
            role,
        }
    }

    /// Returns true if the actor may change settings and post journal entries.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }
}

impl From<&Claims> for Actor {
    fn from(claims: &Claims) -> Self {
        Self {
            user_id: UserId::from_uuid(claims.sub),
            email: claims.email.clone(),
            role: UserRole::parse(&claims.role),
        }
    }
}
