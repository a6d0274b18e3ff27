//! Registration, login, password recovery and user administration.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tally_shared::auth::PURPOSE_PASSWORD_RESET;
use tally_shared::types::UserId;
use tally_shared::{Claims, JwtService};
use tracing::{info, warn};
use uuid::Uuid;

use super::actor::Actor;
use super::error::AuthError;
use super::password::{hash_password, validate_password, verify_password};
use super::user::{User, UserRole, UserView, looks_like_email, normalize_email};
use crate::notification::{NotificationKind, Notifier};
use crate::store::{StoreError, UserStore};

/// Lifetime of a password reset token.
pub const RESET_TOKEN_MINUTES: i64 = 60;

/// A successful login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    /// Bearer token.
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    /// The logged-in user.
    pub user: UserView,
}

/// A freshly issued password reset token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordReset {
    /// Account the token resets.
    pub user_id: UserId,
    /// Single-use bearer token for `reset_password`.
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

/// User accounts and credentials.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt: Arc<JwtService>,
    notifier: Notifier,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("jwt", &self.jwt)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    /// Creates the service.
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, jwt: Arc<JwtService>, notifier: Notifier) -> Self {
        Self {
            users,
            jwt,
            notifier,
        }
    }

    /// Registers a regular user.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEmail`, `BlankName`, a password policy error or
    /// `EmailTaken`.
    pub async fn register(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<UserView, AuthError> {
        self.create_user(email, name, password, UserRole::User).await
    }

    /// Creates a user with an explicit role.
    ///
    /// # Errors
    ///
    /// Same as [`Self::register`].
    pub async fn create_user(
        &self,
        email: &str,
        name: &str,
        password: &str,
        role: UserRole,
    ) -> Result<UserView, AuthError> {
        if !looks_like_email(email) {
            return Err(AuthError::InvalidEmail);
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::BlankName);
        }
        validate_password(password)?;

        let user = User {
            id: UserId::new(),
            email: normalize_email(email),
            name: name.to_string(),
            password_hash: hash_password(password)?,
            role,
            active: true,
            created_at: Utc::now(),
            last_login_at: None,
            reset_token_id: None,
        };
        match self.users.insert_user(&user).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => return Err(AuthError::EmailTaken),
            Err(e) => return Err(e.into()),
        }

        info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(UserView::from(&user))
    }

    /// Verifies credentials and issues a token.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` for an unknown email or wrong password
    /// and `Inactive` for deactivated accounts.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError> {
        let Some(mut user) = self.users.find_user_by_email(&normalize_email(email)).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "failed login attempt");
            return Err(AuthError::InvalidCredentials);
        }
        if !user.active {
            return Err(AuthError::Inactive);
        }

        let token = self.jwt.generate_access_token(
            user.id.into_inner(),
            &user.email,
            user.role.as_str(),
        )?;

        user.last_login_at = Some(Utc::now());
        if let Err(e) = self.users.update_user(&user).await {
            warn!(user_id = %user.id, error = %e, "failed to record last login");
        }

        info!(user_id = %user.id, "user logged in");
        Ok(LoginResult {
            token,
            expires_in: self.jwt.access_token_expires_in(),
            user: UserView::from(&user),
        })
    }

    /// Loads the current user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` for unknown ids.
    pub async fn me(&self, user_id: UserId) -> Result<UserView, AuthError> {
        self.users
            .get_user(user_id)
            .await?
            .map(|u| UserView::from(&u))
            .ok_or(AuthError::UserNotFound(user_id))
    }

    /// Replaces a password after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` if `current` is wrong, or a password
    /// policy error for `new`.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current: &str,
        new: &str,
    ) -> Result<(), AuthError> {
        let mut user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound(user_id))?;
        if !verify_password(current, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }
        validate_password(new)?;

        user.password_hash = hash_password(new)?;
        user.reset_token_id = None;
        if !self.users.update_user(&user).await? {
            return Err(AuthError::UserNotFound(user_id));
        }

        info!(user_id = %user_id, "password changed");
        Ok(())
    }

    /// Re-checks verified claims against the stored account, so that
    /// deactivation and role changes apply to tokens already issued.
    /// Returns the claims with the current email and role.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` if the account no longer exists and
    /// `Inactive` if it was deactivated.
    pub async fn current_claims(&self, claims: &Claims) -> Result<Claims, AuthError> {
        let id = UserId::from_uuid(claims.user_id());
        let user = self
            .users
            .get_user(id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if !user.active {
            return Err(AuthError::Inactive);
        }
        Ok(Claims {
            email: user.email,
            role: user.role.as_str().to_string(),
            ..claims.clone()
        })
    }

    // ========== Password Recovery ==========

    /// Records a password recovery request and notifies every active admin,
    /// who can then issue a reset token with [`Self::issue_reset_token`].
    ///
    /// Unknown and inactive emails succeed silently so the endpoint cannot
    /// be used to discover which accounts exist.
    ///
    /// # Errors
    ///
    /// Returns store errors only.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let email = normalize_email(email);
        let Some(user) = self.users.find_user_by_email(&email).await? else {
            info!("password recovery requested for unknown email");
            return Ok(());
        };
        if !user.active {
            info!(user_id = %user.id, "password recovery requested for inactive user");
            return Ok(());
        }

        let admins = self.users.list_users().await?;
        for admin in admins.iter().filter(|u| u.active && u.role == UserRole::Admin) {
            self.notifier
                .notify(
                    admin.id,
                    NotificationKind::PasswordRecoveryRequested,
                    format!("{} asked to recover their password", user.email),
                    json!({ "userId": user.id, "email": user.email }),
                )
                .await;
        }

        info!(user_id = %user.id, "password recovery requested");
        Ok(())
    }

    /// Issues a single-use reset token for a user. Any earlier token for
    /// the same user stops working.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` or `Inactive`.
    pub async fn issue_reset_token(
        &self,
        actor: &Actor,
        user_id: UserId,
    ) -> Result<PasswordReset, AuthError> {
        let mut user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound(user_id))?;
        if !user.active {
            return Err(AuthError::Inactive);
        }

        let token_id = Uuid::new_v4();
        let token = self.jwt.generate_purpose_token(
            user.id.into_inner(),
            &user.email,
            user.role.as_str(),
            PURPOSE_PASSWORD_RESET,
            token_id,
            RESET_TOKEN_MINUTES,
        )?;
        user.reset_token_id = Some(token_id);
        if !self.users.update_user(&user).await? {
            return Err(AuthError::UserNotFound(user_id));
        }

        info!(user_id = %user_id, issued_by = %actor.user_id, "password reset token issued");
        Ok(PasswordReset {
            user_id,
            token,
            expires_in: RESET_TOKEN_MINUTES * 60,
        })
    }

    /// Replaces a password using a reset token. The token is consumed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidResetToken` for bad, expired, used or superseded
    /// tokens, `Inactive` for deactivated accounts, or a password policy
    /// error for `new`.
    pub async fn reset_password(&self, token: &str, new: &str) -> Result<(), AuthError> {
        let claims = self
            .jwt
            .validate_purpose_token(token, PURPOSE_PASSWORD_RESET)
            .map_err(|e| {
                info!(error = %e, "rejected password reset token");
                AuthError::InvalidResetToken
            })?;
        let token_id = claims.jti.ok_or(AuthError::InvalidResetToken)?;
        let user_id = UserId::from_uuid(claims.user_id());
        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;
        if user.reset_token_id != Some(token_id) {
            return Err(AuthError::InvalidResetToken);
        }
        if !user.active {
            return Err(AuthError::Inactive);
        }
        validate_password(new)?;

        let hash = hash_password(new)?;
        if !self.users.consume_reset_token(user_id, token_id, &hash).await? {
            return Err(AuthError::InvalidResetToken);
        }

        info!(user_id = %user_id, "password reset");
        Ok(())
    }

    // ========== User Administration ==========

    /// Lists every account, oldest first.
    ///
    /// # Errors
    ///
    /// Returns store errors only.
    pub async fn list_users(&self) -> Result<Vec<UserView>, AuthError> {
        let users = self.users.list_users().await?;
        Ok(users.iter().map(UserView::from).collect())
    }

    /// Activates or deactivates an account. Deactivation also voids any
    /// outstanding reset token.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound`, or `SelfLockout` when an actor deactivates
    /// their own account.
    pub async fn set_active(
        &self,
        actor: &Actor,
        user_id: UserId,
        active: bool,
    ) -> Result<UserView, AuthError> {
        if !active && actor.user_id == user_id {
            return Err(AuthError::SelfLockout);
        }
        let user = self
            .update(user_id, |user| {
                user.active = active;
                if !active {
                    user.reset_token_id = None;
                }
            })
            .await?;

        info!(user_id = %user_id, active, changed_by = %actor.user_id, "user activation changed");
        Ok(user)
    }

    /// Changes the role of an account.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound`, or `SelfLockout` when an admin demotes
    /// themselves.
    pub async fn set_role(
        &self,
        actor: &Actor,
        user_id: UserId,
        role: UserRole,
    ) -> Result<UserView, AuthError> {
        if role != UserRole::Admin && actor.user_id == user_id {
            return Err(AuthError::SelfLockout);
        }
        let user = self.update(user_id, |user| user.role = role).await?;

        info!(user_id = %user_id, role = %role, changed_by = %actor.user_id, "user role changed");
        Ok(user)
    }

    async fn update(
        &self,
        user_id: UserId,
        change: impl FnOnce(&mut User),
    ) -> Result<UserView, AuthError> {
        let mut user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound(user_id))?;
        change(&mut user);
        if !self.users.update_user(&user).await? {
            return Err(AuthError::UserNotFound(user_id));
        }
        Ok(UserView::from(&user))
    }
}
