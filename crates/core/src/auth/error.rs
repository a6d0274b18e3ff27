//! Authentication error types.

use tally_shared::AppError;
use tally_shared::jwt::JwtError;
use tally_shared::types::UserId;
use thiserror::Error;

use super::password::PasswordError;
use crate::store::StoreError;

/// Errors that can occur during registration, login and password changes.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email is malformed.
    #[error("a valid email is required")]
    InvalidEmail,

    /// Display name is blank.
    #[error("name is required")]
    BlankName,

    /// Email already registered.
    #[error("email is already registered")]
    EmailTaken,

    /// Unknown email or wrong password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Account is deactivated.
    #[error("account is inactive")]
    Inactive,

    /// User not found.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// Reset token is malformed, expired, already used or superseded.
    #[error("password reset token is invalid or expired")]
    InvalidResetToken,

    /// Admins cannot deactivate or demote their own account.
    #[error("you cannot deactivate or demote your own account")]
    SelfLockout,

    /// Password policy or hashing failure.
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Token issuance failure.
    #[error(transparent)]
    Token(#[from] JwtError),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::BlankName => "BLANK_NAME",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Inactive => "ACCOUNT_INACTIVE",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::InvalidResetToken => "INVALID_RESET_TOKEN",
            Self::SelfLockout => "SELF_LOCKOUT",
            Self::Password(PasswordError::TooShort) => "WEAK_PASSWORD",
            Self::Password(_) | Self::Token(_) => "INTERNAL_ERROR",
            Self::Store(e) => e.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidEmail
            | Self::BlankName
            | Self::EmailTaken
            | Self::SelfLockout
            | Self::Password(PasswordError::TooShort) => 400,
            Self::InvalidCredentials | Self::InvalidResetToken => 401,
            Self::Inactive => 403,
            Self::UserNotFound(_) => 404,
            Self::Password(_) | Self::Token(_) => 500,
            Self::Store(e) => e.http_status_code(),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidEmail
            | AuthError::BlankName
            | AuthError::EmailTaken
            | AuthError::SelfLockout
            | AuthError::Password(PasswordError::TooShort) => Self::Validation(err.to_string()),
            AuthError::InvalidCredentials | AuthError::InvalidResetToken => {
                Self::Unauthorized(err.to_string())
            }
            AuthError::Inactive => Self::Forbidden(err.to_string()),
            AuthError::UserNotFound(_) => Self::NotFound(err.to_string()),
            AuthError::Password(e) => Self::Internal(e.to_string()),
            AuthError::Token(e) => e.into(),
            AuthError::Store(e) => e.into(),
        }
    }
}
