//! Users, authentication and password hashing.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - User accounts and roles
//! - The authenticated `Actor` passed into every core operation
//! - Registration, login and password changes
//! - Password recovery with single-use reset tokens
//! - User administration (activation and roles)

mod password;

pub mod actor;
pub mod error;
pub mod service;
pub mod user;

pub use actor::Actor;
pub use error::AuthError;
pub use password::{MIN_PASSWORD_LENGTH, PasswordError, hash_password, validate_password, verify_password};
pub use service::{AuthService, LoginResult, PasswordReset, RESET_TOKEN_MINUTES};
pub use user::{User, UserRole, UserView};
