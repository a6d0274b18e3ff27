//! JWT credential service.
//!
//! Issues signed access tokens from claims and verifies them back.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Claims;
use crate::error::AppError;

/// JWT configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in minutes.
    pub access_token_expires_minutes: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            access_token_expires_minutes: 480,
        }
    }
}

impl From<&crate::config::JwtConfig> for JwtConfig {
    fn from(config: &crate::config::JwtConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            access_token_expires_minutes: config.access_token_expires_minutes,
        }
    }
}

/// Errors that can occur during JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    EncodingError(String),

    /// Token decoding failed.
    #[error("failed to decode token: {0}")]
    DecodingError(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Token is valid but issued for another purpose.
    #[error("token is not valid for this operation")]
    WrongPurpose,
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::EncodingError(msg) => Self::Internal(msg),
            JwtError::DecodingError(_) => Self::Unauthorized("Invalid token".to_string()),
            JwtError::Expired => Self::Unauthorized("Token has expired".to_string()),
            JwtError::WrongPurpose => Self::Unauthorized("Invalid token".to_string()),
        }
    }
}

/// JWT service for token operations.
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("access_token_expires_minutes", &self.config.access_token_expires_minutes)
            .field("keys", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Creates a new JWT service with the given configuration.
    #[must_use]
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issues an access token for a user.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        email: &str,
        role: &str,
    ) -> Result<String, JwtError> {
        let expires_at = Utc::now() + Duration::minutes(self.config.access_token_expires_minutes);
        self.issue(&Claims::new(user_id, email, role, expires_at))
    }

    /// Issues a single-use token restricted to `purpose`, valid for
    /// `ttl_minutes`.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn generate_purpose_token(
        &self,
        user_id: Uuid,
        email: &str,
        role: &str,
        purpose: &str,
        token_id: Uuid,
        ttl_minutes: i64,
    ) -> Result<String, JwtError> {
        let expires_at = Utc::now() + Duration::minutes(ttl_minutes);
        self.issue(&Claims::new(user_id, email, role, expires_at).for_purpose(purpose, token_id))
    }

    /// Signs the given claims as-is.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn issue(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Validates and decodes a token.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` if the token has expired.
    /// Returns `JwtError::DecodingError` if the token is malformed or the
    /// signature does not match.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let validation = Validation::default();

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::DecodingError(e.to_string()),
            })
    }

    /// Validates a token usable for API access. Purpose tokens are refused.
    ///
    /// # Errors
    ///
    /// Same as [`Self::validate_token`], plus `JwtError::WrongPurpose`.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        let claims = self.validate_token(token)?;
        if !claims.is_access() {
            return Err(JwtError::WrongPurpose);
        }
        Ok(claims)
    }

    /// Validates a token issued for `purpose`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::validate_token`], plus `JwtError::WrongPurpose` for
    /// access tokens and tokens of another purpose.
    pub fn validate_purpose_token(&self, token: &str, purpose: &str) -> Result<Claims, JwtError> {
        let claims = self.validate_token(token)?;
        if claims.purpose.as_deref() != Some(purpose) {
            return Err(JwtError::WrongPurpose);
        }
        Ok(claims)
    }

    /// Returns the access token expiration in seconds.
    #[must_use]
    pub const fn access_token_expires_in(&self) -> i64 {
        self.config.access_token_expires_minutes * 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> JwtService {
        JwtService::new(JwtConfig {
            secret: "test-secret-key-for-testing".to_string(),
            access_token_expires_minutes: 15,
        })
    }

    #[test]
    fn test_generate_and_validate() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();

        let token = service
            .generate_access_token(user_id, "ana@example.com", "admin")
            .unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.email, "ana@example.com");
        assert!(claims.is_admin());
    }

    #[test]
    fn test_invalid_token() {
        let service = create_test_service();
        let result = service.validate_token("invalid.token.here");
        assert!(matches!(result, Err(JwtError::DecodingError(_))));
    }

    #[test]
    fn test_expired_token() {
        let service = create_test_service();
        let past = Utc::now() - Duration::hours(2);
        let claims = Claims::new(Uuid::new_v4(), "a@b.c", "user", past);
        let token = service.issue(&claims).unwrap();

        assert!(matches!(service.validate_token(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_purpose_tokens_are_not_access_tokens() {
        let service = create_test_service();
        let token_id = Uuid::new_v4();
        let reset = service
            .generate_purpose_token(
                Uuid::new_v4(),
                "a@b.c",
                "user",
                crate::auth::PURPOSE_PASSWORD_RESET,
                token_id,
                60,
            )
            .unwrap();

        assert!(matches!(
            service.validate_access_token(&reset),
            Err(JwtError::WrongPurpose)
        ));
        let claims = service
            .validate_purpose_token(&reset, crate::auth::PURPOSE_PASSWORD_RESET)
            .unwrap();
        assert_eq!(claims.jti, Some(token_id));
        assert!(claims.exp - claims.iat <= 60 * 60);

        let access = service
            .generate_access_token(Uuid::new_v4(), "a@b.c", "user")
            .unwrap();
        assert!(service.validate_access_token(&access).is_ok());
        assert!(matches!(
            service.validate_purpose_token(&access, crate::auth::PURPOSE_PASSWORD_RESET),
            Err(JwtError::WrongPurpose)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let service = create_test_service();
        let other = JwtService::new(JwtConfig {
            secret: "another-secret".to_string(),
            access_token_expires_minutes: 15,
        });
        let token = other
            .generate_access_token(Uuid::new_v4(), "a@b.c", "user")
            .unwrap();

        let err: AppError = service.validate_token(&token).unwrap_err().into();
        assert_eq!(err.status_code(), 401);
    }
}
