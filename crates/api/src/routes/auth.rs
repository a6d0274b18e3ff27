//! Authentication routes for register, login, password recovery and the
//! current user.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tally_shared::types::UserId;
use tracing::info;

use crate::{AppState, error::ApiResult, middleware::AuthUser};

/// Public auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

/// Auth routes that need a verified caller.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/change-password", post(change_password))
}

/// Request body for registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Plain-text password.
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

/// Request body for a password change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    /// Current password.
    pub current_password: String,
    /// Replacement password.
    pub new_password: String,
}

/// Request body for a password recovery request.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    /// Login email.
    pub email: String,
}

/// Request body for redeeming a reset token.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    /// Reset token issued by an administrator.
    pub token: String,
    /// Replacement password.
    pub new_password: String,
}

/// POST /auth/register - Create a staff account.
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .services
        .auth
        .register(&payload.email, &payload.name, &payload.password)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /auth/login - Authenticate and return a bearer token.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let result = state
        .services
        .auth
        .login(&payload.email, &payload.password)
        .await?;
    Ok(Json(result))
}

/// GET /auth/me - The current user.
async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<impl IntoResponse> {
    let id = UserId::from_uuid(user.claims().user_id());
    Ok(Json(state.services.auth.me(id).await?))
}

/// POST /auth/change-password - Replace the caller's password.
async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    let id = UserId::from_uuid(user.claims().user_id());
    state
        .services
        .auth
        .change_password(id, &payload.current_password, &payload.new_password)
        .await?;
    info!(user_id = %id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /auth/forgot-password - Ask an administrator for a reset token.
///
/// Always answers 202 so callers cannot tell which emails are registered.
async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    state.services.auth.forgot_password(&payload.email).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "message": "If the account exists, an administrator has been notified"
        })),
    ))
}

/// POST /auth/reset-password - Set a new password with a reset token.
async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .services
        .auth
        .reset_password(&payload.token, &payload.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
