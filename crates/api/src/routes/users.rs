//! User administration routes (admin only).

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Deserialize;
use tally_core::auth::UserRole;
use tally_shared::types::UserId;

use crate::{AppState, error::ApiResult, middleware::AdminUser};

/// Creates the user administration routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}/activate", post(activate))
        .route("/users/{id}/deactivate", post(deactivate))
        .route("/users/{id}/role", put(set_role))
        .route("/users/{id}/reset-token", post(issue_reset_token))
}

/// Request body for a role change.
#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    /// New role.
    pub role: UserRole,
}

/// GET /users
async fn list_users(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.auth.list_users().await?))
}

/// POST /users/{id}/activate
async fn activate(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(id): Path<UserId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.auth.set_active(&actor, id, true).await?))
}

/// POST /users/{id}/deactivate
async fn deactivate(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(id): Path<UserId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.auth.set_active(&actor, id, false).await?))
}

/// PUT /users/{id}/role
async fn set_role(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(id): Path<UserId>,
    Json(payload): Json<RoleRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        state.services.auth.set_role(&actor, id, payload.role).await?,
    ))
}

/// POST /users/{id}/reset-token - Issue a single-use password reset token
/// to hand to the user.
async fn issue_reset_token(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(id): Path<UserId>,
) -> ApiResult<impl IntoResponse> {
    let reset = state.services.auth.issue_reset_token(&actor, id).await?;
    Ok((StatusCode::CREATED, Json(reset)))
}
