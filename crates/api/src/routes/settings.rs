//! Business settings routes.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Deserialize;
use tally_core::settings::{AssetKind, CompanyProfile, DocumentTerms, SettingsPatch};
use tally_shared::AppError;

use super::{attachment, content_type_for, read_upload};
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AdminUser,
};

/// Creates the settings routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings).put(update_settings))
        .route("/settings/company", put(update_company))
        .route("/settings/terms/{document}", put(update_terms))
        .route("/settings/assets/{kind}", post(upload_asset).get(download_asset))
}

/// Request body for replacing document terms.
#[derive(Debug, Deserialize)]
pub struct TermsRequest {
    /// One line per term.
    pub terms: Vec<String>,
}

fn asset_kind(raw: &str) -> Result<AssetKind, ApiError> {
    AssetKind::parse(raw)
        .ok_or_else(|| ApiError(AppError::Validation(format!("unknown asset '{raw}'"))))
}

/// GET /settings
async fn get_settings(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.settings.get().await?))
}

/// PUT /settings - Partial update (admin only).
async fn update_settings(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Json(patch): Json<SettingsPatch>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.settings.update(&actor, patch).await?))
}

/// PUT /settings/company (admin only)
async fn update_company(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Json(company): Json<CompanyProfile>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        state.services.settings.update_company(&actor, company).await?,
    ))
}

/// PUT /settings/terms/{document} - `quote` or `invoice` (admin only).
async fn update_terms(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(document): Path<String>,
    Json(payload): Json<TermsRequest>,
) -> ApiResult<impl IntoResponse> {
    let document = match document.as_str() {
        "quote" => DocumentTerms::Quote,
        "invoice" => DocumentTerms::Invoice,
        other => {
            return Err(ApiError(AppError::Validation(format!(
                "unknown document '{other}'"
            ))));
        }
    };
    let settings = state
        .services
        .settings
        .update_terms(&actor, document, payload.terms)
        .await?;
    Ok(Json(settings))
}

/// POST /settings/assets/{kind} - Replace a branding file (admin only).
async fn upload_asset(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(kind): Path<String>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let kind = asset_kind(&kind)?;
    let (file_name, bytes) = read_upload(multipart).await?;
    let settings = state
        .services
        .settings
        .attach_asset(&actor, kind, &file_name, bytes)
        .await?;
    Ok(Json(settings))
}

/// GET /settings/assets/{kind}
async fn download_asset(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let kind = asset_kind(&raw)?;
    let settings = state.services.settings.get().await?;
    let Some(name) = settings.asset(kind).map(ToString::to_string) else {
        return Err(ApiError(AppError::NotFound(format!("no {raw} uploaded"))));
    };
    let bytes = state
        .services
        .settings
        .read_asset(kind)
        .await?
        .ok_or_else(|| ApiError(AppError::NotFound(format!("no {raw} uploaded"))))?;
    Ok(attachment(content_type_for(&name), &name, bytes))
}
