//! API route definitions.

use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Router, middleware};
use chrono::{NaiveDate, Utc};
use tally_shared::AppError;
use tally_shared::types::PageRequest;

use crate::error::ApiError;
use crate::{AppState, middleware::auth::auth_middleware};

pub mod auth;
pub mod health;
pub mod invoices;
pub mod journal;
pub mod notifications;
pub mod payments;
pub mod quotes;
pub mod reports;
pub mod settings;
pub mod users;

/// Creates the API router: public routes plus everything behind the auth middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(quotes::routes())
        .merge(invoices::routes())
        .merge(payments::routes())
        .merge(journal::routes())
        .merge(reports::routes())
        .merge(settings::routes())
        .merge(notifications::routes())
        .merge(users::routes())
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(notifications::feed_routes())
        .merge(protected_routes)
}

// ========== Shared helpers ==========

/// Calendar day used for "today" in reports and exports.
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Builds a page request from optional query values.
pub(crate) fn page_request(page: Option<u32>, per_page: Option<u32>) -> PageRequest {
    let defaults = PageRequest::default();
    PageRequest::new(
        page.unwrap_or(defaults.page),
        per_page.unwrap_or(defaults.per_page),
    )
}

/// Parses an optional enum-like query value.
pub(crate) fn parse_param<T>(
    name: &str,
    value: Option<&str>,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<Option<T>, ApiError> {
    match value {
        None => Ok(None),
        Some(raw) => parse(raw)
            .map(Some)
            .ok_or_else(|| ApiError(AppError::Validation(format!("unknown {name} '{raw}'")))),
    }
}

/// A binary download with a suggested file name.
pub(crate) fn attachment(content_type: &str, file_name: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// Guesses a download content type from the file extension.
pub(crate) fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Reads the first file field of a multipart body.
pub(crate) async fn read_upload(
    mut multipart: axum::extract::Multipart,
) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError(AppError::Validation(format!("malformed upload: {e}"))))?
    {
        let Some(file_name) = field.file_name().map(ToString::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError(AppError::Validation(format!("malformed upload: {e}"))))?;
        return Ok((file_name, bytes.to_vec()));
    }
    Err(ApiError(AppError::Validation(
        "upload must contain a file field".to_string(),
    )))
}

/// Runs a CPU-bound renderer off the async workers.
pub(crate) async fn render_blocking<F>(render: F) -> Result<Vec<u8>, ApiError>
where
    F: FnOnce() -> Result<Vec<u8>, tally_core::render::RenderError> + Send + 'static,
{
    tokio::task::spawn_blocking(render)
        .await
        .map_err(|e| ApiError(AppError::Internal(format!("render task failed: {e}"))))?
        .map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("receipt.PDF"), "application/pdf");
        assert_eq!(content_type_for("a.b.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }

    #[test]
    fn test_parse_param_rejects_unknown() {
        let parsed = parse_param("status", Some("bogus"), |_| None::<u8>);
        assert_eq!(parsed.unwrap_err().0.status_code(), 400);
        assert!(parse_param("status", None, |_| Some(1u8)).unwrap().is_none());
    }

    #[test]
    fn test_page_request_defaults() {
        let page = page_request(None, Some(10));
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 10);
    }
}
