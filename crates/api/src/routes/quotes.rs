//! Quote routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tally_core::quote::{NewQuote, QuoteFilter, QuotePatch, QuoteStatus};
use tally_shared::types::QuoteId;

use super::{attachment, page_request, parse_param, render_blocking};
use crate::{AppState, error::ApiResult, middleware::AuthUser};

/// Creates the quote routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/quotes", post(create_quote).get(list_quotes))
        .route("/quotes/search", get(search_quotes))
        .route("/quotes/stats", get(quote_stats))
        .route(
            "/quotes/{id}",
            get(get_quote).put(update_quote).delete(delete_quote),
        )
        .route("/quotes/{id}/approve", post(approve_quote))
        .route("/quotes/{id}/reject", post(reject_quote))
        .route("/quotes/{id}/invoice", post(invoice_quote))
        .route("/quotes/{id}/pdf", get(quote_pdf))
}

/// Query parameters for listing quotes.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuotesQuery {
    /// Status filter.
    pub status: Option<String>,
    /// First creation day.
    pub from: Option<NaiveDate>,
    /// Last creation day.
    pub to: Option<NaiveDate>,
    /// Page number.
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Query parameters for search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Text to look for.
    pub q: String,
}

/// POST /quotes - Create a pending quote.
async fn create_quote(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<NewQuote>,
) -> ApiResult<impl IntoResponse> {
    let quote = state.services.quotes.create(&user.actor(), payload).await?;
    Ok((StatusCode::CREATED, Json(quote)))
}

/// GET /quotes - List quotes, newest first.
async fn list_quotes(
    State(state): State<AppState>,
    Query(query): Query<ListQuotesQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = QuoteFilter {
        status: parse_param("status", query.status.as_deref(), QuoteStatus::parse)?,
        from: query.from,
        to: query.to,
    };
    let page = page_request(query.page, query.per_page);
    Ok(Json(state.services.quotes.list(&filter, page).await?))
}

/// GET /quotes/search?q= - Literal, case-insensitive search.
async fn search_quotes(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.quotes.search(&query.q).await?))
}

/// GET /quotes/stats - Counts and amounts by status.
async fn quote_stats(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.quotes.stats().await?))
}

/// GET /quotes/{id}
async fn get_quote(
    State(state): State<AppState>,
    Path(id): Path<QuoteId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.quotes.get(id).await?))
}

/// PUT /quotes/{id} - Merge a partial update.
async fn update_quote(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<QuoteId>,
    Json(patch): Json<QuotePatch>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        state.services.quotes.update(&user.actor(), id, patch).await?,
    ))
}

/// DELETE /quotes/{id}
async fn delete_quote(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<QuoteId>,
) -> ApiResult<impl IntoResponse> {
    state.services.quotes.delete(&user.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /quotes/{id}/approve
async fn approve_quote(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<QuoteId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.quotes.approve(&user.actor(), id).await?))
}

/// POST /quotes/{id}/reject
async fn reject_quote(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<QuoteId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.quotes.reject(&user.actor(), id).await?))
}

/// POST /quotes/{id}/invoice - Derive the invoice of an approved quote.
async fn invoice_quote(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<QuoteId>,
) -> ApiResult<impl IntoResponse> {
    let invoice = state
        .services
        .invoices
        .create_from_quote(&user.actor(), id)
        .await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// GET /quotes/{id}/pdf
async fn quote_pdf(
    State(state): State<AppState>,
    Path(id): Path<QuoteId>,
) -> ApiResult<impl IntoResponse> {
    let quote = state.services.quotes.get(id).await?;
    let settings = state.services.settings.get().await?;
    let renderer = state.services.renderer.clone();
    let file_name = format!("{}.pdf", quote.number);
    let bytes = render_blocking(move || renderer.render_quote_pdf(&quote, &settings)).await?;
    Ok(attachment("application/pdf", &file_name, bytes))
}
