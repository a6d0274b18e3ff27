//! Journal and financial statement routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tally_core::journal::{EntryDraft, EntryKind, EntryState, JournalFilter};
use tally_core::reporting::ReportParams;
use tally_shared::types::JournalEntryId;

use super::{parse_param, today};
use crate::{AppState, error::ApiResult, middleware::AdminUser};

/// Creates the journal routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/journal", post(post_entry).get(list_entries))
        .route("/journal/balance-sheet", get(balance_sheet))
        .route("/journal/income-statement", get(income_statement))
        .route("/journal/cash-flow", get(cash_flow))
        .route("/journal/aging", get(receivables_aging))
        .route("/journal/accounts/{account}/movements", get(account_movements))
        .route("/journal/{id}", get(get_entry))
        .route("/journal/{id}/confirm", post(confirm_entry))
}

/// Query parameters for listing entries.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntriesQuery {
    /// State filter.
    pub state: Option<String>,
    /// Kind filter.
    pub kind: Option<String>,
    /// Source document id.
    pub reference: Option<String>,
    /// Account touched by a posting.
    pub account: Option<String>,
    /// First day.
    pub from: Option<NaiveDate>,
    /// Last day.
    pub to: Option<NaiveDate>,
}

/// Query parameters for the balance sheet.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheetQuery {
    /// Closing day; defaults to today.
    pub as_of: Option<NaiveDate>,
}

/// Optional bounds for account movements.
#[derive(Debug, Default, Deserialize)]
pub struct MovementsQuery {
    /// First day.
    pub start: Option<NaiveDate>,
    /// Last day.
    pub end: Option<NaiveDate>,
}

/// POST /journal - Post a manual pending entry (admin only).
async fn post_entry(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Json(draft): Json<EntryDraft>,
) -> ApiResult<impl IntoResponse> {
    let entry = state.services.journal.post_entry(&actor, draft).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /journal - List entries by date.
async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<ListEntriesQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = JournalFilter {
        state: parse_param("state", query.state.as_deref(), EntryState::parse)?,
        kind: parse_param("kind", query.kind.as_deref(), EntryKind::parse)?,
        reference: query.reference,
        account: query.account,
        from: query.from,
        to: query.to,
    };
    Ok(Json(state.services.journal.list(&filter).await?))
}

/// GET /journal/{id}
async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<JournalEntryId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.journal.get(id).await?))
}

/// POST /journal/{id}/confirm - Confirm a pending entry (admin only).
async fn confirm_entry(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(id): Path<JournalEntryId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.journal.confirm(&actor, id).await?))
}

/// GET /journal/balance-sheet?asOf=
async fn balance_sheet(
    State(state): State<AppState>,
    Query(query): Query<BalanceSheetQuery>,
) -> ApiResult<impl IntoResponse> {
    let as_of = query.as_of.unwrap_or_else(today);
    Ok(Json(state.services.journal.balance_sheet(as_of).await?))
}

/// GET /journal/income-statement?start&end
async fn income_statement(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> ApiResult<impl IntoResponse> {
    let (start, end) = params.range(today())?;
    Ok(Json(
        state.services.journal.income_statement(start, end).await?,
    ))
}

/// GET /journal/cash-flow?start&end
async fn cash_flow(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> ApiResult<impl IntoResponse> {
    let (start, end) = params.range(today())?;
    Ok(Json(state.services.journal.cash_flow(start, end).await?))
}

/// GET /journal/aging - Confirmed receivables by age bucket.
async fn receivables_aging(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        state.services.journal.receivables_aging(today()).await?,
    ))
}

/// GET /journal/accounts/{account}/movements
async fn account_movements(
    State(state): State<AppState>,
    Path(account): Path<String>,
    Query(query): Query<MovementsQuery>,
) -> ApiResult<impl IntoResponse> {
    let movements = state
        .services
        .journal
        .account_movements(&account, query.start, query.end)
        .await?;
    Ok(Json(movements))
}
