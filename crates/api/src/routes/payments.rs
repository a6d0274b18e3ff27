//! Payment routes.

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tally_core::payment::{NewPayment, PaymentFilter, PaymentState};
use tally_core::reporting::ReportParams;
use tally_shared::types::{InvoiceId, PaymentId};

use super::{attachment, content_type_for, parse_param, read_upload, today};
use crate::{AppState, error::ApiResult, middleware::AuthUser};

/// Creates the payment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payments", post(create_payment).get(list_payments))
        .route("/payments/pending", get(pending_payments))
        .route("/payments/summary", get(payment_summary))
        .route("/payments/stats", get(payment_stats))
        .route("/payments/{id}", get(get_payment))
        .route("/payments/{id}/confirm", post(confirm_payment))
        .route("/payments/{id}/proof", post(upload_proof).get(download_proof))
}

/// Query parameters for listing payments.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPaymentsQuery {
    /// Only payments of this invoice.
    pub invoice_id: Option<InvoiceId>,
    /// State filter.
    pub state: Option<String>,
    /// First payment day.
    pub from: Option<NaiveDate>,
    /// Last payment day.
    pub to: Option<NaiveDate>,
}

/// POST /payments - Record a pending payment.
async fn create_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<NewPayment>,
) -> ApiResult<impl IntoResponse> {
    let payment = state.services.payments.create(&user.actor(), payload).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// GET /payments - List payments, oldest first.
async fn list_payments(
    State(state): State<AppState>,
    Query(query): Query<ListPaymentsQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = PaymentFilter {
        invoice_id: query.invoice_id,
        state: parse_param("state", query.state.as_deref(), PaymentState::parse)?,
        from: query.from,
        to: query.to,
    };
    Ok(Json(state.services.payments.list(&filter).await?))
}

/// GET /payments/pending - Payments awaiting confirmation.
async fn pending_payments(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.payments.pending_validation().await?))
}

/// GET /payments/summary?start&end - Confirmed totals by method.
async fn payment_summary(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> ApiResult<impl IntoResponse> {
    let (start, end) = params.range(today())?;
    Ok(Json(
        state.services.payments.summary_by_method(start, end).await?,
    ))
}

/// GET /payments/stats - Lifetime counts and totals by method.
async fn payment_stats(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.payments.stats_by_method().await?))
}

/// GET /payments/{id}
async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<PaymentId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.payments.get(id).await?))
}

/// POST /payments/{id}/confirm - Confirm and settle the invoice.
async fn confirm_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<PaymentId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        state.services.payments.confirm(&user.actor(), id).await?,
    ))
}

/// POST /payments/{id}/proof - Attach a proof file (multipart).
async fn upload_proof(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<PaymentId>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let (file_name, bytes) = read_upload(multipart).await?;
    let payment = state
        .services
        .payments
        .attach_proof(&user.actor(), id, &file_name, bytes)
        .await?;
    Ok(Json(payment))
}

/// GET /payments/{id}/proof - Download the proof file.
async fn download_proof(
    State(state): State<AppState>,
    Path(id): Path<PaymentId>,
) -> ApiResult<impl IntoResponse> {
    let (file_name, bytes) = state.services.payments.read_proof(id).await?;
    Ok(attachment(content_type_for(&file_name), &file_name, bytes))
}
