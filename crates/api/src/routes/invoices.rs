//! Invoice routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tally_core::invoice::{InvoiceFilter, InvoiceStatus};
use tally_shared::types::InvoiceId;

use super::{attachment, page_request, parse_param, render_blocking};
use crate::{AppState, error::ApiResult, middleware::AuthUser};

/// Creates the invoice routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices))
        .route("/invoices/pending", get(pending_invoices))
        .route("/invoices/stats", get(invoice_stats))
        .route("/invoices/{id}", get(get_invoice))
        .route(
            "/invoices/{id}/payments",
            get(invoice_payments).post(register_payment),
        )
        .route("/invoices/{id}/pdf", get(invoice_pdf))
}

/// Query parameters for listing invoices.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInvoicesQuery {
    /// Status filter.
    pub status: Option<String>,
    /// Only invoices not yet paid.
    #[serde(default)]
    pub unpaid: bool,
    /// Customer email, case-insensitive.
    pub customer: Option<String>,
    /// First creation day.
    pub from: Option<NaiveDate>,
    /// Last creation day.
    pub to: Option<NaiveDate>,
    /// Page number.
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Request body for a payment registered from the invoice.
#[derive(Debug, Deserialize)]
pub struct RegisterPaymentRequest {
    /// Amount.
    pub amount: Decimal,
    /// Payment method.
    pub method: String,
    /// External reference.
    #[serde(default)]
    pub reference: Option<String>,
}

/// GET /invoices - List invoices, newest first.
async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<ListInvoicesQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = InvoiceFilter {
        status: parse_param("status", query.status.as_deref(), InvoiceStatus::parse)?,
        unpaid_only: query.unpaid,
        customer_email: query.customer,
        from: query.from,
        to: query.to,
    };
    let page = page_request(query.page, query.per_page);
    Ok(Json(state.services.invoices.list(&filter, page).await?))
}

/// GET /invoices/pending - Unpaid invoices, oldest first.
async fn pending_invoices(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.invoices.pending().await?))
}

/// GET /invoices/stats
async fn invoice_stats(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.invoices.stats().await?))
}

/// GET /invoices/{id}
async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<InvoiceId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.invoices.get(id).await?))
}

/// GET /invoices/{id}/payments
async fn invoice_payments(
    State(state): State<AppState>,
    Path(id): Path<InvoiceId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.payments.by_invoice(id).await?))
}

/// POST /invoices/{id}/payments - Record a payment against this invoice.
async fn register_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<InvoiceId>,
    Json(payload): Json<RegisterPaymentRequest>,
) -> ApiResult<impl IntoResponse> {
    let payment = state
        .services
        .invoices
        .register_payment(
            &user.actor(),
            id,
            payload.amount,
            &payload.method,
            payload.reference,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// GET /invoices/{id}/pdf
async fn invoice_pdf(
    State(state): State<AppState>,
    Path(id): Path<InvoiceId>,
) -> ApiResult<impl IntoResponse> {
    let invoice = state.services.invoices.get(id).await?;
    let settings = state.services.settings.get().await?;
    let renderer = state.services.renderer.clone();
    let file_name = format!("{}.pdf", invoice.number);
    let bytes = render_blocking(move || renderer.render_invoice_pdf(&invoice, &settings)).await?;
    Ok(attachment("application/pdf", &file_name, bytes))
}
