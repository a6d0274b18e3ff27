//! Reporting and export routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tally_core::reporting::{ExportKind, ReportParams, ReportPeriod, SalesGrouping};

use super::{attachment, today};
use crate::{AppState, error::ApiResult};

/// Creates the report routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/dashboard", get(dashboard))
        .route("/reports/trends", get(trends))
        .route("/reports/sales", get(sales_analysis))
        .route("/reports/financial", get(financial_report))
        .route("/reports/receivables", get(receivables_report))
        .route("/reports/customers", get(customers))
        .route("/reports/customers/{email}", get(customer_analysis))
        .route("/reports/export/{kind}", get(export))
}

/// Query parameters naming a rolling window and grouping.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodQuery {
    /// `month`, `quarter` or `year`.
    pub period: Option<String>,
    /// `product`, `client` or `date`.
    pub group_by: Option<String>,
}

impl PeriodQuery {
    fn period(&self) -> ApiResult<ReportPeriod> {
        Ok(self
            .period
            .as_deref()
            .map(ReportPeriod::parse)
            .transpose()?
            .unwrap_or_default())
    }

    fn grouping(&self) -> ApiResult<SalesGrouping> {
        Ok(self
            .group_by
            .as_deref()
            .map(SalesGrouping::parse)
            .transpose()?
            .unwrap_or_default())
    }
}

/// GET /reports/dashboard?period=
async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<impl IntoResponse> {
    let period = query.period()?;
    Ok(Json(state.services.reports.dashboard(period, today()).await?))
}

/// GET /reports/trends?start&end - Daily series.
async fn trends(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> ApiResult<impl IntoResponse> {
    let (start, end) = params.range(today())?;
    Ok(Json(state.services.reports.trends(start, end).await?))
}

/// GET /reports/sales?period&groupBy
async fn sales_analysis(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<impl IntoResponse> {
    let analysis = state
        .services
        .reports
        .sales_analysis(query.period()?, query.grouping()?, today())
        .await?;
    Ok(Json(analysis))
}

/// GET /reports/financial?start&end - Invoiced versus collected.
async fn financial_report(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> ApiResult<impl IntoResponse> {
    let (start, end) = params.range(today())?;
    Ok(Json(
        state.services.reports.financial_report(start, end).await?,
    ))
}

/// GET /reports/receivables - Unpaid invoices by age.
async fn receivables_report(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        state.services.reports.receivables_report(today()).await?,
    ))
}

/// GET /reports/customers
async fn customers(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.reports.customers().await?))
}

/// GET /reports/customers/{email}
async fn customer_analysis(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        state.services.reports.customer_analysis(&email).await?,
    ))
}

/// GET /reports/export/{kind} - CSV download.
async fn export(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Query<ReportParams>,
) -> ApiResult<impl IntoResponse> {
    let kind = ExportKind::parse(&kind)?;
    let file = state.services.reports.export(kind, &params, today()).await?;
    tracing::debug!(kind = kind.as_str(), bytes = file.bytes.len(), "export rendered");
    Ok(attachment(file.content_type, &file.file_name, file.bytes))
}
