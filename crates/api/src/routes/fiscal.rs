//! Fiscal period routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use ledgerline_core::fiscal::FiscalPeriod;
use ledgerline_shared::types::{FiscalPeriodId, OrganizationId};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    AppState,
    error::ApiError,
    extractors::{Json as JsonBody, Path},
    middleware::Actor,
};

/// Creates the fiscal period routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations/{org_id}/fiscalPeriods",
            get(list_periods).post(open_period),
        )
        .route(
            "/organizations/{org_id}/fiscalPeriods/{period_id}",
            get(get_period),
        )
        .route(
            "/organizations/{org_id}/fiscalPeriods/{period_id}/close",
            post(close_period),
        )
        .route(
            "/organizations/{org_id}/fiscalPeriods/{period_id}/lock",
            post(lock_period),
        )
}

/// Request body for opening a period.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPeriodRequest {
    /// Period name.
    pub name: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day, inclusive.
    pub end_date: NaiveDate,
}

async fn list_periods(
    State(state): State<AppState>,
    _actor: Actor,
    Path(org_id): Path<OrganizationId>,
) -> Result<Json<Value>, ApiError> {
    let periods = state.fiscal().list_periods(org_id).await?;
    let data: Vec<FiscalPeriod> = periods.into_iter().map(Into::into).collect();
    Ok(Json(json!({ "data": data })))
}

async fn open_period(
    State(state): State<AppState>,
    _actor: Actor,
    Path(org_id): Path<OrganizationId>,
    JsonBody(payload): JsonBody<OpenPeriodRequest>,
) -> Result<(StatusCode, Json<FiscalPeriod>), ApiError> {
    let period = state
        .fiscal()
        .open_period(org_id, &payload.name, payload.start_date, payload.end_date)
        .await?;
    Ok((StatusCode::CREATED, Json(period.into())))
}

async fn get_period(
    State(state): State<AppState>,
    _actor: Actor,
    Path((org_id, period_id)): Path<(OrganizationId, FiscalPeriodId)>,
) -> Result<Json<FiscalPeriod>, ApiError> {
    let period = state.fiscal().get_period(org_id, period_id).await?;
    Ok(Json(period.into()))
}

/// POST `/organizations/{org_id}/fiscalPeriods/{period_id}/close`
///
/// Fails while draft entries remain in the period.
async fn close_period(
    State(state): State<AppState>,
    actor: Actor,
    Path((org_id, period_id)): Path<(OrganizationId, FiscalPeriodId)>,
) -> Result<Json<FiscalPeriod>, ApiError> {
    actor.require_writer()?;
    let period = state
        .fiscal()
        .close_period(org_id, period_id, actor.id)
        .await?;
    Ok(Json(period.into()))
}

/// POST `/organizations/{org_id}/fiscalPeriods/{period_id}/lock`
async fn lock_period(
    State(state): State<AppState>,
    actor: Actor,
    Path((org_id, period_id)): Path<(OrganizationId, FiscalPeriodId)>,
) -> Result<Json<FiscalPeriod>, ApiError> {
    actor.require_writer()?;
    let period = state.fiscal().lock_period(org_id, period_id, actor.id).await?;
    Ok(Json(period.into()))
}
