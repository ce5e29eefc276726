//! VAT return routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use ledgerline_core::vat::VatReturnStatus;
use ledgerline_db::entities::vat_returns;
use ledgerline_db::repositories::VatAmountsPatch;
use ledgerline_shared::types::{OrganizationId, VatReturnId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    extractors::{Json as JsonBody, Path},
    middleware::Actor,
};

/// Creates the VAT return routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations/{org_id}/vatReturns",
            get(list_returns).post(generate_return),
        )
        .route(
            "/organizations/{org_id}/vatReturns/{return_id}",
            get(get_return).patch(update_return),
        )
        .route(
            "/organizations/{org_id}/vatReturns/{return_id}/regenerate",
            post(regenerate_return),
        )
        .route(
            "/organizations/{org_id}/vatReturns/{return_id}/submit",
            post(submit_return),
        )
        .route(
            "/organizations/{org_id}/vatReturns/{return_id}/accept",
            post(accept_return),
        )
        .route(
            "/organizations/{org_id}/vatReturns/{return_id}/reject",
            post(reject_return),
        )
}

/// Request body for generating a return.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReturnRequest {
    /// First day covered.
    pub period_start: NaiveDate,
    /// Last day covered, inclusive.
    pub period_end: NaiveDate,
}

/// Manual box overrides on a draft return.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReturnRequest {
    /// VAT due on sales.
    pub vat_due_sales: Option<Decimal>,
    /// VAT due on acquisitions.
    pub vat_due_acquisitions: Option<Decimal>,
    /// VAT reclaimed.
    pub vat_reclaimed: Option<Decimal>,
}

/// A VAT return in responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VatReturnResponse {
    /// Return ID.
    pub id: Uuid,
    /// First day covered.
    pub period_start: NaiveDate,
    /// Last day covered.
    pub period_end: NaiveDate,
    /// VAT due on sales.
    pub vat_due_sales: Decimal,
    /// VAT due on acquisitions.
    pub vat_due_acquisitions: Decimal,
    /// VAT reclaimed.
    pub vat_reclaimed: Decimal,
    /// Sales plus acquisitions.
    pub total_vat_due: Decimal,
    /// Total due less reclaimed.
    pub net_vat_due: Decimal,
    /// Lifecycle status.
    pub status: VatReturnStatus,
    /// Submission time.
    pub submitted_at: Option<DateTime<FixedOffset>>,
    /// Submitter.
    pub submitted_by: Option<Uuid>,
    /// Creator.
    pub created_by: Uuid,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
    /// Last change.
    pub updated_at: DateTime<FixedOffset>,
}

impl From<vat_returns::Model> for VatReturnResponse {
    fn from(m: vat_returns::Model) -> Self {
        Self {
            id: m.id,
            period_start: m.period_start,
            period_end: m.period_end,
            vat_due_sales: m.vat_due_sales,
            vat_due_acquisitions: m.vat_due_acquisitions,
            vat_reclaimed: m.vat_reclaimed,
            total_vat_due: m.total_vat_due,
            net_vat_due: m.net_vat_due,
            status: m.status.into(),
            submitted_at: m.submitted_at,
            submitted_by: m.submitted_by,
            created_by: m.created_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

async fn list_returns(
    State(state): State<AppState>,
    _actor: Actor,
    Path(org_id): Path<OrganizationId>,
) -> Result<Json<Value>, ApiError> {
    let returns = state.vat().list_returns(org_id).await?;
    let data: Vec<VatReturnResponse> = returns.into_iter().map(Into::into).collect();
    Ok(Json(json!({ "data": data })))
}

/// POST `/organizations/{org_id}/vatReturns` - Aggregate posted VAT lines into a draft.
async fn generate_return(
    State(state): State<AppState>,
    actor: Actor,
    Path(org_id): Path<OrganizationId>,
    JsonBody(payload): JsonBody<GenerateReturnRequest>,
) -> Result<(StatusCode, Json<VatReturnResponse>), ApiError> {
    let created = state
        .vat()
        .generate(org_id, payload.period_start, payload.period_end, actor.id)
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

async fn get_return(
    State(state): State<AppState>,
    _actor: Actor,
    Path((org_id, return_id)): Path<(OrganizationId, VatReturnId)>,
) -> Result<Json<VatReturnResponse>, ApiError> {
    Ok(Json(state.vat().get_return(org_id, return_id).await?.into()))
}

async fn update_return(
    State(state): State<AppState>,
    _actor: Actor,
    Path((org_id, return_id)): Path<(OrganizationId, VatReturnId)>,
    JsonBody(payload): JsonBody<UpdateReturnRequest>,
) -> Result<Json<VatReturnResponse>, ApiError> {
    let patch = VatAmountsPatch {
        vat_due_sales: payload.vat_due_sales,
        vat_due_acquisitions: payload.vat_due_acquisitions,
        vat_reclaimed: payload.vat_reclaimed,
    };
    let updated = state.vat().update_amounts(org_id, return_id, patch).await?;
    Ok(Json(updated.into()))
}

async fn regenerate_return(
    State(state): State<AppState>,
    _actor: Actor,
    Path((org_id, return_id)): Path<(OrganizationId, VatReturnId)>,
) -> Result<Json<VatReturnResponse>, ApiError> {
    Ok(Json(state.vat().regenerate(org_id, return_id).await?.into()))
}

async fn submit_return(
    State(state): State<AppState>,
    actor: Actor,
    Path((org_id, return_id)): Path<(OrganizationId, VatReturnId)>,
) -> Result<Json<VatReturnResponse>, ApiError> {
    let submitted = state.vat().submit(org_id, return_id, actor.id).await?;
    Ok(Json(submitted.into()))
}

async fn accept_return(
    State(state): State<AppState>,
    _actor: Actor,
    Path((org_id, return_id)): Path<(OrganizationId, VatReturnId)>,
) -> Result<Json<VatReturnResponse>, ApiError> {
    Ok(Json(state.vat().accept(org_id, return_id).await?.into()))
}

async fn reject_return(
    State(state): State<AppState>,
    _actor: Actor,
    Path((org_id, return_id)): Path<(OrganizationId, VatReturnId)>,
) -> Result<Json<VatReturnResponse>, ApiError> {
    Ok(Json(state.vat().reject(org_id, return_id).await?.into()))
}
