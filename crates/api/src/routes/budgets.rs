//! Budget line routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch},
};
use chrono::{DateTime, FixedOffset};
use ledgerline_core::budget::{BudgetSummary, VarianceStatus};
use ledgerline_db::repositories::{
    BudgetLineFilter, BudgetLineWithActual, CreateBudgetLineInput, UpdateBudgetLineInput,
};
use ledgerline_shared::types::{
    AccountId, BudgetLineId, CostCenterId, FiscalPeriodId, OrganizationId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use super::double_option;
use crate::{
    AppState,
    error::ApiError,
    extractors::{Json as JsonBody, Path, Query},
    middleware::Actor,
};

/// Creates the budget routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations/{org_id}/budgetLines",
            get(list_budget_lines).post(create_budget_line),
        )
        .route(
            "/organizations/{org_id}/budgetLines/{line_id}",
            patch(update_budget_line)
                .get(get_budget_line)
                .delete(delete_budget_line),
        )
        .route("/organizations/{org_id}/budgetSummary", get(budget_summary))
}

/// Request body for creating a budget line.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBudgetLineRequest {
    /// Budgeted account.
    pub ledger_account_id: AccountId,
    /// Optional cost center.
    pub cost_center_id: Option<CostCenterId>,
    /// Budgeted period.
    pub fiscal_period_id: FiscalPeriodId,
    /// Budgeted amount, non-negative.
    pub budgeted_amount: Decimal,
    /// Notes.
    pub notes: Option<String>,
}

/// Request body for updating a budget line.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBudgetLineRequest {
    /// New amount.
    pub budgeted_amount: Option<Decimal>,
    /// New notes; `null` clears them.
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

/// Filters shared by the list and summary endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetQuery {
    /// Filter by period.
    pub fiscal_period_id: Option<FiscalPeriodId>,
    /// Filter by account.
    pub ledger_account_id: Option<AccountId>,
    /// Filter by cost center.
    pub cost_center_id: Option<CostCenterId>,
}

impl From<BudgetQuery> for BudgetLineFilter {
    fn from(query: BudgetQuery) -> Self {
        Self {
            fiscal_period_id: query.fiscal_period_id,
            ledger_account_id: query.ledger_account_id,
            cost_center_id: query.cost_center_id,
        }
    }
}

/// A budget line with its actuals.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetLineResponse {
    /// Line ID.
    pub id: Uuid,
    /// Budgeted account.
    pub ledger_account_id: Uuid,
    /// Cost center.
    pub cost_center_id: Option<Uuid>,
    /// Budgeted period.
    pub fiscal_period_id: Uuid,
    /// Notes.
    pub notes: Option<String>,
    /// Budgeted amount.
    pub budgeted: Decimal,
    /// Actual from posted entries.
    pub actual: Decimal,
    /// `actual - budgeted`.
    pub variance: Decimal,
    /// Variance as a percentage of the budget.
    pub variance_percent: Option<Decimal>,
    /// Favorable, unfavorable or on budget.
    pub variance_status: VarianceStatus,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
    /// Last change.
    pub updated_at: DateTime<FixedOffset>,
}

impl From<BudgetLineWithActual> for BudgetLineResponse {
    fn from(BudgetLineWithActual { line, result }: BudgetLineWithActual) -> Self {
        Self {
            id: line.id,
            ledger_account_id: line.ledger_account_id,
            cost_center_id: line.cost_center_id,
            fiscal_period_id: line.fiscal_period_id,
            notes: line.notes,
            budgeted: result.budgeted,
            actual: result.actual,
            variance: result.variance,
            variance_percent: result.variance_percent,
            variance_status: result.status,
            created_at: line.created_at,
            updated_at: line.updated_at,
        }
    }
}

async fn list_budget_lines(
    State(state): State<AppState>,
    _actor: Actor,
    Path(org_id): Path<OrganizationId>,
    Query(query): Query<BudgetQuery>,
) -> Result<Json<Value>, ApiError> {
    let lines = state
        .budgets()
        .list_budget_lines(org_id, &query.into())
        .await?;
    let data: Vec<BudgetLineResponse> = lines.into_iter().map(Into::into).collect();
    Ok(Json(json!({ "data": data })))
}

async fn create_budget_line(
    State(state): State<AppState>,
    _actor: Actor,
    Path(org_id): Path<OrganizationId>,
    JsonBody(payload): JsonBody<CreateBudgetLineRequest>,
) -> Result<(StatusCode, Json<BudgetLineResponse>), ApiError> {
    let input = CreateBudgetLineInput {
        ledger_account_id: payload.ledger_account_id,
        cost_center_id: payload.cost_center_id,
        fiscal_period_id: payload.fiscal_period_id,
        budgeted_amount: payload.budgeted_amount,
        notes: payload.notes,
    };
    let line = state.budgets().create_budget_line(org_id, input).await?;
    Ok((StatusCode::CREATED, Json(line.into())))
}

async fn get_budget_line(
    State(state): State<AppState>,
    _actor: Actor,
    Path((org_id, line_id)): Path<(OrganizationId, BudgetLineId)>,
) -> Result<Json<BudgetLineResponse>, ApiError> {
    let line = state.budgets().get_budget_line(org_id, line_id).await?;
    Ok(Json(line.into()))
}

async fn update_budget_line(
    State(state): State<AppState>,
    _actor: Actor,
    Path((org_id, line_id)): Path<(OrganizationId, BudgetLineId)>,
    JsonBody(payload): JsonBody<UpdateBudgetLineRequest>,
) -> Result<Json<BudgetLineResponse>, ApiError> {
    let patch = UpdateBudgetLineInput {
        budgeted_amount: payload.budgeted_amount,
        notes: payload.notes,
    };
    let line = state
        .budgets()
        .update_budget_line(org_id, line_id, patch)
        .await?;
    Ok(Json(line.into()))
}

async fn delete_budget_line(
    State(state): State<AppState>,
    _actor: Actor,
    Path((org_id, line_id)): Path<(OrganizationId, BudgetLineId)>,
) -> Result<StatusCode, ApiError> {
    state.budgets().delete_budget_line(org_id, line_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/organizations/{org_id}/budgetSummary` - Totals over the filtered lines.
async fn budget_summary(
    State(state): State<AppState>,
    _actor: Actor,
    Path(org_id): Path<OrganizationId>,
    Query(query): Query<BudgetQuery>,
) -> Result<Json<BudgetSummary>, ApiError> {
    Ok(Json(state.budgets().summary(org_id, &query.into()).await?))
}
