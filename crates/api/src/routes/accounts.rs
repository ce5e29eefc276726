//! Chart of accounts routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use ledgerline_core::accounts::{
    AccountBalance, AccountPatch, AccountType, NewAccount, NormalBalance, TrialBalance,
};
use ledgerline_core::vat::VatCategory;
use ledgerline_db::entities::ledger_accounts;
use ledgerline_db::repositories::AccountFilter;
use ledgerline_shared::types::{AccountId, OrganizationId};
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

/// Creates the ledger account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations/{org_id}/ledgerAccounts",
            get(list_accounts).post(create_account),
        )
        .route(
            "/organizations/{org_id}/ledgerAccounts/{account_id}",
            get(get_account).patch(update_account).delete(delete_account),
        )
        .route(
            "/organizations/{org_id}/ledgerAccounts/{account_id}/balance",
            get(account_balance),
        )
        .route(
            "/organizations/{org_id}/ledgerAccounts/{account_id}/descendants",
            get(list_descendants),
        )
        .route("/organizations/{org_id}/trialBalance", get(trial_balance))
}

/// Query parameters for listing accounts.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAccountsQuery {
    /// Only accounts of this type.
    pub account_type: Option<AccountType>,
    /// Only active or inactive accounts.
    pub is_active: Option<bool>,
    /// Only children of this account.
    pub parent_id: Option<AccountId>,
}

/// Request body for updating an account.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    /// New code.
    pub code: Option<String>,
    /// New name.
    pub name: Option<String>,
    /// New parent; `null` detaches the account.
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<AccountId>>,
    /// Activate or deactivate.
    pub is_active: Option<bool>,
    /// New normal balance (system accounts only).
    pub normal_balance: Option<NormalBalance>,
    /// New VAT bucket; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub vat_category: Option<Option<VatCategory>>,
}

impl From<UpdateAccountRequest> for AccountPatch {
    fn from(req: UpdateAccountRequest) -> Self {
        Self {
            code: req.code,
            name: req.name,
            parent_id: req.parent_id,
            is_active: req.is_active,
            normal_balance: req.normal_balance,
            vat_category: req.vat_category,
        }
    }
}

/// Query parameters for balance endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceQuery {
    /// Balance date; today when absent.
    pub as_of: Option<NaiveDate>,
    /// Roll up descendants.
    #[serde(default)]
    pub include_children: bool,
}

/// Response for a ledger account.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    /// Account ID.
    pub id: Uuid,
    /// Owning organization.
    pub organization_id: Uuid,
    /// Account code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
    /// Side that increases the balance.
    pub normal_balance: NormalBalance,
    /// Parent account.
    pub parent_id: Option<Uuid>,
    /// System account flag.
    pub is_system: bool,
    /// Active flag.
    pub is_active: bool,
    /// VAT bucket.
    pub vat_category: Option<VatCategory>,
    /// Running balance.
    pub balance: Decimal,
    /// Optimistic lock counter.
    pub version: i32,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
    /// Last change.
    pub updated_at: DateTime<FixedOffset>,
}

impl From<ledger_accounts::Model> for AccountResponse {
    fn from(m: ledger_accounts::Model) -> Self {
        Self {
            id: m.id,
            organization_id: m.organization_id,
            code: m.code,
            name: m.name,
            account_type: m.account_type.into(),
            normal_balance: m.normal_balance.into(),
            parent_id: m.parent_id,
            is_system: m.is_system,
            is_active: m.is_active,
            vat_category: m.vat_category.map(Into::into),
            balance: m.balance,
            version: m.version,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// GET `/organizations/{org_id}/ledgerAccounts` - List accounts by code.
async fn list_accounts(
    State(state): State<AppState>,
    _actor: Actor,
    Path(org_id): Path<OrganizationId>,
    Query(query): Query<ListAccountsQuery>,
) -> Result<Json<Value>, ApiError> {
    let filter = AccountFilter {
        account_type: query.account_type,
        is_active: query.is_active,
        parent_id: query.parent_id,
    };
    let accounts = state.accounts().list_accounts(org_id, &filter).await?;
    let data: Vec<AccountResponse> = accounts.into_iter().map(Into::into).collect();
    Ok(Json(json!({ "data": data })))
}

/// POST `/organizations/{org_id}/ledgerAccounts` - Create an account.
async fn create_account(
    State(state): State<AppState>,
    _actor: Actor,
    Path(org_id): Path<OrganizationId>,
    JsonBody(payload): JsonBody<NewAccount>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let account = state.accounts().create_account(org_id, payload).await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

/// GET `/organizations/{org_id}/ledgerAccounts/{account_id}`
async fn get_account(
    State(state): State<AppState>,
    _actor: Actor,
    Path((org_id, account_id)): Path<(OrganizationId, AccountId)>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state.accounts().get_account(org_id, account_id).await?;
    Ok(Json(account.into()))
}

/// PATCH `/organizations/{org_id}/ledgerAccounts/{account_id}`
async fn update_account(
    State(state): State<AppState>,
    _actor: Actor,
    Path((org_id, account_id)): Path<(OrganizationId, AccountId)>,
    JsonBody(payload): JsonBody<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state
        .accounts()
        .update_account(org_id, account_id, payload.into())
        .await?;
    Ok(Json(account.into()))
}

/// DELETE `/organizations/{org_id}/ledgerAccounts/{account_id}`
async fn delete_account(
    State(state): State<AppState>,
    _actor: Actor,
    Path((org_id, account_id)): Path<(OrganizationId, AccountId)>,
) -> Result<StatusCode, ApiError> {
    state.accounts().delete_account(org_id, account_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/organizations/{org_id}/ledgerAccounts/{account_id}/balance`
async fn account_balance(
    State(state): State<AppState>,
    _actor: Actor,
    Path((org_id, account_id)): Path<(OrganizationId, AccountId)>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<AccountBalance>, ApiError> {
    let as_of = query.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let balance = state
        .accounts()
        .compute_balance(org_id, account_id, as_of, query.include_children)
        .await?;
    Ok(Json(balance))
}

/// GET `/organizations/{org_id}/ledgerAccounts/{account_id}/descendants`
async fn list_descendants(
    State(state): State<AppState>,
    _actor: Actor,
    Path((org_id, account_id)): Path<(OrganizationId, AccountId)>,
) -> Result<Json<Value>, ApiError> {
    let descendants = state.accounts().list_descendants(org_id, account_id).await?;
    let data: Vec<AccountResponse> = descendants.into_iter().map(Into::into).collect();
    Ok(Json(json!({ "data": data })))
}

/// GET `/organizations/{org_id}/trialBalance`
async fn trial_balance(
    State(state): State<AppState>,
    _actor: Actor,
    Path(org_id): Path<OrganizationId>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<TrialBalance>, ApiError> {
    let as_of = query.as_of.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(state.accounts().trial_balance(org_id, as_of).await?))
}
