//! Bank transaction and reconciliation routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use ledgerline_core::reconciliation::{BankTransactionType, Match};
use ledgerline_db::entities::bank_transactions;
use ledgerline_db::repositories::{BankTransactionFilter, CreateBankTransactionInput};
use ledgerline_shared::types::{AccountId, BankTransactionId, JournalEntryId, OrganizationId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    extractors::{Json as JsonBody, Path, Query},
    middleware::Actor,
};

/// Creates the bank routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations/{org_id}/bankTransactions",
            get(list_transactions).post(create_transaction),
        )
        .route(
            "/organizations/{org_id}/bankTransactions/reconcile",
            post(reconcile),
        )
        .route(
            "/organizations/{org_id}/bankTransactions/{transaction_id}",
            get(get_transaction),
        )
        .route(
            "/organizations/{org_id}/bankTransactions/{transaction_id}/link",
            post(link_transaction),
        )
        .route(
            "/organizations/{org_id}/bankTransactions/{transaction_id}/unlink",
            post(unlink_transaction),
        )
}

/// Request body for recording a bank transaction.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    /// Value date.
    pub transaction_date: NaiveDate,
    /// Kind of movement.
    pub transaction_type: BankTransactionType,
    /// Amount as reported by the bank.
    pub amount: Decimal,
    /// Bank account in the ledger.
    pub ledger_account_id: Option<AccountId>,
    /// Bank reference.
    pub reference: Option<String>,
    /// Description.
    pub description: Option<String>,
}

/// Query parameters for listing transactions.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTransactionsQuery {
    /// Filter by reconciliation state.
    pub is_reconciled: Option<bool>,
    /// Dated on or after.
    pub from: Option<NaiveDate>,
    /// Dated on or before.
    pub to: Option<NaiveDate>,
}

/// Request body for a manual link.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRequest {
    /// Posted entry to link.
    pub journal_entry_id: JournalEntryId,
}

/// A bank transaction in responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankTransactionResponse {
    /// Transaction ID.
    pub id: Uuid,
    /// Value date.
    pub transaction_date: NaiveDate,
    /// Kind of movement.
    pub transaction_type: BankTransactionType,
    /// Amount.
    pub amount: Decimal,
    /// Bank account in the ledger.
    pub ledger_account_id: Option<Uuid>,
    /// Bank reference.
    pub reference: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Whether the transaction is linked.
    pub is_reconciled: bool,
    /// Linked entry.
    pub journal_entry_id: Option<Uuid>,
    /// When it was linked.
    pub reconciled_at: Option<DateTime<FixedOffset>>,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
}

impl From<bank_transactions::Model> for BankTransactionResponse {
    fn from(m: bank_transactions::Model) -> Self {
        Self {
            id: m.id,
            transaction_date: m.transaction_date,
            transaction_type: m.transaction_type.into(),
            amount: m.amount,
            ledger_account_id: m.ledger_account_id,
            reference: m.reference,
            description: m.description,
            is_reconciled: m.is_reconciled,
            journal_entry_id: m.journal_entry_id,
            reconciled_at: m.reconciled_at,
            created_at: m.created_at,
        }
    }
}

async fn list_transactions(
    State(state): State<AppState>,
    _actor: Actor,
    Path(org_id): Path<OrganizationId>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<Value>, ApiError> {
    let filter = BankTransactionFilter {
        is_reconciled: query.is_reconciled,
        from: query.from,
        to: query.to,
    };
    let rows = state.bank().list_transactions(org_id, &filter).await?;
    let data: Vec<BankTransactionResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Json(json!({ "data": data })))
}

async fn create_transaction(
    State(state): State<AppState>,
    _actor: Actor,
    Path(org_id): Path<OrganizationId>,
    JsonBody(payload): JsonBody<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<BankTransactionResponse>), ApiError> {
    let input = CreateBankTransactionInput {
        transaction_date: payload.transaction_date,
        transaction_type: payload.transaction_type,
        amount: payload.amount,
        ledger_account_id: payload.ledger_account_id,
        reference: payload.reference,
        description: payload.description,
    };
    let row = state.bank().create_transaction(org_id, input).await?;
    Ok((StatusCode::CREATED, Json(row.into())))
}

async fn get_transaction(
    State(state): State<AppState>,
    _actor: Actor,
    Path((org_id, transaction_id)): Path<(OrganizationId, BankTransactionId)>,
) -> Result<Json<BankTransactionResponse>, ApiError> {
    let row = state.bank().get_transaction(org_id, transaction_id).await?;
    Ok(Json(row.into()))
}

/// POST `/organizations/{org_id}/bankTransactions/reconcile`
///
/// Runs automatic matching over every unreconciled transaction and returns
/// the links it made.
async fn reconcile(
    State(state): State<AppState>,
    _actor: Actor,
    Path(org_id): Path<OrganizationId>,
) -> Result<Json<Value>, ApiError> {
    let matches: Vec<Match> = state.bank().reconcile(org_id).await?;
    Ok(Json(json!({ "data": matches })))
}

async fn link_transaction(
    State(state): State<AppState>,
    _actor: Actor,
    Path((org_id, transaction_id)): Path<(OrganizationId, BankTransactionId)>,
    JsonBody(payload): JsonBody<LinkRequest>,
) -> Result<Json<BankTransactionResponse>, ApiError> {
    let row = state
        .bank()
        .link(org_id, transaction_id, payload.journal_entry_id)
        .await?;
    Ok(Json(row.into()))
}

async fn unlink_transaction(
    State(state): State<AppState>,
    _actor: Actor,
    Path((org_id, transaction_id)): Path<(OrganizationId, BankTransactionId)>,
) -> Result<Json<BankTransactionResponse>, ApiError> {
    let row = state.bank().unlink(org_id, transaction_id).await?;
    Ok(Json(row.into()))
}
