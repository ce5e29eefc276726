//! Journal entry routes.
//!
//! Entries are created as drafts or posted directly with `"status": "posted"`.
//! Posted entries are never edited; they are voided, which posts a reversing
//! entry alongside.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use ledgerline_core::ledger::{EntryStatus, EntryType, JournalLineInput};
use ledgerline_db::entities::{journal_entries, journal_lines};
use ledgerline_db::repositories::{
    CreateEntryInput, EntryFilter, EntryWithLines, UpdateDraftInput, VoidOutcome,
};
use ledgerline_shared::types::{
    FiscalPeriodId, JournalEntryId, OrganizationId, PageRequest, PageResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::double_option;
use crate::{
    AppState,
    error::ApiError,
    extractors::{Json as JsonBody, Path, Query},
    middleware::Actor,
};

/// Creates the journal entry routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations/{org_id}/journalEntries",
            get(list_entries).post(create_entry),
        )
        .route(
            "/organizations/{org_id}/journalEntries/{entry_id}",
            get(get_entry).patch(update_entry).delete(delete_entry),
        )
        .route(
            "/organizations/{org_id}/journalEntries/{entry_id}/post",
            post(post_entry),
        )
        .route(
            "/organizations/{org_id}/journalEntries/{entry_id}/void",
            post(void_entry),
        )
        .route(
            "/organizations/{org_id}/journalEntries/{entry_id}/cancel",
            post(cancel_entry),
        )
}

/// Request body for creating an entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryRequest {
    /// Must match the path when present.
    pub organization_id: Option<OrganizationId>,
    /// Fiscal period the entry belongs to.
    pub fiscal_period_id: FiscalPeriodId,
    /// Journal number.
    pub journal_number: String,
    /// Entry date.
    pub entry_date: NaiveDate,
    /// Entry type.
    #[serde(default = "default_entry_type")]
    pub entry_type: EntryType,
    /// Description.
    pub description: Option<String>,
    /// `draft` (default) or `posted`.
    pub status: Option<EntryStatus>,
    /// Entry lines.
    pub journal_lines: Vec<JournalLineInput>,
}

const fn default_entry_type() -> EntryType {
    EntryType::Standard
}

impl From<CreateEntryRequest> for CreateEntryInput {
    fn from(req: CreateEntryRequest) -> Self {
        Self {
            fiscal_period_id: req.fiscal_period_id,
            journal_number: req.journal_number,
            entry_date: req.entry_date,
            entry_type: req.entry_type,
            description: req.description,
            lines: req.journal_lines,
        }
    }
}

/// Request body for editing a draft.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntryRequest {
    /// New fiscal period.
    pub fiscal_period_id: Option<FiscalPeriodId>,
    /// New journal number.
    pub journal_number: Option<String>,
    /// New entry date.
    pub entry_date: Option<NaiveDate>,
    /// New entry type.
    pub entry_type: Option<EntryType>,
    /// New description; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    /// Replacement lines.
    pub journal_lines: Option<Vec<JournalLineInput>>,
}

impl From<UpdateEntryRequest> for UpdateDraftInput {
    fn from(req: UpdateEntryRequest) -> Self {
        Self {
            fiscal_period_id: req.fiscal_period_id,
            journal_number: req.journal_number,
            entry_date: req.entry_date,
            entry_type: req.entry_type,
            description: req.description,
            lines: req.journal_lines,
        }
    }
}

/// Query parameters for listing entries.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntriesQuery {
    /// Filter by status.
    pub status: Option<EntryStatus>,
    /// Filter by type.
    pub entry_type: Option<EntryType>,
    /// Filter by period.
    pub fiscal_period_id: Option<FiscalPeriodId>,
    /// Entries dated on or after.
    pub from: Option<NaiveDate>,
    /// Entries dated on or before.
    pub to: Option<NaiveDate>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Request body for voiding a posted entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoidEntryRequest {
    /// Why the entry is voided.
    pub reason: String,
    /// Date of the reversing entry; today when absent.
    pub reversal_date: Option<NaiveDate>,
}

/// A journal line in responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineResponse {
    /// Line ID.
    pub id: Uuid,
    /// Position within the entry.
    pub line_number: i32,
    /// Account hit by the line.
    pub ledger_account_id: Uuid,
    /// Debit amount.
    pub debit_amount: Decimal,
    /// Credit amount.
    pub credit_amount: Decimal,
    /// Memo.
    pub description: Option<String>,
    /// Cost center.
    pub cost_center_id: Option<Uuid>,
}

impl From<journal_lines::Model> for LineResponse {
    fn from(m: journal_lines::Model) -> Self {
        Self {
            id: m.id,
            line_number: m.line_number,
            ledger_account_id: m.ledger_account_id,
            debit_amount: m.debit_amount,
            credit_amount: m.credit_amount,
            description: m.description,
            cost_center_id: m.cost_center_id,
        }
    }
}

/// A journal entry in responses. Lines are omitted in list results.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    /// Entry ID.
    pub id: Uuid,
    /// Owning organization.
    pub organization_id: Uuid,
    /// Fiscal period.
    pub fiscal_period_id: Uuid,
    /// Journal number.
    pub journal_number: String,
    /// Entry date.
    pub entry_date: NaiveDate,
    /// Entry type.
    pub entry_type: EntryType,
    /// Lifecycle status.
    pub status: EntryStatus,
    /// Description.
    pub description: Option<String>,
    /// Assigned at posting.
    pub posting_sequence: Option<i64>,
    /// Reversing entry, once voided.
    pub reversed_by: Option<Uuid>,
    /// Entry this one reverses.
    pub reverses: Option<Uuid>,
    /// Why the entry was voided.
    pub void_reason: Option<String>,
    /// Creator.
    pub created_by: Uuid,
    /// Poster.
    pub posted_by: Option<Uuid>,
    /// Posting time.
    pub posted_at: Option<DateTime<FixedOffset>>,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
    /// Last change.
    pub updated_at: DateTime<FixedOffset>,
    /// Entry lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal_lines: Option<Vec<LineResponse>>,
}

impl From<journal_entries::Model> for EntryResponse {
    fn from(m: journal_entries::Model) -> Self {
        Self {
            id: m.id,
            organization_id: m.organization_id,
            fiscal_period_id: m.fiscal_period_id,
            journal_number: m.journal_number,
            entry_date: m.entry_date,
            entry_type: m.entry_type.into(),
            status: m.status.into(),
            description: m.description,
            posting_sequence: m.posting_sequence,
            reversed_by: m.reversed_by,
            reverses: m.reverses,
            void_reason: m.void_reason,
            created_by: m.created_by,
            posted_by: m.posted_by,
            posted_at: m.posted_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
            journal_lines: None,
        }
    }
}

impl From<EntryWithLines> for EntryResponse {
    fn from(value: EntryWithLines) -> Self {
        Self {
            journal_lines: Some(value.lines.into_iter().map(Into::into).collect()),
            ..Self::from(value.entry)
        }
    }
}

/// Response for a void: the voided original and its reversal.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoidResponse {
    /// The original entry, now voided.
    pub original: EntryResponse,
    /// The posted reversing entry.
    pub reversal: EntryResponse,
}

impl From<VoidOutcome> for VoidResponse {
    fn from(outcome: VoidOutcome) -> Self {
        Self {
            original: outcome.original.into(),
            reversal: outcome.reversal.into(),
        }
    }
}

/// POST `/organizations/{org_id}/journalEntries` - Create a draft or post directly.
async fn create_entry(
    State(state): State<AppState>,
    actor: Actor,
    Path(org_id): Path<OrganizationId>,
    JsonBody(payload): JsonBody<CreateEntryRequest>,
) -> Result<(StatusCode, Json<EntryResponse>), ApiError> {
    if payload.organization_id.is_some_and(|id| id != org_id) {
        return Err(ApiError::validation(
            "organizationId does not match the organization in the path",
        ));
    }

    let status = payload.status.unwrap_or(EntryStatus::Draft);
    let input = CreateEntryInput::from(payload);
    let repo = state.journal();
    let created = match status {
        EntryStatus::Draft => repo.create_draft(org_id, actor.id, &input).await?,
        EntryStatus::Posted => repo.create_and_post(org_id, actor.id, &input).await?,
        EntryStatus::Voided => {
            return Err(ApiError::validation(
                "New entries must be created as draft or posted",
            ));
        }
    };

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// GET `/organizations/{org_id}/journalEntries` - Paged entry headers, newest first.
async fn list_entries(
    State(state): State<AppState>,
    _actor: Actor,
    Path(org_id): Path<OrganizationId>,
    Query(query): Query<ListEntriesQuery>,
) -> Result<Json<PageResponse<EntryResponse>>, ApiError> {
    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page).max(1),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };
    let filter = EntryFilter {
        status: query.status,
        entry_type: query.entry_type,
        fiscal_period_id: query.fiscal_period_id,
        from: query.from,
        to: query.to,
    };

    let (entries, total) = state.journal().list_entries(org_id, &filter, &page).await?;
    let per_page = u32::try_from(page.limit()).unwrap_or(page.per_page);
    let data = entries.into_iter().map(Into::into).collect();
    Ok(Json(PageResponse::new(data, page.page, per_page, total)))
}

async fn get_entry(
    State(state): State<AppState>,
    _actor: Actor,
    Path((org_id, entry_id)): Path<(OrganizationId, JournalEntryId)>,
) -> Result<Json<EntryResponse>, ApiError> {
    let entry = state.journal().get_entry(org_id, entry_id).await?;
    Ok(Json(entry.into()))
}

/// PATCH `/organizations/{org_id}/journalEntries/{entry_id}` - Edit a draft.
async fn update_entry(
    State(state): State<AppState>,
    _actor: Actor,
    Path((org_id, entry_id)): Path<(OrganizationId, JournalEntryId)>,
    JsonBody(payload): JsonBody<UpdateEntryRequest>,
) -> Result<Json<EntryResponse>, ApiError> {
    let entry = state
        .journal()
        .update_draft(org_id, entry_id, payload.into())
        .await?;
    Ok(Json(entry.into()))
}

/// DELETE `/organizations/{org_id}/journalEntries/{entry_id}` - Delete a draft.
async fn delete_entry(
    State(state): State<AppState>,
    _actor: Actor,
    Path((org_id, entry_id)): Path<(OrganizationId, JournalEntryId)>,
) -> Result<StatusCode, ApiError> {
    state.journal().delete_draft(org_id, entry_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/organizations/{org_id}/journalEntries/{entry_id}/post`
async fn post_entry(
    State(state): State<AppState>,
    actor: Actor,
    Path((org_id, entry_id)): Path<(OrganizationId, JournalEntryId)>,
) -> Result<Json<EntryResponse>, ApiError> {
    let entry = state.journal().post(org_id, entry_id, actor.id).await?;
    Ok(Json(entry.into()))
}

/// POST `/organizations/{org_id}/journalEntries/{entry_id}/void`
async fn void_entry(
    State(state): State<AppState>,
    actor: Actor,
    Path((org_id, entry_id)): Path<(OrganizationId, JournalEntryId)>,
    JsonBody(payload): JsonBody<VoidEntryRequest>,
) -> Result<Json<VoidResponse>, ApiError> {
    if payload.reason.trim().is_empty() {
        return Err(ApiError::validation("A void reason is required"));
    }
    let outcome = state
        .journal()
        .void(
            org_id,
            entry_id,
            payload.reason.trim(),
            payload.reversal_date,
            actor.id,
        )
        .await?;
    Ok(Json(outcome.into()))
}

/// POST `/organizations/{org_id}/journalEntries/{entry_id}/cancel` - Void a draft.
async fn cancel_entry(
    State(state): State<AppState>,
    _actor: Actor,
    Path((org_id, entry_id)): Path<(OrganizationId, JournalEntryId)>,
) -> Result<Json<EntryResponse>, ApiError> {
    let entry = state.journal().cancel(org_id, entry_id).await?;
    Ok(Json(entry.into()))
}
