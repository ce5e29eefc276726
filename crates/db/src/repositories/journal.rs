//! Journal repository: drafts, posting, voiding and cancellation.
//!
//! Posting is one transaction. The entry is validated by `LedgerService`,
//! each balance delta is applied with a `version` guard, the fiscal period is
//! touched while still open, the next posting sequence is taken and the entry
//! flips to `posted`. A lost race surfaces as `ConcurrencyConflict` and the
//! whole unit is retried once.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::future::Future;

use chrono::{NaiveDate, Utc};
use ledgerline_core::fiscal::FiscalPeriodStatus;
use ledgerline_core::ledger::{
    BALANCE_TOLERANCE, BalanceDelta, EntryStatus, EntryType, JournalLineInput, LedgerError,
    LedgerService, PostingInput, PostingRejection,
};
use ledgerline_shared::types::{
    AccountId, ActorId, FiscalPeriodId, JournalEntryId, OrganizationId, PageRequest,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait, sea_query::Expr,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::fiscal::load_calendar;
use super::unique_violation;
use crate::entities::{
    enums, fiscal_periods, journal_entries, journal_lines, ledger_accounts, ledger_sequences,
};

/// Error types for journal operations.
#[derive(Debug, thiserror::Error)]
pub enum JournalRepoError {
    /// A journal rule was violated.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl JournalRepoError {
    /// True for failures worth one more attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Ledger(LedgerError::ConcurrencyConflict))
    }
}

/// Input for creating a journal entry.
#[derive(Debug, Clone)]
pub struct CreateEntryInput {
    /// Fiscal period the entry belongs to.
    pub fiscal_period_id: FiscalPeriodId,
    /// Journal number, unique within the organization.
    pub journal_number: String,
    /// Entry date.
    pub entry_date: NaiveDate,
    /// Entry type.
    pub entry_type: EntryType,
    /// Free-text description.
    pub description: Option<String>,
    /// Entry lines.
    pub lines: Vec<JournalLineInput>,
}

/// Changes to a draft entry. `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct UpdateDraftInput {
    /// New fiscal period.
    pub fiscal_period_id: Option<FiscalPeriodId>,
    /// New journal number.
    pub journal_number: Option<String>,
    /// New entry date.
    pub entry_date: Option<NaiveDate>,
    /// New entry type.
    pub entry_type: Option<EntryType>,
    /// New description (`Some(None)` clears it).
    pub description: Option<Option<String>>,
    /// Replacement lines.
    pub lines: Option<Vec<JournalLineInput>>,
}

/// Filter options for listing entries.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Only entries in this status.
    pub status: Option<EntryStatus>,
    /// Only entries of this type.
    pub entry_type: Option<EntryType>,
    /// Only entries in this period.
    pub fiscal_period_id: Option<FiscalPeriodId>,
    /// Entries dated on or after.
    pub from: Option<NaiveDate>,
    /// Entries dated on or before.
    pub to: Option<NaiveDate>,
}

/// A journal entry with its lines ordered by line number.
#[derive(Debug, Clone)]
pub struct EntryWithLines {
    /// The entry header.
    pub entry: journal_entries::Model,
    /// The entry lines.
    pub lines: Vec<journal_lines::Model>,
}

/// Result of voiding an entry.
#[derive(Debug, Clone)]
pub struct VoidOutcome {
    /// The original entry, now `voided`.
    pub original: EntryWithLines,
    /// The posted reversing entry.
    pub reversal: EntryWithLines,
}

/// Journal repository.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: DatabaseConnection,
    tolerance: Decimal,
}

impl JournalRepository {
    /// Creates a new journal repository with the default balance tolerance.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            tolerance: BALANCE_TOLERANCE,
        }
    }

    /// Overrides the accepted `|debits - credits|`.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Stores a draft entry.
    ///
    /// Drafts are checked for line shape, a unique journal number, that the
    /// accounts exist and that the period exists and is open. Balance is
    /// only enforced at posting.
    pub async fn create_draft(
        &self,
        organization_id: OrganizationId,
        actor: ActorId,
        input: &CreateEntryInput,
    ) -> Result<EntryWithLines, JournalRepoError> {
        let txn = self.db.begin().await?;
        let id = insert_draft(&txn, organization_id, actor, input, None).await?;
        let created = load_entry(&txn, organization_id, id).await?;
        txn.commit().await?;

        info!(
            org_id = %organization_id,
            entry_id = %id,
            journal_number = %input.journal_number,
            "Journal entry drafted"
        );
        Ok(created)
    }

    /// Creates an entry and posts it in the same transaction.
    ///
    /// Nothing is stored when posting is rejected.
    pub async fn create_and_post(
        &self,
        organization_id: OrganizationId,
        actor: ActorId,
        input: &CreateEntryInput,
    ) -> Result<EntryWithLines, JournalRepoError> {
        let posted = retry_once("create_and_post", move || async move {
            let txn = self.db.begin().await?;
            let id = insert_draft(&txn, organization_id, actor, input, None).await?;
            self.post_in(&txn, organization_id, id, actor).await?;
            let posted = load_entry(&txn, organization_id, id).await?;
            txn.commit().await?;
            Ok(posted)
        })
        .await?;

        info!(
            org_id = %organization_id,
            entry_id = %posted.entry.id,
            sequence = ?posted.entry.posting_sequence,
            "Journal entry created and posted"
        );
        Ok(posted)
    }

    /// Finds an entry with its lines.
    pub async fn get_entry(
        &self,
        organization_id: OrganizationId,
        id: JournalEntryId,
    ) -> Result<EntryWithLines, JournalRepoError> {
        load_entry(&self.db, organization_id, id).await
    }

    /// Lists entry headers, newest first, with the total count.
    pub async fn list_entries(
        &self,
        organization_id: OrganizationId,
        filter: &EntryFilter,
        page: &PageRequest,
    ) -> Result<(Vec<journal_entries::Model>, u64), JournalRepoError> {
        let mut query = journal_entries::Entity::find()
            .filter(journal_entries::Column::OrganizationId.eq(organization_id.into_inner()));

        if let Some(status) = filter.status {
            query = query.filter(journal_entries::Column::Status.eq(enums::EntryStatus::from(status)));
        }
        if let Some(entry_type) = filter.entry_type {
            query = query
                .filter(journal_entries::Column::EntryType.eq(enums::EntryType::from(entry_type)));
        }
        if let Some(period_id) = filter.fiscal_period_id {
            query = query.filter(journal_entries::Column::FiscalPeriodId.eq(period_id.into_inner()));
        }
        if let Some(from) = filter.from {
            query = query.filter(journal_entries::Column::EntryDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(journal_entries::Column::EntryDate.lte(to));
        }

        let total = query.clone().count(&self.db).await?;
        let entries = query
            .order_by_desc(journal_entries::Column::EntryDate)
            .order_by_desc(journal_entries::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((entries, total))
    }

    /// Edits a draft. Replacing the lines replaces all of them.
    pub async fn update_draft(
        &self,
        organization_id: OrganizationId,
        id: JournalEntryId,
        patch: UpdateDraftInput,
    ) -> Result<EntryWithLines, JournalRepoError> {
        let txn = self.db.begin().await?;

        let current = load_entry(&txn, organization_id, id).await?;
        LedgerService::check_can_modify(current.entry.status.into())?;

        let replace_lines = patch.lines.is_some();
        let merged = CreateEntryInput {
            fiscal_period_id: patch
                .fiscal_period_id
                .unwrap_or_else(|| current.entry.fiscal_period_id.into()),
            journal_number: patch
                .journal_number
                .unwrap_or_else(|| current.entry.journal_number.clone()),
            entry_date: patch.entry_date.unwrap_or(current.entry.entry_date),
            entry_type: patch
                .entry_type
                .unwrap_or_else(|| current.entry.entry_type.into()),
            description: patch
                .description
                .unwrap_or_else(|| current.entry.description.clone()),
            lines: patch.lines.unwrap_or_else(|| {
                current.lines.iter().cloned().map(Into::into).collect()
            }),
        };
        let journal_number = check_draft(&txn, organization_id, &merged, Some(id)).await?;

        // The status guard also holds the row against a concurrent post.
        let result = journal_entries::Entity::update_many()
            .col_expr(
                journal_entries::Column::FiscalPeriodId,
                Expr::value(merged.fiscal_period_id.into_inner()),
            )
            .col_expr(
                journal_entries::Column::JournalNumber,
                Expr::value(journal_number.as_str()),
            )
            .col_expr(journal_entries::Column::EntryDate, Expr::value(merged.entry_date))
            .col_expr(
                journal_entries::Column::EntryType,
                Expr::value(enums::EntryType::from(merged.entry_type)),
            )
            .col_expr(
                journal_entries::Column::Description,
                Expr::value(merged.description),
            )
            .col_expr(
                journal_entries::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(journal_entries::Column::Id.eq(id.into_inner()))
            .filter(journal_entries::Column::Status.eq(enums::EntryStatus::Draft))
            .exec(&txn)
            .await
            .map_err(|err| entry_write_error(err, &journal_number))?;
        if result.rows_affected == 0 {
            return Err(LedgerError::ConcurrencyConflict.into());
        }

        if replace_lines {
            journal_lines::Entity::delete_many()
                .filter(journal_lines::Column::JournalEntryId.eq(id.into_inner()))
                .exec(&txn)
                .await?;
            insert_lines(&txn, id.into_inner(), &merged.lines).await?;
        }

        let updated = load_entry(&txn, organization_id, id).await?;
        txn.commit().await?;

        info!(org_id = %organization_id, entry_id = %id, "Journal draft updated");
        Ok(updated)
    }

    /// Deletes a draft and its lines.
    pub async fn delete_draft(
        &self,
        organization_id: OrganizationId,
        id: JournalEntryId,
    ) -> Result<(), JournalRepoError> {
        let txn = self.db.begin().await?;

        let entry = find_entry(&txn, organization_id, id).await?;
        LedgerService::check_can_modify(entry.status.into())?;

        if !claim_draft(&txn, organization_id, id).await? {
            return Err(LedgerError::ConcurrencyConflict.into());
        }

        journal_lines::Entity::delete_many()
            .filter(journal_lines::Column::JournalEntryId.eq(id.into_inner()))
            .exec(&txn)
            .await?;
        journal_entries::Entity::delete_by_id(id.into_inner())
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(org_id = %organization_id, entry_id = %id, "Journal draft deleted");
        Ok(())
    }

    /// Posts a draft.
    ///
    /// # Errors
    ///
    /// - `AlreadyFinal` if the entry is posted or voided
    /// - `PostingRejected` if validation fails; the entry stays draft
    /// - `ConcurrencyConflict` if a second attempt also loses a race
    pub async fn post(
        &self,
        organization_id: OrganizationId,
        id: JournalEntryId,
        actor: ActorId,
    ) -> Result<EntryWithLines, JournalRepoError> {
        let posted = retry_once("post", move || async move {
            let txn = self.db.begin().await?;
            self.post_in(&txn, organization_id, id, actor).await?;
            let posted = load_entry(&txn, organization_id, id).await?;
            txn.commit().await?;
            Ok(posted)
        })
        .await?;

        info!(
            org_id = %organization_id,
            entry_id = %id,
            sequence = ?posted.entry.posting_sequence,
            "Journal entry posted"
        );
        Ok(posted)
    }

    /// Voids a posted entry by posting a reversing entry.
    ///
    /// The reversal is dated `reversal_date` (today when absent) and posts
    /// into the open period containing that date, whatever the status of the
    /// original's period. The original's lines are left untouched.
    ///
    /// # Errors
    ///
    /// - `NotPosted` for drafts, `AlreadyFinal` for voided entries
    /// - `NoOpenPeriod` if no open period covers the reversal date
    pub async fn void(
        &self,
        organization_id: OrganizationId,
        id: JournalEntryId,
        reason: &str,
        reversal_date: Option<NaiveDate>,
        actor: ActorId,
    ) -> Result<VoidOutcome, JournalRepoError> {
        let reversal_date = reversal_date.unwrap_or_else(|| Utc::now().date_naive());

        let outcome = retry_once("void", move || async move {
            let txn = self.db.begin().await?;
            let reversal_id = self
                .void_in(&txn, organization_id, id, reason, reversal_date, actor)
                .await?;
            let outcome = VoidOutcome {
                original: load_entry(&txn, organization_id, id).await?,
                reversal: load_entry(&txn, organization_id, reversal_id).await?,
            };
            txn.commit().await?;
            Ok(outcome)
        })
        .await?;

        info!(
            org_id = %organization_id,
            entry_id = %id,
            reversal_id = %outcome.reversal.entry.id,
            "Journal entry voided"
        );
        Ok(outcome)
    }

    /// Cancels a draft (`draft → voided`) without touching balances.
    pub async fn cancel(
        &self,
        organization_id: OrganizationId,
        id: JournalEntryId,
    ) -> Result<EntryWithLines, JournalRepoError> {
        let txn = self.db.begin().await?;

        let entry = find_entry(&txn, organization_id, id).await?;
        LedgerService::check_can_cancel(entry.status.into())?;

        let result = journal_entries::Entity::update_many()
            .col_expr(
                journal_entries::Column::Status,
                Expr::value(enums::EntryStatus::Voided),
            )
            .col_expr(
                journal_entries::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(journal_entries::Column::Id.eq(id.into_inner()))
            .filter(journal_entries::Column::Status.eq(enums::EntryStatus::Draft))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(LedgerError::ConcurrencyConflict.into());
        }

        let cancelled = load_entry(&txn, organization_id, id).await?;
        txn.commit().await?;

        info!(org_id = %organization_id, entry_id = %id, "Journal draft cancelled");
        Ok(cancelled)
    }

    async fn post_in(
        &self,
        txn: &DatabaseTransaction,
        organization_id: OrganizationId,
        id: JournalEntryId,
        actor: ActorId,
    ) -> Result<(), JournalRepoError> {
        // Lock the draft before reading it so a concurrent edit either lands
        // first or fails its own status guard.
        let claimed = claim_draft(txn, organization_id, id).await?;
        let entry = find_entry(txn, organization_id, id).await?;
        LedgerService::check_can_post(entry.status.into())?;
        if !claimed {
            return Err(LedgerError::ConcurrencyConflict.into());
        }

        let lines: Vec<JournalLineInput> = journal_lines::Entity::find()
            .filter(journal_lines::Column::JournalEntryId.eq(entry.id))
            .order_by_asc(journal_lines::Column::LineNumber)
            .all(txn)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        let period = fiscal_periods::Entity::find_by_id(entry.fiscal_period_id)
            .filter(fiscal_periods::Column::OrganizationId.eq(organization_id.into_inner()))
            .one(txn)
            .await?
            .map(ledgerline_core::fiscal::FiscalPeriod::from);

        let account_ids: BTreeSet<Uuid> = lines
            .iter()
            .map(|l| l.ledger_account_id.into_inner())
            .collect();
        let accounts: HashMap<AccountId, ledger_accounts::Model> = ledger_accounts::Entity::find()
            .filter(ledger_accounts::Column::Id.is_in(account_ids))
            .all(txn)
            .await?
            .into_iter()
            .map(|a| (AccountId::from(a.id), a))
            .collect();

        let input = PostingInput {
            organization_id,
            entry_date: entry.entry_date,
            fiscal_period_id: entry.fiscal_period_id.into(),
            lines: &lines,
        };
        let plan = LedgerService::validate(
            &input,
            period.as_ref(),
            |account_id| accounts.get(&account_id).map(ledger_accounts::Model::posting_info),
            self.tolerance,
        )?;

        for delta in &plan.deltas {
            let seen = accounts
                .get(&delta.account_id)
                .map(|a| a.version)
                .ok_or(LedgerError::PostingRejected(PostingRejection::AccountNotFound(
                    delta.account_id,
                )))?;
            apply_delta(txn, delta, seen).await?;
        }

        touch_open_period(txn, entry.fiscal_period_id).await?;
        let sequence = next_sequence(txn, organization_id).await?;

        let now = Utc::now().fixed_offset();
        let result = journal_entries::Entity::update_many()
            .col_expr(
                journal_entries::Column::Status,
                Expr::value(enums::EntryStatus::Posted),
            )
            .col_expr(journal_entries::Column::PostingSequence, Expr::value(sequence))
            .col_expr(
                journal_entries::Column::PostedBy,
                Expr::value(actor.into_inner()),
            )
            .col_expr(journal_entries::Column::PostedAt, Expr::value(now))
            .col_expr(journal_entries::Column::UpdatedAt, Expr::value(now))
            .filter(journal_entries::Column::Id.eq(entry.id))
            .filter(journal_entries::Column::Status.eq(enums::EntryStatus::Draft))
            .exec(txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(LedgerError::ConcurrencyConflict.into());
        }

        Ok(())
    }

    async fn void_in(
        &self,
        txn: &DatabaseTransaction,
        organization_id: OrganizationId,
        id: JournalEntryId,
        reason: &str,
        reversal_date: NaiveDate,
        actor: ActorId,
    ) -> Result<JournalEntryId, JournalRepoError> {
        let original = load_entry(txn, organization_id, id).await?;
        LedgerService::check_can_void(original.entry.status.into())?;

        let calendar = load_calendar(txn, organization_id).await?;
        let period_id = calendar
            .current_open_period(reversal_date)
            .map_err(|_| LedgerError::NoOpenPeriod(reversal_date))?
            .id;

        let lines: Vec<JournalLineInput> = original.lines.into_iter().map(Into::into).collect();
        let taken = reversal_numbers_in_use(txn, organization_id, &original.entry.journal_number)
            .await?;
        let reversal = CreateEntryInput {
            fiscal_period_id: period_id,
            journal_number: LedgerService::reversal_journal_number(
                &original.entry.journal_number,
                |number| taken.contains(number),
            ),
            entry_date: reversal_date,
            entry_type: EntryType::Reversing,
            description: Some(LedgerService::reversal_description(
                &original.entry.journal_number,
                reason,
            )),
            lines: LedgerService::reversal_lines(&lines),
        };
        let reversal_id =
            insert_draft(txn, organization_id, actor, &reversal, Some(original.entry.id)).await?;
        self.post_in(txn, organization_id, reversal_id, actor).await?;

        let result = journal_entries::Entity::update_many()
            .col_expr(
                journal_entries::Column::Status,
                Expr::value(enums::EntryStatus::Voided),
            )
            .col_expr(
                journal_entries::Column::ReversedBy,
                Expr::value(reversal_id.into_inner()),
            )
            .col_expr(
                journal_entries::Column::VoidReason,
                Expr::value(reason.to_string()),
            )
            .col_expr(
                journal_entries::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(journal_entries::Column::Id.eq(id.into_inner()))
            .filter(journal_entries::Column::Status.eq(enums::EntryStatus::Posted))
            .exec(txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(LedgerError::ConcurrencyConflict.into());
        }

        Ok(reversal_id)
    }
}

/// Runs `attempt`, and once more if the first run lost a race.
async fn retry_once<T, F, Fut>(operation: &'static str, mut attempt: F) -> Result<T, JournalRepoError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, JournalRepoError>>,
{
    match attempt().await {
        Err(err) if err.is_retryable() => {
            warn!(operation, "Concurrency conflict, retrying once");
            attempt().await
        }
        other => other,
    }
}

async fn find_entry<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    id: JournalEntryId,
) -> Result<journal_entries::Model, JournalRepoError> {
    journal_entries::Entity::find_by_id(id.into_inner())
        .filter(journal_entries::Column::OrganizationId.eq(organization_id.into_inner()))
        .one(conn)
        .await?
        .ok_or(JournalRepoError::Ledger(LedgerError::EntryNotFound(id)))
}

pub(crate) async fn load_entry<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    id: JournalEntryId,
) -> Result<EntryWithLines, JournalRepoError> {
    let entry = find_entry(conn, organization_id, id).await?;
    let lines = journal_lines::Entity::find()
        .filter(journal_lines::Column::JournalEntryId.eq(entry.id))
        .order_by_asc(journal_lines::Column::LineNumber)
        .all(conn)
        .await?;
    Ok(EntryWithLines { entry, lines })
}

/// Checks a draft against stored state and returns the trimmed journal number.
async fn check_draft<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    input: &CreateEntryInput,
    existing: Option<JournalEntryId>,
) -> Result<String, JournalRepoError> {
    let journal_number = input.journal_number.trim().to_string();
    if journal_number.is_empty() {
        return Err(LedgerError::MissingField("journalNumber").into());
    }
    LedgerService::validate_draft(&input.lines)?;

    let mut duplicate = journal_entries::Entity::find()
        .filter(journal_entries::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(journal_entries::Column::JournalNumber.eq(journal_number.as_str()));
    if let Some(existing) = existing {
        duplicate = duplicate.filter(journal_entries::Column::Id.ne(existing.into_inner()));
    }
    if duplicate.count(conn).await? > 0 {
        return Err(LedgerError::DuplicateJournalNumber(journal_number).into());
    }

    let period = fiscal_periods::Entity::find_by_id(input.fiscal_period_id.into_inner())
        .filter(fiscal_periods::Column::OrganizationId.eq(organization_id.into_inner()))
        .one(conn)
        .await?
        .map(ledgerline_core::fiscal::FiscalPeriod::from)
        .ok_or(LedgerError::InvalidEntry(PostingRejection::PeriodNotFound(
            input.fiscal_period_id,
        )))?;
    // Closed periods hold no drafts and locked periods take no new references.
    if period.status != FiscalPeriodStatus::Open {
        return Err(
            LedgerError::PostingRejected(PostingRejection::PeriodNotOpen(period.status)).into(),
        );
    }

    let wanted: BTreeSet<Uuid> = input
        .lines
        .iter()
        .map(|l| l.ledger_account_id.into_inner())
        .collect();
    let found: BTreeSet<Uuid> = ledger_accounts::Entity::find()
        .filter(ledger_accounts::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(ledger_accounts::Column::Id.is_in(wanted.iter().copied()))
        .all(conn)
        .await?
        .into_iter()
        .map(|a| a.id)
        .collect();
    if let Some(missing) = wanted.difference(&found).next() {
        return Err(LedgerError::InvalidEntry(PostingRejection::AccountNotFound(
            (*missing).into(),
        ))
        .into());
    }

    Ok(journal_number)
}

/// Maps a unique index violation to `DuplicateJournalNumber`.
fn entry_write_error(err: DbErr, journal_number: &str) -> JournalRepoError {
    if unique_violation(&err).is_some() {
        LedgerError::DuplicateJournalNumber(journal_number.to_string()).into()
    } else {
        err.into()
    }
}

/// Touches a draft's `updated_at`, taking its row lock. Returns false when
/// the entry is missing or no longer a draft.
async fn claim_draft<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    id: JournalEntryId,
) -> Result<bool, DbErr> {
    let result = journal_entries::Entity::update_many()
        .col_expr(
            journal_entries::Column::UpdatedAt,
            Expr::value(Utc::now().fixed_offset()),
        )
        .filter(journal_entries::Column::Id.eq(id.into_inner()))
        .filter(journal_entries::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(journal_entries::Column::Status.eq(enums::EntryStatus::Draft))
        .exec(conn)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Journal numbers already used by reversals of `original`.
async fn reversal_numbers_in_use<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    original: &str,
) -> Result<HashSet<String>, DbErr> {
    let numbers = journal_entries::Entity::find()
        .filter(journal_entries::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(journal_entries::Column::JournalNumber.starts_with(format!("{original}-REV")))
        .all(conn)
        .await?
        .into_iter()
        .map(|entry| entry.journal_number)
        .collect();
    Ok(numbers)
}

async fn insert_draft(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    actor: ActorId,
    input: &CreateEntryInput,
    reverses: Option<Uuid>,
) -> Result<JournalEntryId, JournalRepoError> {
    let journal_number = check_draft(txn, organization_id, input, None).await?;

    let id = JournalEntryId::new();
    let now = Utc::now().into();
    journal_entries::ActiveModel {
        id: Set(id.into_inner()),
        organization_id: Set(organization_id.into_inner()),
        fiscal_period_id: Set(input.fiscal_period_id.into_inner()),
        journal_number: Set(journal_number.clone()),
        entry_date: Set(input.entry_date),
        entry_type: Set(input.entry_type.into()),
        status: Set(enums::EntryStatus::Draft),
        description: Set(input.description.clone()),
        posting_sequence: Set(None),
        reversed_by: Set(None),
        reverses: Set(reverses),
        void_reason: Set(None),
        created_by: Set(actor.into_inner()),
        posted_by: Set(None),
        posted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(txn)
    .await
    .map_err(|err| entry_write_error(err, &journal_number))?;

    insert_lines(txn, id.into_inner(), &input.lines).await?;
    Ok(id)
}

async fn insert_lines(
    txn: &DatabaseTransaction,
    entry_id: Uuid,
    lines: &[JournalLineInput],
) -> Result<(), DbErr> {
    let models = lines.iter().map(|line| journal_lines::ActiveModel {
        id: Set(Uuid::now_v7()),
        journal_entry_id: Set(entry_id),
        line_number: Set(line.line_number),
        ledger_account_id: Set(line.ledger_account_id.into_inner()),
        debit_amount: Set(line.debit_amount),
        credit_amount: Set(line.credit_amount),
        description: Set(line.description.clone()),
        cost_center_id: Set(line.cost_center_id.map(Into::into)),
    });
    journal_lines::Entity::insert_many(models).exec(txn).await?;
    Ok(())
}

/// Adds `delta` to an account's running balance if its version is still `seen`.
async fn apply_delta(
    txn: &DatabaseTransaction,
    delta: &BalanceDelta,
    seen: i32,
) -> Result<(), JournalRepoError> {
    let result = ledger_accounts::Entity::update_many()
        .col_expr(
            ledger_accounts::Column::Balance,
            Expr::col(ledger_accounts::Column::Balance).add(delta.delta),
        )
        .col_expr(
            ledger_accounts::Column::Version,
            Expr::col(ledger_accounts::Column::Version).add(1),
        )
        .col_expr(
            ledger_accounts::Column::UpdatedAt,
            Expr::value(Utc::now().fixed_offset()),
        )
        .filter(ledger_accounts::Column::Id.eq(delta.account_id.into_inner()))
        .filter(ledger_accounts::Column::Version.eq(seen))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        warn!(account_id = %delta.account_id, version = seen, "Stale account version");
        return Err(LedgerError::ConcurrencyConflict.into());
    }
    Ok(())
}

/// Conditional write on the period row; fails once the period left `open`.
async fn touch_open_period(
    txn: &DatabaseTransaction,
    period_id: Uuid,
) -> Result<(), JournalRepoError> {
    let result = fiscal_periods::Entity::update_many()
        .col_expr(
            fiscal_periods::Column::UpdatedAt,
            Expr::value(Utc::now().fixed_offset()),
        )
        .filter(fiscal_periods::Column::Id.eq(period_id))
        .filter(fiscal_periods::Column::Status.eq(enums::FiscalPeriodStatus::Open))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(LedgerError::PostingRejected(PostingRejection::PeriodNotOpen(
            FiscalPeriodStatus::Closed,
        ))
        .into());
    }
    Ok(())
}

/// Hands out the organization's next posting sequence.
async fn next_sequence(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
) -> Result<i64, JournalRepoError> {
    let current = ledger_sequences::Entity::find_by_id(organization_id.into_inner())
        .one(txn)
        .await?;

    let Some(current) = current else {
        ledger_sequences::ActiveModel {
            organization_id: Set(organization_id.into_inner()),
            last_sequence: Set(1),
        }
        .insert(txn)
        .await?;
        return Ok(1);
    };

    let next = current.last_sequence + 1;
    let result = ledger_sequences::Entity::update_many()
        .col_expr(ledger_sequences::Column::LastSequence, Expr::value(next))
        .filter(ledger_sequences::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(ledger_sequences::Column::LastSequence.eq(current.last_sequence))
        .exec(txn)
        .await?;
    if result.rows_affected == 0 {
        return Err(LedgerError::ConcurrencyConflict.into());
    }
    Ok(next)
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
