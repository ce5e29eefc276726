//! Bank transaction repository and reconciliation.
//!
//! Batch reconciliation is idempotent: only rows still unreconciled are
//! considered and each link is written with `WHERE is_reconciled = false`.

use std::collections::{HashMap, HashSet};

use chrono::{Days, NaiveDate, Utc};
use ledgerline_core::fiscal::FiscalPeriodStatus;
use ledgerline_core::ledger::BALANCE_TOLERANCE;
use ledgerline_core::reconciliation::{
    BankLine, BankTransactionType, CandidateEntry, CandidateLine, Match, MatchConfig, Matcher,
    ReconciliationError,
};
use ledgerline_shared::types::{AccountId, BankTransactionId, JournalEntryId, OrganizationId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait, sea_query::Expr,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::fiscal::period_for_date;
use crate::entities::{
    bank_transactions, enums, fiscal_periods, journal_entries, journal_lines, ledger_accounts,
};

/// Error types for bank and reconciliation operations.
#[derive(Debug, thiserror::Error)]
pub enum BankRepoError {
    /// A reconciliation rule was violated.
    #[error(transparent)]
    Reconciliation(#[from] ReconciliationError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for recording a bank transaction.
#[derive(Debug, Clone)]
pub struct CreateBankTransactionInput {
    /// Value date.
    pub transaction_date: NaiveDate,
    /// Kind of movement.
    pub transaction_type: BankTransactionType,
    /// Amount as reported by the bank, nonzero.
    pub amount: Decimal,
    /// Bank account in the ledger; restricts matching to its lines.
    pub ledger_account_id: Option<AccountId>,
    /// Bank reference.
    pub reference: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
}

/// Filter options for listing bank transactions.
#[derive(Debug, Clone, Default)]
pub struct BankTransactionFilter {
    /// Only reconciled (or only unreconciled) rows.
    pub is_reconciled: Option<bool>,
    /// Dated on or after.
    pub from: Option<NaiveDate>,
    /// Dated on or before.
    pub to: Option<NaiveDate>,
}

/// Bank transaction repository.
#[derive(Debug, Clone)]
pub struct BankRepository {
    db: DatabaseConnection,
    window_days: u32,
    tolerance: Decimal,
}

impl BankRepository {
    /// Creates a new bank repository with a ±2 day match window.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            window_days: MatchConfig::default().window_days,
            tolerance: BALANCE_TOLERANCE,
        }
    }

    /// Overrides the number of days searched on either side of the bank date.
    #[must_use]
    pub const fn with_window_days(mut self, window_days: u32) -> Self {
        self.window_days = window_days;
        self
    }

    /// Overrides the amount tolerance for manual links.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Records a bank transaction, unreconciled.
    pub async fn create_transaction(
        &self,
        organization_id: OrganizationId,
        input: CreateBankTransactionInput,
    ) -> Result<bank_transactions::Model, BankRepoError> {
        Matcher::validate_amount(input.amount)?;
        if let Some(account_id) = input.ledger_account_id {
            let owned = ledger_accounts::Entity::find_by_id(account_id.into_inner())
                .filter(ledger_accounts::Column::OrganizationId.eq(organization_id.into_inner()))
                .count(&self.db)
                .await?;
            if owned == 0 {
                return Err(ReconciliationError::AccountNotFound(account_id).into());
            }
        }

        let now = Utc::now().into();
        let model = bank_transactions::ActiveModel {
            id: Set(BankTransactionId::new().into_inner()),
            organization_id: Set(organization_id.into_inner()),
            transaction_date: Set(input.transaction_date),
            transaction_type: Set(input.transaction_type.into()),
            amount: Set(input.amount),
            ledger_account_id: Set(input.ledger_account_id.map(AccountId::into_inner)),
            reference: Set(input.reference),
            description: Set(input.description),
            is_reconciled: Set(false),
            journal_entry_id: Set(None),
            reconciled_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(
            org_id = %organization_id,
            bank_transaction_id = %model.id,
            amount = %model.amount,
            "Bank transaction recorded"
        );
        Ok(model)
    }

    /// Finds a bank transaction.
    pub async fn get_transaction(
        &self,
        organization_id: OrganizationId,
        id: BankTransactionId,
    ) -> Result<bank_transactions::Model, BankRepoError> {
        find_transaction(&self.db, organization_id, id).await
    }

    /// Lists bank transactions by date.
    pub async fn list_transactions(
        &self,
        organization_id: OrganizationId,
        filter: &BankTransactionFilter,
    ) -> Result<Vec<bank_transactions::Model>, BankRepoError> {
        let mut query = bank_transactions::Entity::find()
            .filter(bank_transactions::Column::OrganizationId.eq(organization_id.into_inner()));

        if let Some(is_reconciled) = filter.is_reconciled {
            query = query.filter(bank_transactions::Column::IsReconciled.eq(is_reconciled));
        }
        if let Some(from) = filter.from {
            query = query.filter(bank_transactions::Column::TransactionDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(bank_transactions::Column::TransactionDate.lte(to));
        }

        Ok(query
            .order_by_asc(bank_transactions::Column::TransactionDate)
            .order_by_asc(bank_transactions::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Matches every unreconciled transaction it can and returns the links made.
    pub async fn reconcile(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Match>, BankRepoError> {
        let txn = self.db.begin().await?;

        let open = bank_transactions::Entity::find()
            .filter(bank_transactions::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(bank_transactions::Column::IsReconciled.eq(false))
            .all(&txn)
            .await?;
        let (Some(earliest), Some(latest)) = (
            open.iter().map(|t| t.transaction_date).min(),
            open.iter().map(|t| t.transaction_date).max(),
        ) else {
            txn.commit().await?;
            return Ok(Vec::new());
        };

        let window = Days::new(u64::from(self.window_days));
        let from = earliest.checked_sub_days(window).unwrap_or(earliest);
        let to = latest.checked_add_days(window).unwrap_or(latest);
        let candidates = posted_candidates(&txn, organization_id, from, to).await?;
        let already_linked = linked_entries(&txn, organization_id).await?;

        let transactions: Vec<BankLine> = open.iter().map(bank_line).collect();
        let matcher = Matcher::new(MatchConfig {
            window_days: self.window_days,
        });
        let proposed = matcher.match_batch(&transactions, &candidates, &already_linked);

        let now = Utc::now().fixed_offset();
        let mut applied = Vec::with_capacity(proposed.len());
        for m in proposed {
            let result = bank_transactions::Entity::update_many()
                .col_expr(bank_transactions::Column::IsReconciled, Expr::value(true))
                .col_expr(
                    bank_transactions::Column::JournalEntryId,
                    Expr::value(m.journal_entry_id.into_inner()),
                )
                .col_expr(bank_transactions::Column::ReconciledAt, Expr::value(now))
                .col_expr(bank_transactions::Column::UpdatedAt, Expr::value(now))
                .filter(bank_transactions::Column::Id.eq(m.bank_transaction_id.into_inner()))
                .filter(bank_transactions::Column::IsReconciled.eq(false))
                .exec(&txn)
                .await?;
            if result.rows_affected == 1 {
                debug!(
                    bank_transaction_id = %m.bank_transaction_id,
                    entry_id = %m.journal_entry_id,
                    kind = ?m.kind,
                    "Bank transaction matched"
                );
                applied.push(m);
            }
        }

        txn.commit().await?;

        info!(
            org_id = %organization_id,
            considered = transactions.len(),
            matched = applied.len(),
            "Bank reconciliation run"
        );
        Ok(applied)
    }

    /// Links a transaction to a posted entry by hand.
    ///
    /// # Errors
    ///
    /// - `AlreadyReconciled` if the transaction is linked
    /// - `EntryNotPosted`, `EntryAlreadyLinked` or `AmountMismatch` for a bad entry
    pub async fn link(
        &self,
        organization_id: OrganizationId,
        id: BankTransactionId,
        entry_id: JournalEntryId,
    ) -> Result<bank_transactions::Model, BankRepoError> {
        let txn = self.db.begin().await?;

        let transaction = find_transaction(&txn, organization_id, id).await?;
        let entry = journal_entries::Entity::find_by_id(entry_id.into_inner())
            .filter(journal_entries::Column::OrganizationId.eq(organization_id.into_inner()))
            .one(&txn)
            .await?
            .ok_or(ReconciliationError::EntryNotFound(entry_id))?;
        let lines = journal_lines::Entity::find()
            .filter(journal_lines::Column::JournalEntryId.eq(entry.id))
            .all(&txn)
            .await?;
        let linked_elsewhere = bank_transactions::Entity::find()
            .filter(bank_transactions::Column::JournalEntryId.eq(entry.id))
            .filter(bank_transactions::Column::Id.ne(transaction.id))
            .count(&txn)
            .await?
            > 0;

        Matcher::check_manual_link(
            &bank_line(&transaction),
            transaction.is_reconciled,
            &candidate(&entry, &lines),
            entry.status.into(),
            linked_elsewhere,
            self.tolerance,
        )?;

        let now = Utc::now().into();
        let mut active: bank_transactions::ActiveModel = transaction.into();
        active.is_reconciled = Set(true);
        active.journal_entry_id = Set(Some(entry.id));
        active.reconciled_at = Set(Some(now));
        active.updated_at = Set(now);
        let linked = active.update(&txn).await?;

        txn.commit().await?;

        info!(
            org_id = %organization_id,
            bank_transaction_id = %id,
            entry_id = %entry_id,
            "Bank transaction linked"
        );
        Ok(linked)
    }

    /// Undoes a link while both periods involved are still open.
    pub async fn unlink(
        &self,
        organization_id: OrganizationId,
        id: BankTransactionId,
    ) -> Result<bank_transactions::Model, BankRepoError> {
        let txn = self.db.begin().await?;

        let transaction = find_transaction(&txn, organization_id, id).await?;
        let transaction_period: Option<FiscalPeriodStatus> =
            period_for_date(&txn, organization_id, transaction.transaction_date)
                .await?
                .map(|p| p.status.into());
        let entry_period = match transaction.journal_entry_id {
            Some(entry_id) => entry_period_status(&txn, entry_id).await?,
            None => None,
        };

        Matcher::check_unlink(transaction.is_reconciled, transaction_period, entry_period)?;

        let mut active: bank_transactions::ActiveModel = transaction.into();
        active.is_reconciled = Set(false);
        active.journal_entry_id = Set(None);
        active.reconciled_at = Set(None);
        active.updated_at = Set(Utc::now().into());
        let unlinked = active.update(&txn).await?;

        txn.commit().await?;

        info!(org_id = %organization_id, bank_transaction_id = %id, "Bank transaction unlinked");
        Ok(unlinked)
    }
}

fn bank_line(model: &bank_transactions::Model) -> BankLine {
    BankLine {
        id: model.id.into(),
        date: model.transaction_date,
        transaction_type: model.transaction_type.into(),
        amount: model.amount,
        ledger_account_id: model.ledger_account_id.map(Into::into),
    }
}

fn candidate(entry: &journal_entries::Model, lines: &[journal_lines::Model]) -> CandidateEntry {
    CandidateEntry {
        id: entry.id.into(),
        entry_date: entry.entry_date,
        posting_sequence: entry.posting_sequence.unwrap_or_default(),
        lines: lines
            .iter()
            .map(|l| CandidateLine {
                account_id: l.ledger_account_id.into(),
                debit: l.debit_amount,
                credit: l.credit_amount,
            })
            .collect(),
    }
}

/// Posted entries dated within `from..=to`, with their lines.
async fn posted_candidates<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<CandidateEntry>, DbErr> {
    let entries = journal_entries::Entity::find()
        .filter(journal_entries::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(journal_entries::Column::Status.eq(enums::EntryStatus::Posted))
        .filter(journal_entries::Column::EntryDate.gte(from))
        .filter(journal_entries::Column::EntryDate.lte(to))
        .all(conn)
        .await?;
    if entries.is_empty() {
        return Ok(Vec::new());
    }

    let mut lines_by_entry: HashMap<Uuid, Vec<journal_lines::Model>> = HashMap::new();
    for line in journal_lines::Entity::find()
        .filter(journal_lines::Column::JournalEntryId.is_in(entries.iter().map(|e| e.id)))
        .all(conn)
        .await?
    {
        lines_by_entry
            .entry(line.journal_entry_id)
            .or_default()
            .push(line);
    }

    Ok(entries
        .iter()
        .map(|entry| {
            let lines = lines_by_entry.remove(&entry.id).unwrap_or_default();
            candidate(entry, &lines)
        })
        .collect())
}

async fn linked_entries<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
) -> Result<HashSet<JournalEntryId>, DbErr> {
    Ok(bank_transactions::Entity::find()
        .filter(bank_transactions::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(bank_transactions::Column::JournalEntryId.is_not_null())
        .all(conn)
        .await?
        .into_iter()
        .filter_map(|t| t.journal_entry_id.map(JournalEntryId::from))
        .collect())
}

async fn entry_period_status<C: ConnectionTrait>(
    conn: &C,
    entry_id: Uuid,
) -> Result<Option<FiscalPeriodStatus>, DbErr> {
    let Some(entry) = journal_entries::Entity::find_by_id(entry_id).one(conn).await? else {
        return Ok(None);
    };
    Ok(fiscal_periods::Entity::find_by_id(entry.fiscal_period_id)
        .one(conn)
        .await?
        .map(|p| p.status.into()))
}

async fn find_transaction<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    id: BankTransactionId,
) -> Result<bank_transactions::Model, BankRepoError> {
    bank_transactions::Entity::find_by_id(id.into_inner())
        .filter(bank_transactions::Column::OrganizationId.eq(organization_id.into_inner()))
        .one(conn)
        .await?
        .ok_or(BankRepoError::Reconciliation(ReconciliationError::NotFound(id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{
        AccountRepository, CreateEntryInput, FiscalRepository, JournalRepository,
    };
    use crate::test_support::{credit, date, debit, new_account, org, test_db};
    use ledgerline_core::accounts::AccountType;
    use ledgerline_core::ledger::EntryType;
    use ledgerline_core::reconciliation::MatchKind;
    use ledgerline_shared::types::{ActorId, FiscalPeriodId};
    use rust_decimal_macros::dec;

    struct Fixture {
        bank: BankRepository,
        journal: JournalRepository,
        fiscal: FiscalRepository,
        org: OrganizationId,
        march: FiscalPeriodId,
        cash: AccountId,
        sales: AccountId,
    }

    async fn fixture() -> Fixture {
        let db = test_db().await;
        let accounts = AccountRepository::new(db.clone());
        let fiscal = FiscalRepository::new(db.clone());
        let org_id = org();

        let march = fiscal
            .open_period(org_id, "Mar 2024", date(2024, 3, 1), date(2024, 3, 31))
            .await
            .unwrap();
        let cash = accounts
            .create_account(org_id, new_account("1000", "Cash", AccountType::Asset))
            .await
            .unwrap();
        let sales = accounts
            .create_account(org_id, new_account("4000", "Sales Revenue", AccountType::Revenue))
            .await
            .unwrap();

        Fixture {
            bank: BankRepository::new(db.clone()),
            journal: JournalRepository::new(db),
            fiscal,
            org: org_id,
            march: march.id.into(),
            cash: cash.id.into(),
            sales: sales.id.into(),
        }
    }

    async fn receipt(f: &Fixture, number: &str, on: NaiveDate, amount: Decimal) -> JournalEntryId {
        let posted = f
            .journal
            .create_and_post(
                f.org,
                ActorId::new(),
                &CreateEntryInput {
                    fiscal_period_id: f.march,
                    journal_number: number.to_string(),
                    entry_date: on,
                    entry_type: EntryType::Standard,
                    description: None,
                    lines: vec![debit(1, f.cash, amount), credit(2, f.sales, amount)],
                },
            )
            .await
            .unwrap();
        posted.entry.id.into()
    }

    async fn deposit(f: &Fixture, on: NaiveDate, amount: Decimal) -> bank_transactions::Model {
        f.bank
            .create_transaction(
                f.org,
                CreateBankTransactionInput {
                    transaction_date: on,
                    transaction_type: BankTransactionType::Debit,
                    amount,
                    ledger_account_id: None,
                    reference: Some("DEP".to_string()),
                    description: None,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_deposit_auto_matches_within_window() {
        let f = fixture().await;
        let entry = receipt(&f, "JE-1", date(2024, 3, 2), dec!(250)).await;
        let tx = deposit(&f, date(2024, 3, 1), dec!(250)).await;

        let matches = f.bank.reconcile(f.org).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].journal_entry_id, entry);
        assert_eq!(matches[0].kind, MatchKind::AmountOnly);
        assert_eq!(matches[0].day_distance, 1);

        let stored = f.bank.get_transaction(f.org, tx.id.into()).await.unwrap();
        assert!(stored.is_reconciled);
        assert_eq!(stored.journal_entry_id, Some(entry.into_inner()));

        // Second run has nothing left to do.
        assert!(f.bank.reconcile(f.org).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_entry_outside_window_is_not_matched() {
        let f = fixture().await;
        receipt(&f, "JE-2", date(2024, 3, 10), dec!(250)).await;
        deposit(&f, date(2024, 3, 1), dec!(250)).await;

        assert!(f.bank.reconcile(f.org).await.unwrap().is_empty());

        let wide = f.bank.clone().with_window_days(10);
        assert_eq!(wide.reconcile(f.org).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_one_entry_matches_one_transaction() {
        let f = fixture().await;
        receipt(&f, "JE-3", date(2024, 3, 5), dec!(80)).await;
        deposit(&f, date(2024, 3, 5), dec!(80)).await;
        deposit(&f, date(2024, 3, 6), dec!(80)).await;

        let matches = f.bank.reconcile(f.org).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].kind, MatchKind::Exact);

        let open = f
            .bank
            .list_transactions(
                f.org,
                &BankTransactionFilter {
                    is_reconciled: Some(false),
                    ..BankTransactionFilter::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].transaction_date, date(2024, 3, 6));
    }

    #[tokio::test]
    async fn test_manual_link_checks_amount() {
        let f = fixture().await;
        let entry = receipt(&f, "JE-4", date(2024, 3, 5), dec!(100)).await;
        let tx = deposit(&f, date(2024, 3, 20), dec!(99)).await;

        let err = f
            .bank
            .link(f.org, tx.id.into(), entry)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BankRepoError::Reconciliation(ReconciliationError::AmountMismatch(_))
        ));

        let tx = deposit(&f, date(2024, 3, 20), dec!(100)).await;
        let linked = f.bank.link(f.org, tx.id.into(), entry).await.unwrap();
        assert!(linked.is_reconciled);

        let err = f
            .bank
            .link(f.org, tx.id.into(), entry)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BankRepoError::Reconciliation(ReconciliationError::AlreadyReconciled)
        ));
    }

    #[tokio::test]
    async fn test_unlink_requires_open_periods() {
        let f = fixture().await;
        let entry = receipt(&f, "JE-5", date(2024, 3, 5), dec!(60)).await;
        let first = deposit(&f, date(2024, 3, 5), dec!(60)).await;
        f.bank.link(f.org, first.id.into(), entry).await.unwrap();

        let unlinked = f.bank.unlink(f.org, first.id.into()).await.unwrap();
        assert!(!unlinked.is_reconciled);
        assert_eq!(unlinked.journal_entry_id, None);

        let err = f.bank.unlink(f.org, first.id.into()).await.unwrap_err();
        assert!(matches!(
            err,
            BankRepoError::Reconciliation(ReconciliationError::NotReconciled)
        ));

        f.bank.link(f.org, first.id.into(), entry).await.unwrap();
        f.fiscal
            .close_period(f.org, f.march, ActorId::new())
            .await
            .unwrap();

        let err = f.bank.unlink(f.org, first.id.into()).await.unwrap_err();
        assert!(matches!(
            err,
            BankRepoError::Reconciliation(ReconciliationError::PeriodLocked)
        ));
    }

    #[tokio::test]
    async fn test_bank_account_must_belong_to_organization() {
        let f = fixture().await;
        let input = |ledger_account_id| CreateBankTransactionInput {
            transaction_date: date(2024, 3, 1),
            transaction_type: BankTransactionType::Credit,
            amount: dec!(-40),
            ledger_account_id: Some(ledger_account_id),
            reference: None,
            description: None,
        };

        let err = f
            .bank
            .create_transaction(org(), input(f.cash))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BankRepoError::Reconciliation(ReconciliationError::AccountNotFound(id)) if id == f.cash
        ));

        let created = f.bank.create_transaction(f.org, input(f.cash)).await.unwrap();
        assert_eq!(created.ledger_account_id, Some(f.cash.into_inner()));
    }

    #[tokio::test]
    async fn test_zero_amount_rejected() {
        let f = fixture().await;
        let err = f
            .bank
            .create_transaction(
                f.org,
                CreateBankTransactionInput {
                    transaction_date: date(2024, 3, 1),
                    transaction_type: BankTransactionType::Fee,
                    amount: Decimal::ZERO,
                    ledger_account_id: Some(f.cash),
                    reference: None,
                    description: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BankRepoError::Reconciliation(ReconciliationError::ZeroAmount)
        ));
    }
}
