//! Budget line repository.
//!
//! Only budgeted amounts are stored. Actuals come from posted journal lines
//! each time lines are read, and variance is left to `BudgetService`.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use ledgerline_core::accounts::{AccountError, NormalBalance};
use ledgerline_core::budget::{
    BudgetError, BudgetPosting, BudgetService, BudgetSummary, VarianceResult,
};
use ledgerline_core::fiscal::FiscalError;
use ledgerline_shared::types::{
    AccountId, BudgetLineId, CostCenterId, FiscalPeriodId, OrganizationId,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use super::postings::{PostedLineFilter, posted_lines};
use crate::entities::{budget_lines, fiscal_periods, ledger_accounts};

/// Error types for budget operations.
#[derive(Debug, thiserror::Error)]
pub enum BudgetRepoError {
    /// A budget rule was violated.
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// The budgeted account does not exist.
    #[error(transparent)]
    Account(#[from] AccountError),

    /// The budgeted period does not exist.
    #[error(transparent)]
    Fiscal(#[from] FiscalError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a budget line.
#[derive(Debug, Clone)]
pub struct CreateBudgetLineInput {
    /// Budgeted account.
    pub ledger_account_id: AccountId,
    /// Optional cost center the budget is scoped to.
    pub cost_center_id: Option<CostCenterId>,
    /// Budgeted period.
    pub fiscal_period_id: FiscalPeriodId,
    /// Budgeted amount, non-negative.
    pub budgeted_amount: Decimal,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// Changes to a budget line.
#[derive(Debug, Clone, Default)]
pub struct UpdateBudgetLineInput {
    /// New budgeted amount.
    pub budgeted_amount: Option<Decimal>,
    /// New notes (`Some(None)` clears them).
    pub notes: Option<Option<String>>,
}

/// Filter options for listing budget lines.
#[derive(Debug, Clone, Default)]
pub struct BudgetLineFilter {
    /// Only lines of this period.
    pub fiscal_period_id: Option<FiscalPeriodId>,
    /// Only lines on this account.
    pub ledger_account_id: Option<AccountId>,
    /// Only lines scoped to this cost center.
    pub cost_center_id: Option<CostCenterId>,
}

/// A budget line with its live actual and variance.
#[derive(Debug, Clone)]
pub struct BudgetLineWithActual {
    /// The stored line.
    pub line: budget_lines::Model,
    /// Actual and variance against the budget.
    pub result: VarianceResult,
}

/// Budget repository.
#[derive(Debug, Clone)]
pub struct BudgetRepository {
    db: DatabaseConnection,
}

impl BudgetRepository {
    /// Creates a new budget repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a budget line.
    ///
    /// # Errors
    ///
    /// Returns `NegativeAmount`, `DuplicateBudgetLine`, `PeriodNotOpen`,
    /// a not-found error for the account or period, or a database error.
    pub async fn create_budget_line(
        &self,
        organization_id: OrganizationId,
        input: CreateBudgetLineInput,
    ) -> Result<BudgetLineWithActual, BudgetRepoError> {
        BudgetService::validate_amount(input.budgeted_amount)?;

        let txn = self.db.begin().await?;

        let account = find_account(&txn, organization_id, input.ledger_account_id).await?;
        let period = find_period(&txn, organization_id, input.fiscal_period_id).await?;
        BudgetService::check_editable(period.status.into())?;

        let mut duplicate = budget_lines::Entity::find()
            .filter(budget_lines::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(budget_lines::Column::LedgerAccountId.eq(account.id))
            .filter(budget_lines::Column::FiscalPeriodId.eq(period.id));
        duplicate = match input.cost_center_id {
            Some(cost_center_id) => duplicate
                .filter(budget_lines::Column::CostCenterId.eq(cost_center_id.into_inner())),
            None => duplicate.filter(budget_lines::Column::CostCenterId.is_null()),
        };
        if duplicate.count(&txn).await? > 0 {
            return Err(BudgetError::DuplicateBudgetLine.into());
        }

        let now = Utc::now().into();
        let line = budget_lines::ActiveModel {
            id: Set(BudgetLineId::new().into_inner()),
            organization_id: Set(organization_id.into_inner()),
            ledger_account_id: Set(account.id),
            cost_center_id: Set(input.cost_center_id.map(CostCenterId::into_inner)),
            fiscal_period_id: Set(period.id),
            budgeted_amount: Set(input.budgeted_amount),
            notes: Set(input.notes),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut with_actuals = attach_actuals(&txn, organization_id, vec![line]).await?;
        txn.commit().await?;

        info!(
            org_id = %organization_id,
            account_id = %input.ledger_account_id,
            period_id = %input.fiscal_period_id,
            "Budget line created"
        );
        with_actuals.pop().ok_or(BudgetRepoError::Database(DbErr::RecordNotInserted))
    }

    /// Finds a budget line with its actual.
    pub async fn get_budget_line(
        &self,
        organization_id: OrganizationId,
        id: BudgetLineId,
    ) -> Result<BudgetLineWithActual, BudgetRepoError> {
        let line = find_line(&self.db, organization_id, id).await?;
        attach_actuals(&self.db, organization_id, vec![line])
            .await?
            .pop()
            .ok_or(BudgetRepoError::Budget(BudgetError::NotFound(id)))
    }

    /// Changes the budgeted amount or notes while the period is open.
    pub async fn update_budget_line(
        &self,
        organization_id: OrganizationId,
        id: BudgetLineId,
        patch: UpdateBudgetLineInput,
    ) -> Result<BudgetLineWithActual, BudgetRepoError> {
        if let Some(amount) = patch.budgeted_amount {
            BudgetService::validate_amount(amount)?;
        }

        let txn = self.db.begin().await?;

        let line = find_line(&txn, organization_id, id).await?;
        let period = find_period(&txn, organization_id, line.fiscal_period_id.into()).await?;
        BudgetService::check_editable(period.status.into())?;

        let mut active: budget_lines::ActiveModel = line.into();
        if let Some(amount) = patch.budgeted_amount {
            active.budgeted_amount = Set(amount);
        }
        if let Some(notes) = patch.notes {
            active.notes = Set(notes);
        }
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        let mut with_actuals = attach_actuals(&txn, organization_id, vec![updated]).await?;
        txn.commit().await?;

        info!(org_id = %organization_id, budget_line_id = %id, "Budget line updated");
        with_actuals
            .pop()
            .ok_or(BudgetRepoError::Budget(BudgetError::NotFound(id)))
    }

    /// Deletes a budget line while the period is open.
    pub async fn delete_budget_line(
        &self,
        organization_id: OrganizationId,
        id: BudgetLineId,
    ) -> Result<(), BudgetRepoError> {
        let txn = self.db.begin().await?;

        let line = find_line(&txn, organization_id, id).await?;
        let period = find_period(&txn, organization_id, line.fiscal_period_id.into()).await?;
        BudgetService::check_editable(period.status.into())?;

        budget_lines::Entity::delete_by_id(id.into_inner())
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(org_id = %organization_id, budget_line_id = %id, "Budget line deleted");
        Ok(())
    }

    /// Lists budget lines with actual and variance computed now.
    pub async fn list_budget_lines(
        &self,
        organization_id: OrganizationId,
        filter: &BudgetLineFilter,
    ) -> Result<Vec<BudgetLineWithActual>, BudgetRepoError> {
        let mut query = budget_lines::Entity::find()
            .filter(budget_lines::Column::OrganizationId.eq(organization_id.into_inner()));

        if let Some(period_id) = filter.fiscal_period_id {
            query = query.filter(budget_lines::Column::FiscalPeriodId.eq(period_id.into_inner()));
        }
        if let Some(account_id) = filter.ledger_account_id {
            query = query.filter(budget_lines::Column::LedgerAccountId.eq(account_id.into_inner()));
        }
        if let Some(cost_center_id) = filter.cost_center_id {
            query = query.filter(budget_lines::Column::CostCenterId.eq(cost_center_id.into_inner()));
        }

        let lines = query
            .order_by_asc(budget_lines::Column::FiscalPeriodId)
            .order_by_asc(budget_lines::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(attach_actuals(&self.db, organization_id, lines).await?)
    }

    /// Totals across the filtered lines.
    pub async fn summary(
        &self,
        organization_id: OrganizationId,
        filter: &BudgetLineFilter,
    ) -> Result<BudgetSummary, BudgetRepoError> {
        let lines = self.list_budget_lines(organization_id, filter).await?;
        Ok(BudgetService::summarize(lines.iter().map(|l| &l.result)))
    }
}

/// Computes actual and variance for each line from posted journal lines.
async fn attach_actuals<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    lines: Vec<budget_lines::Model>,
) -> Result<Vec<BudgetLineWithActual>, DbErr> {
    if lines.is_empty() {
        return Ok(Vec::new());
    }

    let account_ids: BTreeSet<Uuid> = lines.iter().map(|l| l.ledger_account_id).collect();
    let period_ids: BTreeSet<Uuid> = lines.iter().map(|l| l.fiscal_period_id).collect();

    let normal_balances: HashMap<Uuid, NormalBalance> = ledger_accounts::Entity::find()
        .filter(ledger_accounts::Column::Id.is_in(account_ids.iter().copied()))
        .all(conn)
        .await?
        .into_iter()
        .map(|a| (a.id, a.normal_balance.into()))
        .collect();

    let postings: Vec<BudgetPosting> = posted_lines(
        conn,
        organization_id,
        PostedLineFilter {
            fiscal_period_ids: Some(period_ids.into_iter().collect()),
            account_ids: Some(account_ids.into_iter().collect()),
            ..PostedLineFilter::default()
        },
    )
    .await?
    .into_iter()
    .map(|p| BudgetPosting {
        account_id: p.line.ledger_account_id.into(),
        cost_center_id: p.line.cost_center_id.map(Into::into),
        fiscal_period_id: p.entry.fiscal_period_id.into(),
        debit: p.line.debit_amount,
        credit: p.line.credit_amount,
    })
    .collect();

    Ok(lines
        .into_iter()
        .map(|line| {
            let normal_balance = normal_balances
                .get(&line.ledger_account_id)
                .copied()
                .unwrap_or(NormalBalance::Debit);
            let actual = BudgetService::actual_amount(
                line.ledger_account_id.into(),
                line.cost_center_id.map(Into::into),
                line.fiscal_period_id.into(),
                normal_balance,
                &postings,
            );
            let result =
                BudgetService::calculate_variance(line.budgeted_amount, actual, normal_balance);
            BudgetLineWithActual { line, result }
        })
        .collect())
}

async fn find_line<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    id: BudgetLineId,
) -> Result<budget_lines::Model, BudgetRepoError> {
    budget_lines::Entity::find_by_id(id.into_inner())
        .filter(budget_lines::Column::OrganizationId.eq(organization_id.into_inner()))
        .one(conn)
        .await?
        .ok_or(BudgetRepoError::Budget(BudgetError::NotFound(id)))
}

async fn find_account<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    id: AccountId,
) -> Result<ledger_accounts::Model, BudgetRepoError> {
    ledger_accounts::Entity::find_by_id(id.into_inner())
        .filter(ledger_accounts::Column::OrganizationId.eq(organization_id.into_inner()))
        .one(conn)
        .await?
        .ok_or(BudgetRepoError::Account(AccountError::NotFound(id)))
}

async fn find_period<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    id: FiscalPeriodId,
) -> Result<fiscal_periods::Model, BudgetRepoError> {
    fiscal_periods::Entity::find_by_id(id.into_inner())
        .filter(fiscal_periods::Column::OrganizationId.eq(organization_id.into_inner()))
        .one(conn)
        .await?
        .ok_or(BudgetRepoError::Fiscal(FiscalError::NotFound(id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{
        AccountRepository, CreateEntryInput, FiscalRepository, JournalRepository,
    };
    use crate::test_support::{credit, date, debit, new_account, org, test_db};
    use ledgerline_core::accounts::AccountType;
    use ledgerline_core::budget::VarianceStatus;
    use ledgerline_core::ledger::EntryType;
    use ledgerline_shared::types::ActorId;
    use rust_decimal_macros::dec;

    struct Fixture {
        budgets: BudgetRepository,
        journal: JournalRepository,
        fiscal: FiscalRepository,
        org: OrganizationId,
        period: FiscalPeriodId,
        cash: AccountId,
        rent: AccountId,
    }

    async fn fixture() -> Fixture {
        let db = test_db().await;
        let accounts = AccountRepository::new(db.clone());
        let fiscal = FiscalRepository::new(db.clone());
        let org_id = org();

        let period = fiscal
            .open_period(org_id, "Jan 2024", date(2024, 1, 1), date(2024, 1, 31))
            .await
            .unwrap();
        let cash = accounts
            .create_account(org_id, new_account("1000", "Cash", AccountType::Asset))
            .await
            .unwrap();
        let rent = accounts
            .create_account(org_id, new_account("6100", "Rent", AccountType::Expense))
            .await
            .unwrap();

        Fixture {
            budgets: BudgetRepository::new(db.clone()),
            journal: JournalRepository::new(db),
            fiscal,
            org: org_id,
            period: period.id.into(),
            cash: cash.id.into(),
            rent: rent.id.into(),
        }
    }

    fn rent_budget(f: &Fixture, amount: Decimal) -> CreateBudgetLineInput {
        CreateBudgetLineInput {
            ledger_account_id: f.rent,
            cost_center_id: None,
            fiscal_period_id: f.period,
            budgeted_amount: amount,
            notes: None,
        }
    }

    async fn pay_rent(f: &Fixture, number: &str, amount: Decimal) {
        f.journal
            .create_and_post(
                f.org,
                ActorId::new(),
                &CreateEntryInput {
                    fiscal_period_id: f.period,
                    journal_number: number.to_string(),
                    entry_date: date(2024, 1, 5),
                    entry_type: EntryType::Standard,
                    description: None,
                    lines: vec![debit(1, f.rent, amount), credit(2, f.cash, amount)],
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_actual_follows_posted_lines() {
        let f = fixture().await;
        f.budgets
            .create_budget_line(f.org, rent_budget(&f, dec!(1000)))
            .await
            .unwrap();
        pay_rent(&f, "JE-1", dec!(1200)).await;

        let lines = f
            .budgets
            .list_budget_lines(f.org, &BudgetLineFilter::default())
            .await
            .unwrap();
        assert_eq!(lines.len(), 1);
        let result = &lines[0].result;
        assert_eq!(result.actual, dec!(1200));
        assert_eq!(result.variance, dec!(200));
        assert_eq!(result.variance_percent, Some(dec!(20)));
        assert_eq!(result.status, VarianceStatus::Unfavorable);
    }

    #[tokio::test]
    async fn test_zero_budget_has_no_percent() {
        let f = fixture().await;
        let line = f
            .budgets
            .create_budget_line(f.org, rent_budget(&f, Decimal::ZERO))
            .await
            .unwrap();
        assert_eq!(line.result.variance_percent, None);
    }

    #[tokio::test]
    async fn test_duplicate_and_negative_rejected() {
        let f = fixture().await;
        f.budgets
            .create_budget_line(f.org, rent_budget(&f, dec!(10)))
            .await
            .unwrap();

        let err = f
            .budgets
            .create_budget_line(f.org, rent_budget(&f, dec!(20)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BudgetRepoError::Budget(BudgetError::DuplicateBudgetLine)
        ));

        let err = f
            .budgets
            .create_budget_line(f.org, rent_budget(&f, dec!(-1)))
            .await
            .unwrap_err();
        assert!(matches!(err, BudgetRepoError::Budget(BudgetError::NegativeAmount)));
    }

    #[tokio::test]
    async fn test_closed_period_freezes_budget() {
        let f = fixture().await;
        let line = f
            .budgets
            .create_budget_line(f.org, rent_budget(&f, dec!(500)))
            .await
            .unwrap();
        f.fiscal
            .close_period(f.org, f.period, ActorId::new())
            .await
            .unwrap();

        let err = f
            .budgets
            .update_budget_line(
                f.org,
                line.line.id.into(),
                UpdateBudgetLineInput {
                    budgeted_amount: Some(dec!(600)),
                    ..UpdateBudgetLineInput::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BudgetRepoError::Budget(BudgetError::PeriodNotOpen(_))
        ));

        let err = f
            .budgets
            .delete_budget_line(f.org, line.line.id.into())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BudgetRepoError::Budget(BudgetError::PeriodNotOpen(_))
        ));
    }

    #[tokio::test]
    async fn test_update_delete_and_summary() {
        let f = fixture().await;
        let line = f
            .budgets
            .create_budget_line(f.org, rent_budget(&f, dec!(400)))
            .await
            .unwrap();
        pay_rent(&f, "JE-2", dec!(300)).await;

        let updated = f
            .budgets
            .update_budget_line(
                f.org,
                line.line.id.into(),
                UpdateBudgetLineInput {
                    budgeted_amount: Some(dec!(200)),
                    notes: Some(Some("Revised".to_string())),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.line.budgeted_amount, dec!(200));
        assert_eq!(updated.line.notes.as_deref(), Some("Revised"));
        assert_eq!(updated.result.actual, dec!(300));

        let summary = f
            .budgets
            .summary(f.org, &BudgetLineFilter::default())
            .await
            .unwrap();
        assert_eq!(summary.line_count, 1);
        assert_eq!(summary.total_budgeted, dec!(200));
        assert_eq!(summary.total_actual, dec!(300));

        f.budgets
            .delete_budget_line(f.org, line.line.id.into())
            .await
            .unwrap();
        let err = f
            .budgets
            .get_budget_line(f.org, line.line.id.into())
            .await
            .unwrap_err();
        assert!(matches!(err, BudgetRepoError::Budget(BudgetError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_account_rejected() {
        let f = fixture().await;
        let mut input = rent_budget(&f, dec!(10));
        input.ledger_account_id = AccountId::new();

        let err = f
            .budgets
            .create_budget_line(f.org, input)
            .await
            .unwrap_err();
        assert!(matches!(err, BudgetRepoError::Account(AccountError::NotFound(_))));
    }
}
