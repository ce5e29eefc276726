//! Account repository for chart of accounts database operations.

use chrono::{NaiveDate, Utc};
use ledgerline_core::accounts::{
    AccountBalance, AccountError, AccountPatch, AccountType, ChartOfAccounts, NewAccount, Posting,
    TrialBalance,
};
use ledgerline_core::ledger::BALANCE_TOLERANCE;
use ledgerline_shared::types::{AccountId, OrganizationId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::info;

use super::postings::{PostedLineFilter, posted_lines};
use super::unique_violation;
use crate::entities::{budget_lines, journal_lines, ledger_accounts};

/// Error types for account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountRepoError {
    /// A chart of accounts rule was violated.
    #[error(transparent)]
    Account(#[from] AccountError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Filter options for listing accounts.
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    /// Only accounts of this type.
    pub account_type: Option<AccountType>,
    /// Only active (or only inactive) accounts.
    pub is_active: Option<bool>,
    /// Only direct children of this account.
    pub parent_id: Option<AccountId>,
}

/// Account repository for chart of accounts operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
    tolerance: Decimal,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            tolerance: BALANCE_TOLERANCE,
        }
    }

    /// Overrides the debit/credit difference a trial balance accepts.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Creates an account after checking it against the organization's chart.
    ///
    /// # Errors
    ///
    /// Returns `CycleDetected`, `DuplicateCode`, `ParentNotFound` or a
    /// database error.
    pub async fn create_account(
        &self,
        organization_id: OrganizationId,
        input: NewAccount,
    ) -> Result<ledger_accounts::Model, AccountRepoError> {
        let txn = self.db.begin().await?;

        let chart = load_chart(&txn, organization_id).await?;
        let account = chart.validate_new(input)?;
        let (id, code) = (account.id, account.code.clone());

        let now = Utc::now().into();
        let model = ledger_accounts::ActiveModel {
            id: Set(account.id.into_inner()),
            organization_id: Set(organization_id.into_inner()),
            code: Set(account.code),
            name: Set(account.name),
            account_type: Set(account.account_type.into()),
            normal_balance: Set(account.normal_balance.into()),
            parent_id: Set(account.parent_id.map(AccountId::into_inner)),
            is_system: Set(account.is_system),
            is_active: Set(account.is_active),
            vat_category: Set(account.vat_category.map(Into::into)),
            balance: Set(Decimal::ZERO),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|err| account_write_error(err, id, &code))?;

        txn.commit().await?;

        info!(
            org_id = %organization_id,
            account_id = %model.id,
            code = %model.code,
            "Ledger account created"
        );
        Ok(model)
    }

    /// Finds an account of the organization.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not exist in the organization.
    pub async fn get_account(
        &self,
        organization_id: OrganizationId,
        id: AccountId,
    ) -> Result<ledger_accounts::Model, AccountRepoError> {
        find_account(&self.db, organization_id, id).await
    }

    /// Lists accounts ordered by code.
    pub async fn list_accounts(
        &self,
        organization_id: OrganizationId,
        filter: &AccountFilter,
    ) -> Result<Vec<ledger_accounts::Model>, AccountRepoError> {
        let mut query = ledger_accounts::Entity::find()
            .filter(ledger_accounts::Column::OrganizationId.eq(organization_id.into_inner()));

        if let Some(account_type) = filter.account_type {
            let stored: crate::entities::enums::AccountType = account_type.into();
            query = query.filter(ledger_accounts::Column::AccountType.eq(stored));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(ledger_accounts::Column::IsActive.eq(is_active));
        }
        if let Some(parent_id) = filter.parent_id {
            query = query.filter(ledger_accounts::Column::ParentId.eq(parent_id.into_inner()));
        }

        Ok(query
            .order_by_asc(ledger_accounts::Column::Code)
            .all(&self.db)
            .await?)
    }

    /// All descendants of an account, depth-first pre-order.
    pub async fn list_descendants(
        &self,
        organization_id: OrganizationId,
        id: AccountId,
    ) -> Result<Vec<ledger_accounts::Model>, AccountRepoError> {
        let models = org_accounts(&self.db, organization_id).await?;
        let chart = ChartOfAccounts::from_accounts(models.iter().cloned().map(Into::into))?;

        let order: Vec<uuid::Uuid> = chart
            .descendants(id)?
            .into_iter()
            .map(|a| a.id.into_inner())
            .collect();

        let mut by_id: std::collections::HashMap<uuid::Uuid, ledger_accounts::Model> =
            models.into_iter().map(|m| (m.id, m)).collect();
        Ok(order.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// Applies a patch to an account.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `NormalBalanceImmutable`, `CycleDetected`,
    /// `ParentNotFound`, `DuplicateCode` or a database error.
    pub async fn update_account(
        &self,
        organization_id: OrganizationId,
        id: AccountId,
        patch: AccountPatch,
    ) -> Result<ledger_accounts::Model, AccountRepoError> {
        let txn = self.db.begin().await?;

        let existing = find_account(&txn, organization_id, id).await?;
        let chart = load_chart(&txn, organization_id).await?;
        let account = chart.validate_update(id, patch)?;
        let code = account.code.clone();

        let mut active: ledger_accounts::ActiveModel = existing.into();
        active.code = Set(account.code);
        active.name = Set(account.name);
        active.normal_balance = Set(account.normal_balance.into());
        active.parent_id = Set(account.parent_id.map(AccountId::into_inner));
        active.is_active = Set(account.is_active);
        active.vat_category = Set(account.vat_category.map(Into::into));
        active.updated_at = Set(Utc::now().into());
        let updated = active
            .update(&txn)
            .await
            .map_err(|err| account_write_error(err, id, &code))?;

        txn.commit().await?;

        info!(org_id = %organization_id, account_id = %id, "Ledger account updated");
        Ok(updated)
    }

    /// Deletes an account that is not a system account, has no children and
    /// is not referenced by any journal line.
    pub async fn delete_account(
        &self,
        organization_id: OrganizationId,
        id: AccountId,
    ) -> Result<(), AccountRepoError> {
        let txn = self.db.begin().await?;

        let chart = load_chart(&txn, organization_id).await?;
        let references = journal_lines::Entity::find()
            .filter(journal_lines::Column::LedgerAccountId.eq(id.into_inner()))
            .count(&txn)
            .await?;
        chart.validate_delete(id, references > 0)?;

        budget_lines::Entity::delete_many()
            .filter(budget_lines::Column::LedgerAccountId.eq(id.into_inner()))
            .exec(&txn)
            .await?;
        ledger_accounts::Entity::delete_by_id(id.into_inner())
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(org_id = %organization_id, account_id = %id, "Ledger account deleted");
        Ok(())
    }

    /// Computes an account's balance from posted lines dated on or before `as_of`.
    pub async fn compute_balance(
        &self,
        organization_id: OrganizationId,
        id: AccountId,
        as_of: NaiveDate,
        include_children: bool,
    ) -> Result<AccountBalance, AccountRepoError> {
        let chart = load_chart(&self.db, organization_id).await?;
        let postings = load_postings(&self.db, organization_id, as_of).await?;
        Ok(chart.compute_balance(id, &postings, as_of, include_children)?)
    }

    /// Builds the organization's trial balance as of a date.
    pub async fn trial_balance(
        &self,
        organization_id: OrganizationId,
        as_of: NaiveDate,
    ) -> Result<TrialBalance, AccountRepoError> {
        let chart = load_chart(&self.db, organization_id).await?;
        let postings = load_postings(&self.db, organization_id, as_of).await?;
        Ok(chart.trial_balance(&postings, as_of, self.tolerance))
    }
}

/// Maps a unique index violation to the chart rule it enforces.
fn account_write_error(err: DbErr, id: AccountId, code: &str) -> AccountRepoError {
    match unique_violation(&err) {
        Some(message) if message.contains("code") => {
            AccountError::DuplicateCode(code.to_string()).into()
        }
        Some(_) => AccountError::DuplicateId(id).into(),
        None => err.into(),
    }
}

async fn org_accounts<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
) -> Result<Vec<ledger_accounts::Model>, DbErr> {
    ledger_accounts::Entity::find()
        .filter(ledger_accounts::Column::OrganizationId.eq(organization_id.into_inner()))
        .order_by_asc(ledger_accounts::Column::Code)
        .all(conn)
        .await
}

/// Loads the organization's accounts into a chart.
pub(crate) async fn load_chart<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
) -> Result<ChartOfAccounts, AccountRepoError> {
    let models = org_accounts(conn, organization_id).await?;
    Ok(ChartOfAccounts::from_accounts(
        models.into_iter().map(Into::into),
    )?)
}

pub(crate) async fn find_account<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    id: AccountId,
) -> Result<ledger_accounts::Model, AccountRepoError> {
    ledger_accounts::Entity::find_by_id(id.into_inner())
        .filter(ledger_accounts::Column::OrganizationId.eq(organization_id.into_inner()))
        .one(conn)
        .await?
        .ok_or(AccountRepoError::Account(AccountError::NotFound(id)))
}

async fn load_postings<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    as_of: NaiveDate,
) -> Result<Vec<Posting>, DbErr> {
    let lines = posted_lines(
        conn,
        organization_id,
        PostedLineFilter {
            to: Some(as_of),
            ..PostedLineFilter::default()
        },
    )
    .await?;

    Ok(lines
        .into_iter()
        .map(|posted| Posting {
            account_id: posted.line.ledger_account_id.into(),
            entry_date: posted.entry.entry_date,
            debit: posted.line.debit_amount,
            credit: posted.line.credit_amount,
        })
        .collect())
}
