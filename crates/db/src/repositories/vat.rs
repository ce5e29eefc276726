//! VAT return repository.
//!
//! A return is a snapshot of posted activity on VAT-tagged accounts over a
//! date range. Drafts can be edited or regenerated, submitted returns are
//! frozen and only move on to `accepted` or `rejected`.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use ledgerline_core::accounts::NormalBalance;
use ledgerline_core::vat::{
    ExistingReturn, VatAmounts, VatCategory, VatError, VatPosting, VatReturnStatus, VatService,
};
use ledgerline_shared::types::{ActorId, OrganizationId, VatReturnId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait, sea_query::Expr,
};
use tracing::info;
use uuid::Uuid;

use super::postings::{PostedLineFilter, posted_lines};
use crate::entities::{enums, ledger_accounts, vat_returns};

/// Error types for VAT return operations.
#[derive(Debug, thiserror::Error)]
pub enum VatRepoError {
    /// A VAT rule was violated.
    #[error(transparent)]
    Vat(#[from] VatError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Manual corrections to a draft return's boxes.
#[derive(Debug, Clone, Copy, Default)]
pub struct VatAmountsPatch {
    /// New VAT due on sales.
    pub vat_due_sales: Option<Decimal>,
    /// New VAT due on acquisitions.
    pub vat_due_acquisitions: Option<Decimal>,
    /// New VAT reclaimed.
    pub vat_reclaimed: Option<Decimal>,
}

/// VAT return repository.
#[derive(Debug, Clone)]
pub struct VatRepository {
    db: DatabaseConnection,
}

impl VatRepository {
    /// Creates a new VAT repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Builds a draft return from posted activity in `period_start..=period_end`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange`, `OverlappingReturn` or a database error.
    pub async fn generate(
        &self,
        organization_id: OrganizationId,
        period_start: NaiveDate,
        period_end: NaiveDate,
        actor: ActorId,
    ) -> Result<vat_returns::Model, VatRepoError> {
        let txn = self.db.begin().await?;

        let existing = existing_returns(&txn, organization_id).await?;
        VatService::check_range(period_start, period_end, &existing, None)?;
        let amounts = aggregate(&txn, organization_id, period_start, period_end).await?;

        let now = Utc::now().into();
        let model = vat_returns::ActiveModel {
            id: Set(VatReturnId::new().into_inner()),
            organization_id: Set(organization_id.into_inner()),
            period_start: Set(period_start),
            period_end: Set(period_end),
            vat_due_sales: Set(amounts.vat_due_sales),
            vat_due_acquisitions: Set(amounts.vat_due_acquisitions),
            vat_reclaimed: Set(amounts.vat_reclaimed),
            total_vat_due: Set(amounts.total_vat_due()),
            net_vat_due: Set(amounts.net_vat_due()),
            status: Set(enums::VatReturnStatus::Draft),
            submitted_at: Set(None),
            submitted_by: Set(None),
            created_by: Set(actor.into_inner()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(
            org_id = %organization_id,
            vat_return_id = %model.id,
            %period_start,
            %period_end,
            net_vat_due = %model.net_vat_due,
            "VAT return generated"
        );
        Ok(model)
    }

    /// Lists returns, latest period first.
    pub async fn list_returns(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<vat_returns::Model>, VatRepoError> {
        Ok(vat_returns::Entity::find()
            .filter(vat_returns::Column::OrganizationId.eq(organization_id.into_inner()))
            .order_by_desc(vat_returns::Column::PeriodStart)
            .all(&self.db)
            .await?)
    }

    /// Finds a return.
    pub async fn get_return(
        &self,
        organization_id: OrganizationId,
        id: VatReturnId,
    ) -> Result<vat_returns::Model, VatRepoError> {
        find_return(&self.db, organization_id, id).await
    }

    /// Overrides box amounts on a draft and recomputes the totals.
    pub async fn update_amounts(
        &self,
        organization_id: OrganizationId,
        id: VatReturnId,
        patch: VatAmountsPatch,
    ) -> Result<vat_returns::Model, VatRepoError> {
        let txn = self.db.begin().await?;

        let current = find_return(&txn, organization_id, id).await?;
        VatService::check_editable(current.status.into())?;

        let amounts = VatAmounts {
            vat_due_sales: patch.vat_due_sales.unwrap_or(current.vat_due_sales),
            vat_due_acquisitions: patch
                .vat_due_acquisitions
                .unwrap_or(current.vat_due_acquisitions),
            vat_reclaimed: patch.vat_reclaimed.unwrap_or(current.vat_reclaimed),
        };
        VatService::check_amounts(&amounts)?;

        let updated = store_amounts(&txn, current, &amounts).await?;
        txn.commit().await?;

        info!(org_id = %organization_id, vat_return_id = %id, "VAT return amounts updated");
        Ok(updated)
    }

    /// Recomputes a draft's boxes from the ledger.
    pub async fn regenerate(
        &self,
        organization_id: OrganizationId,
        id: VatReturnId,
    ) -> Result<vat_returns::Model, VatRepoError> {
        let txn = self.db.begin().await?;

        let current = find_return(&txn, organization_id, id).await?;
        VatService::check_editable(current.status.into())?;
        let amounts = aggregate(&txn, organization_id, current.period_start, current.period_end).await?;

        let updated = store_amounts(&txn, current, &amounts).await?;
        txn.commit().await?;

        info!(org_id = %organization_id, vat_return_id = %id, "VAT return regenerated");
        Ok(updated)
    }

    /// Files a draft; its amounts are frozen from here on.
    pub async fn submit(
        &self,
        organization_id: OrganizationId,
        id: VatReturnId,
        actor: ActorId,
    ) -> Result<vat_returns::Model, VatRepoError> {
        self.transition(organization_id, id, VatReturnStatus::Submitted, Some(actor))
            .await
    }

    /// Records acceptance of a submitted return.
    pub async fn accept(
        &self,
        organization_id: OrganizationId,
        id: VatReturnId,
    ) -> Result<vat_returns::Model, VatRepoError> {
        self.transition(organization_id, id, VatReturnStatus::Accepted, None)
            .await
    }

    /// Records rejection of a submitted return. Its range becomes free again.
    pub async fn reject(
        &self,
        organization_id: OrganizationId,
        id: VatReturnId,
    ) -> Result<vat_returns::Model, VatRepoError> {
        self.transition(organization_id, id, VatReturnStatus::Rejected, None)
            .await
    }

    async fn transition(
        &self,
        organization_id: OrganizationId,
        id: VatReturnId,
        to: VatReturnStatus,
        submitted_by: Option<ActorId>,
    ) -> Result<vat_returns::Model, VatRepoError> {
        let txn = self.db.begin().await?;

        let current = find_return(&txn, organization_id, id).await?;
        let from: VatReturnStatus = current.status.into();
        VatService::transition(from, to)?;

        let now = Utc::now().fixed_offset();
        let mut update = vat_returns::Entity::update_many()
            .col_expr(
                vat_returns::Column::Status,
                Expr::value(enums::VatReturnStatus::from(to)),
            )
            .col_expr(vat_returns::Column::UpdatedAt, Expr::value(now));
        if let Some(actor) = submitted_by {
            update = update
                .col_expr(vat_returns::Column::SubmittedAt, Expr::value(now))
                .col_expr(
                    vat_returns::Column::SubmittedBy,
                    Expr::value(actor.into_inner()),
                );
        }
        let result = update
            .filter(vat_returns::Column::Id.eq(current.id))
            .filter(vat_returns::Column::Status.eq(current.status))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            let latest = find_return(&txn, organization_id, id).await?;
            return Err(VatError::InvalidTransition {
                from: latest.status.into(),
                to,
            }
            .into());
        }

        let updated = find_return(&txn, organization_id, id).await?;
        txn.commit().await?;

        info!(
            org_id = %organization_id,
            vat_return_id = %id,
            %from,
            %to,
            "VAT return status changed"
        );
        Ok(updated)
    }
}

/// Sums posted lines on VAT-tagged accounts dated within the range.
async fn aggregate<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Result<VatAmounts, DbErr> {
    let vat_accounts: HashMap<Uuid, (VatCategory, NormalBalance)> = ledger_accounts::Entity::find()
        .filter(ledger_accounts::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(ledger_accounts::Column::VatCategory.is_not_null())
        .all(conn)
        .await?
        .into_iter()
        .filter_map(|a| {
            a.vat_category
                .map(|category| (a.id, (category.into(), a.normal_balance.into())))
        })
        .collect();
    if vat_accounts.is_empty() {
        return Ok(VatAmounts::default());
    }

    let postings: Vec<VatPosting> = posted_lines(
        conn,
        organization_id,
        PostedLineFilter {
            from: Some(period_start),
            to: Some(period_end),
            account_ids: Some(vat_accounts.keys().copied().collect()),
            ..PostedLineFilter::default()
        },
    )
    .await?
    .into_iter()
    .filter_map(|p| {
        vat_accounts
            .get(&p.line.ledger_account_id)
            .map(|&(category, normal_balance)| VatPosting {
                category,
                normal_balance,
                debit: p.line.debit_amount,
                credit: p.line.credit_amount,
            })
    })
    .collect();

    Ok(VatService::aggregate(&postings))
}

/// Writes new box amounts while the return is still a draft. A submit that
/// lands first leaves the row untouched and surfaces as `ReturnFrozen`.
async fn store_amounts<C: ConnectionTrait>(
    conn: &C,
    current: vat_returns::Model,
    amounts: &VatAmounts,
) -> Result<vat_returns::Model, VatRepoError> {
    let result = vat_returns::Entity::update_many()
        .col_expr(vat_returns::Column::VatDueSales, Expr::value(amounts.vat_due_sales))
        .col_expr(
            vat_returns::Column::VatDueAcquisitions,
            Expr::value(amounts.vat_due_acquisitions),
        )
        .col_expr(vat_returns::Column::VatReclaimed, Expr::value(amounts.vat_reclaimed))
        .col_expr(vat_returns::Column::TotalVatDue, Expr::value(amounts.total_vat_due()))
        .col_expr(vat_returns::Column::NetVatDue, Expr::value(amounts.net_vat_due()))
        .col_expr(vat_returns::Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
        .filter(vat_returns::Column::Id.eq(current.id))
        .filter(vat_returns::Column::Status.eq(enums::VatReturnStatus::Draft))
        .exec(conn)
        .await?;

    let organization_id = OrganizationId::from(current.organization_id);
    let latest = find_return(conn, organization_id, current.id.into()).await?;
    if result.rows_affected == 0 {
        return Err(VatError::ReturnFrozen(latest.status.into()).into());
    }
    Ok(latest)
}

async fn existing_returns<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
) -> Result<Vec<ExistingReturn>, DbErr> {
    Ok(vat_returns::Entity::find()
        .filter(vat_returns::Column::OrganizationId.eq(organization_id.into_inner()))
        .all(conn)
        .await?
        .into_iter()
        .map(|r| ExistingReturn {
            id: r.id.into(),
            period_start: r.period_start,
            period_end: r.period_end,
            status: r.status.into(),
        })
        .collect())
}

async fn find_return<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    id: VatReturnId,
) -> Result<vat_returns::Model, VatRepoError> {
    vat_returns::Entity::find_by_id(id.into_inner())
        .filter(vat_returns::Column::OrganizationId.eq(organization_id.into_inner()))
        .one(conn)
        .await?
        .ok_or(VatRepoError::Vat(VatError::NotFound(id)))
}
