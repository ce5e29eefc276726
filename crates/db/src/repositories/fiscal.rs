//! Fiscal period repository.
//!
//! Close and lock use conditional updates (`WHERE status = ...`) so they act
//! as a barrier against postings running in parallel.

use chrono::{NaiveDate, Utc};
use ledgerline_core::fiscal::{FiscalCalendar, FiscalError, FiscalPeriod, FiscalPeriodStatus};
use ledgerline_shared::types::{ActorId, FiscalPeriodId, OrganizationId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use tracing::{info, warn};

use crate::entities::{enums, fiscal_calendars, fiscal_periods, journal_entries};

/// Error types for fiscal period operations.
#[derive(Debug, thiserror::Error)]
pub enum FiscalRepoError {
    /// A fiscal calendar rule was violated.
    #[error(transparent)]
    Fiscal(#[from] FiscalError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Fiscal repository for period operations.
#[derive(Debug, Clone)]
pub struct FiscalRepository {
    db: DatabaseConnection,
}

impl FiscalRepository {
    /// Creates a new fiscal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Opens a new period over `start..=end`.
    ///
    /// The organization's calendar row is locked first, so concurrent opens
    /// run their overlap checks one after the other.
    ///
    /// # Errors
    ///
    /// Returns `MissingName`, `InvalidDateRange`, `OverlappingPeriod` or a
    /// database error.
    pub async fn open_period(
        &self,
        organization_id: OrganizationId,
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<fiscal_periods::Model, FiscalRepoError> {
        let txn = self.db.begin().await?;

        lock_calendar(&txn, organization_id).await?;
        let calendar = load_calendar(&txn, organization_id).await?;
        calendar.validate_new(name, start_date, end_date)?;

        let now = Utc::now().into();
        let period = fiscal_periods::ActiveModel {
            id: Set(FiscalPeriodId::new().into_inner()),
            organization_id: Set(organization_id.into_inner()),
            name: Set(name.trim().to_string()),
            start_date: Set(start_date),
            end_date: Set(end_date),
            status: Set(enums::FiscalPeriodStatus::Open),
            closed_at: Set(None),
            closed_by: Set(None),
            locked_at: Set(None),
            locked_by: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(
            org_id = %organization_id,
            period_id = %period.id,
            %start_date,
            %end_date,
            "Fiscal period opened"
        );
        Ok(period)
    }

    /// Lists periods ordered by start date.
    pub async fn list_periods(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<fiscal_periods::Model>, FiscalRepoError> {
        Ok(org_periods(&self.db, organization_id).await?)
    }

    /// Finds a period of the organization.
    pub async fn get_period(
        &self,
        organization_id: OrganizationId,
        id: FiscalPeriodId,
    ) -> Result<fiscal_periods::Model, FiscalRepoError> {
        find_period(&self.db, organization_id, id).await
    }

    /// The period containing `date`, whatever its status.
    pub async fn find_period_for_date(
        &self,
        organization_id: OrganizationId,
        date: NaiveDate,
    ) -> Result<Option<fiscal_periods::Model>, FiscalRepoError> {
        Ok(period_for_date(&self.db, organization_id, date).await?)
    }

    /// The open period containing `date`.
    ///
    /// # Errors
    ///
    /// Returns `NoOpenPeriod` if no open period covers the date.
    pub async fn current_open_period(
        &self,
        organization_id: OrganizationId,
        date: NaiveDate,
    ) -> Result<fiscal_periods::Model, FiscalRepoError> {
        period_for_date(&self.db, organization_id, date)
            .await?
            .filter(|p| p.status == enums::FiscalPeriodStatus::Open)
            .ok_or(FiscalRepoError::Fiscal(FiscalError::NoOpenPeriod(date)))
    }

    /// Closes an open period with no draft entries.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the period is open,
    /// `UnpostedEntriesExist` while drafts remain, or a database error.
    pub async fn close_period(
        &self,
        organization_id: OrganizationId,
        id: FiscalPeriodId,
        actor: ActorId,
    ) -> Result<fiscal_periods::Model, FiscalRepoError> {
        let txn = self.db.begin().await?;

        let model = find_period(&txn, organization_id, id).await?;
        let drafts = journal_entries::Entity::find()
            .filter(journal_entries::Column::FiscalPeriodId.eq(id.into_inner()))
            .filter(journal_entries::Column::Status.eq(enums::EntryStatus::Draft))
            .count(&txn)
            .await?;
        let period = FiscalPeriod::from(model);
        FiscalCalendar::check_close(&period, drafts)?;

        let now = Utc::now().fixed_offset();
        let result = fiscal_periods::Entity::update_many()
            .col_expr(
                fiscal_periods::Column::Status,
                Expr::value(enums::FiscalPeriodStatus::Closed),
            )
            .col_expr(fiscal_periods::Column::ClosedAt, Expr::value(now))
            .col_expr(
                fiscal_periods::Column::ClosedBy,
                Expr::value(actor.into_inner()),
            )
            .col_expr(fiscal_periods::Column::UpdatedAt, Expr::value(now))
            .filter(fiscal_periods::Column::Id.eq(id.into_inner()))
            .filter(fiscal_periods::Column::Status.eq(enums::FiscalPeriodStatus::Open))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            let current = find_period(&txn, organization_id, id).await?;
            warn!(org_id = %organization_id, period_id = %id, "Period changed while closing");
            return Err(FiscalError::InvalidTransition {
                from: current.status.into(),
                to: FiscalPeriodStatus::Closed,
            }
            .into());
        }

        let closed = find_period(&txn, organization_id, id).await?;
        txn.commit().await?;

        info!(org_id = %organization_id, period_id = %id, actor = %actor, "Fiscal period closed");
        Ok(closed)
    }

    /// Locks a closed period. Locking is permanent.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the period is closed.
    pub async fn lock_period(
        &self,
        organization_id: OrganizationId,
        id: FiscalPeriodId,
        actor: ActorId,
    ) -> Result<fiscal_periods::Model, FiscalRepoError> {
        let txn = self.db.begin().await?;

        let model = find_period(&txn, organization_id, id).await?;
        FiscalCalendar::check_lock(&FiscalPeriod::from(model))?;

        let now = Utc::now().fixed_offset();
        let result = fiscal_periods::Entity::update_many()
            .col_expr(
                fiscal_periods::Column::Status,
                Expr::value(enums::FiscalPeriodStatus::Locked),
            )
            .col_expr(fiscal_periods::Column::LockedAt, Expr::value(now))
            .col_expr(
                fiscal_periods::Column::LockedBy,
                Expr::value(actor.into_inner()),
            )
            .col_expr(fiscal_periods::Column::UpdatedAt, Expr::value(now))
            .filter(fiscal_periods::Column::Id.eq(id.into_inner()))
            .filter(fiscal_periods::Column::Status.eq(enums::FiscalPeriodStatus::Closed))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            let current = find_period(&txn, organization_id, id).await?;
            warn!(org_id = %organization_id, period_id = %id, "Period changed while locking");
            return Err(FiscalError::InvalidTransition {
                from: current.status.into(),
                to: FiscalPeriodStatus::Locked,
            }
            .into());
        }

        let locked = find_period(&txn, organization_id, id).await?;
        txn.commit().await?;

        info!(org_id = %organization_id, period_id = %id, actor = %actor, "Fiscal period locked");
        Ok(locked)
    }
}

/// Bumps the organization's calendar revision. The row lock is held until
/// the transaction ends.
async fn lock_calendar<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
) -> Result<(), DbErr> {
    fiscal_calendars::Entity::insert(fiscal_calendars::ActiveModel {
        organization_id: Set(organization_id.into_inner()),
        revision: Set(0),
    })
    .on_conflict(
        OnConflict::column(fiscal_calendars::Column::OrganizationId)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    fiscal_calendars::Entity::update_many()
        .col_expr(
            fiscal_calendars::Column::Revision,
            Expr::col(fiscal_calendars::Column::Revision).add(1),
        )
        .filter(fiscal_calendars::Column::OrganizationId.eq(organization_id.into_inner()))
        .exec(conn)
        .await?;
    Ok(())
}

pub(crate) async fn org_periods<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
) -> Result<Vec<fiscal_periods::Model>, DbErr> {
    fiscal_periods::Entity::find()
        .filter(fiscal_periods::Column::OrganizationId.eq(organization_id.into_inner()))
        .order_by_asc(fiscal_periods::Column::StartDate)
        .all(conn)
        .await
}

/// Loads the organization's periods into a calendar.
pub(crate) async fn load_calendar<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
) -> Result<FiscalCalendar, DbErr> {
    let periods = org_periods(conn, organization_id).await?;
    Ok(FiscalCalendar::new(periods.into_iter().map(Into::into).collect()))
}

pub(crate) async fn find_period<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    id: FiscalPeriodId,
) -> Result<fiscal_periods::Model, FiscalRepoError> {
    fiscal_periods::Entity::find_by_id(id.into_inner())
        .filter(fiscal_periods::Column::OrganizationId.eq(organization_id.into_inner()))
        .one(conn)
        .await?
        .ok_or(FiscalRepoError::Fiscal(FiscalError::NotFound(id)))
}

pub(crate) async fn period_for_date<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    date: NaiveDate,
) -> Result<Option<fiscal_periods::Model>, DbErr> {
    fiscal_periods::Entity::find()
        .filter(fiscal_periods::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(fiscal_periods::Column::StartDate.lte(date))
        .filter(fiscal_periods::Column::EndDate.gte(date))
        .one(conn)
        .await
}
