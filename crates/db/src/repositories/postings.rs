//! Lines of entries that reached the ledger.
//!
//! An entry counts once it has a posting sequence: `posted` entries and
//! `voided` entries that were posted before being reversed. The reversal is
//! itself posted, so the pair nets to zero. Cancelled drafts never got a
//! sequence and are left out.

use chrono::NaiveDate;
use ledgerline_shared::types::OrganizationId;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::{journal_entries, journal_lines};

/// Narrowing applied to [`posted_lines`].
#[derive(Debug, Clone, Default)]
pub(crate) struct PostedLineFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub fiscal_period_ids: Option<Vec<Uuid>>,
    pub account_ids: Option<Vec<Uuid>>,
}

/// A journal line with the header fields of its entry.
#[derive(Debug, Clone)]
pub(crate) struct PostedLine {
    pub line: journal_lines::Model,
    pub entry: journal_entries::Model,
}

pub(crate) async fn posted_lines<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    filter: PostedLineFilter,
) -> Result<Vec<PostedLine>, DbErr> {
    let mut query = journal_lines::Entity::find()
        .find_also_related(journal_entries::Entity)
        .filter(journal_entries::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(journal_entries::Column::PostingSequence.is_not_null());

    if let Some(from) = filter.from {
        query = query.filter(journal_entries::Column::EntryDate.gte(from));
    }
    if let Some(to) = filter.to {
        query = query.filter(journal_entries::Column::EntryDate.lte(to));
    }
    if let Some(period_ids) = filter.fiscal_period_ids {
        query = query.filter(journal_entries::Column::FiscalPeriodId.is_in(period_ids));
    }
    if let Some(account_ids) = filter.account_ids {
        query = query.filter(journal_lines::Column::LedgerAccountId.is_in(account_ids));
    }

    let rows = query
        .order_by_asc(journal_entries::Column::PostingSequence)
        .order_by_asc(journal_lines::Column::LineNumber)
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(line, entry)| entry.map(|entry| PostedLine { line, entry }))
        .collect())
}
