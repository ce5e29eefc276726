//! Ledger tables: accounts, fiscal periods, journal entries and lines,
//! and the per-organization posting sequence.

use sea_orm_migration::prelude::*;

use super::money_precision;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let (precision, scale) = money_precision(manager.get_database_backend());

        manager
            .create_table(
                Table::create()
                    .table(LedgerAccounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(LedgerAccounts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(LedgerAccounts::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(LedgerAccounts::Code).string_len(32).not_null())
                    .col(ColumnDef::new(LedgerAccounts::Name).string_len(255).not_null())
                    .col(ColumnDef::new(LedgerAccounts::AccountType).string_len(16).not_null())
                    .col(ColumnDef::new(LedgerAccounts::NormalBalance).string_len(16).not_null())
                    .col(ColumnDef::new(LedgerAccounts::ParentId).uuid().null())
                    .col(
                        ColumnDef::new(LedgerAccounts::IsSystem)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(LedgerAccounts::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(LedgerAccounts::VatCategory).string_len(24).null())
                    .col(
                        ColumnDef::new(LedgerAccounts::Balance)
                            .decimal_len(precision, scale)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LedgerAccounts::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(timestamp(LedgerAccounts::CreatedAt))
                    .col(timestamp(LedgerAccounts::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ledger_accounts_parent")
                            .from(LedgerAccounts::Table, LedgerAccounts::ParentId)
                            .to(LedgerAccounts::Table, LedgerAccounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_ledger_accounts_org_code")
                    .table(LedgerAccounts::Table)
                    .col(LedgerAccounts::OrganizationId)
                    .col(LedgerAccounts::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FiscalPeriods::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(FiscalPeriods::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(FiscalPeriods::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(FiscalPeriods::Name).string_len(100).not_null())
                    .col(ColumnDef::new(FiscalPeriods::StartDate).date().not_null())
                    .col(ColumnDef::new(FiscalPeriods::EndDate).date().not_null())
                    .col(ColumnDef::new(FiscalPeriods::Status).string_len(16).not_null())
                    .col(ColumnDef::new(FiscalPeriods::ClosedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(FiscalPeriods::ClosedBy).uuid().null())
                    .col(ColumnDef::new(FiscalPeriods::LockedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(FiscalPeriods::LockedBy).uuid().null())
                    .col(timestamp(FiscalPeriods::CreatedAt))
                    .col(timestamp(FiscalPeriods::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_fiscal_periods_org_dates")
                    .table(FiscalPeriods::Table)
                    .col(FiscalPeriods::OrganizationId)
                    .col(FiscalPeriods::StartDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JournalEntries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(JournalEntries::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(JournalEntries::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(JournalEntries::FiscalPeriodId).uuid().not_null())
                    .col(ColumnDef::new(JournalEntries::JournalNumber).string_len(64).not_null())
                    .col(ColumnDef::new(JournalEntries::EntryDate).date().not_null())
                    .col(ColumnDef::new(JournalEntries::EntryType).string_len(16).not_null())
                    .col(ColumnDef::new(JournalEntries::Status).string_len(16).not_null())
                    .col(ColumnDef::new(JournalEntries::Description).text().null())
                    .col(ColumnDef::new(JournalEntries::PostingSequence).big_integer().null())
                    .col(ColumnDef::new(JournalEntries::ReversedBy).uuid().null())
                    .col(ColumnDef::new(JournalEntries::Reverses).uuid().null())
                    .col(ColumnDef::new(JournalEntries::VoidReason).text().null())
                    .col(ColumnDef::new(JournalEntries::CreatedBy).uuid().not_null())
                    .col(ColumnDef::new(JournalEntries::PostedBy).uuid().null())
                    .col(ColumnDef::new(JournalEntries::PostedAt).timestamp_with_time_zone().null())
                    .col(timestamp(JournalEntries::CreatedAt))
                    .col(timestamp(JournalEntries::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_journal_entries_period")
                            .from(JournalEntries::Table, JournalEntries::FiscalPeriodId)
                            .to(FiscalPeriods::Table, FiscalPeriods::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_journal_entries_org_number")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::OrganizationId)
                    .col(JournalEntries::JournalNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_journal_entries_period_status")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::FiscalPeriodId)
                    .col(JournalEntries::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JournalLines::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(JournalLines::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(JournalLines::JournalEntryId).uuid().not_null())
                    .col(ColumnDef::new(JournalLines::LineNumber).integer().not_null())
                    .col(ColumnDef::new(JournalLines::LedgerAccountId).uuid().not_null())
                    .col(
                        ColumnDef::new(JournalLines::DebitAmount)
                            .decimal_len(precision, scale)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(JournalLines::CreditAmount)
                            .decimal_len(precision, scale)
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(JournalLines::Description).text().null())
                    .col(ColumnDef::new(JournalLines::CostCenterId).uuid().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_journal_lines_entry")
                            .from(JournalLines::Table, JournalLines::JournalEntryId)
                            .to(JournalEntries::Table, JournalEntries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_journal_lines_account")
                            .from(JournalLines::Table, JournalLines::LedgerAccountId)
                            .to(LedgerAccounts::Table, LedgerAccounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_journal_lines_account")
                    .table(JournalLines::Table)
                    .col(JournalLines::LedgerAccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LedgerSequences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerSequences::OrganizationId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LedgerSequences::LastSequence)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LedgerSequences::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JournalLines::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JournalEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FiscalPeriods::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LedgerAccounts::Table).to_owned())
            .await
    }
}

/// `created_at` / `updated_at` column.
pub(super) fn timestamp<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(DeriveIden)]
pub(super) enum LedgerAccounts {
    Table,
    Id,
    OrganizationId,
    Code,
    Name,
    AccountType,
    NormalBalance,
    ParentId,
    IsSystem,
    IsActive,
    VatCategory,
    Balance,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(super) enum FiscalPeriods {
    Table,
    Id,
    OrganizationId,
    Name,
    StartDate,
    EndDate,
    Status,
    ClosedAt,
    ClosedBy,
    LockedAt,
    LockedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(super) enum JournalEntries {
    Table,
    Id,
    OrganizationId,
    FiscalPeriodId,
    JournalNumber,
    EntryDate,
    EntryType,
    Status,
    Description,
    PostingSequence,
    ReversedBy,
    Reverses,
    VoidReason,
    CreatedBy,
    PostedBy,
    PostedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum JournalLines {
    Table,
    Id,
    JournalEntryId,
    LineNumber,
    LedgerAccountId,
    DebitAmount,
    CreditAmount,
    Description,
    CostCenterId,
}

#[derive(DeriveIden)]
enum LedgerSequences {
    Table,
    OrganizationId,
    LastSequence,
}
