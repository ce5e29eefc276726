//! Budget lines, bank transactions and VAT returns.

use sea_orm_migration::prelude::*;

use super::m20260301_000001_ledger::{
    FiscalPeriods, JournalEntries, LedgerAccounts, timestamp,
};
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
                    .table(BudgetLines::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BudgetLines::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(BudgetLines::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(BudgetLines::LedgerAccountId).uuid().not_null())
                    .col(ColumnDef::new(BudgetLines::CostCenterId).uuid().null())
                    .col(ColumnDef::new(BudgetLines::FiscalPeriodId).uuid().not_null())
                    .col(
                        ColumnDef::new(BudgetLines::BudgetedAmount)
                            .decimal_len(precision, scale)
                            .not_null(),
                    )
                    .col(ColumnDef::new(BudgetLines::Notes).text().null())
                    .col(timestamp(BudgetLines::CreatedAt))
                    .col(timestamp(BudgetLines::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_budget_lines_account")
                            .from(BudgetLines::Table, BudgetLines::LedgerAccountId)
                            .to(LedgerAccounts::Table, LedgerAccounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_budget_lines_period")
                            .from(BudgetLines::Table, BudgetLines::FiscalPeriodId)
                            .to(FiscalPeriods::Table, FiscalPeriods::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_budget_lines_period")
                    .table(BudgetLines::Table)
                    .col(BudgetLines::OrganizationId)
                    .col(BudgetLines::FiscalPeriodId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BankTransactions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BankTransactions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(BankTransactions::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(BankTransactions::TransactionDate).date().not_null())
                    .col(
                        ColumnDef::new(BankTransactions::TransactionType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(BankTransactions::Amount).decimal_len(precision, scale).not_null())
                    .col(ColumnDef::new(BankTransactions::LedgerAccountId).uuid().null())
                    .col(ColumnDef::new(BankTransactions::Reference).string_len(100).null())
                    .col(ColumnDef::new(BankTransactions::Description).text().null())
                    .col(
                        ColumnDef::new(BankTransactions::IsReconciled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(BankTransactions::JournalEntryId).uuid().null())
                    .col(
                        ColumnDef::new(BankTransactions::ReconciledAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(timestamp(BankTransactions::CreatedAt))
                    .col(timestamp(BankTransactions::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bank_transactions_entry")
                            .from(BankTransactions::Table, BankTransactions::JournalEntryId)
                            .to(JournalEntries::Table, JournalEntries::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bank_transactions_org_date")
                    .table(BankTransactions::Table)
                    .col(BankTransactions::OrganizationId)
                    .col(BankTransactions::TransactionDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VatReturns::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(VatReturns::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(VatReturns::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(VatReturns::PeriodStart).date().not_null())
                    .col(ColumnDef::new(VatReturns::PeriodEnd).date().not_null())
                    .col(amount(VatReturns::VatDueSales, precision, scale))
                    .col(amount(VatReturns::VatDueAcquisitions, precision, scale))
                    .col(amount(VatReturns::VatReclaimed, precision, scale))
                    .col(amount(VatReturns::TotalVatDue, precision, scale))
                    .col(amount(VatReturns::NetVatDue, precision, scale))
                    .col(ColumnDef::new(VatReturns::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(VatReturns::SubmittedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(VatReturns::SubmittedBy).uuid().null())
                    .col(ColumnDef::new(VatReturns::CreatedBy).uuid().not_null())
                    .col(timestamp(VatReturns::CreatedAt))
                    .col(timestamp(VatReturns::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_vat_returns_org_period")
                    .table(VatReturns::Table)
                    .col(VatReturns::OrganizationId)
                    .col(VatReturns::PeriodStart)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VatReturns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BankTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BudgetLines::Table).to_owned())
            .await
    }
}

fn amount<T: IntoIden>(name: T, precision: u32, scale: u32) -> ColumnDef {
    ColumnDef::new(name)
        .decimal_len(precision, scale)
        .not_null()
        .default(0)
        .to_owned()
}

#[derive(DeriveIden)]
enum BudgetLines {
    Table,
    Id,
    OrganizationId,
    LedgerAccountId,
    CostCenterId,
    FiscalPeriodId,
    BudgetedAmount,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum BankTransactions {
    Table,
    Id,
    OrganizationId,
    TransactionDate,
    TransactionType,
    Amount,
    LedgerAccountId,
    Reference,
    Description,
    IsReconciled,
    JournalEntryId,
    ReconciledAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum VatReturns {
    Table,
    Id,
    OrganizationId,
    PeriodStart,
    PeriodEnd,
    VatDueSales,
    VatDueAcquisitions,
    VatReclaimed,
    TotalVatDue,
    NetVatDue,
    Status,
    SubmittedAt,
    SubmittedBy,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}
