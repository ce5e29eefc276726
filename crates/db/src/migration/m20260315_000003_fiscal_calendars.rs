//! Per-organization calendar row that serializes period creation.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FiscalCalendars::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FiscalCalendars::OrganizationId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FiscalCalendars::Revision)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FiscalCalendars::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum FiscalCalendars {
    Table,
    OrganizationId,
    Revision,
}
