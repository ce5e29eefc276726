//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration and are written with the
//! schema builder so the same steps run on PostgreSQL and SQLite.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_ledger;
mod m20260301_000002_subledgers;
mod m20260315_000003_fiscal_calendars;

/// Precision and scale of money columns. SQLite caps decimal precision at 16.
pub(crate) const fn money_precision(backend: sea_orm::DatabaseBackend) -> (u32, u32) {
    match backend {
        sea_orm::DatabaseBackend::Sqlite => (16, 4),
        _ => (19, 4),
    }
}

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_ledger::Migration),
            Box::new(m20260301_000002_subledgers::Migration),
            Box::new(m20260315_000003_fiscal_calendars::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DatabaseBackend;

    #[test]
    fn test_money_precision_per_backend() {
        assert_eq!(money_precision(DatabaseBackend::Postgres), (19, 4));
        assert_eq!(money_precision(DatabaseBackend::Sqlite), (16, 4));
    }

    #[tokio::test]
    async fn test_migrations_apply_and_revert_on_sqlite() {
        let db = crate::test_support::test_db().await;

        Migrator::down(&db, None).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
    }
}
