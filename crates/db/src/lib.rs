//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - The schema migration (PostgreSQL and SQLite)
//! - Repositories that run each use case inside one transaction

pub mod entities;
pub mod migration;
pub mod repositories;

#[cfg(test)]
pub(crate) mod test_support;

pub use repositories::{
    AccountRepository, BankRepository, BudgetRepository, FiscalRepository, JournalRepository,
    VatRepository,
};

use std::time::Duration;

use ledgerline_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}
