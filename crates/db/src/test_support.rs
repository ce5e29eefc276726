//! In-memory database for repository tests.

use chrono::NaiveDate;
use ledgerline_core::accounts::{AccountType, NewAccount};
use ledgerline_core::ledger::JournalLineInput;
use ledgerline_shared::types::{AccountId, OrganizationId};
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::migration::Migrator;

/// Fresh SQLite database with the schema applied.
///
/// A single pooled connection keeps every query on the same in-memory database.
pub(crate) async fn test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.expect("connect sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) fn new_account(code: &str, name: &str, account_type: AccountType) -> NewAccount {
    NewAccount {
        id: None,
        code: code.to_string(),
        name: name.to_string(),
        account_type,
        normal_balance: None,
        parent_id: None,
        is_system: false,
        is_active: true,
        vat_category: None,
    }
}

pub(crate) fn debit(line_number: i32, account: AccountId, amount: Decimal) -> JournalLineInput {
    JournalLineInput {
        line_number,
        ledger_account_id: account,
        debit_amount: amount,
        credit_amount: Decimal::ZERO,
        description: None,
        cost_center_id: None,
    }
}

pub(crate) fn credit(line_number: i32, account: AccountId, amount: Decimal) -> JournalLineInput {
    JournalLineInput {
        line_number,
        ledger_account_id: account,
        debit_amount: Decimal::ZERO,
        credit_amount: amount,
        description: None,
        cost_center_id: None,
    }
}

/// A fresh organization id.
pub(crate) fn org() -> OrganizationId {
    OrganizationId::new()
}
