//! Repository layer for database operations.
//!
//! Each repository owns a connection, opens one transaction per use case
//! and defers every business rule to `ledgerline-core`.

pub mod account;
pub mod bank;
pub mod budget;
pub mod fiscal;
pub mod journal;
pub(crate) mod postings;
pub mod vat;

pub use account::{AccountFilter, AccountRepoError, AccountRepository};
pub use bank::{BankRepoError, BankRepository, BankTransactionFilter, CreateBankTransactionInput};
pub use budget::{
    BudgetLineFilter, BudgetLineWithActual, BudgetRepoError, BudgetRepository,
    CreateBudgetLineInput, UpdateBudgetLineInput,
};
pub use fiscal::{FiscalRepoError, FiscalRepository};
pub use journal::{
    CreateEntryInput, EntryFilter, EntryWithLines, JournalRepoError, JournalRepository,
    UpdateDraftInput, VoidOutcome,
};
pub use vat::{VatAmountsPatch, VatRepoError, VatRepository};

use sea_orm::{DbErr, SqlErr};

/// The database message of a unique index violation, if `err` is one.
///
/// Rule checks read before they write, so two writers can both pass them;
/// the index then rejects the later one.
pub(crate) fn unique_violation(err: &DbErr) -> Option<String> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => Some(message),
        _ => None,
    }
}
