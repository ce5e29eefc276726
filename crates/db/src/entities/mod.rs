//! `SeaORM` entities, one module per table.

pub mod bank_transactions;
pub mod budget_lines;
pub mod enums;
pub mod fiscal_calendars;
pub mod fiscal_periods;
pub mod journal_entries;
pub mod journal_lines;
pub mod ledger_accounts;
pub mod ledger_sequences;
pub mod vat_returns;
