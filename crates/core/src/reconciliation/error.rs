//! Reconciliation errors.

use ledgerline_shared::types::{AccountId, BankTransactionId, JournalEntryId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by reconciliation operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconciliationError {
    /// Bank transaction not found.
    #[error("Bank transaction not found: {0}")]
    NotFound(BankTransactionId),

    /// Journal entry not found.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    /// Bank account is not in the organization's chart.
    #[error("Ledger account not found: {0}")]
    AccountNotFound(AccountId),

    /// Bank transaction amount must be nonzero.
    #[error("Bank transaction amount cannot be zero")]
    ZeroAmount,

    /// Transaction is already linked.
    #[error("Bank transaction is already reconciled")]
    AlreadyReconciled,

    /// Transaction is not linked.
    #[error("Bank transaction is not reconciled")]
    NotReconciled,

    /// Only posted entries can be linked.
    #[error("Only posted journal entries can be reconciled")]
    EntryNotPosted,

    /// Entry is linked to another bank transaction.
    #[error("Journal entry {0} is already linked to another bank transaction")]
    EntryAlreadyLinked(JournalEntryId),

    /// No line of the entry matches the bank amount on the expected side.
    #[error("Journal entry has no line matching amount {0}")]
    AmountMismatch(Decimal),

    /// The transaction's or entry's period is no longer open.
    #[error("Fiscal period is closed or locked, reconciliation cannot be undone")]
    PeriodLocked,
}

impl ReconciliationError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "BANK_TRANSACTION_NOT_FOUND",
            Self::EntryNotFound(_) => "JOURNAL_ENTRY_NOT_FOUND",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::AlreadyReconciled => "ALREADY_RECONCILED",
            Self::NotReconciled => "NOT_RECONCILED",
            Self::EntryNotPosted => "ENTRY_NOT_POSTED",
            Self::EntryAlreadyLinked(_) => "ENTRY_ALREADY_LINKED",
            Self::AmountMismatch(_) => "AMOUNT_MISMATCH",
            Self::PeriodLocked => "PERIOD_LOCKED",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) | Self::EntryNotFound(_) | Self::AccountNotFound(_) => 404,
            Self::ZeroAmount => 400,
            Self::AlreadyReconciled | Self::EntryAlreadyLinked(_) => 409,
            Self::NotReconciled
            | Self::EntryNotPosted
            | Self::AmountMismatch(_)
            | Self::PeriodLocked => 422,
        }
    }
}
