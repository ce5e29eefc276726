//! Journal error types.
//!
//! Failed posting checks are grouped under [`PostingRejection`] so callers
//! get one `PostingRejected` outcome with a specific reason.

use chrono::NaiveDate;
use ledgerline_shared::types::{AccountId, FiscalPeriodId, JournalEntryId};
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::EntryStatus;
use crate::fiscal::FiscalPeriodStatus;

/// Why an entry cannot be posted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PostingRejection {
    /// Fewer than two lines.
    #[error("Journal entry must have at least 2 lines, got {0}")]
    InsufficientLines(usize),

    /// Both or neither of debit/credit set.
    #[error("Line {0} must have exactly one of debit or credit amount")]
    InvalidLine(i32),

    /// Negative debit or credit.
    #[error("Line {0} has a negative amount")]
    NegativeAmount(i32),

    /// Debits and credits differ beyond tolerance.
    #[error("Total Debits must equal Total Credits (debits {debit}, credits {credit})")]
    Unbalanced {
        /// Total debits.
        debit: Decimal,
        /// Total credits.
        credit: Decimal,
    },

    /// Referenced fiscal period missing.
    #[error("Fiscal period not found: {0}")]
    PeriodNotFound(FiscalPeriodId),

    /// Referenced fiscal period is closed or locked.
    #[error("Fiscal period is {0}, posting not allowed")]
    PeriodNotOpen(FiscalPeriodStatus),

    /// Entry date is outside the referenced period.
    #[error("Entry date {0} is outside the fiscal period")]
    DateOutsidePeriod(NaiveDate),

    /// Referenced account missing.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Referenced account belongs to another organization.
    #[error("Account {0} belongs to another organization")]
    AccountOrganizationMismatch(AccountId),

    /// Referenced account is inactive.
    #[error("Account {0} is inactive")]
    AccountInactive(AccountId),
}

impl PostingRejection {
    /// Stable code of the reason.
    #[must_use]
    pub const fn reason_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines(_) => "INSUFFICIENT_LINES",
            Self::InvalidLine(_) => "INVALID_LINE",
            Self::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            Self::Unbalanced { .. } => "UNBALANCED_ENTRY",
            Self::PeriodNotFound(_) => "PERIOD_NOT_FOUND",
            Self::PeriodNotOpen(_) => "PERIOD_NOT_OPEN",
            Self::DateOutsidePeriod(_) => "DATE_OUTSIDE_PERIOD",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountOrganizationMismatch(_) => "ACCOUNT_ORGANIZATION_MISMATCH",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
        }
    }
}

/// Errors that can occur during journal operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Posting checks failed; the entry stays draft.
    #[error("{0}")]
    PostingRejected(PostingRejection),

    /// Draft lines are malformed.
    #[error("{0}")]
    InvalidEntry(PostingRejection),

    /// Required field missing.
    #[error("Journal entry {0} is required")]
    MissingField(&'static str),

    /// Journal number already used in the organization.
    #[error("Journal number '{0}' already exists")]
    DuplicateJournalNumber(String),

    // ========== State Errors ==========
    /// Entry not found.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    /// Entry is already posted or voided.
    #[error("Journal entry is already {0}")]
    AlreadyFinal(EntryStatus),

    /// Only drafts can be edited, deleted or cancelled.
    #[error("Only draft journal entries can be changed, entry is {0}")]
    NotDraft(EntryStatus),

    /// Only posted entries can be voided.
    #[error("Only posted journal entries can be voided, entry is {0}")]
    NotPosted(EntryStatus),

    /// No open period to receive a reversal.
    #[error("No open fiscal period for date {0}")]
    NoOpenPeriod(NaiveDate),

    // ========== Concurrency Errors ==========
    /// Account balance changed underneath the posting.
    #[error("Concurrent modification detected, please retry")]
    ConcurrencyConflict,
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::PostingRejected(_) => "POSTING_REJECTED",
            Self::InvalidEntry(reason) => reason.reason_code(),
            Self::MissingField(_) => "VALIDATION_ERROR",
            Self::DuplicateJournalNumber(_) => "DUPLICATE_JOURNAL_NUMBER",
            Self::EntryNotFound(_) => "JOURNAL_ENTRY_NOT_FOUND",
            Self::AlreadyFinal(_) => "ALREADY_FINAL",
            Self::NotDraft(_) => "NOT_DRAFT",
            Self::NotPosted(_) => "NOT_POSTED",
            Self::NoOpenPeriod(_) => "NO_OPEN_PERIOD",
            Self::ConcurrencyConflict => "CONCURRENCY_CONFLICT",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - malformed input
            Self::InvalidEntry(_) | Self::MissingField(_) => 400,

            // 404 Not Found
            Self::EntryNotFound(_) => 404,

            // 409 Conflict
            Self::DuplicateJournalNumber(_) | Self::ConcurrencyConflict => 409,

            // 422 Unprocessable - state and posting rules
            Self::PostingRejected(_)
            | Self::AlreadyFinal(_)
            | Self::NotDraft(_)
            | Self::NotPosted(_)
            | Self::NoOpenPeriod(_) => 422,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict)
    }

    /// The rejection reason, if this is a posting rejection.
    #[must_use]
    pub const fn rejection(&self) -> Option<&PostingRejection> {
        match self {
            Self::PostingRejected(reason) | Self::InvalidEntry(reason) => Some(reason),
            _ => None,
        }
    }
}
