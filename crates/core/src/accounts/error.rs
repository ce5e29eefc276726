//! Chart of accounts errors.

use ledgerline_shared::types::AccountId;
use thiserror::Error;

/// Errors raised by chart of accounts operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    /// Account not found.
    #[error("Account not found: {0}")]
    NotFound(AccountId),

    /// Parent account not found.
    #[error("Parent account not found: {0}")]
    ParentNotFound(AccountId),

    /// The proposed parent is the account itself or one of its descendants.
    #[error("Parent {parent_id} would create a cycle under account {account_id}")]
    CycleDetected {
        /// Account being created or moved.
        account_id: AccountId,
        /// Proposed parent.
        parent_id: AccountId,
    },

    /// Account code already used in this chart.
    #[error("Account code '{0}' already exists")]
    DuplicateCode(String),

    /// Account ID already used in this chart.
    #[error("Account {0} already exists")]
    DuplicateId(AccountId),

    /// Code or name is blank.
    #[error("Account {0} must not be empty")]
    MissingField(&'static str),

    /// Normal balance is fixed for non-system accounts.
    #[error("Normal balance of account {0} cannot be changed")]
    NormalBalanceImmutable(AccountId),

    /// System accounts cannot be deleted.
    #[error("System account {0} cannot be deleted")]
    SystemAccount(AccountId),

    /// Account still has child accounts.
    #[error("Account {0} has child accounts")]
    AccountHasChildren(AccountId),

    /// Account is referenced by journal lines.
    #[error("Account {0} is referenced by journal lines")]
    AccountInUse(AccountId),
}

impl AccountError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::ParentNotFound(_) => "PARENT_NOT_FOUND",
            Self::CycleDetected { .. } => "CYCLE_DETECTED",
            Self::DuplicateCode(_) => "DUPLICATE_CODE",
            Self::DuplicateId(_) => "DUPLICATE_ACCOUNT",
            Self::MissingField(_) => "VALIDATION_ERROR",
            Self::NormalBalanceImmutable(_) => "NORMAL_BALANCE_IMMUTABLE",
            Self::SystemAccount(_) => "SYSTEM_ACCOUNT",
            Self::AccountHasChildren(_) => "ACCOUNT_HAS_CHILDREN",
            Self::AccountInUse(_) => "ACCOUNT_IN_USE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::MissingField(_) => 400,
            Self::ParentNotFound(_)
            | Self::CycleDetected { .. }
            | Self::NormalBalanceImmutable(_)
            | Self::SystemAccount(_)
            | Self::AccountHasChildren(_)
            | Self::AccountInUse(_) => 422,
            Self::DuplicateCode(_) | Self::DuplicateId(_) => 409,
        }
    }
}
