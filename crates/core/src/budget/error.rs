//! Budget error types.

use ledgerline_shared::types::BudgetLineId;
use thiserror::Error;

use crate::fiscal::FiscalPeriodStatus;

/// Budget-related errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BudgetError {
    /// Budget line not found.
    #[error("Budget line not found: {0}")]
    NotFound(BudgetLineId),

    /// Budget line already exists for this account, cost center and period.
    #[error("Budget line already exists for this account, cost center and period")]
    DuplicateBudgetLine,

    /// Amount cannot be negative.
    #[error("Budgeted amount cannot be negative")]
    NegativeAmount,

    /// Budgets of closed or locked periods are frozen.
    #[error("Fiscal period is {0}, budget can no longer be changed")]
    PeriodNotOpen(FiscalPeriodStatus),
}

impl BudgetError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "BUDGET_LINE_NOT_FOUND",
            Self::DuplicateBudgetLine => "DUPLICATE_BUDGET_LINE",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::PeriodNotOpen(_) => "PERIOD_NOT_OPEN",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::DuplicateBudgetLine => 409,
            Self::NegativeAmount => 400,
            Self::PeriodNotOpen(_) => 422,
        }
    }
}
