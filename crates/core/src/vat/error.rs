//! VAT return errors.

use chrono::NaiveDate;
use ledgerline_shared::types::VatReturnId;
use thiserror::Error;

use super::types::VatReturnStatus;

/// Errors raised by VAT return operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VatError {
    /// VAT return not found.
    #[error("VAT return not found: {0}")]
    NotFound(VatReturnId),

    /// Start date after end date.
    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange {
        /// Requested start.
        start: NaiveDate,
        /// Requested end.
        end: NaiveDate,
    },

    /// Range overlaps a return that has not been rejected.
    #[error("VAT return overlaps existing return {0}")]
    OverlappingReturn(VatReturnId),

    /// Amounts are frozen once the return leaves draft.
    #[error("VAT return is {0} and can no longer be edited")]
    ReturnFrozen(VatReturnStatus),

    /// Status change outside draft → submitted → accepted/rejected.
    #[error("Cannot move VAT return from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: VatReturnStatus,
        /// Requested status.
        to: VatReturnStatus,
    },

    /// Box amounts cannot be negative.
    #[error("VAT amounts cannot be negative")]
    NegativeAmount,
}

impl VatError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "VAT_RETURN_NOT_FOUND",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::OverlappingReturn(_) => "OVERLAPPING_RETURN",
            Self::ReturnFrozen(_) => "RETURN_FROZEN",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::InvalidDateRange { .. } | Self::NegativeAmount => 400,
            Self::OverlappingReturn(_) => 409,
            Self::ReturnFrozen(_) | Self::InvalidTransition { .. } => 422,
        }
    }
}
