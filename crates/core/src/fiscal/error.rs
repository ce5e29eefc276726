//! Fiscal calendar errors.

use chrono::NaiveDate;
use ledgerline_shared::types::FiscalPeriodId;
use thiserror::Error;

use super::period::FiscalPeriodStatus;

/// Errors raised by fiscal calendar operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FiscalError {
    /// Fiscal period not found.
    #[error("Fiscal period not found: {0}")]
    NotFound(FiscalPeriodId),

    /// Start date after end date.
    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange {
        /// Requested start.
        start: NaiveDate,
        /// Requested end.
        end: NaiveDate,
    },

    /// Range overlaps an existing period.
    #[error("Fiscal period overlaps existing period {0}")]
    OverlappingPeriod(FiscalPeriodId),

    /// Period name is blank.
    #[error("Fiscal period name must not be empty")]
    MissingName,

    /// Status change outside `open → closed → locked`.
    #[error("Cannot move fiscal period from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: FiscalPeriodStatus,
        /// Requested status.
        to: FiscalPeriodStatus,
    },

    /// Draft entries still reference the period.
    #[error("Fiscal period has {0} unposted journal entries")]
    UnpostedEntriesExist(u64),

    /// No open period contains the date.
    #[error("No open fiscal period for date {0}")]
    NoOpenPeriod(NaiveDate),
}

impl FiscalError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "FISCAL_PERIOD_NOT_FOUND",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::OverlappingPeriod(_) => "OVERLAPPING_PERIOD",
            Self::MissingName => "VALIDATION_ERROR",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::UnpostedEntriesExist(_) => "UNPOSTED_ENTRIES_EXIST",
            Self::NoOpenPeriod(_) => "NO_OPEN_PERIOD",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::InvalidDateRange { .. } | Self::MissingName => 400,
            Self::OverlappingPeriod(_) => 409,
            Self::InvalidTransition { .. }
            | Self::UnpostedEntriesExist(_)
            | Self::NoOpenPeriod(_) => 422,
        }
    }
}
