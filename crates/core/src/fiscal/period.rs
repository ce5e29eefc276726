//! Fiscal period types.

use chrono::{DateTime, NaiveDate, Utc};
use ledgerline_shared::types::{ActorId, FiscalPeriodId};
use serde::{Deserialize, Serialize};

use super::error::FiscalError;

/// Status of a fiscal period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FiscalPeriodStatus {
    /// Period accepts postings.
    Open,
    /// Period is closed, no new postings.
    Closed,
    /// Period is locked permanently, nothing may reference it.
    Locked,
}

impl FiscalPeriodStatus {
    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Locked => "locked",
        }
    }

    /// Checks a status change against `open → closed → locked`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` for anything else, including no-op
    /// transitions and going backwards.
    pub fn transition_to(self, to: Self) -> Result<Self, FiscalError> {
        match (self, to) {
            (Self::Open, Self::Closed) | (Self::Closed, Self::Locked) => Ok(to),
            (from, to) => Err(FiscalError::InvalidTransition { from, to }),
        }
    }
}

impl std::fmt::Display for FiscalPeriodStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bounded date range entries are posted against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiscalPeriod {
    /// Unique identifier.
    pub id: FiscalPeriodId,
    /// Period name (e.g., "March 2024").
    pub name: String,
    /// First day of the period.
    pub start_date: NaiveDate,
    /// Last day of the period (inclusive).
    pub end_date: NaiveDate,
    /// Current status.
    pub status: FiscalPeriodStatus,
    /// When the period was closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Who closed the period.
    pub closed_by: Option<ActorId>,
    /// When the period was locked.
    pub locked_at: Option<DateTime<Utc>>,
    /// Who locked the period.
    pub locked_by: Option<ActorId>,
}

impl FiscalPeriod {
    /// Returns true if entries can be posted to this period.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == FiscalPeriodStatus::Open
    }

    /// Returns true if the given date falls within this period.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Returns true if the inclusive ranges intersect.
    #[must_use]
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }
}
