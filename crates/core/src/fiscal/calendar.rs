//! An organization's set of fiscal periods.

use chrono::NaiveDate;
use ledgerline_shared::types::FiscalPeriodId;

use super::error::FiscalError;
use super::period::{FiscalPeriod, FiscalPeriodStatus};

/// All fiscal periods of one organization, ordered by start date.
#[derive(Debug, Clone, Default)]
pub struct FiscalCalendar {
    periods: Vec<FiscalPeriod>,
}

impl FiscalCalendar {
    /// Builds a calendar from stored periods.
    #[must_use]
    pub fn new(mut periods: Vec<FiscalPeriod>) -> Self {
        periods.sort_by_key(|p| p.start_date);
        Self { periods }
    }

    /// Periods ordered by start date.
    #[must_use]
    pub fn periods(&self) -> &[FiscalPeriod] {
        &self.periods
    }

    /// Looks up a period by id.
    #[must_use]
    pub fn get(&self, id: FiscalPeriodId) -> Option<&FiscalPeriod> {
        self.periods.iter().find(|p| p.id == id)
    }

    /// Checks that a new period can be opened over `start..=end`.
    ///
    /// # Errors
    ///
    /// - `MissingName` for a blank name
    /// - `InvalidDateRange` if `start > end`
    /// - `OverlappingPeriod` if the range intersects any existing period
    pub fn validate_new(&self, name: &str, start: NaiveDate, end: NaiveDate) -> Result<(), FiscalError> {
        if name.trim().is_empty() {
            return Err(FiscalError::MissingName);
        }
        if start > end {
            return Err(FiscalError::InvalidDateRange { start, end });
        }
        if let Some(existing) = self.periods.iter().find(|p| p.overlaps(start, end)) {
            return Err(FiscalError::OverlappingPeriod(existing.id));
        }
        Ok(())
    }

    /// The period whose range contains `date`, whatever its status.
    #[must_use]
    pub fn period_for_date(&self, date: NaiveDate) -> Option<&FiscalPeriod> {
        self.periods.iter().find(|p| p.contains_date(date))
    }

    /// The open period containing `date`.
    ///
    /// Reversals of entries in closed or locked periods post here.
    pub fn current_open_period(&self, date: NaiveDate) -> Result<&FiscalPeriod, FiscalError> {
        self.period_for_date(date)
            .filter(|p| p.is_open())
            .ok_or(FiscalError::NoOpenPeriod(date))
    }

    /// Checks that a period may be closed.
    ///
    /// `draft_entries` is the number of `draft` journal entries in the period.
    pub fn check_close(period: &FiscalPeriod, draft_entries: u64) -> Result<(), FiscalError> {
        period.status.transition_to(FiscalPeriodStatus::Closed)?;
        if draft_entries > 0 {
            return Err(FiscalError::UnpostedEntriesExist(draft_entries));
        }
        Ok(())
    }

    /// Checks that a period may be locked.
    pub fn check_lock(period: &FiscalPeriod) -> Result<(), FiscalError> {
        period.status.transition_to(FiscalPeriodStatus::Locked)?;
        Ok(())
    }
}
