//! VAT aggregation and return lifecycle rules.

use chrono::NaiveDate;
use ledgerline_shared::types::VatReturnId;
use rust_decimal::Decimal;

use super::error::VatError;
use super::types::{VatAmounts, VatCategory, VatPosting, VatReturnStatus};

/// Summary of a stored return used for overlap checks.
#[derive(Debug, Clone, Copy)]
pub struct ExistingReturn {
    /// Return ID.
    pub id: VatReturnId,
    /// First day covered.
    pub period_start: NaiveDate,
    /// Last day covered.
    pub period_end: NaiveDate,
    /// Current status.
    pub status: VatReturnStatus,
}

/// Stateless VAT rules.
pub struct VatService;

impl VatService {
    /// Sums postings into the three return boxes.
    ///
    /// Each line is sign-adjusted by its account's normal balance, so a
    /// credit-normal output VAT account contributes its credits and a
    /// debit-normal input VAT account its debits.
    #[must_use]
    pub fn aggregate(postings: &[VatPosting]) -> VatAmounts {
        let mut amounts = VatAmounts::default();
        for posting in postings {
            let amount = posting
                .normal_balance
                .balance_change(posting.debit, posting.credit);
            match posting.category {
                VatCategory::OutputSales => amounts.vat_due_sales += amount,
                VatCategory::OutputAcquisitions => amounts.vat_due_acquisitions += amount,
                VatCategory::InputReclaimable => amounts.vat_reclaimed += amount,
            }
        }
        amounts
    }

    /// Checks a return's date range against other returns of the organization.
    ///
    /// Rejected returns do not block a new filing for the same range.
    /// `exclude` skips the return being edited.
    pub fn check_range(
        start: NaiveDate,
        end: NaiveDate,
        existing: &[ExistingReturn],
        exclude: Option<VatReturnId>,
    ) -> Result<(), VatError> {
        if start > end {
            return Err(VatError::InvalidDateRange { start, end });
        }
        let clash = existing.iter().find(|r| {
            Some(r.id) != exclude
                && r.status != VatReturnStatus::Rejected
                && r.period_start <= end
                && start <= r.period_end
        });
        match clash {
            Some(r) => Err(VatError::OverlappingReturn(r.id)),
            None => Ok(()),
        }
    }

    /// Only drafts can be edited or regenerated.
    pub fn check_editable(status: VatReturnStatus) -> Result<(), VatError> {
        match status {
            VatReturnStatus::Draft => Ok(()),
            other => Err(VatError::ReturnFrozen(other)),
        }
    }

    /// Validates manually entered box amounts.
    pub fn check_amounts(amounts: &VatAmounts) -> Result<(), VatError> {
        if amounts.vat_due_sales < Decimal::ZERO
            || amounts.vat_due_acquisitions < Decimal::ZERO
            || amounts.vat_reclaimed < Decimal::ZERO
        {
            return Err(VatError::NegativeAmount);
        }
        Ok(())
    }

    /// Checks a status change: draft → submitted → accepted | rejected.
    pub fn transition(from: VatReturnStatus, to: VatReturnStatus) -> Result<VatReturnStatus, VatError> {
        match (from, to) {
            (VatReturnStatus::Draft, VatReturnStatus::Submitted)
            | (VatReturnStatus::Submitted, VatReturnStatus::Accepted | VatReturnStatus::Rejected) => {
                Ok(to)
            }
            (from, to) => Err(VatError::InvalidTransition { from, to }),
        }
    }
}
