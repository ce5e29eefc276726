//! Budget service for actuals, variance and edit rules.

use ledgerline_shared::types::{AccountId, CostCenterId, FiscalPeriodId};
use rust_decimal::Decimal;

use super::error::BudgetError;
use super::types::{BudgetPosting, BudgetSummary, VarianceResult, VarianceStatus};
use crate::accounts::NormalBalance;
use crate::fiscal::FiscalPeriodStatus;

/// Budget service for business logic.
pub struct BudgetService;

impl BudgetService {
    /// Actual amount for a budget line.
    ///
    /// Sums posted lines on the account in the period, restricted to the
    /// cost center when the budget line names one, sign-adjusted by the
    /// account's normal balance.
    #[must_use]
    pub fn actual_amount(
        account_id: AccountId,
        cost_center_id: Option<CostCenterId>,
        fiscal_period_id: FiscalPeriodId,
        normal_balance: NormalBalance,
        postings: &[BudgetPosting],
    ) -> Decimal {
        postings
            .iter()
            .filter(|p| p.account_id == account_id && p.fiscal_period_id == fiscal_period_id)
            .filter(|p| cost_center_id.is_none() || p.cost_center_id == cost_center_id)
            .map(|p| normal_balance.balance_change(p.debit, p.credit))
            .sum()
    }

    /// Calculate variance between budgeted and actual amounts.
    ///
    /// `variance = actual - budgeted`. A positive variance is favorable for
    /// credit-normal (income) accounts and unfavorable for debit-normal
    /// (spend) accounts.
    #[must_use]
    pub fn calculate_variance(
        budgeted: Decimal,
        actual: Decimal,
        normal_balance: NormalBalance,
    ) -> VarianceResult {
        let variance = actual - budgeted;

        let status = match (variance.cmp(&Decimal::ZERO), normal_balance) {
            (std::cmp::Ordering::Equal, _) => VarianceStatus::OnBudget,
            (std::cmp::Ordering::Greater, NormalBalance::Credit)
            | (std::cmp::Ordering::Less, NormalBalance::Debit) => VarianceStatus::Favorable,
            _ => VarianceStatus::Unfavorable,
        };

        VarianceResult {
            budgeted,
            actual,
            variance,
            variance_percent: Self::percent_of(variance, budgeted),
            status,
        }
    }

    fn percent_of(part: Decimal, whole: Decimal) -> Option<Decimal> {
        if whole.is_zero() {
            None
        } else {
            Some((part / whole * Decimal::ONE_HUNDRED).round_dp(2))
        }
    }

    /// Totals across lines.
    #[must_use]
    pub fn summarize<'a>(results: impl IntoIterator<Item = &'a VarianceResult>) -> BudgetSummary {
        let mut summary = BudgetSummary::default();
        for result in results {
            summary.line_count += 1;
            summary.total_budgeted += result.budgeted;
            summary.total_actual += result.actual;
            summary.total_variance += result.variance;
        }
        summary.variance_percent = Self::percent_of(summary.total_variance, summary.total_budgeted);
        summary
    }

    /// Validates a budgeted amount.
    pub fn validate_amount(amount: Decimal) -> Result<(), BudgetError> {
        if amount < Decimal::ZERO {
            return Err(BudgetError::NegativeAmount);
        }
        Ok(())
    }

    /// Budget lines can only change while their period is open.
    pub fn check_editable(period_status: FiscalPeriodStatus) -> Result<(), BudgetError> {
        match period_status {
            FiscalPeriodStatus::Open => Ok(()),
            other => Err(BudgetError::PeriodNotOpen(other)),
        }
    }
}
