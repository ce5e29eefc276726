//! Budget data types.

use ledgerline_shared::types::{AccountId, CostCenterId, FiscalPeriodId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Whether a variance helps or hurts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceStatus {
    /// Better than budget (more revenue or less spend).
    Favorable,
    /// Worse than budget.
    Unfavorable,
    /// Exactly on budget.
    OnBudget,
}

/// Budget vs actual for one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VarianceResult {
    /// Budgeted amount.
    pub budgeted: Decimal,
    /// Actual amount from posted lines.
    pub actual: Decimal,
    /// `actual - budgeted`.
    pub variance: Decimal,
    /// `variance / budgeted * 100` rounded to 2 dp; `None` when nothing was budgeted.
    pub variance_percent: Option<Decimal>,
    /// Favorable or not, given the account's normal balance.
    pub status: VarianceStatus,
}

/// A posted journal line as seen by the budget tracker.
#[derive(Debug, Clone, Copy)]
pub struct BudgetPosting {
    /// Account the line hits.
    pub account_id: AccountId,
    /// Cost center on the line, if any.
    pub cost_center_id: Option<CostCenterId>,
    /// Period of the owning entry.
    pub fiscal_period_id: FiscalPeriodId,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
}

/// Totals across a set of budget lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    /// Number of lines summarized.
    pub line_count: usize,
    /// Sum of budgeted amounts.
    pub total_budgeted: Decimal,
    /// Sum of actual amounts.
    pub total_actual: Decimal,
    /// Sum of variances.
    pub total_variance: Decimal,
    /// Overall variance percent; `None` when nothing was budgeted.
    pub variance_percent: Option<Decimal>,
}
