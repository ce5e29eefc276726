//! Ledger service for entry validation, posting plans and reversals.
//!
//! Pure functions only: the database layer loads the entry, its period and
//! the referenced accounts, asks this service for a [`PostingPlan`], and
//! applies the plan inside one transaction.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use ledgerline_shared::types::{AccountId, FiscalPeriodId, OrganizationId};
use rust_decimal::Decimal;

use super::error::{LedgerError, PostingRejection};
use super::types::{
    AccountInfo, BalanceDelta, EntryStatus, EntryTotals, JournalLineInput, PostingPlan,
};
use crate::fiscal::FiscalPeriod;

/// Largest accepted `|debits - credits|` (currency rounding).
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// The parts of an entry that posting validation looks at.
#[derive(Debug, Clone, Copy)]
pub struct PostingInput<'a> {
    /// Organization posting the entry.
    pub organization_id: OrganizationId,
    /// Entry date.
    pub entry_date: NaiveDate,
    /// Referenced fiscal period.
    pub fiscal_period_id: FiscalPeriodId,
    /// Entry lines.
    pub lines: &'a [JournalLineInput],
}

/// Ledger service for journal rules.
///
/// This service contains pure business logic with no database dependencies.
pub struct LedgerService;

impl LedgerService {
    /// Checks line shape: at least two lines, each with exactly one
    /// non-negative, nonzero side.
    ///
    /// Drafts are held to this much; balance is only enforced at posting.
    pub fn validate_shape(lines: &[JournalLineInput]) -> Result<(), PostingRejection> {
        if lines.len() < 2 {
            return Err(PostingRejection::InsufficientLines(lines.len()));
        }
        for line in lines {
            if line.debit_amount < Decimal::ZERO || line.credit_amount < Decimal::ZERO {
                return Err(PostingRejection::NegativeAmount(line.line_number));
            }
            if line.debit_amount.is_zero() == line.credit_amount.is_zero() {
                return Err(PostingRejection::InvalidLine(line.line_number));
            }
        }
        Ok(())
    }

    /// Validates a draft's lines before it is stored.
    pub fn validate_draft(lines: &[JournalLineInput]) -> Result<(), LedgerError> {
        Self::validate_shape(lines).map_err(LedgerError::InvalidEntry)
    }

    /// Validates an entry for posting and builds its posting plan.
    ///
    /// Checks, in order:
    /// 1. at least 2 lines
    /// 2. each line has exactly one nonzero side
    /// 3. `|Σdebits − Σcredits| ≤ tolerance`
    /// 4. the fiscal period exists, is open and contains the entry date
    /// 5. every account exists, belongs to the organization and is active
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::PostingRejected` with the first failing reason.
    pub fn validate<A>(
        input: &PostingInput<'_>,
        period: Option<&FiscalPeriod>,
        account_lookup: A,
        tolerance: Decimal,
    ) -> Result<PostingPlan, LedgerError>
    where
        A: Fn(AccountId) -> Option<AccountInfo>,
    {
        Self::plan(input, period, account_lookup, tolerance).map_err(LedgerError::PostingRejected)
    }

    fn plan<A>(
        input: &PostingInput<'_>,
        period: Option<&FiscalPeriod>,
        account_lookup: A,
        tolerance: Decimal,
    ) -> Result<PostingPlan, PostingRejection>
    where
        A: Fn(AccountId) -> Option<AccountInfo>,
    {
        Self::validate_shape(input.lines)?;

        let totals = EntryTotals::of(input.lines);
        if !totals.is_balanced(tolerance) {
            return Err(PostingRejection::Unbalanced {
                debit: totals.total_debit,
                credit: totals.total_credit,
            });
        }

        let period = period
            .filter(|p| p.id == input.fiscal_period_id)
            .ok_or(PostingRejection::PeriodNotFound(input.fiscal_period_id))?;
        if !period.is_open() {
            return Err(PostingRejection::PeriodNotOpen(period.status));
        }
        if !period.contains_date(input.entry_date) {
            return Err(PostingRejection::DateOutsidePeriod(input.entry_date));
        }

        let mut deltas: BTreeMap<AccountId, Decimal> = BTreeMap::new();
        for line in input.lines {
            let account = account_lookup(line.ledger_account_id)
                .ok_or(PostingRejection::AccountNotFound(line.ledger_account_id))?;
            if account.organization_id != input.organization_id {
                return Err(PostingRejection::AccountOrganizationMismatch(account.id));
            }
            if !account.is_active {
                return Err(PostingRejection::AccountInactive(account.id));
            }
            *deltas.entry(account.id).or_default() += account
                .normal_balance
                .balance_change(line.debit_amount, line.credit_amount);
        }

        Ok(PostingPlan {
            totals,
            deltas: deltas
                .into_iter()
                .map(|(account_id, delta)| BalanceDelta { account_id, delta })
                .collect(),
        })
    }

    /// Posting is only legal from `draft`.
    pub fn check_can_post(status: EntryStatus) -> Result<(), LedgerError> {
        if status.is_final() {
            return Err(LedgerError::AlreadyFinal(status));
        }
        Ok(())
    }

    /// Editing and deleting are only legal on drafts.
    pub fn check_can_modify(status: EntryStatus) -> Result<(), LedgerError> {
        match status {
            EntryStatus::Draft => Ok(()),
            other => Err(LedgerError::NotDraft(other)),
        }
    }

    /// Cancelling (`draft → voided`) skips balance effects.
    pub fn check_can_cancel(status: EntryStatus) -> Result<(), LedgerError> {
        match status {
            EntryStatus::Draft => Ok(()),
            other => Err(LedgerError::AlreadyFinal(other)),
        }
    }

    /// Voiding is only legal on posted entries.
    pub fn check_can_void(status: EntryStatus) -> Result<(), LedgerError> {
        match status {
            EntryStatus::Posted => Ok(()),
            EntryStatus::Voided => Err(LedgerError::AlreadyFinal(status)),
            EntryStatus::Draft => Err(LedgerError::NotPosted(status)),
        }
    }

    /// Lines of the reversing entry: each original line with debit and credit swapped.
    #[must_use]
    pub fn reversal_lines(lines: &[JournalLineInput]) -> Vec<JournalLineInput> {
        lines
            .iter()
            .map(|line| JournalLineInput {
                line_number: line.line_number,
                ledger_account_id: line.ledger_account_id,
                debit_amount: line.credit_amount,
                credit_amount: line.debit_amount,
                description: Some(format!(
                    "Reversal: {}",
                    line.description.clone().unwrap_or_default()
                )),
                cost_center_id: line.cost_center_id,
            })
            .collect()
    }

    /// Journal number of the reversing entry: `{original}-REV`, or the first
    /// free `{original}-REV-{n}` (n >= 2) when that is taken.
    #[must_use]
    pub fn reversal_journal_number(original: &str, is_taken: impl Fn(&str) -> bool) -> String {
        let base = format!("{original}-REV");
        let mut candidate = base.clone();
        let mut attempt = 1u32;
        while is_taken(&candidate) {
            attempt += 1;
            candidate = format!("{base}-{attempt}");
        }
        candidate
    }

    /// Description of the reversing entry.
    #[must_use]
    pub fn reversal_description(original: &str, reason: &str) -> String {
        format!("Reversal of {original}. Reason: {reason}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::NormalBalance;
    use crate::fiscal::FiscalPeriodStatus;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    struct Fixture {
        org: OrganizationId,
        period: FiscalPeriod,
        cash: AccountId,
        sales: AccountId,
        accounts: HashMap<AccountId, AccountInfo>,
    }

    impl Fixture {
        fn new() -> Self {
            let org = OrganizationId::new();
            let cash = AccountId::new();
            let sales = AccountId::new();
            let mut accounts = HashMap::new();
            accounts.insert(
                cash,
                AccountInfo {
                    id: cash,
                    organization_id: org,
                    normal_balance: NormalBalance::Debit,
                    is_active: true,
                },
            );
            accounts.insert(
                sales,
                AccountInfo {
                    id: sales,
                    organization_id: org,
                    normal_balance: NormalBalance::Credit,
                    is_active: true,
                },
            );
            Self {
                org,
                period: FiscalPeriod {
                    id: FiscalPeriodId::new(),
                    name: "P1".to_string(),
                    start_date: date(2024, 3, 1),
                    end_date: date(2024, 3, 31),
                    status: FiscalPeriodStatus::Open,
                    closed_at: None,
                    closed_by: None,
                    locked_at: None,
                    locked_by: None,
                },
                cash,
                sales,
                accounts,
            }
        }

        fn validate(&self, lines: &[JournalLineInput]) -> Result<PostingPlan, LedgerError> {
            let input = PostingInput {
                organization_id: self.org,
                entry_date: date(2024, 3, 15),
                fiscal_period_id: self.period.id,
                lines,
            };
            LedgerService::validate(
                &input,
                Some(&self.period),
                |id| self.accounts.get(&id).copied(),
                BALANCE_TOLERANCE,
            )
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn line(n: i32, account: AccountId, debit: Decimal, credit: Decimal) -> JournalLineInput {
        JournalLineInput {
            line_number: n,
            ledger_account_id: account,
            debit_amount: debit,
            credit_amount: credit,
            description: None,
            cost_center_id: None,
        }
    }

    fn rejection(result: Result<PostingPlan, LedgerError>) -> PostingRejection {
        match result {
            Err(LedgerError::PostingRejected(reason)) => reason,
            other => panic!("expected PostingRejected, got {other:?}"),
        }
    }

    #[test]
    fn test_balanced_entry_plans_deltas() {
        let f = Fixture::new();
        let plan = f
            .validate(&[
                line(1, f.cash, dec!(100), dec!(0)),
                line(2, f.sales, dec!(0), dec!(100)),
            ])
            .unwrap();
        assert_eq!(plan.totals.total_debit, dec!(100));
        assert_eq!(plan.deltas.len(), 2);
        let cash = plan.deltas.iter().find(|d| d.account_id == f.cash).unwrap();
        let sales = plan.deltas.iter().find(|d| d.account_id == f.sales).unwrap();
        assert_eq!(cash.delta, dec!(100));
        assert_eq!(sales.delta, dec!(100));
    }

    #[test]
    fn test_unbalanced_entry_rejected() {
        let f = Fixture::new();
        let reason = rejection(f.validate(&[
            line(1, f.cash, dec!(100), dec!(0)),
            line(2, f.sales, dec!(0), dec!(90)),
        ]));
        assert_eq!(
            reason,
            PostingRejection::Unbalanced {
                debit: dec!(100),
                credit: dec!(90),
            }
        );
    }

    #[test]
    fn test_rounding_difference_within_tolerance() {
        let f = Fixture::new();
        assert!(f
            .validate(&[
                line(1, f.cash, dec!(100.01), dec!(0)),
                line(2, f.sales, dec!(0), dec!(100)),
            ])
            .is_ok());
        assert!(f
            .validate(&[
                line(1, f.cash, dec!(100.02), dec!(0)),
                line(2, f.sales, dec!(0), dec!(100)),
            ])
            .is_err());
    }

    #[test]
    fn test_single_line_rejected() {
        let f = Fixture::new();
        assert_eq!(
            rejection(f.validate(&[line(1, f.cash, dec!(100), dec!(0))])),
            PostingRejection::InsufficientLines(1)
        );
    }

    #[test]
    fn test_two_sided_and_empty_lines_rejected() {
        let f = Fixture::new();
        assert_eq!(
            rejection(f.validate(&[
                line(1, f.cash, dec!(100), dec!(100)),
                line(2, f.sales, dec!(0), dec!(0)),
            ])),
            PostingRejection::InvalidLine(1)
        );
        assert_eq!(
            rejection(f.validate(&[
                line(1, f.cash, dec!(100), dec!(0)),
                line(2, f.sales, dec!(0), dec!(0)),
            ])),
            PostingRejection::InvalidLine(2)
        );
    }

    #[test]
    fn test_negative_amount_rejected() {
        let f = Fixture::new();
        assert_eq!(
            rejection(f.validate(&[
                line(1, f.cash, dec!(-100), dec!(0)),
                line(2, f.sales, dec!(-100), dec!(0)),
            ])),
            PostingRejection::NegativeAmount(1)
        );
    }

    #[test]
    fn test_closed_period_rejected() {
        let mut f = Fixture::new();
        f.period.status = FiscalPeriodStatus::Closed;
        assert_eq!(
            rejection(f.validate(&[
                line(1, f.cash, dec!(100), dec!(0)),
                line(2, f.sales, dec!(0), dec!(100)),
            ])),
            PostingRejection::PeriodNotOpen(FiscalPeriodStatus::Closed)
        );
    }

    #[test]
    fn test_date_outside_period_rejected() {
        let mut f = Fixture::new();
        f.period.end_date = date(2024, 3, 10);
        assert_eq!(
            rejection(f.validate(&[
                line(1, f.cash, dec!(100), dec!(0)),
                line(2, f.sales, dec!(0), dec!(100)),
            ])),
            PostingRejection::DateOutsidePeriod(date(2024, 3, 15))
        );
    }

    #[test]
    fn test_missing_period_rejected() {
        let f = Fixture::new();
        let lines = [
            line(1, f.cash, dec!(100), dec!(0)),
            line(2, f.sales, dec!(0), dec!(100)),
        ];
        let input = PostingInput {
            organization_id: f.org,
            entry_date: date(2024, 3, 15),
            fiscal_period_id: f.period.id,
            lines: &lines,
        };
        let result = LedgerService::validate(&input, None, |id| f.accounts.get(&id).copied(), BALANCE_TOLERANCE);
        assert_eq!(rejection(result), PostingRejection::PeriodNotFound(f.period.id));
    }

    #[test]
    fn test_account_checks() {
        let mut f = Fixture::new();
        let ghost = AccountId::new();
        assert_eq!(
            rejection(f.validate(&[
                line(1, ghost, dec!(100), dec!(0)),
                line(2, f.sales, dec!(0), dec!(100)),
            ])),
            PostingRejection::AccountNotFound(ghost)
        );

        if let Some(info) = f.accounts.get_mut(&f.sales) {
            info.is_active = false;
        }
        assert_eq!(
            rejection(f.validate(&[
                line(1, f.cash, dec!(100), dec!(0)),
                line(2, f.sales, dec!(0), dec!(100)),
            ])),
            PostingRejection::AccountInactive(f.sales)
        );

        if let Some(info) = f.accounts.get_mut(&f.sales) {
            info.is_active = true;
            info.organization_id = OrganizationId::new();
        }
        assert_eq!(
            rejection(f.validate(&[
                line(1, f.cash, dec!(100), dec!(0)),
                line(2, f.sales, dec!(0), dec!(100)),
            ])),
            PostingRejection::AccountOrganizationMismatch(f.sales)
        );
    }

    #[test]
    fn test_state_checks() {
        assert!(LedgerService::check_can_post(EntryStatus::Draft).is_ok());
        assert_eq!(
            LedgerService::check_can_post(EntryStatus::Posted),
            Err(LedgerError::AlreadyFinal(EntryStatus::Posted))
        );
        assert_eq!(
            LedgerService::check_can_post(EntryStatus::Voided),
            Err(LedgerError::AlreadyFinal(EntryStatus::Voided))
        );
        assert!(LedgerService::check_can_void(EntryStatus::Posted).is_ok());
        assert_eq!(
            LedgerService::check_can_void(EntryStatus::Draft),
            Err(LedgerError::NotPosted(EntryStatus::Draft))
        );
        assert!(LedgerService::check_can_cancel(EntryStatus::Draft).is_ok());
        assert_eq!(
            LedgerService::check_can_modify(EntryStatus::Posted),
            Err(LedgerError::NotDraft(EntryStatus::Posted))
        );
    }

    #[test]
    fn test_reversal_swaps_sides() {
        let f = Fixture::new();
        let original = vec![
            line(1, f.cash, dec!(100), dec!(0)),
            line(2, f.sales, dec!(0), dec!(100)),
        ];
        let reversed = LedgerService::reversal_lines(&original);
        assert_eq!(reversed[0].credit_amount, dec!(100));
        assert_eq!(reversed[0].debit_amount, dec!(0));
        assert_eq!(reversed[1].debit_amount, dec!(100));
        assert_eq!(reversed[0].description.as_deref(), Some("Reversal: "));
    }

    #[test]
    fn test_reversal_number_skips_taken_numbers() {
        assert_eq!(LedgerService::reversal_journal_number("JE-001", |_| false), "JE-001-REV");

        let taken = ["JE-001-REV", "JE-001-REV-2"];
        assert_eq!(
            LedgerService::reversal_journal_number("JE-001", |n| taken.contains(&n)),
            "JE-001-REV-3"
        );
    }

    #[test]
    fn test_draft_shape_errors_are_invalid_entry() {
        let f = Fixture::new();
        assert_eq!(
            LedgerService::validate_draft(&[line(1, f.cash, dec!(1), dec!(0))]),
            Err(LedgerError::InvalidEntry(PostingRejection::InsufficientLines(1)))
        );
        // Drafts may be unbalanced.
        assert!(LedgerService::validate_draft(&[
            line(1, f.cash, dec!(100), dec!(0)),
            line(2, f.sales, dec!(0), dec!(90)),
        ])
        .is_ok());
    }
}
