//! Account balances, rollups and the trial balance.

use std::collections::HashMap;

use chrono::NaiveDate;
use ledgerline_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::Serialize;

use super::chart::ChartOfAccounts;
use super::error::AccountError;
use super::types::{AccountType, NormalBalance};

/// One posted journal line as seen by balance calculations.
///
/// Callers pass lines of `posted` entries only; the entry status is not
/// re-checked here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    /// Account the line hits.
    pub account_id: AccountId,
    /// Date of the owning entry.
    pub entry_date: NaiveDate,
    /// Debit amount (zero on credit lines).
    pub debit: Decimal,
    /// Credit amount (zero on debit lines).
    pub credit: Decimal,
}

/// Balance of an account as of a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    /// The account.
    pub account_id: AccountId,
    /// Cut-off date (inclusive).
    pub as_of: NaiveDate,
    /// Whether descendant postings were rolled in.
    pub include_children: bool,
    /// Sum of debits.
    pub debit_total: Decimal,
    /// Sum of credits.
    pub credit_total: Decimal,
    /// Net balance, positive in the account's normal direction.
    pub balance: Decimal,
}

#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    debit: Decimal,
    credit: Decimal,
}

impl Totals {
    fn add(&mut self, other: Self) {
        self.debit += other.debit;
        self.credit += other.credit;
    }
}

fn direct_totals(postings: &[Posting], as_of: NaiveDate) -> HashMap<AccountId, Totals> {
    let mut totals: HashMap<AccountId, Totals> = HashMap::new();
    for posting in postings.iter().filter(|p| p.entry_date <= as_of) {
        let entry = totals.entry(posting.account_id).or_default();
        entry.debit += posting.debit;
        entry.credit += posting.credit;
    }
    totals
}

impl ChartOfAccounts {
    /// Computes an account's balance from posted lines dated on or before `as_of`.
    ///
    /// Debits add and credits subtract; the net is negated for credit-normal
    /// accounts. With `include_children`, descendant postings are rolled up
    /// recursively and oriented by the requested account's normal balance.
    /// Subtree totals are memoized for the duration of the call.
    pub fn compute_balance(
        &self,
        account_id: AccountId,
        postings: &[Posting],
        as_of: NaiveDate,
        include_children: bool,
    ) -> Result<AccountBalance, AccountError> {
        let account = self.get(account_id).ok_or(AccountError::NotFound(account_id))?;
        let direct = direct_totals(postings, as_of);

        let totals = if include_children {
            let mut memo = HashMap::new();
            self.subtree_totals(account_id, &direct, &mut memo)?
        } else {
            direct.get(&account_id).copied().unwrap_or_default()
        };

        Ok(AccountBalance {
            account_id,
            as_of,
            include_children,
            debit_total: totals.debit,
            credit_total: totals.credit,
            balance: account
                .normal_balance
                .balance_change(totals.debit, totals.credit),
        })
    }

    fn subtree_totals(
        &self,
        account_id: AccountId,
        direct: &HashMap<AccountId, Totals>,
        memo: &mut HashMap<AccountId, Totals>,
    ) -> Result<Totals, AccountError> {
        if let Some(cached) = memo.get(&account_id) {
            return Ok(*cached);
        }
        let mut totals = direct.get(&account_id).copied().unwrap_or_default();
        for child in self.children(account_id)? {
            totals.add(self.subtree_totals(child.id, direct, memo)?);
        }
        memo.insert(account_id, totals);
        Ok(totals)
    }

    /// Builds a trial balance of every account with activity up to `as_of`.
    ///
    /// The totals count as balanced when they differ by at most `tolerance`,
    /// the same slack posting allows.
    #[must_use]
    pub fn trial_balance(
        &self,
        postings: &[Posting],
        as_of: NaiveDate,
        tolerance: Decimal,
    ) -> TrialBalance {
        let direct = direct_totals(postings, as_of);

        let mut lines: Vec<TrialBalanceLine> = self
            .accounts()
            .filter_map(|account| {
                let totals = direct.get(&account.id)?;
                Some(TrialBalanceLine {
                    account_id: account.id,
                    code: account.code.clone(),
                    name: account.name.clone(),
                    account_type: account.account_type,
                    normal_balance: account.normal_balance,
                    debit_total: totals.debit,
                    credit_total: totals.credit,
                    balance: account
                        .normal_balance
                        .balance_change(totals.debit, totals.credit),
                })
            })
            .collect();
        lines.sort_by(|a, b| a.code.cmp(&b.code));

        let total_debits: Decimal = lines.iter().map(|l| l.debit_total).sum();
        let total_credits: Decimal = lines.iter().map(|l| l.credit_total).sum();

        TrialBalance {
            as_of,
            lines,
            total_debits,
            total_credits,
            is_balanced: (total_debits - total_credits).abs() <= tolerance,
        }
    }
}

/// Per-account row of a trial balance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalanceLine {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
    /// Normal side.
    pub normal_balance: NormalBalance,
    /// Sum of debits.
    pub debit_total: Decimal,
    /// Sum of credits.
    pub credit_total: Decimal,
    /// Net balance in the normal direction.
    pub balance: Decimal,
}

/// Trial balance as of a date.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalance {
    /// Cut-off date (inclusive).
    pub as_of: NaiveDate,
    /// Rows ordered by account code.
    pub lines: Vec<TrialBalanceLine>,
    /// Sum of all debits.
    pub total_debits: Decimal,
    /// Sum of all credits.
    pub total_credits: Decimal,
    /// True when debits equal credits.
    pub is_balanced: bool,
}
