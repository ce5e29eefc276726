//! Property-based tests for posting validation and reversals.

use std::collections::HashMap;

use chrono::NaiveDate;
use ledgerline_shared::types::{AccountId, FiscalPeriodId, OrganizationId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::{LedgerError, PostingRejection};
use super::service::{BALANCE_TOLERANCE, LedgerService, PostingInput};
use super::types::{AccountInfo, JournalLineInput};
use crate::accounts::NormalBalance;
use crate::fiscal::{FiscalPeriod, FiscalPeriodStatus};

/// Strategy to generate a valid positive amount (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn side_strategy() -> impl Strategy<Value = NormalBalance> {
    prop_oneof![Just(NormalBalance::Debit), Just(NormalBalance::Credit)]
}

struct World {
    org: OrganizationId,
    period: FiscalPeriod,
    accounts: HashMap<AccountId, AccountInfo>,
    ids: Vec<AccountId>,
}

fn world(sides: &[NormalBalance]) -> World {
    let org = OrganizationId::new();
    let mut accounts = HashMap::new();
    let mut ids = Vec::new();
    for side in sides {
        let id = AccountId::new();
        ids.push(id);
        accounts.insert(
            id,
            AccountInfo {
                id,
                organization_id: org,
                normal_balance: *side,
                is_active: true,
            },
        );
    }
    World {
        org,
        period: FiscalPeriod {
            id: FiscalPeriodId::new(),
            name: "P".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            status: FiscalPeriodStatus::Open,
            closed_at: None,
            closed_by: None,
            locked_at: None,
            locked_by: None,
        },
        accounts,
        ids,
    }
}

/// Balanced lines: each debit amount is mirrored by a credit line.
fn balanced_lines(w: &World, amounts: &[(usize, usize, Decimal)]) -> Vec<JournalLineInput> {
    let mut lines = Vec::new();
    for (debit_pick, credit_pick, amount) in amounts {
        let n = i32::try_from(lines.len()).unwrap() + 1;
        lines.push(JournalLineInput {
            line_number: n,
            ledger_account_id: w.ids[debit_pick % w.ids.len()],
            debit_amount: *amount,
            credit_amount: Decimal::ZERO,
            description: None,
            cost_center_id: None,
        });
        lines.push(JournalLineInput {
            line_number: n + 1,
            ledger_account_id: w.ids[credit_pick % w.ids.len()],
            debit_amount: Decimal::ZERO,
            credit_amount: *amount,
            description: None,
            cost_center_id: None,
        });
    }
    lines
}

fn validate(w: &World, lines: &[JournalLineInput]) -> Result<super::types::PostingPlan, LedgerError> {
    let input = PostingInput {
        organization_id: w.org,
        entry_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        fiscal_period_id: w.period.id,
        lines,
    };
    LedgerService::validate(
        &input,
        Some(&w.period),
        |id| w.accounts.get(&id).copied(),
        BALANCE_TOLERANCE,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Balanced entries always validate, and their oriented deltas net to zero.
    #[test]
    fn prop_balanced_entries_validate(
        sides in prop::collection::vec(side_strategy(), 1..6),
        amounts in prop::collection::vec((0usize..8, 0usize..8, positive_amount()), 1..6),
    ) {
        let w = world(&sides);
        let lines = balanced_lines(&w, &amounts);
        let plan = validate(&w, &lines).unwrap();

        prop_assert_eq!(plan.totals.total_debit, plan.totals.total_credit);
        let net_debit: Decimal = plan
            .deltas
            .iter()
            .map(|d| w.accounts[&d.account_id].normal_balance.orient(d.delta))
            .sum();
        prop_assert_eq!(net_debit, Decimal::ZERO);
    }

    /// Any imbalance beyond 0.01 is rejected as unbalanced.
    #[test]
    fn prop_imbalance_rejected(
        sides in prop::collection::vec(side_strategy(), 2..6),
        amounts in prop::collection::vec((0usize..8, 0usize..8, positive_amount()), 1..6),
        skew in 2i64..100_000,
    ) {
        let w = world(&sides);
        let mut lines = balanced_lines(&w, &amounts);
        lines[0].debit_amount += Decimal::new(skew, 2);

        let result = validate(&w, &lines);
        let is_unbalanced = matches!(
            result,
            Err(LedgerError::PostingRejected(PostingRejection::Unbalanced { .. }))
        );
        prop_assert!(is_unbalanced);
    }

    /// Posting an entry and then its reversal leaves every account unchanged.
    #[test]
    fn prop_reversal_nets_to_zero(
        sides in prop::collection::vec(side_strategy(), 1..6),
        amounts in prop::collection::vec((0usize..8, 0usize..8, positive_amount()), 1..6),
    ) {
        let w = world(&sides);
        let lines = balanced_lines(&w, &amounts);
        let original = validate(&w, &lines).unwrap();
        let reversal = validate(&w, &LedgerService::reversal_lines(&lines)).unwrap();

        let mut net: HashMap<AccountId, Decimal> = HashMap::new();
        for delta in original.deltas.iter().chain(reversal.deltas.iter()) {
            *net.entry(delta.account_id).or_default() += delta.delta;
        }
        for (_, total) in net {
            prop_assert_eq!(total, Decimal::ZERO);
        }
    }

    /// Re-posting a final entry always fails with AlreadyFinal.
    #[test]
    fn prop_final_entries_cannot_be_posted(posted in any::<bool>()) {
        let status = if posted {
            super::types::EntryStatus::Posted
        } else {
            super::types::EntryStatus::Voided
        };
        prop_assert_eq!(
            LedgerService::check_can_post(status),
            Err(LedgerError::AlreadyFinal(status))
        );
    }
}
