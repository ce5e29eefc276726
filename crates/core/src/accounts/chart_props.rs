//! Property-based tests for chart hierarchy rules.

use proptest::prelude::*;
use rust_decimal::Decimal;

use chrono::NaiveDate;
use ledgerline_shared::types::AccountId;

use super::*;

/// Builds a random forest: account `i` gets parent `parents[i] % i` when the
/// flag is set, so parents always precede children.
fn build_chart(shape: &[(bool, usize)]) -> (ChartOfAccounts, Vec<AccountId>) {
    let mut chart = ChartOfAccounts::default();
    let mut ids = Vec::with_capacity(shape.len());
    for (i, (has_parent, pick)) in shape.iter().enumerate() {
        let parent_id = if *has_parent && i > 0 {
            Some(ids[pick % i])
        } else {
            None
        };
        let account = chart
            .validate_new(NewAccount {
                id: None,
                code: format!("{:04}", i + 1000),
                name: format!("Account {i}"),
                account_type: AccountType::Asset,
                normal_balance: None,
                parent_id,
                is_system: false,
                is_active: true,
                vat_category: None,
            })
            .unwrap();
        ids.push(account.id);
        chart.insert(account).unwrap();
    }
    (chart, ids)
}

fn shape_strategy() -> impl Strategy<Value = Vec<(bool, usize)>> {
    prop::collection::vec((any::<bool>(), 0usize..64), 1..24)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Moving any account under itself or one of its descendants is rejected.
    #[test]
    fn prop_reparent_into_subtree_rejected(shape in shape_strategy(), pick in 0usize..64) {
        let (chart, ids) = build_chart(&shape);
        let target = ids[pick % ids.len()];
        let mut subtree: Vec<AccountId> = chart
            .descendants(target)
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        subtree.push(target);

        for new_parent in subtree {
            let patch = AccountPatch {
                parent_id: Some(Some(new_parent)),
                ..AccountPatch::default()
            };
            let is_cycle = matches!(
                chart.validate_update(target, patch),
                Err(AccountError::CycleDetected { .. })
            );
            prop_assert!(is_cycle);
        }
    }

    /// A rollup over the roots equals the sum of all postings.
    #[test]
    fn prop_rollup_of_roots_covers_every_posting(
        shape in shape_strategy(),
        amounts in prop::collection::vec((0usize..64, 1i64..100_000), 0..40),
    ) {
        let (chart, ids) = build_chart(&shape);
        let on = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let postings: Vec<Posting> = amounts
            .iter()
            .map(|(pick, cents)| Posting {
                account_id: ids[pick % ids.len()],
                entry_date: on,
                debit: Decimal::new(*cents, 2),
                credit: Decimal::ZERO,
            })
            .collect();

        let roots: Vec<AccountId> = chart
            .accounts()
            .filter(|a| a.parent_id.is_none())
            .map(|a| a.id)
            .collect();
        let rolled: Decimal = roots
            .iter()
            .map(|id| chart.compute_balance(*id, &postings, on, true).unwrap().balance)
            .sum();
        let expected: Decimal = postings.iter().map(|p| p.debit).sum();
        prop_assert_eq!(rolled, expected);
    }
}
