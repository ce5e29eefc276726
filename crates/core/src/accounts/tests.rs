use chrono::NaiveDate;
use ledgerline_shared::types::AccountId;
use rstest::rstest;
use rust_decimal_macros::dec;

use super::*;
use crate::vat::VatCategory;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_account(code: &str, account_type: AccountType, parent_id: Option<AccountId>) -> NewAccount {
    NewAccount {
        id: None,
        code: code.to_string(),
        name: format!("Account {code}"),
        account_type,
        normal_balance: None,
        parent_id,
        is_system: false,
        is_active: true,
        vat_category: None,
    }
}

fn add(chart: &mut ChartOfAccounts, input: NewAccount) -> AccountId {
    let account = chart.validate_new(input).unwrap();
    let id = account.id;
    chart.insert(account).unwrap();
    id
}

/// Assets(1000) -> Cash(1100), Bank(1200) -> Bank Sub(1210); Revenue(4000)
fn sample_chart() -> (ChartOfAccounts, [AccountId; 5]) {
    let mut chart = ChartOfAccounts::default();
    let assets = add(&mut chart, new_account("1000", AccountType::Asset, None));
    let cash = add(&mut chart, new_account("1100", AccountType::Asset, Some(assets)));
    let bank = add(&mut chart, new_account("1200", AccountType::Asset, Some(assets)));
    let bank_sub = add(&mut chart, new_account("1210", AccountType::Asset, Some(bank)));
    let revenue = add(&mut chart, new_account("4000", AccountType::Revenue, None));
    (chart, [assets, cash, bank, bank_sub, revenue])
}

fn posting(account_id: AccountId, on: NaiveDate, debit: rust_decimal::Decimal, credit: rust_decimal::Decimal) -> Posting {
    Posting {
        account_id,
        entry_date: on,
        debit,
        credit,
    }
}

#[rstest]
#[case(AccountType::Asset, NormalBalance::Debit)]
#[case(AccountType::Expense, NormalBalance::Debit)]
#[case(AccountType::Cogs, NormalBalance::Debit)]
#[case(AccountType::Liability, NormalBalance::Credit)]
#[case(AccountType::Equity, NormalBalance::Credit)]
#[case(AccountType::Revenue, NormalBalance::Credit)]
fn test_default_normal_balance(#[case] account_type: AccountType, #[case] expected: NormalBalance) {
    assert_eq!(account_type.default_normal_balance(), expected);
}

#[test]
fn test_create_defaults_normal_balance() {
    let chart = ChartOfAccounts::default();
    let account = chart
        .validate_new(new_account("4000", AccountType::Revenue, None))
        .unwrap();
    assert_eq!(account.normal_balance, NormalBalance::Credit);
    assert!(account.is_active);
}

#[test]
fn test_duplicate_code_rejected() {
    let (chart, _) = sample_chart();
    let result = chart.validate_new(new_account("1100", AccountType::Asset, None));
    assert_eq!(result, Err(AccountError::DuplicateCode("1100".to_string())));
}

#[test]
fn test_missing_parent_rejected() {
    let (chart, _) = sample_chart();
    let ghost = AccountId::new();
    let result = chart.validate_new(new_account("1300", AccountType::Asset, Some(ghost)));
    assert_eq!(result, Err(AccountError::ParentNotFound(ghost)));
}

#[test]
fn test_missing_parent_rejected_on_empty_chart() {
    let chart = ChartOfAccounts::default();
    let ghost = AccountId::new();
    let result = chart.validate_new(new_account("1000", AccountType::Asset, Some(ghost)));
    assert_eq!(result, Err(AccountError::ParentNotFound(ghost)));
}

#[test]
fn test_self_parent_is_a_cycle() {
    let chart = ChartOfAccounts::default();
    let id = AccountId::new();
    let mut input = new_account("1000", AccountType::Asset, Some(id));
    input.id = Some(id);
    assert!(matches!(
        chart.validate_new(input),
        Err(AccountError::CycleDetected { .. })
    ));
}

#[test]
fn test_create_under_own_descendant_is_a_cycle() {
    let (chart, [assets, _, _, bank_sub, _]) = sample_chart();
    let mut input = new_account("9999", AccountType::Asset, Some(bank_sub));
    input.id = Some(assets);
    assert_eq!(
        chart.validate_new(input),
        Err(AccountError::CycleDetected {
            account_id: assets,
            parent_id: bank_sub,
        })
    );
}

#[test]
fn test_reparent_under_descendant_rejected() {
    let (chart, [assets, _, _, bank_sub, _]) = sample_chart();
    let patch = AccountPatch {
        parent_id: Some(Some(bank_sub)),
        ..AccountPatch::default()
    };
    assert!(matches!(
        chart.validate_update(assets, patch),
        Err(AccountError::CycleDetected { .. })
    ));
}

#[test]
fn test_reparent_to_root_allowed() {
    let (chart, [_, _, bank, _, _]) = sample_chart();
    let patch = AccountPatch {
        parent_id: Some(None),
        name: Some("Bank Accounts".to_string()),
        ..AccountPatch::default()
    };
    let updated = chart.validate_update(bank, patch).unwrap();
    assert_eq!(updated.parent_id, None);
    assert_eq!(updated.name, "Bank Accounts");
}

#[test]
fn test_normal_balance_immutable_for_regular_accounts() {
    let (chart, [_, cash, ..]) = sample_chart();
    let patch = AccountPatch {
        normal_balance: Some(NormalBalance::Credit),
        ..AccountPatch::default()
    };
    assert_eq!(
        chart.validate_update(cash, patch),
        Err(AccountError::NormalBalanceImmutable(cash))
    );
}

#[test]
fn test_normal_balance_changeable_for_system_accounts() {
    let mut chart = ChartOfAccounts::default();
    let mut input = new_account("3900", AccountType::Equity, None);
    input.is_system = true;
    let id = add(&mut chart, input);
    let patch = AccountPatch {
        normal_balance: Some(NormalBalance::Debit),
        vat_category: Some(Some(VatCategory::OutputSales)),
        ..AccountPatch::default()
    };
    let updated = chart.validate_update(id, patch).unwrap();
    assert_eq!(updated.normal_balance, NormalBalance::Debit);
    assert_eq!(updated.vat_category, Some(VatCategory::OutputSales));
}

#[test]
fn test_delete_rules() {
    let (mut chart, [assets, cash, ..]) = sample_chart();
    assert_eq!(
        chart.validate_delete(assets, false),
        Err(AccountError::AccountHasChildren(assets))
    );
    assert_eq!(
        chart.validate_delete(cash, true),
        Err(AccountError::AccountInUse(cash))
    );
    assert_eq!(chart.validate_delete(cash, false), Ok(()));

    let mut input = new_account("3000", AccountType::Equity, None);
    input.is_system = true;
    let system = add(&mut chart, input);
    assert_eq!(
        chart.validate_delete(system, false),
        Err(AccountError::SystemAccount(system))
    );
}

#[test]
fn test_descendants_preorder() {
    let (chart, [assets, cash, bank, bank_sub, _]) = sample_chart();
    let ids: Vec<AccountId> = chart
        .descendants(assets)
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(ids, vec![cash, bank, bank_sub]);
    assert!(chart.descendants(bank_sub).unwrap().is_empty());
}

#[test]
fn test_from_accounts_accepts_any_order_and_rejects_cycles() {
    let (chart, [assets, ..]) = sample_chart();
    let mut accounts: Vec<Account> = chart.accounts().cloned().collect();
    accounts.reverse();
    let rebuilt = ChartOfAccounts::from_accounts(accounts.clone()).unwrap();
    assert_eq!(rebuilt.descendants(assets).unwrap().len(), 3);

    // Point the root at a leaf to close a loop.
    let leaf = accounts.iter().find(|a| a.code == "1210").unwrap().id;
    for account in &mut accounts {
        if account.id == assets {
            account.parent_id = Some(leaf);
        }
    }
    assert!(matches!(
        ChartOfAccounts::from_accounts(accounts),
        Err(AccountError::CycleDetected { .. })
    ));
}

#[test]
fn test_compute_balance_debit_normal() {
    let (chart, [_, cash, ..]) = sample_chart();
    let postings = vec![
        posting(cash, date(2024, 1, 5), dec!(100), dec!(0)),
        posting(cash, date(2024, 1, 6), dec!(0), dec!(30)),
        posting(cash, date(2024, 2, 1), dec!(500), dec!(0)),
    ];
    let balance = chart
        .compute_balance(cash, &postings, date(2024, 1, 31), false)
        .unwrap();
    assert_eq!(balance.debit_total, dec!(100));
    assert_eq!(balance.credit_total, dec!(30));
    assert_eq!(balance.balance, dec!(70));
}

#[test]
fn test_compute_balance_credit_normal_is_negated() {
    let (chart, [_, cash, _, _, revenue]) = sample_chart();
    let postings = vec![
        posting(cash, date(2024, 1, 5), dec!(100), dec!(0)),
        posting(revenue, date(2024, 1, 5), dec!(0), dec!(100)),
    ];
    let balance = chart
        .compute_balance(revenue, &postings, date(2024, 1, 31), false)
        .unwrap();
    assert_eq!(balance.balance, dec!(100));
}

#[test]
fn test_compute_balance_rolls_up_descendants() {
    let (chart, [assets, cash, bank, bank_sub, _]) = sample_chart();
    let on = date(2024, 3, 1);
    let postings = vec![
        posting(cash, on, dec!(100), dec!(0)),
        posting(bank, on, dec!(50), dec!(0)),
        posting(bank_sub, on, dec!(25), dec!(0)),
        posting(bank_sub, on, dec!(0), dec!(5)),
    ];
    let rolled = chart.compute_balance(assets, &postings, on, true).unwrap();
    assert_eq!(rolled.balance, dec!(170));

    let only_self = chart.compute_balance(assets, &postings, on, false).unwrap();
    assert_eq!(only_self.balance, dec!(0));

    let bank_rolled = chart.compute_balance(bank, &postings, on, true).unwrap();
    assert_eq!(bank_rolled.balance, dec!(70));
}

#[test]
fn test_compute_balance_unknown_account() {
    let (chart, _) = sample_chart();
    let ghost = AccountId::new();
    assert_eq!(
        chart.compute_balance(ghost, &[], date(2024, 1, 1), false),
        Err(AccountError::NotFound(ghost))
    );
}

#[test]
fn test_trial_balance() {
    let (chart, [_, cash, _, _, revenue]) = sample_chart();
    let on = date(2024, 1, 10);
    let postings = vec![
        posting(cash, on, dec!(250), dec!(0)),
        posting(revenue, on, dec!(0), dec!(250)),
    ];
    let trial = chart.trial_balance(&postings, on, dec!(0.01));
    assert_eq!(trial.lines.len(), 2);
    assert_eq!(trial.lines[0].code, "1100");
    assert_eq!(trial.total_debits, dec!(250));
    assert_eq!(trial.total_credits, dec!(250));
    assert!(trial.is_balanced);
}

#[rstest]
#[case::within_tolerance(dec!(100.01), true)]
#[case::beyond_tolerance(dec!(100.02), false)]
fn test_trial_balance_uses_posting_tolerance(#[case] credit: rust_decimal::Decimal, #[case] balanced: bool) {
    let (chart, [_, cash, _, _, revenue]) = sample_chart();
    let on = date(2024, 1, 10);
    let postings = vec![
        posting(cash, on, dec!(100), dec!(0)),
        posting(revenue, on, dec!(0), credit),
    ];
    assert_eq!(chart.trial_balance(&postings, on, dec!(0.01)).is_balanced, balanced);
}

#[test]
fn test_account_error_codes() {
    let id = AccountId::new();
    assert_eq!(AccountError::DuplicateCode("1".into()).http_status_code(), 409);
    assert_eq!(AccountError::NotFound(id).http_status_code(), 404);
    assert_eq!(AccountError::SystemAccount(id).error_code(), "SYSTEM_ACCOUNT");
    assert_eq!(
        AccountError::CycleDetected {
            account_id: id,
            parent_id: id
        }
        .error_code(),
        "CYCLE_DETECTED"
    );
}
