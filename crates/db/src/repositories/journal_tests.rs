//! Journal repository tests against an in-memory database.

use super::*;
use crate::repositories::{AccountRepository, FiscalRepository};
use crate::test_support::{credit, date, debit, new_account, org, test_db};
use ledgerline_core::accounts::AccountType;
use ledgerline_core::fiscal::FiscalError;
use rust_decimal_macros::dec;

struct Books {
    db: DatabaseConnection,
    journal: JournalRepository,
    accounts: AccountRepository,
    fiscal: FiscalRepository,
    org: OrganizationId,
    actor: ActorId,
    january: FiscalPeriodId,
    cash: AccountId,
    sales: AccountId,
}

async fn books() -> Books {
    let db = test_db().await;
    let accounts = AccountRepository::new(db.clone());
    let fiscal = FiscalRepository::new(db.clone());
    let org_id = org();

    let january = fiscal
        .open_period(org_id, "Jan 2024", date(2024, 1, 1), date(2024, 1, 31))
        .await
        .unwrap();
    let cash = accounts
        .create_account(org_id, new_account("1000", "Cash", AccountType::Asset))
        .await
        .unwrap();
    let sales = accounts
        .create_account(org_id, new_account("4000", "Sales Revenue", AccountType::Revenue))
        .await
        .unwrap();

    Books {
        journal: JournalRepository::new(db.clone()),
        db,
        accounts,
        fiscal,
        org: org_id,
        actor: ActorId::new(),
        january: january.id.into(),
        cash: cash.id.into(),
        sales: sales.id.into(),
    }
}

fn sale(b: &Books, number: &str, debit_amount: Decimal, credit_amount: Decimal) -> CreateEntryInput {
    CreateEntryInput {
        fiscal_period_id: b.january,
        journal_number: number.to_string(),
        entry_date: date(2024, 1, 15),
        entry_type: EntryType::Standard,
        description: Some("Cash sale".to_string()),
        lines: vec![debit(1, b.cash, debit_amount), credit(2, b.sales, credit_amount)],
    }
}

async fn balance(b: &Books, account: AccountId) -> Decimal {
    b.accounts.get_account(b.org, account).await.unwrap().balance
}

#[tokio::test]
async fn test_post_balanced_entry_updates_balances() {
    let b = books().await;
    let draft = b
        .journal
        .create_draft(b.org, b.actor, &sale(&b, "JE-001", dec!(100), dec!(100)))
        .await
        .unwrap();
    assert_eq!(draft.entry.status, enums::EntryStatus::Draft);
    assert_eq!(draft.lines.len(), 2);

    let posted = b
        .journal
        .post(b.org, draft.entry.id.into(), b.actor)
        .await
        .unwrap();

    assert_eq!(posted.entry.status, enums::EntryStatus::Posted);
    assert_eq!(posted.entry.posting_sequence, Some(1));
    assert_eq!(posted.entry.posted_by, Some(b.actor.into_inner()));
    assert_eq!(balance(&b, b.cash).await, dec!(100));
    assert_eq!(balance(&b, b.sales).await, dec!(100));
}

#[tokio::test]
async fn test_unbalanced_entry_rejected_and_stays_draft() {
    let b = books().await;
    let draft = b
        .journal
        .create_draft(b.org, b.actor, &sale(&b, "JE-002", dec!(100), dec!(90)))
        .await
        .unwrap();

    let err = b
        .journal
        .post(b.org, draft.entry.id.into(), b.actor)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        JournalRepoError::Ledger(LedgerError::PostingRejected(
            PostingRejection::Unbalanced { .. }
        ))
    ));
    assert!(err.to_string().contains("Total Debits must equal Total Credits"));

    let reloaded = b
        .journal
        .get_entry(b.org, draft.entry.id.into())
        .await
        .unwrap();
    assert_eq!(reloaded.entry.status, enums::EntryStatus::Draft);
    assert_eq!(reloaded.entry.posting_sequence, None);
    assert_eq!(balance(&b, b.cash).await, Decimal::ZERO);
}

#[tokio::test]
async fn test_reposting_is_already_final() {
    let b = books().await;
    let posted = b
        .journal
        .create_and_post(b.org, b.actor, &sale(&b, "JE-003", dec!(40), dec!(40)))
        .await
        .unwrap();

    let err = b
        .journal
        .post(b.org, posted.entry.id.into(), b.actor)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        JournalRepoError::Ledger(LedgerError::AlreadyFinal(EntryStatus::Posted))
    ));
    assert_eq!(balance(&b, b.cash).await, dec!(40));
}

#[tokio::test]
async fn test_posting_sequence_is_monotonic() {
    let b = books().await;
    let first = b
        .journal
        .create_and_post(b.org, b.actor, &sale(&b, "JE-010", dec!(10), dec!(10)))
        .await
        .unwrap();
    let second = b
        .journal
        .create_and_post(b.org, b.actor, &sale(&b, "JE-011", dec!(20), dec!(20)))
        .await
        .unwrap();

    assert_eq!(first.entry.posting_sequence, Some(1));
    assert_eq!(second.entry.posting_sequence, Some(2));
    assert_eq!(balance(&b, b.cash).await, dec!(30));
}

#[tokio::test]
async fn test_rejected_create_and_post_stores_nothing() {
    let b = books().await;
    let err = b
        .journal
        .create_and_post(b.org, b.actor, &sale(&b, "JE-012", dec!(10), dec!(5)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        JournalRepoError::Ledger(LedgerError::PostingRejected(_))
    ));

    let (entries, total) = b
        .journal
        .list_entries(b.org, &EntryFilter::default(), &PageRequest::default())
        .await
        .unwrap();
    assert!(entries.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_duplicate_journal_number() {
    let b = books().await;
    b.journal
        .create_draft(b.org, b.actor, &sale(&b, "JE-020", dec!(5), dec!(5)))
        .await
        .unwrap();

    let err = b
        .journal
        .create_draft(b.org, b.actor, &sale(&b, "JE-020", dec!(7), dec!(7)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        JournalRepoError::Ledger(LedgerError::DuplicateJournalNumber(_))
    ));
}

#[tokio::test]
async fn test_number_index_violation_maps_to_duplicate_number() {
    let b = books().await;
    b.journal
        .create_draft(b.org, b.actor, &sale(&b, "JE-020", dec!(5), dec!(5)))
        .await
        .unwrap();
    let other = b
        .journal
        .create_draft(b.org, b.actor, &sale(&b, "JE-021", dec!(5), dec!(5)))
        .await
        .unwrap();

    let err = journal_entries::Entity::update_many()
        .col_expr(journal_entries::Column::JournalNumber, Expr::value("JE-020"))
        .filter(journal_entries::Column::Id.eq(other.entry.id))
        .exec(&b.db)
        .await
        .unwrap_err();

    assert!(matches!(
        entry_write_error(err, "JE-020"),
        JournalRepoError::Ledger(LedgerError::DuplicateJournalNumber(number)) if number == "JE-020"
    ));
}

#[tokio::test]
async fn test_draft_with_bad_line_shape_rejected() {
    let b = books().await;
    let mut input = sale(&b, "JE-021", dec!(5), dec!(5));
    input.lines.truncate(1);

    let err = b
        .journal
        .create_draft(b.org, b.actor, &input)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        JournalRepoError::Ledger(LedgerError::InvalidEntry(
            PostingRejection::InsufficientLines(1)
        ))
    ));
}

#[tokio::test]
async fn test_posting_into_closed_period_rejected() {
    let b = books().await;
    let draft = b
        .journal
        .create_draft(b.org, b.actor, &sale(&b, "JE-030", dec!(50), dec!(50)))
        .await
        .unwrap();
    b.journal
        .cancel(b.org, draft.entry.id.into())
        .await
        .unwrap();
    let other = b
        .journal
        .create_draft(b.org, b.actor, &sale(&b, "JE-031", dec!(50), dec!(50)))
        .await
        .unwrap();

    // Close needs every draft gone.
    let err = b
        .fiscal
        .close_period(b.org, b.january, b.actor)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        crate::repositories::FiscalRepoError::Fiscal(FiscalError::UnpostedEntriesExist(1))
    ));

    b.journal
        .cancel(b.org, other.entry.id.into())
        .await
        .unwrap();
    b.fiscal
        .close_period(b.org, b.january, b.actor)
        .await
        .unwrap();

    let err = b
        .journal
        .create_and_post(b.org, b.actor, &sale(&b, "JE-032", dec!(50), dec!(50)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        JournalRepoError::Ledger(LedgerError::PostingRejected(
            PostingRejection::PeriodNotOpen(FiscalPeriodStatus::Closed)
        ))
    ));
}

#[tokio::test]
async fn test_drafts_need_an_open_period() {
    let b = books().await;
    let february = b
        .fiscal
        .open_period(b.org, "Feb 2024", date(2024, 2, 1), date(2024, 2, 29))
        .await
        .unwrap();
    let draft = b
        .journal
        .create_draft(b.org, b.actor, &sale(&b, "JE-035", dec!(20), dec!(20)))
        .await
        .unwrap();
    b.fiscal
        .close_period(b.org, february.id.into(), b.actor)
        .await
        .unwrap();

    let err = b
        .journal
        .update_draft(
            b.org,
            draft.entry.id.into(),
            UpdateDraftInput {
                fiscal_period_id: Some(february.id.into()),
                entry_date: Some(date(2024, 2, 10)),
                ..UpdateDraftInput::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        JournalRepoError::Ledger(LedgerError::PostingRejected(
            PostingRejection::PeriodNotOpen(FiscalPeriodStatus::Closed)
        ))
    ));

    b.journal
        .cancel(b.org, draft.entry.id.into())
        .await
        .unwrap();
    b.fiscal
        .close_period(b.org, b.january, b.actor)
        .await
        .unwrap();
    b.fiscal
        .lock_period(b.org, b.january, b.actor)
        .await
        .unwrap();

    let err = b
        .journal
        .create_draft(b.org, b.actor, &sale(&b, "JE-036", dec!(20), dec!(20)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        JournalRepoError::Ledger(LedgerError::PostingRejected(
            PostingRejection::PeriodNotOpen(FiscalPeriodStatus::Locked)
        ))
    ));
}

#[tokio::test]
async fn test_inactive_account_rejected() {
    let b = books().await;
    b.accounts
        .update_account(
            b.org,
            b.sales,
            ledgerline_core::accounts::AccountPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = b
        .journal
        .create_and_post(b.org, b.actor, &sale(&b, "JE-040", dec!(5), dec!(5)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        JournalRepoError::Ledger(LedgerError::PostingRejected(
            PostingRejection::AccountInactive(_)
        ))
    ));
}

#[tokio::test]
async fn test_void_posts_reversal_and_nets_to_zero() {
    let b = books().await;
    let posted = b
        .journal
        .create_and_post(b.org, b.actor, &sale(&b, "JE-050", dec!(100), dec!(100)))
        .await
        .unwrap();

    let outcome = b
        .journal
        .void(
            b.org,
            posted.entry.id.into(),
            "Duplicate",
            Some(date(2024, 1, 20)),
            b.actor,
        )
        .await
        .unwrap();

    assert_eq!(outcome.original.entry.status, enums::EntryStatus::Voided);
    assert_eq!(outcome.original.entry.reversed_by, Some(outcome.reversal.entry.id));
    assert_eq!(outcome.original.entry.void_reason.as_deref(), Some("Duplicate"));
    assert_eq!(outcome.reversal.entry.reverses, Some(posted.entry.id));
    assert_eq!(outcome.reversal.entry.entry_type, enums::EntryType::Reversing);
    assert_eq!(outcome.reversal.entry.status, enums::EntryStatus::Posted);
    assert_eq!(outcome.reversal.entry.journal_number, "JE-050-REV");

    // Original lines untouched, reversal lines swapped.
    assert_eq!(outcome.original.lines[0].debit_amount, dec!(100));
    assert_eq!(outcome.reversal.lines[0].credit_amount, dec!(100));
    assert_eq!(outcome.reversal.lines[1].debit_amount, dec!(100));

    assert_eq!(balance(&b, b.cash).await, Decimal::ZERO);
    assert_eq!(balance(&b, b.sales).await, Decimal::ZERO);

    let computed = b
        .accounts
        .compute_balance(b.org, b.cash, date(2024, 1, 31), false)
        .await
        .unwrap();
    assert_eq!(computed.balance, Decimal::ZERO);

    let err = b
        .journal
        .void(b.org, posted.entry.id.into(), "Again", Some(date(2024, 1, 21)), b.actor)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        JournalRepoError::Ledger(LedgerError::AlreadyFinal(EntryStatus::Voided))
    ));
}

#[tokio::test]
async fn test_void_picks_a_free_reversal_number() {
    let b = books().await;
    let posted = b
        .journal
        .create_and_post(b.org, b.actor, &sale(&b, "JE-9", dec!(30), dec!(30)))
        .await
        .unwrap();
    b.journal
        .create_draft(b.org, b.actor, &sale(&b, "JE-9-REV", dec!(1), dec!(1)))
        .await
        .unwrap();

    let outcome = b
        .journal
        .void(b.org, posted.entry.id.into(), "Wrong customer", Some(date(2024, 1, 16)), b.actor)
        .await
        .unwrap();

    assert_eq!(outcome.reversal.entry.journal_number, "JE-9-REV-2");
    assert_eq!(balance(&b, b.cash).await, Decimal::ZERO);
}

#[tokio::test]
async fn test_void_of_closed_period_entry_lands_in_open_period() {
    let b = books().await;
    let february = b
        .fiscal
        .open_period(b.org, "Feb 2024", date(2024, 2, 1), date(2024, 2, 29))
        .await
        .unwrap();
    let posted = b
        .journal
        .create_and_post(b.org, b.actor, &sale(&b, "JE-060", dec!(75), dec!(75)))
        .await
        .unwrap();
    b.fiscal
        .close_period(b.org, b.january, b.actor)
        .await
        .unwrap();
    b.fiscal
        .lock_period(b.org, b.january, b.actor)
        .await
        .unwrap();

    let err = b
        .journal
        .void(b.org, posted.entry.id.into(), "Late", Some(date(2024, 1, 31)), b.actor)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        JournalRepoError::Ledger(LedgerError::NoOpenPeriod(_))
    ));

    let outcome = b
        .journal
        .void(b.org, posted.entry.id.into(), "Late", Some(date(2024, 2, 10)), b.actor)
        .await
        .unwrap();
    assert_eq!(outcome.reversal.entry.fiscal_period_id, february.id);
    assert_eq!(balance(&b, b.cash).await, Decimal::ZERO);
}

#[tokio::test]
async fn test_void_draft_is_not_posted() {
    let b = books().await;
    let draft = b
        .journal
        .create_draft(b.org, b.actor, &sale(&b, "JE-070", dec!(5), dec!(5)))
        .await
        .unwrap();
    let err = b
        .journal
        .void(b.org, draft.entry.id.into(), "x", Some(date(2024, 1, 16)), b.actor)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        JournalRepoError::Ledger(LedgerError::NotPosted(EntryStatus::Draft))
    ));
}

#[tokio::test]
async fn test_cancel_draft_skips_balances() {
    let b = books().await;
    let draft = b
        .journal
        .create_draft(b.org, b.actor, &sale(&b, "JE-080", dec!(5), dec!(5)))
        .await
        .unwrap();

    let cancelled = b
        .journal
        .cancel(b.org, draft.entry.id.into())
        .await
        .unwrap();
    assert_eq!(cancelled.entry.status, enums::EntryStatus::Voided);
    assert_eq!(cancelled.entry.posting_sequence, None);

    let err = b
        .journal
        .post(b.org, draft.entry.id.into(), b.actor)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        JournalRepoError::Ledger(LedgerError::AlreadyFinal(EntryStatus::Voided))
    ));
    assert_eq!(balance(&b, b.cash).await, Decimal::ZERO);
}

#[tokio::test]
async fn test_update_and_delete_drafts_only() {
    let b = books().await;
    let draft = b
        .journal
        .create_draft(b.org, b.actor, &sale(&b, "JE-090", dec!(5), dec!(5)))
        .await
        .unwrap();

    let updated = b
        .journal
        .update_draft(
            b.org,
            draft.entry.id.into(),
            UpdateDraftInput {
                description: Some(None),
                lines: Some(vec![
                    debit(1, b.cash, dec!(12)),
                    credit(2, b.sales, dec!(12)),
                ]),
                ..UpdateDraftInput::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.entry.description, None);
    assert_eq!(updated.lines.len(), 2);
    assert_eq!(updated.lines[0].debit_amount, dec!(12));

    let posted = b
        .journal
        .post(b.org, draft.entry.id.into(), b.actor)
        .await
        .unwrap();
    let err = b
        .journal
        .delete_draft(b.org, posted.entry.id.into())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        JournalRepoError::Ledger(LedgerError::NotDraft(EntryStatus::Posted))
    ));

    let other = b
        .journal
        .create_draft(b.org, b.actor, &sale(&b, "JE-091", dec!(5), dec!(5)))
        .await
        .unwrap();
    b.journal
        .delete_draft(b.org, other.entry.id.into())
        .await
        .unwrap();
    let err = b
        .journal
        .get_entry(b.org, other.entry.id.into())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        JournalRepoError::Ledger(LedgerError::EntryNotFound(_))
    ));
}

#[tokio::test]
async fn test_claim_draft_only_holds_drafts() {
    let b = books().await;
    let draft = b
        .journal
        .create_draft(b.org, b.actor, &sale(&b, "JE-095", dec!(5), dec!(5)))
        .await
        .unwrap();
    let id: JournalEntryId = draft.entry.id.into();

    assert!(claim_draft(&b.db, b.org, id).await.unwrap());
    assert!(!claim_draft(&b.db, org(), id).await.unwrap());

    b.journal.post(b.org, id, b.actor).await.unwrap();
    assert!(!claim_draft(&b.db, b.org, id).await.unwrap());

    // A posted entry keeps its lines.
    let err = b
        .journal
        .update_draft(
            b.org,
            id,
            UpdateDraftInput {
                lines: Some(vec![debit(1, b.cash, dec!(9)), credit(2, b.sales, dec!(9))]),
                ..UpdateDraftInput::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        JournalRepoError::Ledger(LedgerError::NotDraft(EntryStatus::Posted))
    ));
    let stored = b.journal.get_entry(b.org, id).await.unwrap();
    assert_eq!(stored.lines[0].debit_amount, dec!(5));
    assert_eq!(balance(&b, b.cash).await, dec!(5));
}

#[tokio::test]
async fn test_list_filters_by_status() {
    let b = books().await;
    b.journal
        .create_draft(b.org, b.actor, &sale(&b, "JE-100", dec!(5), dec!(5)))
        .await
        .unwrap();
    b.journal
        .create_and_post(b.org, b.actor, &sale(&b, "JE-101", dec!(5), dec!(5)))
        .await
        .unwrap();

    let (posted, total) = b
        .journal
        .list_entries(
            b.org,
            &EntryFilter {
                status: Some(EntryStatus::Posted),
                ..EntryFilter::default()
            },
            &PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(posted[0].journal_number, "JE-101");
}

#[tokio::test]
async fn test_stale_version_is_a_conflict() {
    let b = books().await;
    let txn = b.db.begin().await.unwrap();

    let err = apply_delta(
        &txn,
        &BalanceDelta {
            account_id: b.cash,
            delta: dec!(5),
        },
        7,
    )
    .await
    .unwrap_err();
    assert!(err.is_retryable());

    apply_delta(
        &txn,
        &BalanceDelta {
            account_id: b.cash,
            delta: dec!(5),
        },
        0,
    )
    .await
    .unwrap();
    txn.commit().await.unwrap();

    let cash = b.accounts.get_account(b.org, b.cash).await.unwrap();
    assert_eq!(cash.balance, dec!(5));
    assert_eq!(cash.version, 1);
}

#[tokio::test]
async fn test_retry_once_gives_up_after_second_conflict() {
    let mut calls = 0;
    let result: Result<(), JournalRepoError> = retry_once("test", || {
        calls += 1;
        async { Err(LedgerError::ConcurrencyConflict.into()) }
    })
    .await;

    assert!(result.unwrap_err().is_retryable());
    assert_eq!(calls, 2);
}
