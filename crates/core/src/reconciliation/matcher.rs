//! Batch matcher and link/unlink rules.

use std::collections::HashSet;

use ledgerline_shared::types::JournalEntryId;
use rust_decimal::Decimal;

use super::error::ReconciliationError;
use super::types::{BankLine, CandidateEntry, Match, MatchKind};
use crate::fiscal::FiscalPeriodStatus;
use crate::ledger::EntryStatus;

/// Matcher settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchConfig {
    /// Days on either side of the bank date searched for entries.
    pub window_days: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self { window_days: 2 }
    }
}

/// Matches bank transactions to posted journal entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher {
    config: MatchConfig,
}

impl Matcher {
    /// Creates a matcher.
    #[must_use]
    pub const fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    /// Proposes one match per unreconciled transaction where possible.
    ///
    /// Transactions are processed oldest first. For each, candidates dated
    /// within the window that have a line equal to `|amount|` on the side
    /// implied by the transaction type qualify. The best candidate is the
    /// one with the smallest date distance (zero means an exact match),
    /// then the lowest posting sequence. Entries in `already_linked`, and
    /// entries taken earlier in the same batch, are skipped.
    #[must_use]
    pub fn match_batch(
        &self,
        transactions: &[BankLine],
        candidates: &[CandidateEntry],
        already_linked: &HashSet<JournalEntryId>,
    ) -> Vec<Match> {
        let window = i64::from(self.config.window_days);
        let mut taken: HashSet<JournalEntryId> = already_linked.clone();

        let mut ordered: Vec<&BankLine> = transactions.iter().collect();
        ordered.sort_by_key(|t| (t.date, t.id));

        let mut matches = Vec::new();
        for transaction in ordered {
            let best = candidates
                .iter()
                .filter(|c| !taken.contains(&c.id))
                .filter_map(|c| {
                    let distance = (c.entry_date - transaction.date).num_days().abs();
                    (distance <= window
                        && c.lines
                            .iter()
                            .any(|line| transaction.pairs_with(line, Decimal::ZERO)))
                    .then_some((distance, c.posting_sequence, c.id))
                })
                .min();

            if let Some((distance, _, entry_id)) = best {
                taken.insert(entry_id);
                matches.push(Match {
                    bank_transaction_id: transaction.id,
                    journal_entry_id: entry_id,
                    kind: if distance == 0 {
                        MatchKind::Exact
                    } else {
                        MatchKind::AmountOnly
                    },
                    day_distance: distance,
                });
            }
        }
        matches
    }

    /// Checks a new bank transaction amount.
    pub fn validate_amount(amount: Decimal) -> Result<(), ReconciliationError> {
        if amount.is_zero() {
            return Err(ReconciliationError::ZeroAmount);
        }
        Ok(())
    }

    /// Checks a manual link of `transaction` to `entry`.
    ///
    /// The entry must be posted and not linked elsewhere, and one of its
    /// lines must match the bank amount within `tolerance` on the expected side.
    pub fn check_manual_link(
        transaction: &BankLine,
        is_reconciled: bool,
        entry: &CandidateEntry,
        entry_status: EntryStatus,
        entry_linked_elsewhere: bool,
        tolerance: Decimal,
    ) -> Result<(), ReconciliationError> {
        if is_reconciled {
            return Err(ReconciliationError::AlreadyReconciled);
        }
        if entry_status != EntryStatus::Posted {
            return Err(ReconciliationError::EntryNotPosted);
        }
        if entry_linked_elsewhere {
            return Err(ReconciliationError::EntryAlreadyLinked(entry.id));
        }
        if !entry
            .lines
            .iter()
            .any(|line| transaction.pairs_with(line, tolerance))
        {
            return Err(ReconciliationError::AmountMismatch(transaction.amount.abs()));
        }
        Ok(())
    }

    /// Checks that a link can be undone.
    ///
    /// Both the period containing the bank date and the entry's period must
    /// still be open. A missing period counts as not open.
    pub fn check_unlink(
        is_reconciled: bool,
        transaction_period: Option<FiscalPeriodStatus>,
        entry_period: Option<FiscalPeriodStatus>,
    ) -> Result<(), ReconciliationError> {
        if !is_reconciled {
            return Err(ReconciliationError::NotReconciled);
        }
        let open = Some(FiscalPeriodStatus::Open);
        if transaction_period != open || entry_period != open {
            return Err(ReconciliationError::PeriodLocked);
        }
        Ok(())
    }
}
