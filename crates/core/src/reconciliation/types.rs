//! Reconciliation types.

use chrono::NaiveDate;
use ledgerline_shared::types::{AccountId, BankTransactionId, JournalEntryId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of bank movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BankTransactionType {
    /// Money in.
    Debit,
    /// Money out.
    Credit,
    /// Bank charge.
    Fee,
    /// Interest earned.
    Interest,
    /// Anything else; direction follows the sign of the amount.
    Other,
}

impl BankTransactionType {
    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
            Self::Fee => "fee",
            Self::Interest => "interest",
            Self::Other => "other",
        }
    }

    /// Side of the journal line a transaction of this type pairs with.
    ///
    /// `debit` and `interest` pair with a debit-side line, `credit` and `fee`
    /// with a credit-side line. `other` uses the sign of `amount`.
    #[must_use]
    pub fn expected_side(self, amount: Decimal) -> LineSide {
        match self {
            Self::Debit | Self::Interest => LineSide::Debit,
            Self::Credit | Self::Fee => LineSide::Credit,
            Self::Other if amount < Decimal::ZERO => LineSide::Credit,
            Self::Other => LineSide::Debit,
        }
    }
}

/// Side of a journal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSide {
    /// Debit amount set.
    Debit,
    /// Credit amount set.
    Credit,
}

/// A bank transaction as seen by the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankLine {
    /// Bank transaction ID.
    pub id: BankTransactionId,
    /// Value date.
    pub date: NaiveDate,
    /// Kind of movement.
    pub transaction_type: BankTransactionType,
    /// Amount as reported by the bank.
    pub amount: Decimal,
    /// Restricts matching to lines on this account.
    pub ledger_account_id: Option<AccountId>,
}

impl BankLine {
    /// Returns true if `line` is on the right side, for the right amount,
    /// and on the right account.
    #[must_use]
    pub fn pairs_with(&self, line: &CandidateLine, tolerance: Decimal) -> bool {
        if self
            .ledger_account_id
            .is_some_and(|account_id| account_id != line.account_id)
        {
            return false;
        }
        let side_amount = match self.transaction_type.expected_side(self.amount) {
            LineSide::Debit => line.debit,
            LineSide::Credit => line.credit,
        };
        !side_amount.is_zero() && (side_amount - self.amount.abs()).abs() <= tolerance
    }
}

/// One line of a posted entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateLine {
    /// Account hit.
    pub account_id: AccountId,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
}

/// A posted journal entry that may match a bank transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEntry {
    /// Entry ID.
    pub id: JournalEntryId,
    /// Entry date.
    pub entry_date: NaiveDate,
    /// Per-organization posting sequence.
    pub posting_sequence: i64,
    /// Entry lines.
    pub lines: Vec<CandidateLine>,
}

/// How a match was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchKind {
    /// Same date and amount.
    Exact,
    /// Same amount within the date window.
    AmountOnly,
}

/// A proposed link between a bank transaction and an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// Bank transaction.
    pub bank_transaction_id: BankTransactionId,
    /// Journal entry.
    pub journal_entry_id: JournalEntryId,
    /// Exact or amount-only.
    pub kind: MatchKind,
    /// Days between the bank date and the entry date.
    pub day_distance: i64,
}
