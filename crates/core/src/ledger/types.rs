//! Journal domain types.

use ledgerline_shared::types::{AccountId, CostCenterId, OrganizationId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::accounts::NormalBalance;

/// Kind of journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Day-to-day entry.
    Standard,
    /// Period-end adjustment.
    Adjusting,
    /// Generated by voiding a posted entry.
    Reversing,
}

impl EntryType {
    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Adjusting => "adjusting",
            Self::Reversing => "reversing",
        }
    }
}

/// Entry lifecycle: `draft → posted → voided`, or `draft → voided` on cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Editable, no balance effect.
    Draft,
    /// Applied to balances; immutable.
    Posted,
    /// Cancelled or reversed; immutable.
    Voided,
}

impl EntryStatus {
    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Posted => "posted",
            Self::Voided => "voided",
        }
    }

    /// Returns true once the entry can no longer be posted or edited.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Posted | Self::Voided)
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One debit-or-credit movement within an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalLineInput {
    /// Position within the entry (1-based).
    pub line_number: i32,
    /// Account the line hits.
    pub ledger_account_id: AccountId,
    /// Debit amount; zero on credit lines.
    #[serde(default)]
    pub debit_amount: Decimal,
    /// Credit amount; zero on debit lines.
    #[serde(default)]
    pub credit_amount: Decimal,
    /// Line memo.
    #[serde(default)]
    pub description: Option<String>,
    /// Cost center for budget tracking.
    #[serde(default)]
    pub cost_center_id: Option<CostCenterId>,
}

/// Sums of an entry's debits and credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryTotals {
    /// Total debits.
    pub total_debit: Decimal,
    /// Total credits.
    pub total_credit: Decimal,
}

impl EntryTotals {
    /// Sums the lines.
    #[must_use]
    pub fn of(lines: &[JournalLineInput]) -> Self {
        Self {
            total_debit: lines.iter().map(|l| l.debit_amount).sum(),
            total_credit: lines.iter().map(|l| l.credit_amount).sum(),
        }
    }

    /// `total_debit - total_credit`.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.total_debit - self.total_credit
    }

    /// True when the difference is within `tolerance`.
    #[must_use]
    pub fn is_balanced(&self, tolerance: Decimal) -> bool {
        self.difference().abs() <= tolerance
    }
}

/// What validation needs to know about an account.
#[derive(Debug, Clone, Copy)]
pub struct AccountInfo {
    /// The account ID.
    pub id: AccountId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Side that increases the balance.
    pub normal_balance: NormalBalance,
    /// Whether the account accepts postings.
    pub is_active: bool,
}

/// Net change to one account's running balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceDelta {
    /// The account.
    pub account_id: AccountId,
    /// Signed change, positive in the account's normal direction.
    pub delta: Decimal,
}

/// Result of a successful validation: what posting will apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingPlan {
    /// Entry totals.
    pub totals: EntryTotals,
    /// One delta per distinct account, ordered by account id.
    pub deltas: Vec<BalanceDelta>,
}
