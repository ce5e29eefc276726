//! Account domain types.

use ledgerline_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::vat::VatCategory;

/// Classification of a ledger account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Resources owned.
    Asset,
    /// Obligations owed.
    Liability,
    /// Owner's residual interest.
    Equity,
    /// Income earned.
    Revenue,
    /// Costs of operating.
    Expense,
    /// Cost of goods sold.
    Cogs,
}

impl AccountType {
    /// The side that increases an account of this type.
    ///
    /// Asset, Expense, COGS → debit. Liability, Equity, Revenue → credit.
    #[must_use]
    pub const fn default_normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense | Self::Cogs => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalBalance::Credit,
        }
    }

    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
            Self::Cogs => "cogs",
        }
    }
}

/// Side on which an account's balance grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalBalance {
    /// Debits increase the balance.
    Debit,
    /// Credits increase the balance.
    Credit,
}

impl NormalBalance {
    /// Balance change for a debit/credit pair, positive in the expected direction.
    ///
    /// - Debit-normal: `debit - credit`
    /// - Credit-normal: `credit - debit`
    #[must_use]
    pub fn balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        self.orient(debit - credit)
    }

    /// Orients a raw `debit - credit` net amount to this side.
    #[must_use]
    pub fn orient(self, net_debit: Decimal) -> Decimal {
        match self {
            Self::Debit => net_debit,
            Self::Credit => -net_debit,
        }
    }
}

/// A node in the chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Code, unique within the organization's chart (e.g. "1100").
    pub code: String,
    /// Display name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
    /// Side that increases the balance.
    pub normal_balance: NormalBalance,
    /// Parent account for rollups.
    pub parent_id: Option<AccountId>,
    /// System accounts cannot be deleted.
    pub is_system: bool,
    /// Inactive accounts reject postings.
    pub is_active: bool,
    /// VAT bucket this account feeds, if any.
    pub vat_category: Option<VatCategory>,
}

/// Input for creating an account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    /// Caller-chosen ID; generated when absent.
    #[serde(default)]
    pub id: Option<AccountId>,
    /// Account code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
    /// Defaults from `account_type` when absent.
    #[serde(default)]
    pub normal_balance: Option<NormalBalance>,
    /// Parent account.
    #[serde(default)]
    pub parent_id: Option<AccountId>,
    /// Marks a system account.
    #[serde(default)]
    pub is_system: bool,
    /// Defaults to active.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// VAT bucket.
    #[serde(default)]
    pub vat_category: Option<VatCategory>,
}

const fn default_true() -> bool {
    true
}

/// Partial update of an account.
///
/// Double options distinguish "leave unchanged" (`None`) from
/// "clear" (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    /// New code.
    pub code: Option<String>,
    /// New name.
    pub name: Option<String>,
    /// New parent.
    pub parent_id: Option<Option<AccountId>>,
    /// Activate or deactivate.
    pub is_active: Option<bool>,
    /// Change normal balance (system accounts only).
    pub normal_balance: Option<NormalBalance>,
    /// Change VAT bucket.
    pub vat_category: Option<Option<VatCategory>>,
}
