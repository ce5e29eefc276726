//! Enumerations stored as short strings, with conversions to the domain enums.

use ledgerline_core::accounts;
use ledgerline_core::fiscal;
use ledgerline_core::ledger;
use ledgerline_core::reconciliation;
use ledgerline_core::vat;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Maps a stored enum onto its domain twin and back, variant for variant.
macro_rules! domain_enum {
    ($db:ident <=> $module:ident :: $domain:ident { $($variant:ident),+ $(,)? }) => {
        impl From<$db> for $module::$domain {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$module::$domain> for $db {
            fn from(value: $module::$domain) -> Self {
                match value {
                    $($module::$domain::$variant => Self::$variant,)+
                }
            }
        }
    };
}

/// Account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AccountType {
    /// Asset.
    #[sea_orm(string_value = "asset")]
    Asset,
    /// Liability.
    #[sea_orm(string_value = "liability")]
    Liability,
    /// Equity.
    #[sea_orm(string_value = "equity")]
    Equity,
    /// Revenue.
    #[sea_orm(string_value = "revenue")]
    Revenue,
    /// Expense.
    #[sea_orm(string_value = "expense")]
    Expense,
    /// Cost of goods sold.
    #[sea_orm(string_value = "cogs")]
    Cogs,
}

domain_enum!(AccountType <=> accounts::AccountType {
    Asset, Liability, Equity, Revenue, Expense, Cogs
});

/// Side on which an account increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum NormalBalance {
    /// Debit-normal.
    #[sea_orm(string_value = "debit")]
    Debit,
    /// Credit-normal.
    #[sea_orm(string_value = "credit")]
    Credit,
}

domain_enum!(NormalBalance <=> accounts::NormalBalance { Debit, Credit });

/// VAT box an account feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
pub enum VatCategory {
    /// VAT due on sales.
    #[sea_orm(string_value = "output_sales")]
    OutputSales,
    /// VAT due on acquisitions.
    #[sea_orm(string_value = "output_acquisitions")]
    OutputAcquisitions,
    /// VAT reclaimable on purchases.
    #[sea_orm(string_value = "input_reclaimable")]
    InputReclaimable,
}

domain_enum!(VatCategory <=> vat::VatCategory {
    OutputSales, OutputAcquisitions, InputReclaimable
});

/// Fiscal period lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum FiscalPeriodStatus {
    /// Accepts postings.
    #[sea_orm(string_value = "open")]
    Open,
    /// Closed for postings.
    #[sea_orm(string_value = "closed")]
    Closed,
    /// Permanently locked.
    #[sea_orm(string_value = "locked")]
    Locked,
}

domain_enum!(FiscalPeriodStatus <=> fiscal::FiscalPeriodStatus { Open, Closed, Locked });

/// Journal entry kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum EntryType {
    /// Regular entry.
    #[sea_orm(string_value = "standard")]
    Standard,
    /// Period-end adjustment.
    #[sea_orm(string_value = "adjusting")]
    Adjusting,
    /// Reversal of another entry.
    #[sea_orm(string_value = "reversing")]
    Reversing,
}

domain_enum!(EntryType <=> ledger::EntryType { Standard, Adjusting, Reversing });

/// Journal entry lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum EntryStatus {
    /// Editable.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Applied to balances.
    #[sea_orm(string_value = "posted")]
    Posted,
    /// Cancelled or reversed.
    #[sea_orm(string_value = "voided")]
    Voided,
}

domain_enum!(EntryStatus <=> ledger::EntryStatus { Draft, Posted, Voided });

/// Bank transaction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum BankTransactionType {
    /// Money in.
    #[sea_orm(string_value = "debit")]
    Debit,
    /// Money out.
    #[sea_orm(string_value = "credit")]
    Credit,
    /// Bank fee.
    #[sea_orm(string_value = "fee")]
    Fee,
    /// Interest received.
    #[sea_orm(string_value = "interest")]
    Interest,
    /// Anything else; direction follows the sign.
    #[sea_orm(string_value = "other")]
    Other,
}

domain_enum!(BankTransactionType <=> reconciliation::BankTransactionType {
    Debit, Credit, Fee, Interest, Other
});

/// VAT return lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum VatReturnStatus {
    /// Editable.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Sent to the tax authority.
    #[sea_orm(string_value = "submitted")]
    Submitted,
    /// Accepted by the tax authority.
    #[sea_orm(string_value = "accepted")]
    Accepted,
    /// Rejected by the tax authority.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

domain_enum!(VatReturnStatus <=> vat::VatReturnStatus {
    Draft, Submitted, Accepted, Rejected
});
