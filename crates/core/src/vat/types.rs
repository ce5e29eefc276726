//! VAT domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::accounts::NormalBalance;

/// VAT bucket an account feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VatCategory {
    /// Output VAT charged on sales.
    OutputSales,
    /// VAT due on acquisitions (reverse charge).
    OutputAcquisitions,
    /// Input VAT reclaimable on purchases.
    InputReclaimable,
}

impl VatCategory {
    /// camelCase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OutputSales => "outputSales",
            Self::OutputAcquisitions => "outputAcquisitions",
            Self::InputReclaimable => "inputReclaimable",
        }
    }
}

/// Lifecycle of a VAT return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VatReturnStatus {
    /// Editable snapshot.
    Draft,
    /// Filed; amounts frozen.
    Submitted,
    /// Accepted by the tax authority.
    Accepted,
    /// Rejected by the tax authority.
    Rejected,
}

impl VatReturnStatus {
    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for VatReturnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A posted line on a VAT-tagged account.
#[derive(Debug, Clone, Copy)]
pub struct VatPosting {
    /// Bucket of the line's account.
    pub category: VatCategory,
    /// Normal balance of the line's account.
    pub normal_balance: NormalBalance,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
}

/// The three return boxes plus derived totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VatAmounts {
    /// VAT due on sales.
    pub vat_due_sales: Decimal,
    /// VAT due on acquisitions.
    pub vat_due_acquisitions: Decimal,
    /// VAT reclaimed on purchases.
    pub vat_reclaimed: Decimal,
}

impl VatAmounts {
    /// `vat_due_sales + vat_due_acquisitions`.
    #[must_use]
    pub fn total_vat_due(&self) -> Decimal {
        self.vat_due_sales + self.vat_due_acquisitions
    }

    /// `total_vat_due - vat_reclaimed`; negative means a refund is due.
    #[must_use]
    pub fn net_vat_due(&self) -> Decimal {
        self.total_vat_due() - self.vat_reclaimed
    }
}
