//! VAT return aggregation.
//!
//! A return is a snapshot of posted activity on VAT-tagged accounts over a
//! date range. Amounts can be regenerated or edited only while the return
//! is a draft; submission freezes them.

pub mod error;
pub mod service;
pub mod types;

pub use error::VatError;
pub use service::{ExistingReturn, VatService};
pub use types::{VatAmounts, VatCategory, VatPosting, VatReturnStatus};
