//! Budget tracking and variance analysis.
//!
//! Actuals are derived from posted journal lines at read time; this module
//! is the only place variance is computed.

pub mod error;
pub mod service;
pub mod types;


pub use error::BudgetError;
pub use service::BudgetService;
pub use types::{BudgetPosting, BudgetSummary, VarianceResult, VarianceStatus};
