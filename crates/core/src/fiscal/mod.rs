//! Fiscal periods and their open → closed → locked lifecycle.

pub mod calendar;
pub mod error;
pub mod period;

pub use calendar::FiscalCalendar;
pub use error::FiscalError;
pub use period::{FiscalPeriod, FiscalPeriodStatus};
