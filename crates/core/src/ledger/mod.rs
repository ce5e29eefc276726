//! Double-entry journal logic.
//!
//! This module implements the rules of the posting engine:
//! - Entry and line types with their state machine
//! - Validation of an entry against its fiscal period and accounts
//! - Posting plans (per-account balance deltas)
//! - Reversal of posted entries

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::{LedgerError, PostingRejection};
pub use service::{BALANCE_TOLERANCE, LedgerService, PostingInput};
pub use types::{
    AccountInfo, BalanceDelta, EntryStatus, EntryTotals, EntryType, JournalLineInput, PostingPlan,
};
