//! Bank reconciliation.
//!
//! Links bank transactions to the posted journal entries that record the
//! same cash movement. The batch matcher is pure and idempotent: it only
//! looks at unreconciled transactions and never proposes an entry twice.

pub mod error;
pub mod matcher;
pub mod types;

pub use error::ReconciliationError;
pub use matcher::{MatchConfig, Matcher};
pub use types::{BankLine, BankTransactionType, CandidateEntry, CandidateLine, LineSide, Match, MatchKind};
