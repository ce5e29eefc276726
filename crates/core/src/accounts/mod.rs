//! Chart of accounts.
//!
//! Accounts live in a flat table keyed by id with an optional `parent_id`.
//! [`ChartOfAccounts`] loads them into an arena with an id index so that
//! hierarchy rules (acyclic parents, unique codes) are checked at write
//! time and balances can be rolled up without an object graph.

pub mod balance;
pub mod chart;
pub mod error;
pub mod types;

#[cfg(test)]
mod chart_props;
#[cfg(test)]
mod tests;

pub use balance::{AccountBalance, Posting, TrialBalance, TrialBalanceLine};
pub use chart::ChartOfAccounts;
pub use error::AccountError;
pub use types::{Account, AccountPatch, AccountType, NewAccount, NormalBalance};
