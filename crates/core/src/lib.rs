//! Core accounting logic for Ledgerline.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `accounts` - Chart of accounts hierarchy and balance rollups
//! - `fiscal` - Fiscal periods and their open/closed/locked lifecycle
//! - `ledger` - Double-entry validation, posting plans and reversals
//! - `budget` - Budget vs actual variance
//! - `reconciliation` - Bank transaction matching
//! - `vat` - VAT return aggregation and lifecycle

pub mod accounts;
pub mod budget;
pub mod fiscal;
pub mod ledger;
pub mod reconciliation;
pub mod vat;
