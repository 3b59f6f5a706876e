//! Calculators for pool accounting and the loan lifecycle.
//!
//! All functions are pure: they borrow the current snapshot and return a new
//! one, or an error with the input left untouched.

pub mod amortization;
pub mod pool_ledger;
pub mod position_accountant;
