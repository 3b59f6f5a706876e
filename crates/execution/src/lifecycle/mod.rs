//! Wallet lifecycle tracking.
//!
//! Records every confirmed change to a wallet's state:
//! - Collateral registration
//! - Deposits and withdrawals
//! - Loan issuance and payments

mod events;
mod tracker;

pub use events::*;
pub use tracker::*;
