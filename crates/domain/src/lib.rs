//! Domain model for remittance-collateralized lending.
//!
//! This crate holds the pure accounting core of the lending dashboard:
//! - Pool ledger arithmetic (TVL, available liquidity, utilization)
//! - Lender position accounting (principal, accrued interest, pool share)
//! - Loan amortization tracking (progress, due dates, aggregation)
//! - Collateral reliability tiers and portfolio breakdowns
//!
//! Every calculator takes snapshots by reference and returns new snapshots,
//! so a failed operation never leaves partially mutated state behind.

/// Entities owned by the pool, lenders and borrowers.
pub mod entities;
/// Enumerations shared across the domain.
pub mod enums;
/// Domain error types.
pub mod error;
/// Calculators for the pool, positions and loans.
pub mod math;
/// Derived display metrics.
pub mod metrics;
/// Value objects for money and percentages.
pub mod value_objects;

pub use error::{LendingError, LendingResult};
