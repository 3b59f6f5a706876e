//! Error types for lending operations.

use crate::value_objects::money::Money;
use thiserror::Error;

/// Result alias for domain operations.
pub type LendingResult<T> = Result<T, LendingError>;

/// Recoverable failures raised by the accounting core.
///
/// None of these are fatal: each is reported back to the form that
/// initiated the action and the prior state stays as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LendingError {
    /// Amount was missing, zero, negative or not a number.
    #[error("Enter a valid amount")]
    InvalidAmount,

    /// Withdrawal is larger than the lender's total value.
    #[error("Withdrawal of {requested} exceeds available balance of {available}")]
    ExceedsBalance {
        /// Amount requested.
        requested: Money,
        /// Lender's total value.
        available: Money,
    },

    /// The pool does not hold enough idle liquidity.
    #[error("Pool liquidity of {available} cannot cover {requested}")]
    InsufficientLiquidity {
        /// Amount requested.
        requested: Money,
        /// Pool available liquidity.
        available: Money,
    },

    /// Loan duration must be at least one month.
    #[error("Loan term must be at least one month")]
    InvalidTerm,

    /// Interest rate was negative or not a number.
    #[error("Interest rate must be a non-negative percentage")]
    InvalidRate,

    /// Reliability score outside 0..=100.
    #[error("Reliability score {0} is outside 0-100")]
    InvalidReliabilityScore(u8),

    /// Collateral token is not staked.
    #[error("Collateral token #{0} must be staked before borrowing")]
    CollateralNotStaked(u64),

    /// Collateral reliability score is below the lending threshold.
    #[error("Reliability score {score} is below the minimum of {minimum}")]
    CollateralIneligible {
        /// Score on the collateral token.
        score: u8,
        /// Minimum score required.
        minimum: u8,
    },

    /// Loan is already fully repaid.
    #[error("Loan #{0} is already closed")]
    LoanClosed(u64),
}
