use crate::value_objects::Percent;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    Active,
    Retired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReliabilityTier {
    Fair,
    Good,
    VeryGood,
    Excellent,
}

/// How the monthly payment of a new loan is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentFormula {
    /// Fixed-rate annuity over the loan term.
    #[default]
    Annuity,
    /// Flat share of principal per month, independent of rate and term.
    FlatPercent(Percent),
}

impl PaymentFormula {
    /// Flat payment of 8% of principal per month.
    pub fn legacy_flat() -> Self {
        Self::FlatPercent(Percent::from_bps(800))
    }
}

/// Kinds of user-initiated mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Deposit,
    Withdraw,
    RequestLoan,
    MakePayment,
}
