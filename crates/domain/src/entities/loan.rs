use crate::enums::LoanStatus;
use crate::value_objects::{Money, Percent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LoanId(pub u64);

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A borrower's loan against a collateral token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub collateral_token_id: u64,
    pub principal: Money,
    pub balance: Money,
    /// APR on the 0-100 scale.
    pub annual_rate: Percent,
    pub monthly_payment: Money,
    pub next_due_date: DateTime<Utc>,
    pub payments_made: u32,
    pub total_payments: u32,
}

impl Loan {
    /// Lifecycle status; a loan retires once repaid or all payments are made.
    pub fn status(&self) -> LoanStatus {
        if self.balance.is_zero() || self.payments_made >= self.total_payments {
            LoanStatus::Retired
        } else {
            LoanStatus::Active
        }
    }

    pub fn is_active(&self) -> bool {
        self.status() == LoanStatus::Active
    }

    pub fn remaining_payments(&self) -> u32 {
        self.total_payments.saturating_sub(self.payments_made)
    }
}
