use crate::error::LendingResult;
use crate::value_objects::{Money, Percent};
use serde::Serialize;

/// A single lender's stake in the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LenderPosition {
    principal: Money,
    earned_interest: Money,
    total_value: Money,
    share_percentage: Percent,
}

impl LenderPosition {
    /// Creates a position; total value is always principal plus interest.
    pub fn new(
        principal: Money,
        earned_interest: Money,
        share_percentage: Percent,
    ) -> LendingResult<Self> {
        Ok(Self {
            principal,
            earned_interest,
            total_value: principal.checked_add(earned_interest)?,
            share_percentage: share_percentage.rounded(),
        })
    }

    /// A wallet that has never deposited.
    pub fn empty() -> Self {
        Self {
            principal: Money::ZERO,
            earned_interest: Money::ZERO,
            total_value: Money::ZERO,
            share_percentage: Percent::ZERO,
        }
    }

    pub fn principal(&self) -> Money {
        self.principal
    }

    pub fn earned_interest(&self) -> Money {
        self.earned_interest
    }

    pub fn total_value(&self) -> Money {
        self.total_value
    }

    pub fn share_percentage(&self) -> Percent {
        self.share_percentage
    }
}

impl Default for LenderPosition {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_total_value_is_derived() {
        let position = LenderPosition::new(
            Money::new(dec!(54000)).unwrap(),
            Money::new(dec!(3180)).unwrap(),
            Percent(dec!(4.2)),
        )
        .unwrap();
        assert_eq!(position.total_value().value(), dec!(57180));
    }
}
