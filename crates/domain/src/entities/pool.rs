use crate::error::LendingResult;
use crate::math::pool_ledger;
use crate::value_objects::{Money, Percent};
use rust_decimal::Decimal;
use serde::Serialize;

/// Shared liquidity pool totals.
///
/// `total_value_locked` and `utilization_rate` are derived from available
/// liquidity and total borrowed on every construction, so they can
/// never drift from their components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolState {
    total_value_locked: Money,
    total_borrowed: Money,
    available_liquidity: Money,
    utilization_rate: Percent,
    current_apy: Percent,
}

impl PoolState {
    /// Creates a pool from its independent components.
    ///
    /// Fails with `InvalidAmount` when TVL would not be representable.
    pub fn new(
        available_liquidity: Money,
        total_borrowed: Money,
        current_apy: Percent,
    ) -> LendingResult<Self> {
        let total_value_locked = available_liquidity.checked_add(total_borrowed)?;
        Ok(Self::derived(
            available_liquidity,
            total_borrowed,
            total_value_locked,
            current_apy,
        ))
    }

    /// An empty pool.
    pub fn empty(current_apy: Percent) -> Self {
        Self::derived(Money::ZERO, Money::ZERO, Money::ZERO, current_apy)
    }

    /// The pool the lender dashboard opens with: 464k idle, 786k lent out, 11.4% APY.
    pub fn dashboard_seed() -> Self {
        let available = Money::saturating(Decimal::from(464_000));
        let borrowed = Money::saturating(Decimal::from(786_000));
        Self::derived(
            available,
            borrowed,
            Money::saturating(Decimal::from(1_250_000)),
            Percent::from_bps(1140),
        )
    }

    fn derived(
        available_liquidity: Money,
        total_borrowed: Money,
        total_value_locked: Money,
        current_apy: Percent,
    ) -> Self {
        Self {
            total_value_locked,
            total_borrowed,
            available_liquidity,
            utilization_rate: pool_ledger::utilization_of(total_borrowed, total_value_locked),
            current_apy,
        }
    }

    /// Returns a copy with new liquidity components, re-deriving totals.
    pub fn with_components(
        &self,
        available_liquidity: Money,
        total_borrowed: Money,
    ) -> LendingResult<Self> {
        Self::new(available_liquidity, total_borrowed, self.current_apy)
    }

    pub fn total_value_locked(&self) -> Money {
        self.total_value_locked
    }

    pub fn total_borrowed(&self) -> Money {
        self.total_borrowed
    }

    pub fn available_liquidity(&self) -> Money {
        self.available_liquidity
    }

    pub fn utilization_rate(&self) -> Percent {
        self.utilization_rate
    }

    pub fn current_apy(&self) -> Percent {
        self.current_apy
    }
}
