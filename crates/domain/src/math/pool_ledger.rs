use crate::entities::PoolState;
use crate::error::{LendingError, LendingResult};
use crate::value_objects::{Money, Percent};

/// Adds a deposit to the pool's idle liquidity.
///
/// Total borrowed is unchanged; TVL is re-derived from its components.
pub fn apply_deposit(pool: &PoolState, amount: Money) -> LendingResult<PoolState> {
    if amount.is_zero() {
        return Err(LendingError::InvalidAmount);
    }
    let available = pool.available_liquidity().checked_add(amount)?;
    pool.with_components(available, pool.total_borrowed())
}

/// Removes a withdrawal from the pool's idle liquidity.
///
/// Available liquidity is clamped at zero. Whether the lender may withdraw
/// this much is decided by the position accountant, and whether the pool
/// must cover it in full by [`ensure_liquidity`].
pub fn apply_withdraw(pool: &PoolState, amount: Money) -> LendingResult<PoolState> {
    if amount.is_zero() {
        return Err(LendingError::InvalidAmount);
    }
    let available = pool.available_liquidity().saturating_sub(amount);
    pool.with_components(available, pool.total_borrowed())
}

/// Fails with [`LendingError::InsufficientLiquidity`] when the pool's idle
/// liquidity cannot cover `amount`.
pub fn ensure_liquidity(pool: &PoolState, amount: Money) -> LendingResult<()> {
    if amount > pool.available_liquidity() {
        return Err(LendingError::InsufficientLiquidity {
            requested: amount,
            available: pool.available_liquidity(),
        });
    }
    Ok(())
}

/// Share of TVL currently lent out, as a percentage. Zero for an empty pool.
pub fn utilization(pool: &PoolState) -> Percent {
    utilization_of(pool.total_borrowed(), pool.total_value_locked())
}

/// `borrowed / tvl * 100`, zero when `tvl` is zero.
pub fn utilization_of(total_borrowed: Money, total_value_locked: Money) -> Percent {
    Percent::ratio(total_borrowed.value(), total_value_locked.value())
}
