use crate::entities::{LenderPosition, PoolState};
use crate::error::{LendingError, LendingResult};
use crate::math::pool_ledger;
use crate::value_objects::{Money, Percent};
use rust_decimal::Decimal;

/// Share of each withdrawal realized from accrued interest (10%).
pub const DEFAULT_INTEREST_REDEMPTION_RATIO: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Credits a deposit to a lender's position.
///
/// The share is computed against the pool total *after* the deposit, using
/// the pool as it stands before [`pool_ledger::apply_deposit`] runs.
pub fn deposit(
    position: &LenderPosition,
    pool: &PoolState,
    amount: Money,
) -> LendingResult<LenderPosition> {
    if amount.is_zero() {
        return Err(LendingError::InvalidAmount);
    }
    let principal = position.principal().checked_add(amount)?;
    let pool_total = pool.total_value_locked().checked_add(amount)?;
    LenderPosition::new(
        principal,
        position.earned_interest(),
        Percent::ratio(principal.value(), pool_total.value()),
    )
}

/// Debits a withdrawal using the default 10% interest redemption ratio.
pub fn withdraw(
    position: &LenderPosition,
    pool: &PoolState,
    amount: Money,
) -> LendingResult<LenderPosition> {
    withdraw_with_ratio(position, pool, amount, DEFAULT_INTEREST_REDEMPTION_RATIO)
}

/// Debits a withdrawal from a lender's position.
///
/// `redemption_ratio` of the amount is drawn from accrued interest, the
/// remainder from principal. Interest never goes negative and never exceeds
/// the remaining total value. The share is computed against the pool total
/// after the withdrawal, the same rule [`deposit`] follows.
pub fn withdraw_with_ratio(
    position: &LenderPosition,
    pool: &PoolState,
    amount: Money,
    redemption_ratio: Decimal,
) -> LendingResult<LenderPosition> {
    if amount.is_zero() {
        return Err(LendingError::InvalidAmount);
    }
    if amount > position.total_value() {
        return Err(LendingError::ExceedsBalance {
            requested: amount,
            available: position.total_value(),
        });
    }

    let remaining_total = position.total_value().saturating_sub(amount);
    let interest = amount
        .value()
        .checked_mul(redemption_ratio)
        .and_then(|reduction| position.earned_interest().value().checked_sub(reduction))
        .map(Money::saturating)
        .ok_or(LendingError::InvalidAmount)?
        .min(remaining_total);
    let principal = remaining_total.saturating_sub(interest);

    let pool_after = pool_ledger::apply_withdraw(pool, amount)?;
    LenderPosition::new(
        principal,
        interest,
        Percent::ratio(principal.value(), pool_after.total_value_locked().value()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn money(value: Decimal) -> Money {
        Money::new(value).unwrap()
    }

    fn dashboard_position() -> LenderPosition {
        LenderPosition::new(money(dec!(54000)), money(dec!(3180)), Percent(dec!(4.2))).unwrap()
    }

    #[test]
    fn test_deposit_scenario() {
        let pool = PoolState::dashboard_seed();
        let updated = deposit(&dashboard_position(), &pool, money(dec!(10000))).unwrap();

        assert_eq!(updated.principal().value(), dec!(64000));
        assert_eq!(updated.earned_interest().value(), dec!(3180));
        assert_eq!(updated.total_value().value(), dec!(67180));
        // 64000 / 1260000 * 100
        assert_eq!(updated.share_percentage().0, dec!(5.08));
    }

    #[test]
    fn test_deposit_rejects_zero() {
        let pool = PoolState::dashboard_seed();
        assert_eq!(
            deposit(&dashboard_position(), &pool, Money::ZERO),
            Err(LendingError::InvalidAmount)
        );
    }

    #[test]
    fn test_deposit_beyond_representable_total_is_invalid() {
        let pool = PoolState::dashboard_seed();
        let huge = Money::parse_amount("79228162514264337593543950335").unwrap();
        assert_eq!(
            deposit(&dashboard_position(), &pool, huge),
            Err(LendingError::InvalidAmount)
        );
    }

    #[test]
    fn test_withdraw_scenario() {
        let pool = PoolState::dashboard_seed();
        let updated = withdraw(&dashboard_position(), &pool, money(dec!(5000))).unwrap();

        assert_eq!(updated.earned_interest().value(), dec!(2680));
        assert_eq!(updated.total_value().value(), dec!(52180));
        assert_eq!(updated.principal().value(), dec!(49500));
        // 49500 / 1245000 * 100
        assert_eq!(updated.share_percentage().0, dec!(3.98));
    }

    #[test]
    fn test_withdraw_exceeding_total_value() {
        let pool = PoolState::dashboard_seed();
        let result = withdraw(&dashboard_position(), &pool, money(dec!(60000)));
        assert_eq!(
            result,
            Err(LendingError::ExceedsBalance {
                requested: money(dec!(60000)),
                available: money(dec!(57180)),
            })
        );
    }

    #[test]
    fn test_withdraw_everything() {
        let pool = PoolState::dashboard_seed();
        let updated = withdraw(&dashboard_position(), &pool, money(dec!(57180))).unwrap();

        assert!(updated.total_value().is_zero());
        assert!(updated.principal().is_zero());
        assert!(updated.earned_interest().is_zero());
        assert_eq!(updated.share_percentage(), Percent::ZERO);
    }

    #[test]
    fn test_withdraw_interest_heavy_position_keeps_invariant() {
        let pool = PoolState::dashboard_seed();
        let position = LenderPosition::new(money(dec!(5)), money(dec!(95)), Percent::ZERO).unwrap();
        let updated = withdraw(&position, &pool, money(dec!(50))).unwrap();

        assert_eq!(updated.total_value().value(), dec!(50));
        assert_eq!(updated.earned_interest().value(), dec!(50));
        assert!(updated.principal().is_zero());
    }

    #[test]
    fn test_repeated_withdrawals_track_total_value() {
        let pool = PoolState::dashboard_seed();
        let mut position = dashboard_position();
        let mut expected = position.total_value().value();

        for amount in [dec!(1234.56), dec!(0.01), dec!(999.99), dec!(3333.33)] {
            position = withdraw(&position, &pool, money(amount)).unwrap();
            expected -= amount;
            let drift = (position.total_value().value() - expected).abs();
            assert!(drift <= dec!(0.01), "drift {drift}");
        }
    }
}
