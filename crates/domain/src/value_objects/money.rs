use crate::error::{LendingError, LendingResult};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

/// Number of decimal places kept on every stored amount.
pub const CENT_PRECISION: u32 = 2;

/// A non-negative monetary amount held at cent precision.
///
/// Every constructor rounds to two decimal places, midpoint away from zero,
/// so repeated deposits and withdrawals cannot accumulate drift.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Creates an amount, rejecting negative values.
    pub fn new(value: Decimal) -> LendingResult<Self> {
        let rounded = round_cents(value);
        if rounded.is_zero() {
            return Ok(Self::ZERO);
        }
        if rounded.is_sign_negative() {
            return Err(LendingError::InvalidAmount);
        }
        Ok(Self(rounded))
    }

    /// Creates an amount, flooring negative values at zero.
    #[must_use]
    pub fn saturating(value: Decimal) -> Self {
        Self::new(value.max(Decimal::ZERO)).unwrap_or(Self::ZERO)
    }

    /// Creates a strictly positive amount, as required for user actions.
    pub fn positive(value: Decimal) -> LendingResult<Self> {
        let money = Self::new(value)?;
        if money.is_zero() {
            return Err(LendingError::InvalidAmount);
        }
        Ok(money)
    }

    /// Parses a user-entered amount.
    ///
    /// Empty, non-numeric, zero and negative input all map to
    /// [`LendingError::InvalidAmount`].
    pub fn parse_amount(input: &str) -> LendingResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(LendingError::InvalidAmount);
        }
        let value = Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| LendingError::InvalidAmount)?;
        Self::positive(value)
    }

    /// Converts a float amount, treating NaN and infinities as invalid.
    pub fn from_f64(value: f64) -> LendingResult<Self> {
        if !value.is_finite() {
            return Err(LendingError::InvalidAmount);
        }
        let value = Decimal::from_f64(value).ok_or(LendingError::InvalidAmount)?;
        Self::positive(value)
    }

    /// Returns the underlying decimal.
    #[must_use]
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns true for a zero amount.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Adds two amounts, failing with [`LendingError::InvalidAmount`] when
    /// the sum is not representable.
    pub fn checked_add(self, other: Money) -> LendingResult<Money> {
        self.0
            .checked_add(other.0)
            .map(|sum| Money(round_cents(sum)))
            .ok_or(LendingError::InvalidAmount)
    }

    /// Sums amounts with [`Money::checked_add`].
    pub fn checked_sum<I>(amounts: I) -> LendingResult<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |total, amount| total.checked_add(amount))
    }

    /// Subtracts, flooring the result at zero.
    #[must_use]
    pub fn saturating_sub(self, other: Money) -> Money {
        Money::saturating(self.0 - other.0)
    }
}

fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CENT_PRECISION, RoundingStrategy::MidpointAwayFromZero)
}

/// Saturates at the largest representable amount. Ledger arithmetic goes
/// through [`Money::checked_add`] instead.
impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(round_cents(self.0.saturating_add(rhs.0)))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl TryFrom<Decimal> for Money {
    type Error = LendingError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Money::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl FromStr for Money {
    type Err = LendingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse_amount(s)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
