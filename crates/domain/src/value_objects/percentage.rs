use crate::value_objects::money::CENT_PRECISION;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A percentage on the 0-100 scale (e.g. `Percent(dec!(11.4))` is 11.4%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Percent(pub Decimal);

impl Percent {
    /// Zero percent.
    pub const ZERO: Percent = Percent(Decimal::ZERO);

    /// Converts basis points (1140 bps = 11.40%).
    pub fn from_bps(bps: u32) -> Self {
        Self(Decimal::from(bps) / Decimal::from(100))
    }

    /// Converts to basis points, truncating fractions of a basis point.
    pub fn to_bps(&self) -> u32 {
        self.0
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|bps| bps.to_u32())
            .unwrap_or(0)
    }

    /// `part / whole * 100`, defined as zero when `whole` is zero.
    ///
    /// A quotient too large to represent saturates at `Decimal::MAX`.
    pub fn ratio(part: Decimal, whole: Decimal) -> Self {
        if whole.is_zero() {
            return Self::ZERO;
        }
        let percent = part
            .checked_div(whole)
            .and_then(|quotient| quotient.checked_mul(Decimal::ONE_HUNDRED));
        Self(percent.unwrap_or(Decimal::MAX))
    }

    /// The same percentage as a fraction (11.4% -> 0.114).
    pub fn as_fraction(&self) -> Decimal {
        self.0 / Decimal::ONE_HUNDRED
    }

    /// Rounded to two decimal places for storage and display.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(CENT_PRECISION, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Returns the underlying decimal.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bps_conversion() {
        assert_eq!(Percent::from_bps(1140).0, dec!(11.4));
        assert_eq!(Percent(dec!(12.5)).to_bps(), 1250);
    }

    #[test]
    fn test_ratio_zero_denominator() {
        assert_eq!(Percent::ratio(dec!(10), Decimal::ZERO), Percent::ZERO);
        assert_eq!(Percent::ratio(dec!(786000), dec!(1250000)).0, dec!(62.88));
    }

    #[test]
    fn test_ratio_saturates_instead_of_panicking() {
        assert_eq!(Percent::ratio(Decimal::MAX, dec!(0.01)).0, Decimal::MAX);
        assert_eq!(Percent::ratio(Decimal::MAX, Decimal::ONE).0, Decimal::MAX);
        assert_eq!(Percent(Decimal::MAX).to_bps(), 0);
    }

    #[test]
    fn test_rounded() {
        let share = Percent::ratio(dec!(64000), dec!(1260000)).rounded();
        assert_eq!(share.0, dec!(5.08));
        assert_eq!(share.to_string(), "5.08%");
    }
}
