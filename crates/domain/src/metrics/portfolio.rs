use super::PortfolioSlice;
use crate::entities::LenderPosition;
use crate::value_objects::Percent;
use rust_decimal::Decimal;

/// Splits a position into principal and interest shares of its total value.
///
/// An empty position divides by one, so both slices report zero.
pub fn split(position: &LenderPosition) -> [PortfolioSlice; 2] {
    let total = position.total_value().value();
    let denominator = if total.is_zero() { Decimal::ONE } else { total };

    [
        PortfolioSlice {
            label: "Principal",
            value: position.principal(),
            percent: Percent::ratio(position.principal().value(), denominator).rounded(),
        },
        PortfolioSlice {
            label: "Interest",
            value: position.earned_interest(),
            percent: Percent::ratio(position.earned_interest().value(), denominator).rounded(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Money;
    use rust_decimal_macros::dec;

    #[test]
    fn test_split_dashboard_position() {
        let position = LenderPosition::new(
            Money::new(dec!(54000)).unwrap(),
            Money::new(dec!(3180)).unwrap(),
            Percent::ZERO,
        )
        .unwrap();
        let [principal, interest] = split(&position);

        assert_eq!(principal.label, "Principal");
        assert_eq!(principal.percent.0, dec!(94.44));
        assert_eq!(interest.percent.0, dec!(5.56));
    }

    #[test]
    fn test_split_empty_position() {
        let [principal, interest] = split(&LenderPosition::empty());
        assert_eq!(principal.percent, Percent::ZERO);
        assert_eq!(interest.percent, Percent::ZERO);
    }
}
