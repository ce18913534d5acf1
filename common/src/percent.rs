//! [`Percent`]-related definitions.

use std::str::FromStr;

use derive_more::Display;
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::{Decimal, RoundingStrategy};

/// Non-negative percentage (`12.5` means `12.5%`).
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(try_from = "Decimal", into = "Decimal")
)]
pub struct Percent(Decimal);

impl Percent {
    /// Creates a new [`Percent`] by checking the provided value is not
    /// negative.
    ///
    /// Values above `100` are allowed: rent adjustments under high inflation
    /// routinely exceed them.
    #[must_use]
    pub fn new(val: Decimal) -> Option<Self> {
        if val < Decimal::ZERO {
            None
        } else {
            #[expect(
                clippy::allow_attributes,
                reason = "TODO: Remove once clippy is fixed"
            )]
            #[allow(unsafe_code, reason = "invariants checked already")]
            Some(unsafe { Self::new_unchecked(val) })
        }
    }

    /// Creates a new [`Percent`] without performing any validation.
    ///
    /// # Safety
    ///
    /// The provided value must not be negative.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(val: Decimal) -> Self {
        Self(val)
    }

    /// Returns the inner value of this [`Percent`].
    #[must_use]
    pub fn value(self) -> Decimal {
        self.0
    }

    /// Increases the provided `amount` by this [`Percent`], rounding the
    /// result to cents (half away from zero).
    #[must_use]
    pub fn increase(self, amount: Decimal) -> Decimal {
        (amount * (Decimal::ONE + self.0 / Decimal::ONE_HUNDRED))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

impl FromStr for Percent {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s)
            .ok()
            .and_then(Self::new)
            .ok_or("invalid percent value")
    }
}

impl TryFrom<Decimal> for Percent {
    type Error = &'static str;

    fn try_from(val: Decimal) -> Result<Self, Self::Error> {
        Self::new(val).ok_or("negative percent value")
    }
}

impl From<Percent> for Decimal {
    fn from(p: Percent) -> Self {
        p.0
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::Percent;

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(
            Percent::from_str("12.5").unwrap().value(),
            decimal("12.5"),
        );
        assert!(Percent::from_str("0").is_ok());
        assert!(Percent::from_str("250").is_ok());

        assert!(Percent::from_str("-0.01").is_err());
        assert!(Percent::from_str("ten").is_err());
    }

    #[test]
    fn increases_amount() {
        let pct = Percent::from_str("10").unwrap();
        assert_eq!(pct.increase(decimal("1000")), decimal("1100.00"));

        let pct = Percent::from_str("7.5").unwrap();
        assert_eq!(pct.increase(decimal("333.33")), decimal("358.33"));

        let pct = Percent::from_str("0").unwrap();
        assert_eq!(pct.increase(decimal("100.10")), decimal("100.10"));
    }

    #[test]
    fn rounds_half_up() {
        // 100.05 * 1.05 = 105.0525
        let pct = Percent::from_str("5").unwrap();
        assert_eq!(pct.increase(decimal("100.05")), decimal("105.05"));

        // 0.10 * 1.25 = 0.125
        let pct = Percent::from_str("25").unwrap();
        assert_eq!(pct.increase(decimal("0.10")), decimal("0.13"));
    }
}
