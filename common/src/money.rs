//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use rust_decimal::{prelude::ToPrimitive as _, Decimal};

use crate::define_kind;

/// Amount of money in some [`Currency`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Creates a new [`Money`] if the provided `amount` is not negative.
    #[must_use]
    pub fn non_negative(amount: Decimal, currency: Currency) -> Option<Self> {
        (amount >= Decimal::ZERO).then_some(Self { amount, currency })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        match amount.is_integer().then(|| amount.to_i128()).flatten() {
            Some(int) => write!(f, "{int}{currency}"),
            None => write!(f, "{amount}{currency}"),
        }
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 || !s.is_char_boundary(s.len() - 3) {
            return Err("too short");
        }

        let (amount, currency) = s.split_at(s.len() - 3);
        let amount = Decimal::from_str(amount).map_err(|_| "invalid amount")?;
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        Ok(Self { amount, currency })
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "Argentine Peso."]
        #[code = "ARS"]
        Ars = 1,

        #[doc = "US Dollar."]
        #[code = "USD"]
        Usd = 2,
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::{Currency, Money};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(
            Money::from_str("123.45USD").unwrap(),
            Money {
                amount: decimal("123.45"),
                currency: Currency::Usd,
            },
        );

        assert_eq!(
            Money::from_str("150000ARS").unwrap(),
            Money {
                amount: decimal("150000"),
                currency: Currency::Ars,
            },
        );

        assert!(Money::from_str("123.45").is_err());
        assert!(Money::from_str("123.45Us").is_err());
        assert!(Money::from_str("123.45EUR").is_err());
        assert!(Money::from_str("123.45Usdollar").is_err());

        assert!(Money::from_str("123.00USD").is_ok());
        assert!(Money::from_str("123USD").is_ok());
    }

    #[test]
    fn to_string() {
        assert_eq!(
            Money {
                amount: decimal("123.45"),
                currency: Currency::Usd,
            }
            .to_string(),
            "123.45USD",
        );
        assert_eq!(
            Money {
                amount: decimal("1500.00"),
                currency: Currency::Ars,
            }
            .to_string(),
            "1500ARS",
        );
    }

    #[test]
    fn non_negative() {
        assert!(Money::non_negative(decimal("0"), Currency::Ars).is_some());
        assert!(Money::non_negative(decimal("10.5"), Currency::Usd).is_some());
        assert!(Money::non_negative(decimal("-0.01"), Currency::Ars).is_none());
    }

    #[test]
    fn currency_codes() {
        assert_eq!(Currency::Ars.to_string(), "ARS");
        assert_eq!("USD".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!(Currency::Usd.code(), "USD");
    }
}
