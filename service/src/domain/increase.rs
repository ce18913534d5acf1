//! [`Increase`] definitions.

use common::{unit, Currency, Date, DateOf, Money, Percent};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{contract, index, Note};
#[cfg(doc)]
use crate::domain::{Contract, Index};

/// Rent adjustment of a [`Contract`].
#[derive(Clone, Debug, PartialEq)]
pub struct Increase {
    /// ID of this [`Increase`].
    pub id: Id,

    /// ID of the adjusted [`Contract`].
    pub contract_id: contract::Id,

    /// ID of the [`Index`] this [`Increase`] is computed from.
    pub index_id: index::Id,

    /// [`Date`] this [`Increase`] takes effect at.
    pub date: AdjustmentDate,

    /// Adjusted rent amount.
    pub amount: Money,

    /// Applied adjustment.
    pub adjustment: Percent,

    /// Free-text [`Note`] about this [`Increase`].
    pub note: Option<Note>,

    /// [`Period`] this [`Increase`] is effective in.
    pub period: Option<Period>,
}

impl Increase {
    /// Returns [`Currency`] of this [`Increase`].
    #[must_use]
    pub fn currency(&self) -> Currency {
        self.amount.currency
    }
}

/// Returns the latest [`Increase`] out of the provided ones.
pub fn latest<'a, I>(increases: I) -> Option<&'a Increase>
where
    I: IntoIterator<Item = &'a Increase>,
{
    increases.into_iter().max_by_key(|i| i.date)
}

/// Returns the latest [`Increase`] already in effect by the provided `today`.
pub fn effective<'a, I>(increases: I, today: Date) -> Option<&'a Increase>
where
    I: IntoIterator<Item = &'a Increase>,
{
    latest(
        increases
            .into_iter()
            .filter(|i| i.date.coerce::<()>() <= today),
    )
}

/// ID of an [`Increase`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Inclusive range of [`Date`]s an [`Increase`] is effective in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Period {
    /// First [`Date`] of this [`Period`].
    from: Date,

    /// Last [`Date`] of this [`Period`].
    to: Date,
}

impl Period {
    /// Creates a new [`Period`] if `to` is not before `from`.
    #[must_use]
    pub fn new(from: Date, to: Date) -> Option<Self> {
        (to >= from).then_some(Self { from, to })
    }

    /// Creates a [`Period`] starting at the provided [`Date`] and lasting
    /// until the next adjustment, `months` later.
    ///
    /// [`None`] is returned if the dates are out of the supported range.
    #[must_use]
    pub fn starting_at(from: Date, months: i32) -> Option<Self> {
        let to = from.checked_add_months(months)?.checked_add_days(-1)?;
        Self::new(from, to)
    }

    /// Returns the first [`Date`] of this [`Period`].
    #[must_use]
    pub fn from(self) -> Date {
        self.from
    }

    /// Returns the last [`Date`] of this [`Period`].
    #[must_use]
    pub fn to(self) -> Date {
        self.to
    }
}

/// [`Date`] an [`Increase`] takes effect at.
pub type AdjustmentDate = DateOf<(Increase, unit::Adjustment)>;

#[cfg(test)]
pub(crate) mod spec {
    use common::{Currency, Date, Money, Percent};
    use rust_decimal::Decimal;

    use crate::domain::{contract, index};

    use super::{effective, latest, Id, Increase, Period};

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    pub(crate) fn increase(
        contract_id: contract::Id,
        on: &str,
        amount: i64,
    ) -> Increase {
        Increase {
            id: Id::new(),
            contract_id,
            index_id: index::Id::new(),
            date: date(on).coerce(),
            amount: Money {
                amount: Decimal::from(amount),
                currency: Currency::Ars,
            },
            adjustment: Percent::new(Decimal::TEN).unwrap(),
            note: None,
            period: None,
        }
    }

    #[test]
    fn period_bounds() {
        assert!(Period::new(date("2024-01-01"), date("2024-01-01")).is_some());
        assert!(Period::new(date("2024-01-02"), date("2024-01-01")).is_none());
    }

    #[test]
    fn period_lasts_until_next_adjustment() {
        let p = Period::starting_at(date("2024-01-31"), 3).unwrap();

        assert_eq!(p.from(), date("2024-01-31"));
        assert_eq!(p.to(), date("2024-04-29"));

        let p = Period::starting_at(date("2024-03-01"), 1).unwrap();
        assert_eq!(p.to(), date("2024-03-31"));
    }

    #[test]
    fn picks_latest() {
        let id = contract::Id::new();
        let all = [
            increase(id, "2024-04-01", 1100),
            increase(id, "2024-10-01", 1331),
            increase(id, "2024-07-01", 1210),
        ];

        assert_eq!(
            latest(&all).map(|i| i.amount.amount),
            Some(Decimal::from(1331)),
        );
        assert_eq!(
            effective(&all, date("2024-09-30")).map(|i| i.amount.amount),
            Some(Decimal::from(1210)),
        );
        assert_eq!(
            effective(&all, date("2024-07-01")).map(|i| i.amount.amount),
            Some(Decimal::from(1210)),
        );
        assert!(effective(&all, date("2024-03-31")).is_none());
        assert!(latest(&Vec::<Increase>::new()).is_none());
    }
}
