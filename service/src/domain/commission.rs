//! [`Commission`] definitions.

use std::collections::{BTreeMap, HashMap};

use common::{define_kind, Currency, Date, Money, YearMonth};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{contract, Note};
#[cfg(doc)]
use crate::domain::Contract;

/// Fee charged by the agency for a [`Contract`].
#[derive(Clone, Debug, PartialEq)]
pub struct Commission {
    /// ID of this [`Commission`].
    pub id: Id,

    /// ID of the [`Contract`] this [`Commission`] is charged for.
    pub contract_id: contract::Id,

    /// Total charged amount.
    pub amount: Money,

    /// [`Date`] this [`Commission`] is charged at.
    pub date: Date,

    /// How this [`Commission`] is paid.
    pub payment_type: PaymentType,

    /// Number of installments this [`Commission`] is paid in.
    pub installments: Installments,

    /// Current [`Status`] of this [`Commission`].
    pub status: Status,

    /// Free-text [`Note`] about this [`Commission`].
    pub note: Option<Note>,
}

impl Commission {
    /// Checks the invariants of this [`Commission`].
    ///
    /// # Errors
    ///
    /// With the first violated invariant.
    pub fn validate(&self) -> Result<(), Violation> {
        if self.amount.amount < Decimal::ZERO {
            return Err(Violation::NegativeAmount);
        }
        if self.payment_type == PaymentType::LumpSum
            && self.installments != Installments::ONE
        {
            return Err(Violation::InstallmentsOfLumpSum);
        }
        Ok(())
    }

    /// Checks whether this [`Commission`] matches the provided [`Filter`].
    #[must_use]
    pub fn matches(&self, filter: &Filter) -> bool {
        let Filter {
            status,
            currency,
            dates,
        } = filter;
        status.map_or(true, |s| self.status == s)
            && currency.map_or(true, |c| self.amount.currency == c)
            && dates.map_or(true, |(from, to)| {
                from <= self.date && self.date <= to
            })
    }
}

/// ID of a [`Commission`].
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

define_kind! {
    #[doc = "Way a [`Commission`] is paid."]
    enum PaymentType {
        #[doc = "Single payment."]
        #[code = "PAGO_COMPLETO"]
        LumpSum = 1,

        #[doc = "Several installments."]
        #[code = "CUOTAS"]
        Installments = 2,
    }
}

define_kind! {
    #[doc = "Status of a [`Commission`]."]
    enum Status {
        #[doc = "[`Commission`] is not paid yet."]
        #[code = "PENDIENTE"]
        Pending = 1,

        #[doc = "[`Commission`] is paid."]
        #[code = "PAGADA"]
        Paid = 2,
    }
}

/// Number of installments a [`Commission`] is paid in.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Installments(i16);

impl Installments {
    /// Single installment.
    pub const ONE: Self = Self(1);

    /// Creates new [`Installments`] if the provided `count` is positive.
    #[must_use]
    pub fn new(count: u16) -> Option<Self> {
        (count >= 1)
            .then(|| i16::try_from(count).ok().map(Self))
            .flatten()
    }

    /// Returns the number of installments.
    #[must_use]
    pub fn count(self) -> u16 {
        self.0.unsigned_abs()
    }
}

/// Violation of a [`Commission`] invariant.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum Violation {
    /// Amount is negative.
    #[display("amount must not be negative")]
    NegativeAmount,

    /// [`PaymentType::LumpSum`] is split into several installments.
    #[display("lump sum commission must have a single installment")]
    InstallmentsOfLumpSum,
}

/// Filter of [`Commission`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct Filter {
    /// [`Status`] to match, if any.
    pub status: Option<Status>,

    /// [`Currency`] to match, if any.
    pub currency: Option<Currency>,

    /// Inclusive range of [`Date`]s to match, if any.
    pub dates: Option<(Date, Date)>,
}

/// Sums the amounts of the provided [`Commission`]s.
pub fn total<'a, I>(commissions: I) -> Decimal
where
    I: IntoIterator<Item = &'a Commission>,
{
    commissions.into_iter().map(|c| c.amount.amount).sum()
}

/// Sums the amounts of the provided [`Commission`]s per [`YearMonth`].
///
/// Months without any [`Commission`] are omitted.
pub fn monthly_totals<'a, I>(commissions: I) -> BTreeMap<YearMonth, Decimal>
where
    I: IntoIterator<Item = &'a Commission>,
{
    commissions
        .into_iter()
        .fold(BTreeMap::new(), |mut totals, c| {
            *totals.entry(c.date.year_month()).or_default() += c.amount.amount;
            totals
        })
}

/// Counts the provided [`Commission`]s per [`Status`].
///
/// Every [`Status`] is present in the result, even without [`Commission`]s.
pub fn count_by_status<'a, I>(commissions: I) -> HashMap<Status, u64>
where
    I: IntoIterator<Item = &'a Commission>,
{
    let mut counts: HashMap<_, _> =
        Status::ALL.iter().map(|s| (*s, 0)).collect();
    for c in commissions {
        *counts.entry(c.status).or_default() += 1;
    }
    counts
}

#[cfg(test)]
pub(crate) mod spec {
    use common::{Currency, Date, Money, YearMonth};
    use rust_decimal::Decimal;

    use crate::domain::contract;

    use super::{
        count_by_status, monthly_totals, total, Commission, Filter, Id,
        Installments, PaymentType, Status, Violation,
    };

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    pub(crate) fn commission(
        contract_id: contract::Id,
        on: &str,
        amount: i64,
        currency: Currency,
        status: Status,
    ) -> Commission {
        Commission {
            id: Id::new(),
            contract_id,
            amount: Money {
                amount: Decimal::from(amount),
                currency,
            },
            date: date(on),
            payment_type: PaymentType::LumpSum,
            installments: Installments::ONE,
            status,
            note: None,
        }
    }

    #[test]
    fn installments_are_positive() {
        assert!(Installments::new(0).is_none());
        assert_eq!(Installments::new(3).map(Installments::count), Some(3));
    }

    #[test]
    fn lump_sum_is_single_installment() {
        let mut c = commission(
            contract::Id::new(),
            "2024-01-10",
            100,
            Currency::Ars,
            Status::Pending,
        );
        assert_eq!(c.validate(), Ok(()));

        c.installments = Installments::new(3).unwrap();
        assert_eq!(c.validate(), Err(Violation::InstallmentsOfLumpSum));

        c.payment_type = PaymentType::Installments;
        assert_eq!(c.validate(), Ok(()));

        c.amount.amount = Decimal::from(-1);
        assert_eq!(c.validate(), Err(Violation::NegativeAmount));
    }

    #[test]
    fn filters_and_aggregates() {
        let id = contract::Id::new();
        let all = [
            commission(id, "2024-01-10", 100, Currency::Ars, Status::Pending),
            commission(id, "2024-01-20", 50, Currency::Ars, Status::Paid),
            commission(id, "2024-03-05", 70, Currency::Ars, Status::Pending),
            commission(id, "2024-03-05", 9, Currency::Usd, Status::Pending),
        ];

        let pending_ars = Filter {
            status: Some(Status::Pending),
            currency: Some(Currency::Ars),
            dates: None,
        };
        assert_eq!(
            total(all.iter().filter(|c| c.matches(&pending_ars))),
            Decimal::from(170),
        );

        let january = Filter {
            currency: Some(Currency::Ars),
            dates: Some((date("2024-01-01"), date("2024-01-31"))),
            ..Filter::default()
        };
        assert_eq!(
            total(all.iter().filter(|c| c.matches(&january))),
            Decimal::from(150),
        );

        let ars = Filter {
            currency: Some(Currency::Ars),
            ..Filter::default()
        };
        let monthly = monthly_totals(all.iter().filter(|c| c.matches(&ars)));
        assert_eq!(monthly.len(), 2);
        assert_eq!(
            monthly[&YearMonth {
                year: 2024,
                month: 1
            }],
            Decimal::from(150),
        );
        assert_eq!(
            monthly[&YearMonth {
                year: 2024,
                month: 3
            }],
            Decimal::from(70),
        );

        let counts = count_by_status(&all);
        assert_eq!(counts[&Status::Pending], 3);
        assert_eq!(counts[&Status::Paid], 1);

        let counts = count_by_status(&Vec::<Commission>::new());
        assert_eq!(counts[&Status::Pending], 0);
        assert_eq!(counts[&Status::Paid], 0);
    }
}
