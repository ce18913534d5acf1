//! [`ContractUtility`] definitions.

pub mod increase;

use common::{define_kind, unit, Date, DateOf};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{contract, utility, Note};
#[cfg(doc)]
use crate::domain::{Contract, Utility};

pub use self::increase::Increase;

/// Recurring [`Utility`] charge billed through a [`Contract`].
#[derive(Clone, Debug, PartialEq)]
pub struct ContractUtility {
    /// ID of this [`ContractUtility`].
    pub id: Id,

    /// ID of the [`Contract`] this charge is billed through.
    pub contract_id: contract::Id,

    /// ID of the charged [`Utility`].
    pub utility_id: utility::Id,

    /// How often this charge is due.
    pub periodicity: Periodicity,

    /// Amount this charge starts with.
    pub initial_amount: Decimal,

    /// Amount of the last recorded payment.
    pub last_paid_amount: Option<Decimal>,

    /// [`Date`] of the last recorded payment.
    ///
    /// The next due date is derived from it.
    pub last_paid_date: PaymentDate,

    /// Free-text [`Note`] about this charge.
    pub note: Option<Note>,
}

impl ContractUtility {
    /// Returns [`Date`] this charge is due next at.
    ///
    /// [`None`] is returned if the date is out of the supported range.
    #[must_use]
    pub fn next_due_date(&self) -> Option<Date> {
        self.last_paid_date
            .coerce::<()>()
            .checked_add_months(self.periodicity.months())
    }

    /// Returns whether this charge is due exactly at the provided [`Date`].
    #[must_use]
    pub fn is_due_on(&self, date: Date) -> bool {
        self.next_due_date() == Some(date)
    }

    /// Checks the invariants of this [`ContractUtility`].
    ///
    /// # Errors
    ///
    /// With [`NegativeAmount`] if any of its amounts is negative.
    pub fn validate(&self) -> Result<(), NegativeAmount> {
        let negative = self.initial_amount < Decimal::ZERO
            || self.last_paid_amount.is_some_and(|a| a < Decimal::ZERO);
        if negative {
            Err(NegativeAmount)
        } else {
            Ok(())
        }
    }
}

/// ID of a [`ContractUtility`].
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
    #[doc = "How often a [`ContractUtility`] is due."]
    enum Periodicity {
        #[doc = "Every month."]
        #[code = "MENSUAL"]
        Monthly = 1,

        #[doc = "Every two months."]
        #[code = "BIMENSUAL"]
        Bimonthly = 2,

        #[doc = "Every three months."]
        #[code = "TRIMESTRAL"]
        Quarterly = 3,

        #[doc = "Every six months."]
        #[code = "SEMESTRAL"]
        Semiannual = 4,

        #[doc = "Every year."]
        #[code = "ANUAL"]
        Annual = 5,
    }
}

impl Periodicity {
    /// Returns the number of months between charges.
    #[must_use]
    pub const fn months(self) -> i32 {
        match self {
            Self::Monthly => 1,
            Self::Bimonthly => 2,
            Self::Quarterly => 3,
            Self::Semiannual => 6,
            Self::Annual => 12,
        }
    }
}

/// Partial update of a [`ContractUtility`].
#[derive(Clone, Debug, Default)]
pub struct Patch {
    /// New [`Periodicity`].
    pub periodicity: Option<Periodicity>,

    /// New initial amount.
    pub initial_amount: Option<Decimal>,

    /// New last paid amount.
    pub last_paid_amount: Option<Decimal>,

    /// New last payment date.
    pub last_paid_date: Option<PaymentDate>,

    /// New [`Note`].
    pub note: Option<Note>,
}

impl Patch {
    /// Merges this [`Patch`] onto the provided [`ContractUtility`].
    ///
    /// # Errors
    ///
    /// If the resulting [`ContractUtility`] has a negative amount.
    pub fn apply(
        self,
        utility: &ContractUtility,
    ) -> Result<ContractUtility, NegativeAmount> {
        let mut merged = utility.clone();
        if let Some(p) = self.periodicity {
            merged.periodicity = p;
        }
        if let Some(amount) = self.initial_amount {
            merged.initial_amount = amount;
        }
        if let Some(amount) = self.last_paid_amount {
            merged.last_paid_amount = Some(amount);
        }
        if let Some(date) = self.last_paid_date {
            merged.last_paid_date = date;
        }
        if let Some(note) = self.note {
            merged.note = Some(note);
        }
        merged.validate()?;
        Ok(merged)
    }
}

/// Error of a negative amount being provided.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
#[display("amounts must not be negative")]
pub struct NegativeAmount;

/// [`Date`] of a [`ContractUtility`] payment.
pub type PaymentDate = DateOf<(ContractUtility, unit::Payment)>;

#[cfg(test)]
pub(crate) mod spec {
    use common::Date;
    use rust_decimal::Decimal;

    use crate::domain::{contract, utility};

    use super::{ContractUtility, Id, NegativeAmount, Patch, Periodicity};

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    pub(crate) fn contract_utility(
        contract_id: contract::Id,
        last_paid: &str,
        periodicity: Periodicity,
    ) -> ContractUtility {
        ContractUtility {
            id: Id::new(),
            contract_id,
            utility_id: utility::Id::new(),
            periodicity,
            initial_amount: Decimal::from(5000),
            last_paid_amount: None,
            last_paid_date: date(last_paid).coerce(),
            note: None,
        }
    }

    #[test]
    fn next_due_date_follows_periodicity() {
        let id = contract::Id::new();
        let cases = [
            (Periodicity::Monthly, "2024-02-15"),
            (Periodicity::Bimonthly, "2024-03-15"),
            (Periodicity::Quarterly, "2024-04-15"),
            (Periodicity::Semiannual, "2024-07-15"),
            (Periodicity::Annual, "2025-01-15"),
        ];
        for (periodicity, due) in cases {
            let u = contract_utility(id, "2024-01-15", periodicity);

            assert_eq!(u.next_due_date(), Some(date(due)), "{periodicity}");
        }
    }

    #[test]
    fn due_date_is_exact() {
        let u = contract_utility(
            contract::Id::new(),
            "2024-01-31",
            Periodicity::Monthly,
        );

        assert!(u.is_due_on(date("2024-02-29")));
        assert!(!u.is_due_on(date("2024-02-28")));
        assert!(!u.is_due_on(date("2024-03-01")));
    }

    #[test]
    fn patch_merges_given_fields() {
        let u = contract_utility(
            contract::Id::new(),
            "2024-01-15",
            Periodicity::Monthly,
        );

        let patched = Patch {
            periodicity: Some(Periodicity::Quarterly),
            last_paid_amount: Some(Decimal::from(5200)),
            ..Patch::default()
        }
        .apply(&u)
        .unwrap();

        assert_eq!(patched.periodicity, Periodicity::Quarterly);
        assert_eq!(patched.last_paid_amount, Some(Decimal::from(5200)));
        assert_eq!(patched.initial_amount, u.initial_amount);
        assert_eq!(patched.last_paid_date, u.last_paid_date);
        assert_eq!(patched.utility_id, u.utility_id);
    }

    #[test]
    fn patch_rejects_negative_amounts() {
        let u = contract_utility(
            contract::Id::new(),
            "2024-01-15",
            Periodicity::Monthly,
        );

        let res = Patch {
            initial_amount: Some(Decimal::from(-1)),
            ..Patch::default()
        }
        .apply(&u);

        assert_eq!(res, Err(NegativeAmount));
    }
}
