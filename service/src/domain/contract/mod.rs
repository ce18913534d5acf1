//! [`Contract`] definitions.

mod patch;
mod status;

use common::{define_kind, unit, Currency, Date, DateOf, Money};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{index, property, user, Note};
#[cfg(doc)]
use crate::domain::{Increase, Index, Property, User};

pub use self::{
    patch::Patch,
    status::{Effect, Status, Transition},
};

/// Rental agreement between a tenant [`User`] and a [`Property`].
#[derive(Clone, Debug, PartialEq)]
pub struct Contract {
    /// ID of this [`Contract`].
    pub id: Id,

    /// ID of the tenant [`User`].
    pub user_id: user::Id,

    /// ID of the rented [`Property`].
    pub property_id: property::Id,

    /// [`Kind`] of this [`Contract`].
    pub kind: Kind,

    /// [`Date`] this [`Contract`] starts at.
    pub start_date: StartDate,

    /// [`Date`] this [`Contract`] ends at.
    pub end_date: EndDate,

    /// Current [`Status`] of this [`Contract`].
    pub status: Status,

    /// Rent amount this [`Contract`] starts with.
    ///
    /// Its [`Currency`] is the currency of the whole [`Contract`].
    pub initial_amount: Money,

    /// ID of the [`Index`] rent adjustments are computed from.
    pub adjustment_index_id: index::Id,

    /// How often the rent is adjusted.
    pub adjustment_frequency: Frequency,

    /// Amount of the last recorded rent payment.
    pub last_paid_amount: Option<Decimal>,

    /// [`Date`] of the last recorded rent payment.
    pub last_paid_date: Option<PaymentDate>,

    /// Free-text [`Note`] about this [`Contract`].
    pub note: Option<Note>,

    /// Security [`Deposit`], if any.
    pub deposit: Option<Deposit>,
}

impl Contract {
    /// Returns [`Currency`] of this [`Contract`].
    #[must_use]
    pub fn currency(&self) -> Currency {
        self.initial_amount.currency
    }

    /// Returns whether this [`Contract`] is [`Status::Active`].
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    /// Returns whether this [`Contract`] has already lapsed by the provided
    /// `today`.
    #[must_use]
    pub fn has_lapsed(&self, today: Date) -> bool {
        self.end_date.coerce() <= today
    }

    /// Returns whether this [`Contract`] ends within a calendar month
    /// from the provided `today` (inclusively).
    #[must_use]
    pub fn expires_within_month(&self, today: Date) -> bool {
        today
            .checked_add_months(1)
            .map_or(true, |limit| self.end_date.coerce() <= limit)
    }

    /// Returns [`Date`] of the next rent adjustment, counted from the `latest`
    /// [`Increase`] date.
    ///
    /// [`None`] is returned if the date is out of the supported range.
    #[must_use]
    pub fn next_adjustment_date(&self, latest: Date) -> Option<Date> {
        latest.checked_add_months(self.adjustment_frequency.months())
    }

    /// Checks the invariants of this [`Contract`].
    ///
    /// # Errors
    ///
    /// With the first violated invariant.
    pub fn validate(&self) -> Result<(), Violation> {
        if self.end_date.coerce::<()>() <= self.start_date.coerce() {
            return Err(Violation::InvertedPeriod);
        }
        let negative = self.initial_amount.amount < Decimal::ZERO
            || self.last_paid_amount.is_some_and(|a| a < Decimal::ZERO)
            || self.deposit.as_ref().is_some_and(|d| d.amount < Decimal::ZERO);
        if negative {
            return Err(Violation::NegativeAmount);
        }
        Ok(())
    }
}

/// Returns whether the provided `target` [`Date`] is exactly one calendar
/// month after `today`.
///
/// The month is counted backwards from the `target`, so every `target` is
/// matched by exactly one `today`, even when the day of the month doesn't
/// exist in the previous month (`03-29`, `03-30` and `03-31` are all matched
/// on `02-28` of a non-leap year).
#[must_use]
pub fn is_one_month_ahead(target: Date, today: Date) -> bool {
    target.checked_sub_months(1) == Some(today)
}

/// ID of a [`Contract`].
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
    #[doc = "Kind of a [`Contract`]."]
    enum Kind {
        #[doc = "Housing rent."]
        #[code = "VIVIENDA"]
        Housing = 1,

        #[doc = "Commercial rent."]
        #[code = "COMERCIAL"]
        Commercial = 2,
    }
}

/// Number of months between rent adjustments of a [`Contract`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Frequency(i16);

impl Frequency {
    /// Creates a new [`Frequency`] if the provided number of `months` is
    /// within `1..=120`.
    #[must_use]
    pub fn new(months: u16) -> Option<Self> {
        (1..=120)
            .contains(&months)
            .then(|| i16::try_from(months).ok().map(Self))
            .flatten()
    }

    /// Returns the number of months.
    #[must_use]
    pub fn months(self) -> i32 {
        self.0.into()
    }
}

/// Inclusive range of [`Date`]s selecting the [`Contract`]s lasting within
/// it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Period {
    /// Earliest start [`Date`] of a selected [`Contract`].
    pub from: Date,

    /// Latest end [`Date`] of a selected [`Contract`].
    pub to: Date,
}

impl Period {
    /// Returns whether the provided [`Contract`] starts and ends within this
    /// [`Period`].
    #[must_use]
    pub fn contains(&self, contract: &Contract) -> bool {
        self.from <= contract.start_date.coerce()
            && contract.end_date.coerce() <= self.to
    }
}

/// Security deposit of a [`Contract`].
///
/// Its [`Currency`] is the one of the [`Contract`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Deposit {
    /// Deposited amount.
    pub amount: Decimal,

    /// Free-text [`Note`] about this [`Deposit`].
    pub note: Option<Note>,
}

impl Deposit {
    /// Builds an optional [`Deposit`] out of the flag and the amount, which
    /// must agree with each other.
    ///
    /// # Errors
    ///
    /// - [`Violation::DepositAmountMissing`] if the flag is set without an
    ///   amount;
    /// - [`Violation::DepositAmountUnexpected`] if an amount is given without
    ///   the flag;
    /// - [`Violation::NegativeAmount`] if the amount is negative.
    pub fn from_parts(
        has_deposit: bool,
        amount: Option<Decimal>,
        note: Option<Note>,
    ) -> Result<Option<Self>, Violation> {
        match (has_deposit, amount) {
            (true, Some(amount)) if amount < Decimal::ZERO => {
                Err(Violation::NegativeAmount)
            }
            (true, Some(amount)) => Ok(Some(Self { amount, note })),
            (true, None) => Err(Violation::DepositAmountMissing),
            (false, Some(_)) => Err(Violation::DepositAmountUnexpected),
            (false, None) => Ok(None),
        }
    }
}

/// Violation of a [`Contract`] invariant.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum Violation {
    /// End date is not strictly after the start date.
    #[display("end date must be after the start date")]
    InvertedPeriod,

    /// Some amount is negative.
    #[display("amounts must not be negative")]
    NegativeAmount,

    /// Deposit is declared without an amount.
    #[display("deposit amount is required when a deposit is declared")]
    DepositAmountMissing,

    /// Deposit amount is given without declaring a deposit.
    #[display("deposit amount is given without declaring a deposit")]
    DepositAmountUnexpected,
}

/// [`Date`] a [`Contract`] starts at.
pub type StartDate = DateOf<(Contract, unit::Start)>;

/// [`Date`] a [`Contract`] ends at.
pub type EndDate = DateOf<(Contract, unit::End)>;

/// [`Date`] of a [`Contract`] rent payment.
pub type PaymentDate = DateOf<(Contract, unit::Payment)>;
