//! [`Increase`] of a [`ContractUtility`] definitions.

use common::{unit, DateOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use common::Date;

use super::NegativeAmount;
#[cfg(doc)]
use super::ContractUtility;

/// Adjustment of the charged amount of a [`ContractUtility`].
#[derive(Clone, Debug, PartialEq)]
pub struct Increase {
    /// ID of this [`Increase`].
    pub id: Id,

    /// ID of the adjusted [`ContractUtility`].
    pub contract_utility_id: super::Id,

    /// [`Date`] this [`Increase`] takes effect at.
    pub date: AdjustmentDate,

    /// Adjusted charge amount.
    pub amount: Decimal,
}

impl Increase {
    /// Checks the invariants of this [`Increase`].
    ///
    /// # Errors
    ///
    /// With [`NegativeAmount`] if its amount is negative.
    pub fn validate(&self) -> Result<(), NegativeAmount> {
        if self.amount < Decimal::ZERO {
            Err(NegativeAmount)
        } else {
            Ok(())
        }
    }
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

/// Partial update of an [`Increase`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Patch {
    /// New [`Date`] the [`Increase`] takes effect at.
    pub date: Option<AdjustmentDate>,

    /// New adjusted amount.
    pub amount: Option<Decimal>,
}

impl Patch {
    /// Merges this [`Patch`] onto the provided [`Increase`].
    ///
    /// # Errors
    ///
    /// If the resulting [`Increase`] has a negative amount.
    pub fn apply(
        self,
        increase: &Increase,
    ) -> Result<Increase, NegativeAmount> {
        let mut merged = increase.clone();
        if let Some(date) = self.date {
            merged.date = date;
        }
        if let Some(amount) = self.amount {
            merged.amount = amount;
        }
        merged.validate()?;
        Ok(merged)
    }
}

/// [`Date`] an [`Increase`] takes effect at.
pub type AdjustmentDate = DateOf<(Increase, unit::Adjustment)>;
