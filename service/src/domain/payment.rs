//! [`Payment`] definitions.

use common::{define_kind, Currency, Date, Money};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{commission, contract, contract_utility, Note};
#[cfg(doc)]
use crate::domain::{Commission, Contract, ContractUtility};

/// Payment recorded against a [`Contract`].
#[derive(Clone, Debug, PartialEq)]
pub struct Payment {
    /// ID of this [`Payment`].
    pub id: Id,

    /// ID of the [`Contract`] this [`Payment`] is recorded against.
    pub contract_id: contract::Id,

    /// Paid amount.
    pub amount: Money,

    /// [`Date`] this [`Payment`] was made at.
    pub date: Date,

    /// Free-text description of this [`Payment`].
    pub description: Option<Note>,

    /// What this [`Payment`] is for.
    pub concept: Concept,
}

impl Payment {
    /// Returns [`Currency`] of this [`Payment`].
    #[must_use]
    pub fn currency(&self) -> Currency {
        self.amount.currency
    }

    /// Checks the invariants of this [`Payment`].
    ///
    /// # Errors
    ///
    /// If its amount is negative.
    pub fn validate(&self) -> Result<(), Violation> {
        if self.amount.amount < Decimal::ZERO {
            Err(Violation::NegativeAmount)
        } else {
            Ok(())
        }
    }
}

/// ID of a [`Payment`].
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

/// What a [`Payment`] is for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Concept {
    /// Rent of the [`Contract`].
    Rent,

    /// Charge of a [`ContractUtility`] of the [`Contract`].
    Utility(contract_utility::Id),

    /// [`Commission`] of the [`Contract`].
    Commission(commission::Id),
}

impl Concept {
    /// Returns the [`ConceptKind`] of this [`Concept`].
    #[must_use]
    pub fn kind(self) -> ConceptKind {
        match self {
            Self::Rent => ConceptKind::Rent,
            Self::Utility(_) => ConceptKind::Utility,
            Self::Commission(_) => ConceptKind::Commission,
        }
    }

    /// Assembles a [`Concept`] out of its persisted parts.
    ///
    /// # Errors
    ///
    /// If the referenced entity doesn't correspond to the [`ConceptKind`].
    pub fn from_parts(
        kind: ConceptKind,
        contract_utility_id: Option<contract_utility::Id>,
        commission_id: Option<commission::Id>,
    ) -> Result<Self, Violation> {
        match (kind, contract_utility_id, commission_id) {
            (ConceptKind::Rent, None, None) => Ok(Self::Rent),
            (ConceptKind::Utility, Some(id), None) => Ok(Self::Utility(id)),
            (ConceptKind::Commission, None, Some(id)) => {
                Ok(Self::Commission(id))
            }
            (ConceptKind::Utility, None, _) => {
                Err(Violation::ContractUtilityMissing)
            }
            (ConceptKind::Commission, _, None) => {
                Err(Violation::CommissionMissing)
            }
            (ConceptKind::Rent | ConceptKind::Utility, _, Some(_))
            | (ConceptKind::Rent | ConceptKind::Commission, Some(_), _) => {
                Err(Violation::UnexpectedReference)
            }
        }
    }

    /// Returns the referenced [`ContractUtility`] ID, if any.
    #[must_use]
    pub fn contract_utility_id(self) -> Option<contract_utility::Id> {
        match self {
            Self::Utility(id) => Some(id),
            Self::Rent | Self::Commission(_) => None,
        }
    }

    /// Returns the referenced [`Commission`] ID, if any.
    #[must_use]
    pub fn commission_id(self) -> Option<commission::Id> {
        match self {
            Self::Commission(id) => Some(id),
            Self::Rent | Self::Utility(_) => None,
        }
    }
}

define_kind! {
    #[doc = "Kind of a [`Concept`]."]
    enum ConceptKind {
        #[doc = "[`Concept::Rent`]."]
        #[code = "ALQUILER"]
        Rent = 1,

        #[doc = "[`Concept::Utility`]."]
        #[code = "SERVICIO"]
        Utility = 2,

        #[doc = "[`Concept::Commission`]."]
        #[code = "COMISION"]
        Commission = 3,
    }
}

/// Violation of a [`Payment`] invariant.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum Violation {
    /// Amount is negative.
    #[display("amount must not be negative")]
    NegativeAmount,

    /// Utility payment doesn't reference a [`ContractUtility`].
    #[display("utility payment must reference a contract utility")]
    ContractUtilityMissing,

    /// Commission payment doesn't reference a [`Commission`].
    #[display("commission payment must reference a commission")]
    CommissionMissing,

    /// Payment references an entity its concept doesn't allow.
    #[display("payment references an entity its concept doesn't allow")]
    UnexpectedReference,
}
