//! [`Property`] definitions.

use common::define_kind;
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Property resolved from the external property service.
#[derive(Clone, Copy, Debug)]
pub struct Property {
    /// ID of this [`Property`].
    pub id: Id,

    /// Current [`Status`] of this [`Property`].
    pub status: Status,
}

/// ID of a [`Property`].
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
    #[doc = "Availability status of a [`Property`]."]
    enum Status {
        #[doc = "[`Property`] can be rented."]
        #[code = "DISPONIBLE"]
        Available = 1,

        #[doc = "[`Property`] is rented under a contract."]
        #[code = "ALQUILADA"]
        Rented = 2,

        #[doc = "[`Property`] is sold."]
        #[code = "VENDIDA"]
        Sold = 3,

        #[doc = "[`Property`] is reserved."]
        #[code = "RESERVADA"]
        Reserved = 4,
    }
}
