//! [`Guarantor`] definitions.

use std::{str::FromStr, sync::LazyLock};

use derive_more::{AsRef, Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{contract, user::Email};
#[cfg(doc)]
use crate::domain::Contract;

/// Third party financially backing tenants of [`Contract`]s.
#[derive(Clone, Debug, PartialEq)]
pub struct Guarantor {
    /// ID of this [`Guarantor`].
    pub id: Id,

    /// Full [`Name`] of this [`Guarantor`].
    pub name: Name,

    /// [`Email`] of this [`Guarantor`], unique across all of them.
    pub email: Email,

    /// [`Phone`] of this [`Guarantor`], unique across all of them.
    pub phone: Phone,
}

/// ID of a [`Guarantor`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    derive_more::FromStr,
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

/// Full name of a [`Guarantor`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`] if the given `name` is not blank.
    ///
    /// Surrounding whitespace is trimmed.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Option<Self> {
        let name = name.as_ref().trim();
        (!name.is_empty() && name.len() <= 256).then(|| Self(name.to_owned()))
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Phone number of a [`Guarantor`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Phone(String);

impl Phone {
    /// Creates a new [`Phone`] if the given `number` is valid.
    ///
    /// Surrounding whitespace is trimmed.
    #[must_use]
    pub fn new(number: impl AsRef<str>) -> Option<Self> {
        let number = number.as_ref().trim();
        Self::check(number).then(|| Self(number.to_owned()))
    }

    /// Checks whether the given `number` is a valid [`Phone`].
    fn check(number: &str) -> bool {
        /// Regular expression checking [`Phone`] format: digits, optionally
        /// prefixed with `+` and grouped with spaces, dashes or parentheses.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^\+?[0-9()\- ]*[0-9][0-9()\- ]*$")
                .expect("valid regex")
        });

        number.len() <= 32 && REGEX.is_match(number)
    }
}

impl FromStr for Phone {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Phone`")
    }
}

/// Link between a [`Guarantor`] and a [`Contract`] it backs.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Link {
    /// ID of the linked [`Guarantor`].
    pub guarantor_id: Id,

    /// ID of the linked [`Contract`].
    pub contract_id: contract::Id,
}

#[cfg(test)]
mod spec {
    use super::{Name, Phone};

    #[test]
    fn name_is_not_blank() {
        assert_eq!(
            Name::new("  Ana Gómez ").unwrap().to_string(),
            "Ana Gómez",
        );
        assert!(Name::new("   ").is_none());
        assert!(Name::new("").is_none());
    }

    #[test]
    fn phone_format() {
        assert!(Phone::new("+54 9 11 5555-1234").is_some());
        assert!(Phone::new("(011) 4444 5555").is_some());
        assert_eq!(Phone::new(" 1234 ").unwrap().to_string(), "1234");

        assert!(Phone::new("").is_none());
        assert!(Phone::new("  ").is_none());
        assert!(Phone::new("call me").is_none());
        assert!(Phone::new("--").is_none());
    }
}
