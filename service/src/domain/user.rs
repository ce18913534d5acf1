//! [`User`] definitions.

use std::{str::FromStr, sync::LazyLock};

use common::define_kind;
use derive_more::{AsRef, Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Platform user, resolved from the external user directory.
#[derive(Clone, Debug)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// First [`Name`] of this [`User`].
    pub first_name: Name,

    /// Last [`Name`] of this [`User`].
    pub last_name: Name,

    /// [`Email`] of this [`User`].
    pub email: Email,
}

impl User {
    /// Returns the full name of this [`User`].
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// ID of a [`User`].
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

/// Name of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `name` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 256
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Email address of a [`User`] (or any other notified party).
#[derive(
    AsRef, Clone, Debug, Display, Eq, Hash, PartialEq, Serialize,
)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `address` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Creates a new [`Email`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Email`].
    fn check(address: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Email`] format: a local part and a
        /// dotted domain without whitespace, separated by a single `@`.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex")
        });

        let address = address.as_ref();
        address.len() <= 320 && REGEX.is_match(address)
    }
}

impl FromStr for Email {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Email`")
    }
}

define_kind! {
    #[doc = "Role of a [`User`] granted by the contract lifecycle."]
    enum Role {
        #[doc = "[`User`] renting a property under an active contract."]
        #[code = "tenant"]
        Tenant = 1,
    }
}

/// Binding of a [`Role`] to a [`User`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RoleBinding {
    /// ID of the [`User`] the [`Role`] is bound to.
    pub user_id: Id,

    /// Bound [`Role`].
    pub role: Role,
}

impl RoleBinding {
    /// Creates a [`Role::Tenant`] binding for the provided [`User`].
    #[must_use]
    pub fn tenant(user_id: Id) -> Self {
        Self {
            user_id,
            role: Role::Tenant,
        }
    }
}

#[cfg(test)]
mod spec {
    use super::Email;

    #[test]
    fn email_format() {
        assert!(Email::new("tenant@example.com").is_some());
        assert!(Email::new("a.b+c@mail.example.org").is_some());

        assert!(Email::new("tenant@example").is_none());
        assert!(Email::new("tenant example@mail.com").is_none());
        assert!(Email::new("@example.com").is_none());
        assert!(Email::new("").is_none());
    }
}
