//! [`Note`] definitions.

use std::str::FromStr;

use derive_more::{AsRef, Display};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::Serialize;

/// Free-text note attached to an entity.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Note(String);

impl Note {
    /// Creates a new [`Note`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `text` is not blank.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Creates a new [`Note`] if the given `text` is valid.
    ///
    /// Surrounding whitespace is trimmed.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        let text = text.trim();
        Self::check(text).then(|| Self(text.to_owned()))
    }

    /// Checks whether the given `text` is a valid [`Note`].
    fn check(text: impl AsRef<str>) -> bool {
        let text = text.as_ref();
        !text.is_empty() && text.len() <= 2048
    }
}

impl FromStr for Note {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Note`")
    }
}
