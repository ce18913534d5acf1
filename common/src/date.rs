//! Calendar date utilities.

#[cfg(feature = "postgres")]
use std::error::Error as StdError;
use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    str::FromStr,
};

use derive_more::{Debug, Display, Error};
#[cfg(feature = "postgres")]
use postgres_types::{
    accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use time::{util::is_leap_year, Month};

/// Untyped calendar date.
pub type Date = DateOf;

/// Calendar date (without a time and an offset).
#[derive(Debug)]
pub struct DateOf<Of: ?Sized = ()> {
    /// Inner representation of the date.
    inner: time::Date,

    /// Type parameter describing the kind of date.
    #[debug(skip)]
    _of: PhantomData<Of>,
}

impl<Of: ?Sized> DateOf<Of> {
    /// Returns the current date in UTC.
    #[must_use]
    pub fn today() -> Self {
        time::OffsetDateTime::now_utc().date().into()
    }

    /// Creates a new [`Date`] from the provided calendar components.
    ///
    /// [`None`] is returned if the components don't form a valid date.
    #[must_use]
    pub fn from_ymd(year: i32, month: u8, day: u8) -> Option<Self> {
        let month = Month::try_from(month).ok()?;
        time::Date::from_calendar_date(year, month, day)
            .ok()
            .map(Into::into)
    }

    /// Returns the year of this [`Date`].
    #[must_use]
    pub fn year(&self) -> i32 {
        self.inner.year()
    }

    /// Returns the month of this [`Date`] (`1..=12`).
    #[must_use]
    pub fn month(&self) -> u8 {
        self.inner.month().into()
    }

    /// Returns the day of the month of this [`Date`] (`1..=31`).
    #[must_use]
    pub fn day(&self) -> u8 {
        self.inner.day()
    }

    /// Returns the [`YearMonth`] this [`Date`] belongs to.
    #[must_use]
    pub fn year_month(&self) -> YearMonth {
        YearMonth {
            year: self.year(),
            month: self.month(),
        }
    }

    /// Adds the provided number of calendar months to this [`Date`].
    ///
    /// The day of the month is kept, unless it doesn't exist in the resulting
    /// month, in which case the last day of that month is used (so
    /// `2024-01-31` plus one month is `2024-02-29`).
    ///
    /// [`None`] is returned if the result is out of the supported range.
    #[must_use]
    pub fn checked_add_months(self, months: i32) -> Option<Self> {
        let index = self
            .year()
            .checked_mul(12)?
            .checked_add(i32::from(self.month()) - 1)?
            .checked_add(months)?;
        let year = index.div_euclid(12);
        let month = Month::try_from(
            u8::try_from(index.rem_euclid(12) + 1).ok()?,
        )
        .ok()?;
        let day = self.day().min(days_in_month(year, month));
        time::Date::from_calendar_date(year, month, day)
            .ok()
            .map(Into::into)
    }

    /// Subtracts the provided number of calendar months from this [`Date`].
    ///
    /// Clamps the day of the month the same way as
    /// [`DateOf::checked_add_months()`] does.
    #[must_use]
    pub fn checked_sub_months(self, months: i32) -> Option<Self> {
        self.checked_add_months(months.checked_neg()?)
    }

    /// Adds the provided number of days to this [`Date`].
    ///
    /// [`None`] is returned if the result is out of the supported range.
    #[must_use]
    pub fn checked_add_days(self, days: i64) -> Option<Self> {
        self.inner
            .checked_add(time::Duration::days(days))
            .map(Into::into)
    }

    /// Coerces one kind of [`Date`] into another.
    #[must_use]
    pub fn coerce<NewOf: ?Sized>(self) -> DateOf<NewOf> {
        DateOf {
            inner: self.inner,
            _of: PhantomData,
        }
    }
}

/// Returns the number of days in the provided `month` of the `year`.
fn days_in_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

impl<Of: ?Sized> fmt::Display for DateOf<Of> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year(), self.month(), self.day())
    }
}

impl<Of: ?Sized> FromStr for DateOf<Of> {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '-');
        let mut next = || parts.next().ok_or(ParseError::Format);

        let year = next()?.parse().map_err(|_| ParseError::Format)?;
        let month = next()?.parse().map_err(|_| ParseError::Format)?;
        let day = next()?.parse().map_err(|_| ParseError::Format)?;

        Self::from_ymd(year, month, day).ok_or(ParseError::ComponentRange)
    }
}

/// Error of parsing a [`Date`] from a `YYYY-MM-DD` string.
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum ParseError {
    /// String is not in a `YYYY-MM-DD` format.
    #[display("expected `YYYY-MM-DD` format")]
    Format,

    /// Parsed date has an out of range component.
    #[display("date component is out of range")]
    ComponentRange,
}

impl<Of: ?Sized> From<time::Date> for DateOf<Of> {
    fn from(inner: time::Date) -> Self {
        Self {
            inner,
            _of: PhantomData,
        }
    }
}

impl<Of: ?Sized> From<DateOf<Of>> for time::Date {
    fn from(date: DateOf<Of>) -> Self {
        date.inner
    }
}

impl<Of: ?Sized> Copy for DateOf<Of> {}
impl<Of: ?Sized> Clone for DateOf<Of> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Of: ?Sized> Eq for DateOf<Of> {}
impl<Of: ?Sized> PartialEq for DateOf<Of> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<Of: ?Sized> Hash for DateOf<Of> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl<Of: ?Sized> Ord for DateOf<Of> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<Of: ?Sized> PartialOrd for DateOf<Of> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> FromSql<'_> for DateOf<Of> {
    accepts!(DATE);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        time::Date::from_sql(ty, raw).map(Into::into)
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> ToSql for DateOf<Of> {
    accepts!(DATE);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.inner.to_sql(ty, w)
    }
}

#[cfg(feature = "serde")]
mod serde {
    //! Module providing integration with [`serde`] crate.

    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    use super::DateOf;

    impl<Of: ?Sized> Serialize for DateOf<Of> {
        fn serialize<S: Serializer>(
            &self,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            serializer.collect_str(self)
        }
    }

    impl<'de, Of: ?Sized> Deserialize<'de> for DateOf<Of> {
        fn deserialize<D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Self, D::Error> {
            String::deserialize(deserializer)?
                .parse()
                .map_err(D::Error::custom)
        }
    }
}

/// Month of a specific year.
#[derive(
    Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd,
)]
#[display("{year:04}-{month:02}")]
pub struct YearMonth {
    /// Year.
    pub year: i32,

    /// Month of the [`YearMonth::year`] (`1..=12`).
    pub month: u8,
}

#[cfg(test)]
mod spec {
    use super::Date;

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    #[test]
    fn parses_and_prints() {
        assert_eq!(date("2024-03-05").to_string(), "2024-03-05");
        assert_eq!(date("0999-12-31").to_string(), "0999-12-31");

        assert!("2024-02-30".parse::<Date>().is_err());
        assert!("2024-13-01".parse::<Date>().is_err());
        assert!("2024/03/05".parse::<Date>().is_err());
        assert!("2024-03".parse::<Date>().is_err());
    }

    #[test]
    fn adds_calendar_months() {
        assert_eq!(
            date("2024-01-15").checked_add_months(1),
            Some(date("2024-02-15")),
        );
        assert_eq!(
            date("2024-11-30").checked_add_months(3),
            Some(date("2025-02-28")),
        );
        assert_eq!(
            date("2024-12-31").checked_add_months(12),
            Some(date("2025-12-31")),
        );
        assert_eq!(
            date("2023-12-15").checked_add_months(0),
            Some(date("2023-12-15")),
        );
    }

    #[test]
    fn clamps_to_month_end() {
        assert_eq!(
            date("2024-01-31").checked_add_months(1),
            Some(date("2024-02-29")),
        );
        assert_eq!(
            date("2023-01-31").checked_add_months(1),
            Some(date("2023-02-28")),
        );
        assert_eq!(
            date("2024-03-31").checked_sub_months(1),
            Some(date("2024-02-29")),
        );
        assert_eq!(
            date("2024-05-31").checked_add_months(1),
            Some(date("2024-06-30")),
        );
    }

    #[test]
    fn subtracts_calendar_months_across_years() {
        assert_eq!(
            date("2024-01-10").checked_sub_months(1),
            Some(date("2023-12-10")),
        );
        assert_eq!(
            date("2024-02-29").checked_sub_months(12),
            Some(date("2023-02-28")),
        );
        assert_eq!(
            date("2024-03-10").checked_sub_months(26),
            Some(date("2022-01-10")),
        );
    }

    #[test]
    fn adds_days() {
        assert_eq!(
            date("2024-02-25").checked_add_days(10),
            Some(date("2024-03-06")),
        );
        assert_eq!(
            date("2024-01-01").checked_add_days(-1),
            Some(date("2023-12-31")),
        );
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(date("9999-12-01").checked_add_months(1), None);
        assert_eq!(date("9999-12-31").checked_add_days(1), None);
    }

    #[test]
    fn year_month() {
        let ym = date("2024-03-05").year_month();
        assert_eq!((ym.year, ym.month), (2024, 3));
        assert_eq!(ym.to_string(), "2024-03");
    }
}
