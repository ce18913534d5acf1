//! [`Query`] collection related to [`Commission`]s.
//!
//! Aggregates validate their filters eagerly and fail instead of returning
//! empty results for malformed input.

use std::collections::{BTreeMap, HashMap};

use common::{
    operations::{By, Select},
    Currency, Date, YearMonth,
};
use derive_more::{Display, Error, From};
use rust_decimal::Decimal;
use tracerr::Traced;

use crate::{
    domain::{commission, contract, Commission},
    infra::{database, Database},
    Classified, Failure, Service,
};
#[cfg(doc)]
use crate::domain::Contract;

use super::{DatabaseQuery, Query};

/// Queries a [`Commission`] by its [`commission::Id`].
pub type ById = DatabaseQuery<By<Option<Commission>, commission::Id>>;

/// Queries all the [`Commission`]s of a [`Contract`], ordered by their date.
pub type ByContract = DatabaseQuery<By<Vec<Commission>, contract::Id>>;

/// Queries all the [`Commission`]s matching a [`commission::Filter`].
pub type List = DatabaseQuery<By<Vec<Commission>, commission::Filter>>;

/// Sums the amounts of the [`Commission`]s in the provided
/// [`commission::Status`].
#[derive(Clone, Copy, Debug)]
pub struct TotalAmountByStatus {
    /// [`commission::Status`] to sum the [`Commission`]s of.
    pub status: commission::Status,

    /// [`Currency`] to sum the amounts in.
    pub currency: Option<Currency>,
}

/// Sums the amounts of the [`Commission`]s charged at the provided [`Date`].
#[derive(Clone, Copy, Debug)]
pub struct TotalAmountByDate {
    /// [`Date`] the [`Commission`]s are charged at.
    pub date: Date,

    /// [`Currency`] to sum the amounts in.
    pub currency: Option<Currency>,
}

/// Sums the amounts of the [`Commission`]s charged within the provided
/// inclusive range of [`Date`]s.
#[derive(Clone, Copy, Debug)]
pub struct TotalAmountByDateRange {
    /// First [`Date`] of the range.
    pub from: Option<Date>,

    /// Last [`Date`] of the range.
    pub to: Option<Date>,

    /// [`Currency`] to sum the amounts in.
    pub currency: Option<Currency>,
}

/// Sums the amounts of the [`Commission`]s charged within the provided year,
/// grouped by [`YearMonth`].
#[derive(Clone, Copy, Debug)]
pub struct MonthlyTotals {
    /// Year to sum the [`Commission`]s of.
    pub year: i32,

    /// [`Currency`] to sum the amounts in.
    pub currency: Option<Currency>,
}

impl MonthlyTotals {
    /// First year accepted by this [`Query`].
    pub const MIN_YEAR: i32 = 1900;

    /// Last year accepted by this [`Query`].
    pub const MAX_YEAR: i32 = 3000;
}

/// Counts all the [`Commission`]s per [`commission::Status`].
#[derive(Clone, Copy, Debug)]
pub struct CountByStatus;

/// Selects the [`Commission`]s matching the provided [`commission::Filter`].
async fn select<Db>(
    db: &Db,
    filter: commission::Filter,
) -> Result<Vec<Commission>, Traced<ExecutionError>>
where
    Db: Database<
        Select<By<Vec<Commission>, commission::Filter>>,
        Ok = Vec<Commission>,
        Err = Traced<database::Error>,
    >,
{
    db.execute(Select(By::new(filter)))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))
}

impl<Db, Ntf> Query<TotalAmountByStatus> for Service<Db, Ntf>
where
    Db: Database<
        Select<By<Vec<Commission>, commission::Filter>>,
        Ok = Vec<Commission>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Decimal;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        query: TotalAmountByStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let TotalAmountByStatus { status, currency } = query;
        let currency = currency
            .ok_or(E::CurrencyRequired)
            .map_err(tracerr::wrap!())?;

        let filter = commission::Filter {
            status: Some(status),
            currency: Some(currency),
            dates: None,
        };
        let commissions = select(self.database(), filter)
            .await
            .map_err(tracerr::wrap!())?;
        Ok(commission::total(&commissions))
    }
}

impl<Db, Ntf> Query<TotalAmountByDate> for Service<Db, Ntf>
where
    Db: Database<
        Select<By<Vec<Commission>, commission::Filter>>,
        Ok = Vec<Commission>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Decimal;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        query: TotalAmountByDate,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let TotalAmountByDate { date, currency } = query;
        let currency = currency
            .ok_or(E::CurrencyRequired)
            .map_err(tracerr::wrap!())?;

        let filter = commission::Filter {
            status: None,
            currency: Some(currency),
            dates: Some((date, date)),
        };
        let commissions = select(self.database(), filter)
            .await
            .map_err(tracerr::wrap!())?;
        Ok(commission::total(&commissions))
    }
}

impl<Db, Ntf> Query<TotalAmountByDateRange> for Service<Db, Ntf>
where
    Db: Database<
        Select<By<Vec<Commission>, commission::Filter>>,
        Ok = Vec<Commission>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Decimal;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        query: TotalAmountByDateRange,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let TotalAmountByDateRange { from, to, currency } = query;
        let currency = currency
            .ok_or(E::CurrencyRequired)
            .map_err(tracerr::wrap!())?;
        let (Some(from), Some(to)) = (from, to) else {
            return Err(tracerr::new!(E::DatesRequired));
        };
        if from > to {
            return Err(tracerr::new!(E::InvertedDateRange(from, to)));
        }

        let filter = commission::Filter {
            status: None,
            currency: Some(currency),
            dates: Some((from, to)),
        };
        let commissions = select(self.database(), filter)
            .await
            .map_err(tracerr::wrap!())?;
        Ok(commission::total(&commissions))
    }
}

impl<Db, Ntf> Query<MonthlyTotals> for Service<Db, Ntf>
where
    Db: Database<
        Select<By<Vec<Commission>, commission::Filter>>,
        Ok = Vec<Commission>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = BTreeMap<YearMonth, Decimal>;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        query: MonthlyTotals,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let MonthlyTotals { year, currency } = query;
        let currency = currency
            .ok_or(E::CurrencyRequired)
            .map_err(tracerr::wrap!())?;
        let range = (MonthlyTotals::MIN_YEAR..=MonthlyTotals::MAX_YEAR)
            .contains(&year)
            .then(|| {
                Date::from_ymd(year, 1, 1).zip(Date::from_ymd(year, 12, 31))
            })
            .flatten()
            .ok_or(E::YearOutOfRange(year))
            .map_err(tracerr::wrap!())?;

        let filter = commission::Filter {
            status: None,
            currency: Some(currency),
            dates: Some(range),
        };
        let commissions = select(self.database(), filter)
            .await
            .map_err(tracerr::wrap!())?;
        Ok(commission::monthly_totals(&commissions))
    }
}

impl<Db, Ntf> Query<CountByStatus> for Service<Db, Ntf>
where
    Db: Database<
        Select<By<Vec<Commission>, commission::Filter>>,
        Ok = Vec<Commission>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = HashMap<commission::Status, u64>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, _: CountByStatus) -> Result<Self::Ok, Self::Err> {
        let commissions =
            select(self.database(), commission::Filter::default())
                .await
                .map_err(tracerr::wrap!())?;
        Ok(commission::count_by_status(&commissions))
    }
}

/// Error of the [`Commission`] aggregate [`Query`]s execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Currency`] to aggregate in is not provided.
    #[display("`Currency` is required")]
    CurrencyRequired,

    /// Range of [`Date`]s is not fully provided.
    #[display("Both `from` and `to` dates are required")]
    DatesRequired,

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Range of [`Date`]s starts after it ends.
    #[display("Date range `{_0}..={_1}` is inverted")]
    InvertedDateRange(Date, Date),

    /// Year is outside of the accepted window.
    #[display(
        "Year `{_0}` is out of `{}..={}` range",
        MonthlyTotals::MIN_YEAR,
        MonthlyTotals::MAX_YEAR,
    )]
    YearOutOfRange(#[error(not(source))] i32),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::CurrencyRequired
            | Self::DatesRequired
            | Self::InvertedDateRange(..)
            | Self::YearOutOfRange(_) => Failure::BadRequest,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{Currency, YearMonth};
    use rust_decimal::Decimal;

    use crate::{
        domain::commission::{spec::commission, Status},
        spec::{date, Fixture},
        Classified as _, Failure, Query as _,
    };

    use super::{
        CountByStatus, MonthlyTotals, TotalAmountByDate,
        TotalAmountByDateRange, TotalAmountByStatus,
    };

    async fn seeded() -> Fixture {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;
        let all = [
            commission(c.id, "2024-01-10", 100, Currency::Ars, Status::Pending),
            commission(c.id, "2024-01-20", 50, Currency::Ars, Status::Paid),
            commission(c.id, "2024-03-05", 70, Currency::Ars, Status::Pending),
            commission(c.id, "2024-03-05", 9, Currency::Usd, Status::Pending),
            commission(c.id, "2023-12-31", 5, Currency::Ars, Status::Paid),
        ];
        f.db.seed(|s| {
            for c in all {
                _ = s.commissions.insert(c.id, c);
            }
        })
        .await;
        f
    }

    #[tokio::test]
    async fn total_by_status_requires_currency() {
        let f = seeded().await;

        let err = f
            .service
            .execute(TotalAmountByStatus {
                status: Status::Pending,
                currency: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err.failure(), Failure::BadRequest);
    }

    #[tokio::test]
    async fn sums_by_status() {
        let f = seeded().await;

        let total = f
            .service
            .execute(TotalAmountByStatus {
                status: Status::Pending,
                currency: Some(Currency::Ars),
            })
            .await
            .unwrap();

        assert_eq!(total, Decimal::from(170));
    }

    #[tokio::test]
    async fn sums_by_date() {
        let f = seeded().await;

        let total = f
            .service
            .execute(TotalAmountByDate {
                date: date("2024-03-05"),
                currency: Some(Currency::Usd),
            })
            .await
            .unwrap();

        assert_eq!(total, Decimal::from(9));
    }

    #[tokio::test]
    async fn sums_by_date_range() {
        let f = seeded().await;

        let total = f
            .service
            .execute(TotalAmountByDateRange {
                from: Some(date("2024-01-01")),
                to: Some(date("2024-01-31")),
                currency: Some(Currency::Ars),
            })
            .await
            .unwrap();
        assert_eq!(total, Decimal::from(150));

        let total = f
            .service
            .execute(TotalAmountByDateRange {
                from: Some(date("2024-02-01")),
                to: Some(date("2024-02-01")),
                currency: Some(Currency::Ars),
            })
            .await
            .unwrap();
        assert_eq!(total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn rejects_malformed_date_range() {
        let f = seeded().await;

        for (from, to) in [
            (Some(date("2024-02-01")), Some(date("2024-01-01"))),
            (None, Some(date("2024-01-01"))),
            (Some(date("2024-01-01")), None),
        ] {
            let err = f
                .service
                .execute(TotalAmountByDateRange {
                    from,
                    to,
                    currency: Some(Currency::Ars),
                })
                .await
                .unwrap_err();
            assert_eq!(err.failure(), Failure::BadRequest, "{from:?}..{to:?}");
        }
    }

    #[tokio::test]
    async fn groups_year_by_months() {
        let f = seeded().await;

        let totals = f
            .service
            .execute(MonthlyTotals {
                year: 2024,
                currency: Some(Currency::Ars),
            })
            .await
            .unwrap();

        assert_eq!(
            totals.into_iter().collect::<Vec<_>>(),
            [
                (
                    YearMonth {
                        year: 2024,
                        month: 1
                    },
                    Decimal::from(150),
                ),
                (
                    YearMonth {
                        year: 2024,
                        month: 3
                    },
                    Decimal::from(70),
                ),
            ],
        );
    }

    #[tokio::test]
    async fn rejects_year_out_of_window() {
        let f = seeded().await;

        for year in [1899, 3001] {
            let err = f
                .service
                .execute(MonthlyTotals {
                    year,
                    currency: Some(Currency::Ars),
                })
                .await
                .unwrap_err();
            assert_eq!(err.failure(), Failure::BadRequest, "{year}");
        }

        let totals = f
            .service
            .execute(MonthlyTotals {
                year: 1900,
                currency: Some(Currency::Ars),
            })
            .await
            .unwrap();
        assert!(totals.is_empty());
    }

    #[tokio::test]
    async fn counts_every_status() {
        let f = Fixture::new().await;

        let counts = f.service.execute(CountByStatus).await.unwrap();
        assert_eq!(counts[&Status::Pending], 0);
        assert_eq!(counts[&Status::Paid], 0);

        let f = seeded().await;

        let counts = f.service.execute(CountByStatus).await.unwrap();
        assert_eq!(counts[&Status::Pending], 3);
        assert_eq!(counts[&Status::Paid], 2);
    }
}
