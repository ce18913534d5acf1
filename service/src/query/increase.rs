//! [`Query`] collection related to [`Increase`]s.
//!
//! Unlike the plain [`DatabaseQuery`]s, these fail when nothing matches.
//!
//! [`DatabaseQuery`]: super::DatabaseQuery

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{contract, increase, Contract, Increase},
    infra::{database, Database},
    Classified, Failure, Service,
};

use super::Query;

/// Queries an [`Increase`] by its [`increase::Id`].
#[derive(Clone, Copy, Debug)]
pub struct ById {
    /// ID of the [`Increase`] to be queried.
    pub increase_id: increase::Id,
}

/// Queries all the [`Increase`]s of a [`Contract`], ordered by their date.
#[derive(Clone, Copy, Debug)]
pub struct ByContract {
    /// ID of the adjusted [`Contract`].
    pub contract_id: contract::Id,
}

/// Queries the latest [`Increase`] of a [`Contract`].
#[derive(Clone, Copy, Debug)]
pub struct LastByContract {
    /// ID of the adjusted [`Contract`].
    pub contract_id: contract::Id,
}

impl<Db, Ntf> Query<ById> for Service<Db, Ntf>
where
    Db: Database<
        Select<By<Option<Increase>, increase::Id>>,
        Ok = Option<Increase>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Increase;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, query: ById) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ById { increase_id: id } = query;

        self.database()
            .execute(Select(By::<Option<Increase>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::IncreaseNotExists(id))
            .map_err(tracerr::wrap!())
    }
}

impl<Db, Ntf> Query<ByContract> for Service<Db, Ntf>
where
    Db: Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Increase>, contract::Id>>,
            Ok = Vec<Increase>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Vec<Increase>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, query: ByContract) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ByContract { contract_id: id } = query;

        self.database()
            .execute(Select(By::<Option<Contract>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractNotExists(id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let increases = self
            .database()
            .execute(Select(By::<Vec<Increase>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if increases.is_empty() {
            return Err(tracerr::new!(E::NoIncreases(id)));
        }
        Ok(increases)
    }
}

impl<Db, Ntf> Query<LastByContract> for Service<Db, Ntf>
where
    Self: Query<ByContract, Ok = Vec<Increase>, Err = Traced<ExecutionError>>,
{
    type Ok = Increase;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        query: LastByContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let LastByContract { contract_id: id } = query;

        let increases = self
            .execute(ByContract { contract_id: id })
            .await
            .map_err(tracerr::wrap!())?;
        increase::latest(&increases)
            .cloned()
            .ok_or(E::NoIncreases(id))
            .map_err(tracerr::wrap!())
    }
}

/// Error of the [`Increase`] [`Query`]s execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Increase`] with the provided ID does not exist.
    #[display("`Increase(id: {_0})` does not exist")]
    IncreaseNotExists(#[error(not(source))] increase::Id),

    /// [`Contract`] exists, but has no [`Increase`]s yet.
    #[display("`Contract(id: {_0})` has no `Increase`s")]
    NoIncreases(#[error(not(source))] contract::Id),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::ContractNotExists(_)
            | Self::IncreaseNotExists(_)
            | Self::NoIncreases(_) => Failure::NotFound,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{Currency, Money, Percent};
    use rust_decimal::Decimal;

    use crate::{
        domain::{contract, increase, Increase},
        spec::{date, Fixture},
        Classified as _, Failure, Query as _,
    };

    use super::{ByContract, ById, LastByContract};

    fn increase_of(
        f: &Fixture,
        contract_id: contract::Id,
        on: &str,
        amount: i64,
    ) -> Increase {
        Increase {
            id: increase::Id::new(),
            contract_id,
            index_id: f.index.id,
            date: date(on).coerce(),
            amount: Money {
                amount: Decimal::from(amount),
                currency: Currency::Ars,
            },
            adjustment: Percent::new(Decimal::from(10)).unwrap(),
            note: None,
            period: None,
        }
    }

    #[tokio::test]
    async fn contract_without_increases_is_not_found() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;

        let err = f
            .service
            .execute(LastByContract { contract_id: c.id })
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Failure::NotFound);

        let err = f
            .service
            .execute(ByContract {
                contract_id: contract::Id::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Failure::NotFound);

        let err = f
            .service
            .execute(ById {
                increase_id: increase::Id::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Failure::NotFound);
    }

    #[tokio::test]
    async fn returns_latest_increase() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;
        let first = increase_of(&f, c.id, "2024-04-01", 1100);
        let second = increase_of(&f, c.id, "2024-07-01", 1210);
        let (a, b) = (first.clone(), second.clone());
        f.db.seed(|s| {
            _ = s.increases.insert(b.id, b);
            _ = s.increases.insert(a.id, a);
        })
        .await;

        let all = f
            .service
            .execute(ByContract { contract_id: c.id })
            .await
            .unwrap();
        assert_eq!(all, [first.clone(), second.clone()]);

        let last = f
            .service
            .execute(LastByContract { contract_id: c.id })
            .await
            .unwrap();
        assert_eq!(last, second);

        let found = f
            .service
            .execute(ById {
                increase_id: first.id,
            })
            .await
            .unwrap();
        assert_eq!(found, first);
    }
}
