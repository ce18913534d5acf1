//! [`Command`] for updating an existing [`Contract`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{contract, index, Contract, Index},
    infra::{database, Database},
    Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for updating an existing [`Contract`].
///
/// Only the fields provided in the [`contract::Patch`] are overwritten.
#[derive(Clone, Debug)]
pub struct UpdateContract {
    /// ID of the [`Contract`] to be updated.
    pub contract_id: contract::Id,

    /// Changes to be applied.
    pub patch: contract::Patch,
}

impl<Db, Ntf> Command<UpdateContract> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Contract, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Index>, index::Id>>,
            Ok = Option<Index>,
            Err = Traced<database::Error>,
        > + Database<Insert<Contract>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Contract;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateContract { contract_id, patch } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent modifications.
        tx.execute(Lock(By::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let contract = tx
            .execute(Select(By::<Option<Contract>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractNotExists(contract_id))
            .map_err(tracerr::wrap!())?;

        let index_id = patch
            .adjustment_index_id
            .unwrap_or(contract.adjustment_index_id);
        tx.execute(Select(By::<Option<Index>, _>::new(index_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::IndexNotExists(index_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let contract = patch
            .apply(&contract)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Insert(contract.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(contract)
    }
}

/// Error of [`UpdateContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Index`] with the provided ID does not exist.
    #[display("`Index(id: {_0})` does not exist")]
    IndexNotExists(#[error(not(source))] index::Id),

    /// Updated [`Contract`] violates its invariants.
    #[display("Invalid `Contract`: {_0}")]
    #[from]
    Invalid(contract::Violation),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::ContractNotExists(_) | Self::IndexNotExists(_) => {
                Failure::NotFound
            }
            Self::Invalid(_) => Failure::BadRequest,
        }
    }
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use crate::{
        domain::{contract, index},
        spec::{date, Fixture},
        Classified as _, Command as _, Failure,
    };

    use super::UpdateContract;

    #[tokio::test]
    async fn overwrites_only_provided_fields() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;

        let updated = f
            .service
            .execute(UpdateContract {
                contract_id: c.id,
                patch: contract::Patch {
                    end_date: Some(date("2026-01-01").coerce()),
                    last_paid_amount: Some(Decimal::from(1200)),
                    ..contract::Patch::default()
                },
            })
            .await
            .unwrap();

        assert_eq!(updated.end_date, date("2026-01-01").coerce());
        assert_eq!(updated.last_paid_amount, Some(Decimal::from(1200)));
        assert_eq!(updated.start_date, c.start_date);
        assert_eq!(updated.initial_amount, c.initial_amount);
        assert_eq!(updated.adjustment_index_id, c.adjustment_index_id);
        assert_eq!(f.stored(c.id).await, Some(updated));
    }

    #[tokio::test]
    async fn rejects_inverted_period() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;

        let err = f
            .service
            .execute(UpdateContract {
                contract_id: c.id,
                patch: contract::Patch {
                    end_date: Some(date("2023-12-31").coerce()),
                    ..contract::Patch::default()
                },
            })
            .await
            .unwrap_err();

        assert_eq!(err.failure(), Failure::BadRequest);
        assert_eq!(f.stored(c.id).await, Some(c));
    }

    #[tokio::test]
    async fn requires_existing_contract_and_index() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;

        let err = f
            .service
            .execute(UpdateContract {
                contract_id: contract::Id::new(),
                patch: contract::Patch::default(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Failure::NotFound);

        let err = f
            .service
            .execute(UpdateContract {
                contract_id: c.id,
                patch: contract::Patch {
                    adjustment_index_id: Some(index::Id::new()),
                    ..contract::Patch::default()
                },
            })
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Failure::NotFound);
    }
}
