//! [`Command`] for deleting all the [`Increase`]s of a [`Contract`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{contract, Contract, Increase},
    infra::{database, Database},
    Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for deleting all the [`Increase`]s of a [`Contract`],
/// returning the number of deleted ones.
#[derive(Clone, Copy, Debug)]
pub struct DeleteContractIncreases {
    /// ID of the [`Contract`] to delete the [`Increase`]s of.
    pub contract_id: contract::Id,
}

impl<Db, Ntf> Command<DeleteContractIncreases> for Service<Db, Ntf>
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
            Delete<By<Vec<Increase>, contract::Id>>,
            Ok = u64,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = u64;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteContractIncreases,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteContractIncreases { contract_id } = cmd;

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

        tx.execute(Select(By::<Option<Contract>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractNotExists(contract_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let deleted = tx
            .execute(Delete(By::<Vec<Increase>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(deleted)
    }
}

/// Error of [`DeleteContractIncreases`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::ContractNotExists(_) => Failure::NotFound,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{contract, increase::spec::increase},
        spec::Fixture,
        Classified as _, Command as _, Failure,
    };

    use super::DeleteContractIncreases;

    #[tokio::test]
    async fn deletes_increases_of_the_contract() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;
        let other = f.contract("2024-01-01", "2025-01-01").await;
        let all = [
            increase(c.id, "2024-04-01", 1100),
            increase(c.id, "2024-07-01", 1210),
            increase(other.id, "2024-04-01", 1100),
        ];
        f.db.seed(|s| {
            for i in all {
                _ = s.increases.insert(i.id, i);
            }
        })
        .await;

        let deleted = f
            .service
            .execute(DeleteContractIncreases { contract_id: c.id })
            .await
            .unwrap();

        assert_eq!(deleted, 2);
        assert_eq!(f.state().await.increases.len(), 1);
    }

    #[tokio::test]
    async fn missing_contract_is_not_found() {
        let f = Fixture::new().await;

        let err = f
            .service
            .execute(DeleteContractIncreases {
                contract_id: contract::Id::new(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.failure(), Failure::NotFound);
    }
}
