//! [`Command`] for deleting an [`Increase`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{contract, increase, Contract, Increase},
    infra::{database, Database},
    Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for deleting an [`Increase`].
#[derive(Clone, Copy, Debug)]
pub struct DeleteIncrease {
    /// ID of the [`Increase`] to be deleted.
    pub increase_id: increase::Id,
}

impl<Db, Ntf> Command<DeleteIncrease> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Increase>, increase::Id>>,
            Ok = Option<Increase>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Contract, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Increase, increase::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Increase;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteIncrease,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteIncrease { increase_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let increase = tx
            .execute(Select(By::<Option<Increase>, _>::new(increase_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::IncreaseNotExists(increase_id))
            .map_err(tracerr::wrap!())?;

        // Avoid concurrent modifications.
        tx.execute(Lock(By::new(increase.contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Delete(By::<Increase, _>::new(increase_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(increase)
    }
}

/// Error of [`DeleteIncrease`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Increase`] with the provided ID does not exist.
    #[display("`Increase(id: {_0})` does not exist")]
    IncreaseNotExists(#[error(not(source))] increase::Id),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::IncreaseNotExists(_) => Failure::NotFound,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{increase, increase::spec::increase},
        spec::Fixture,
        Classified as _, Command as _, Failure,
    };

    use super::DeleteIncrease;

    #[tokio::test]
    async fn deletes_only_the_increase() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;
        let deleted = increase(c.id, "2024-04-01", 1100);
        let kept = increase(c.id, "2024-07-01", 1210);
        let (d, k) = (deleted.clone(), kept.clone());
        f.db.seed(|s| {
            _ = s.increases.insert(d.id, d);
            _ = s.increases.insert(k.id, k);
        })
        .await;

        let res = f
            .service
            .execute(DeleteIncrease {
                increase_id: deleted.id,
            })
            .await
            .unwrap();

        assert_eq!(res, deleted);
        let state = f.state().await;
        assert_eq!(state.increases.len(), 1);
        assert_eq!(state.increases.get(&kept.id), Some(&kept));
    }

    #[tokio::test]
    async fn missing_increase_is_not_found() {
        let f = Fixture::new().await;

        let err = f
            .service
            .execute(DeleteIncrease {
                increase_id: increase::Id::new(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.failure(), Failure::NotFound);
    }
}
