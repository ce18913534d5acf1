//! [`Command`] for deleting a [`Utility`].

use common::operations::{By, Commit, Delete, Select, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{utility, Utility},
    infra::{database, Database},
    read::Referenced,
    Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for deleting a [`Utility`] not charged through any
/// [`ContractUtility`].
///
/// [`ContractUtility`]: crate::domain::ContractUtility
#[derive(Clone, Copy, Debug)]
pub struct DeleteUtility {
    /// ID of the [`Utility`] to be deleted.
    pub utility_id: utility::Id,
}

impl<Db, Ntf> Command<DeleteUtility> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Utility>, utility::Id>>,
            Ok = Option<Utility>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Referenced<Utility>, utility::Id>>,
            Ok = bool,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Utility, utility::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Utility;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteUtility) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteUtility { utility_id: id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let utility = tx
            .execute(Select(By::<Option<Utility>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UtilityNotExists(id))
            .map_err(tracerr::wrap!())?;

        let in_use = tx
            .execute(Select(By::<Referenced<Utility>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if in_use {
            return Err(tracerr::new!(E::UtilityInUse(id)));
        }

        tx.execute(Delete(By::<Utility, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(utility)
    }
}

/// Error of [`DeleteUtility`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Utility`] is still charged through some [`ContractUtility`].
    ///
    /// [`ContractUtility`]: crate::domain::ContractUtility
    #[display("`Utility(id: {_0})` is in use")]
    UtilityInUse(#[error(not(source))] utility::Id),

    /// [`Utility`] with the provided ID does not exist.
    #[display("`Utility(id: {_0})` does not exist")]
    UtilityNotExists(#[error(not(source))] utility::Id),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::UtilityInUse(_) => Failure::Conflict,
            Self::UtilityNotExists(_) => Failure::NotFound,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::create_contract_utility::spec::seed_utility,
        domain::{
            contract_utility::{spec::contract_utility, Periodicity},
            ContractUtility,
        },
        spec::Fixture,
        Classified as _, Command as _, Failure,
    };

    use super::DeleteUtility;

    #[tokio::test]
    async fn charged_utility_is_kept() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;
        let gas = seed_utility(&f, "Gas").await;
        let cu = ContractUtility {
            utility_id: gas.id,
            ..contract_utility(c.id, "2024-02-01", Periodicity::Monthly)
        };
        f.db.seed(|s| {
            _ = s.contract_utilities.insert(cu.id, cu);
        })
        .await;

        let err = f
            .service
            .execute(DeleteUtility { utility_id: gas.id })
            .await
            .unwrap_err();

        assert_eq!(err.failure(), Failure::Conflict);
        assert!(f.state().await.utilities.contains_key(&gas.id));
    }

    #[tokio::test]
    async fn deletes_unused_utility() {
        let f = Fixture::new().await;
        let water = seed_utility(&f, "Water").await;

        let deleted = f
            .service
            .execute(DeleteUtility {
                utility_id: water.id,
            })
            .await
            .unwrap();
        assert_eq!(deleted.id, water.id);
        assert!(f.state().await.utilities.is_empty());

        let err = f
            .service
            .execute(DeleteUtility {
                utility_id: water.id,
            })
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Failure::NotFound);
    }
}
