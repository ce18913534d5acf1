//! [`Command`] for deleting a loaded amount of a [`ContractUtility`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{contract, contract_utility, Contract, ContractUtility},
    infra::{database, Database},
    Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for deleting a [`contract_utility::Increase`].
#[derive(Clone, Copy, Debug)]
pub struct DeleteUtilityIncrease {
    /// ID of the [`contract_utility::Increase`] to be deleted.
    pub increase_id: contract_utility::increase::Id,
}

impl<Db, Ntf> Command<DeleteUtilityIncrease> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<
                By<
                    Option<contract_utility::Increase>,
                    contract_utility::increase::Id,
                >,
            >,
            Ok = Option<contract_utility::Increase>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<ContractUtility>, contract_utility::Id>>,
            Ok = Option<ContractUtility>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Contract, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<
                By<contract_utility::Increase, contract_utility::increase::Id>,
            >,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = contract_utility::Increase;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteUtilityIncrease,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteUtilityIncrease { increase_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let increase = tx
            .execute(Select(
                By::<Option<contract_utility::Increase>, _>::new(increase_id),
            ))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::IncreaseNotExists(increase_id))
            .map_err(tracerr::wrap!())?;

        let utility = tx
            .execute(Select(By::<Option<ContractUtility>, _>::new(
                increase.contract_utility_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(utility) = utility {
            // Avoid concurrent modifications.
            tx.execute(Lock(By::new(utility.contract_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        tx.execute(Delete(By::<contract_utility::Increase, _>::new(
            increase_id,
        )))
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

/// Error of [`DeleteUtilityIncrease`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`contract_utility::Increase`] with the provided ID does not exist.
    #[display("`ContractUtilityIncrease(id: {_0})` does not exist")]
    IncreaseNotExists(#[error(not(source))] contract_utility::increase::Id),
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
    use rust_decimal::Decimal;

    use crate::{
        domain::contract_utility::{
            self, spec::contract_utility, Periodicity,
        },
        spec::{date, Fixture},
        Classified as _, Command as _, Failure,
    };

    use super::DeleteUtilityIncrease;

    #[tokio::test]
    async fn deletes_increase() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;
        let cu = contract_utility(c.id, "2024-02-01", Periodicity::Monthly);
        let inc = contract_utility::Increase {
            id: contract_utility::increase::Id::new(),
            contract_utility_id: cu.id,
            date: date("2024-03-01").coerce(),
            amount: Decimal::from(5500),
        };
        let stored = inc.clone();
        f.db.seed(|s| {
            _ = s.contract_utilities.insert(cu.id, cu);
            _ = s.utility_increases.insert(stored.id, stored);
        })
        .await;

        let deleted = f
            .service
            .execute(DeleteUtilityIncrease {
                increase_id: inc.id,
            })
            .await
            .unwrap();

        assert_eq!(deleted, inc);
        let state = f.state().await;
        assert!(state.utility_increases.is_empty());
        assert_eq!(state.contract_utilities.len(), 1);

        let err = f
            .service
            .execute(DeleteUtilityIncrease {
                increase_id: inc.id,
            })
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Failure::NotFound);
    }
}
