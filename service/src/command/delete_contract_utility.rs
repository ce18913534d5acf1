//! [`Command`] for deleting a [`ContractUtility`].

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

/// [`Command`] for deleting a [`ContractUtility`] along with its
/// [`contract_utility::Increase`]s.
#[derive(Clone, Copy, Debug)]
pub struct DeleteContractUtility {
    /// ID of the [`ContractUtility`] to be deleted.
    pub contract_utility_id: contract_utility::Id,
}

impl<Db, Ntf> Command<DeleteContractUtility> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<ContractUtility>, contract_utility::Id>>,
            Ok = Option<ContractUtility>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Contract, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<ContractUtility, contract_utility::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ContractUtility;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteContractUtility,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteContractUtility {
            contract_utility_id: id,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let utility = tx
            .execute(Select(By::<Option<ContractUtility>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractUtilityNotExists(id))
            .map_err(tracerr::wrap!())?;

        // Avoid concurrent modifications.
        tx.execute(Lock(By::new(utility.contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Delete(By::<ContractUtility, _>::new(id)))
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

/// Error of [`DeleteContractUtility`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`ContractUtility`] with the provided ID does not exist.
    #[display("`ContractUtility(id: {_0})` does not exist")]
    ContractUtilityNotExists(#[error(not(source))] contract_utility::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::ContractUtilityNotExists(_) => Failure::NotFound,
        }
    }
}
