//! [`Command`] for overwriting the [`commission::Status`] of a [`Commission`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{commission, contract, Commission, Contract},
    infra::{database, Database},
    Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for overwriting the [`commission::Status`] of a
/// [`Commission`].
///
/// Any [`commission::Status`] may be set regardless of the current one, so
/// repeating the same [`UpdateCommissionStatus`] is harmless.
#[derive(Clone, Copy, Debug)]
pub struct UpdateCommissionStatus {
    /// ID of the [`Commission`] to be updated.
    pub commission_id: commission::Id,

    /// New [`commission::Status`].
    pub status: commission::Status,
}

impl<Db, Ntf> Command<UpdateCommissionStatus> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Commission>, commission::Id>>,
            Ok = Option<Commission>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Contract, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<Insert<Commission>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Commission;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateCommissionStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateCommissionStatus {
            commission_id: id,
            status,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let commission = tx
            .execute(Select(By::<Option<Commission>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::CommissionNotExists(id))
            .map_err(tracerr::wrap!())?;

        // Avoid concurrent modifications.
        tx.execute(Lock(By::new(commission.contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if commission.status == status {
            return Ok(commission);
        }
        let commission = Commission {
            status,
            ..commission
        };
        tx.execute(Insert(commission.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(commission)
    }
}

/// Error of [`UpdateCommissionStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Commission`] with the provided ID does not exist.
    #[display("`Commission(id: {_0})` does not exist")]
    CommissionNotExists(#[error(not(source))] commission::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::CommissionNotExists(_) => Failure::NotFound,
        }
    }
}
