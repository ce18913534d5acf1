//! [`Command`] for deleting a [`Guarantor`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{guarantor, Guarantor},
    infra::{database, Database},
    read::Referenced,
    Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for deleting a [`Guarantor`] not linked to any
/// [`Contract`].
///
/// [`Contract`]: crate::domain::Contract
#[derive(Clone, Copy, Debug)]
pub struct DeleteGuarantor {
    /// ID of the [`Guarantor`] to be deleted.
    pub guarantor_id: guarantor::Id,
}

impl<Db, Ntf> Command<DeleteGuarantor> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Guarantor, guarantor::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Guarantor>, guarantor::Id>>,
            Ok = Option<Guarantor>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Referenced<Guarantor>, guarantor::Id>>,
            Ok = bool,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Guarantor, guarantor::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Guarantor;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteGuarantor,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteGuarantor { guarantor_id: id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent linking.
        tx.execute(Lock(By::<Guarantor, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let guarantor = tx
            .execute(Select(By::<Option<Guarantor>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::GuarantorNotExists(id))
            .map_err(tracerr::wrap!())?;

        let linked = tx
            .execute(Select(By::<Referenced<Guarantor>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if linked {
            return Err(tracerr::new!(E::GuarantorLinked(id)));
        }

        tx.execute(Delete(By::<Guarantor, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(guarantor)
    }
}

/// Error of [`DeleteGuarantor`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Guarantor`] is still linked to some [`Contract`].
    ///
    /// [`Contract`]: crate::domain::Contract
    #[display("`Guarantor(id: {_0})` is linked to some `Contract`")]
    GuarantorLinked(#[error(not(source))] guarantor::Id),

    /// [`Guarantor`] with the provided ID does not exist.
    #[display("`Guarantor(id: {_0})` does not exist")]
    GuarantorNotExists(#[error(not(source))] guarantor::Id),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::GuarantorLinked(_) => Failure::Conflict,
            Self::GuarantorNotExists(_) => Failure::NotFound,
        }
    }
}
