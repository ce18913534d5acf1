//! [`Command`] for unlinking a [`Guarantor`] from a [`Contract`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{contract, guarantor, Contract, Guarantor},
    infra::{database, Database},
    Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for unlinking a [`Guarantor`] from a [`Contract`].
///
/// Unlinking a not linked [`Guarantor`] changes nothing, so this [`Command`]
/// is safe to retry.
#[derive(Clone, Copy, Debug)]
pub struct UnlinkGuarantor {
    /// ID of the [`Guarantor`] to be unlinked.
    pub guarantor_id: guarantor::Id,

    /// ID of the [`Contract`] to unlink the [`Guarantor`] from.
    pub contract_id: contract::Id,
}

/// Outcome of an [`UnlinkGuarantor`] [`Command`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Unlinking {
    /// [`Guarantor`] has been unlinked from the [`Contract`].
    #[display("Guarantor unlinked from the contract")]
    Unlinked,

    /// [`Guarantor`] was not linked to the [`Contract`].
    #[display("Guarantor is not linked to the contract")]
    NotLinked,
}

impl<Db, Ntf> Command<UnlinkGuarantor> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Contract, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Guarantor, guarantor::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Guarantor>, guarantor::Id>>,
            Ok = Option<Guarantor>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<guarantor::Link>,
            Ok = bool,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Unlinking;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UnlinkGuarantor,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UnlinkGuarantor {
            guarantor_id,
            contract_id,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent modifications.
        tx.execute(Lock(By::<Contract, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Lock(By::<Guarantor, _>::new(guarantor_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Select(By::<Option<Contract>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractNotExists(contract_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        tx.execute(Select(By::<Option<Guarantor>, _>::new(guarantor_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::GuarantorNotExists(guarantor_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let removed = tx
            .execute(Delete(guarantor::Link {
                guarantor_id,
                contract_id,
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(if removed {
            Unlinking::Unlinked
        } else {
            Unlinking::NotLinked
        })
    }
}

/// Error of [`UnlinkGuarantor`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Guarantor`] with the provided ID does not exist.
    #[display("`Guarantor(id: {_0})` does not exist")]
    GuarantorNotExists(#[error(not(source))] guarantor::Id),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::ContractNotExists(_) | Self::GuarantorNotExists(_) => {
                Failure::NotFound
            }
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{create_guarantor::spec::seed_guarantor, LinkGuarantor},
        spec::Fixture,
        Command as _,
    };

    use super::{UnlinkGuarantor, Unlinking};

    #[tokio::test]
    async fn unlinking_is_idempotent() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;
        let g = seed_guarantor(&f, "luis@mail.example", "1111").await;
        _ = f
            .service
            .execute(LinkGuarantor {
                guarantor_id: g.id,
                contract_id: c.id,
            })
            .await
            .unwrap();
        let cmd = UnlinkGuarantor {
            guarantor_id: g.id,
            contract_id: c.id,
        };

        assert_eq!(f.service.execute(cmd).await.unwrap(), Unlinking::Unlinked);
        assert_eq!(
            f.service.execute(cmd).await.unwrap(),
            Unlinking::NotLinked,
        );
        assert!(f.state().await.links.is_empty());
        assert_eq!(f.state().await.guarantors.len(), 1);
    }
}
