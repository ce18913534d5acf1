//! [`Command`] for linking a [`Guarantor`] to a [`Contract`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{contract, guarantor, Contract, Guarantor},
    infra::{database, Database},
    Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for linking a [`Guarantor`] to a [`Contract`] it backs.
///
/// Linking an already linked [`Guarantor`] changes nothing, so this
/// [`Command`] is safe to retry.
#[derive(Clone, Copy, Debug)]
pub struct LinkGuarantor {
    /// ID of the [`Guarantor`] to be linked.
    pub guarantor_id: guarantor::Id,

    /// ID of the [`Contract`] to link the [`Guarantor`] to.
    pub contract_id: contract::Id,
}

/// Outcome of a [`LinkGuarantor`] [`Command`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Linking {
    /// [`Guarantor`] has been linked to the [`Contract`].
    #[display("Guarantor linked to the contract")]
    Linked,

    /// [`Guarantor`] was already linked to the [`Contract`].
    #[display("Guarantor is already linked to the contract")]
    AlreadyLinked,
}

impl<Db, Ntf> Command<LinkGuarantor> for Service<Db, Ntf>
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
            Insert<guarantor::Link>,
            Ok = bool,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Linking;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: LinkGuarantor) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let LinkGuarantor {
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

        let inserted = tx
            .execute(Insert(guarantor::Link {
                guarantor_id,
                contract_id,
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(if inserted {
            Linking::Linked
        } else {
            Linking::AlreadyLinked
        })
    }
}

/// Error of [`LinkGuarantor`] [`Command`] execution.
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
        command::create_guarantor::spec::seed_guarantor,
        domain::{contract, guarantor},
        spec::Fixture,
        Classified as _, Command as _, Failure,
    };

    use super::{LinkGuarantor, Linking};

    #[tokio::test]
    async fn linking_is_idempotent() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;
        let g = seed_guarantor(&f, "luis@mail.example", "1111").await;
        let cmd = LinkGuarantor {
            guarantor_id: g.id,
            contract_id: c.id,
        };

        assert_eq!(f.service.execute(cmd).await.unwrap(), Linking::Linked);
        assert_eq!(
            f.service.execute(cmd).await.unwrap(),
            Linking::AlreadyLinked,
        );

        let links = f.state().await.links;
        assert_eq!(links.len(), 1);
        assert!(links.contains(&guarantor::Link {
            guarantor_id: g.id,
            contract_id: c.id,
        }));
    }

    #[tokio::test]
    async fn requires_both_sides() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;
        let g = seed_guarantor(&f, "luis@mail.example", "1111").await;

        let err = f
            .service
            .execute(LinkGuarantor {
                guarantor_id: guarantor::Id::new(),
                contract_id: c.id,
            })
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Failure::NotFound);

        let err = f
            .service
            .execute(LinkGuarantor {
                guarantor_id: g.id,
                contract_id: contract::Id::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Failure::NotFound);

        assert!(f.state().await.links.is_empty());
    }
}
