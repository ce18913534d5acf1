//! [`Command`] for registering a new [`Utility`].

use common::operations::{By, Commit, Insert, Select, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{utility, Utility},
    infra::{database, Database},
    Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for registering a new [`Utility`] in the catalog.
///
/// [`utility::Name`]s are unique regardless of their case.
#[derive(Clone, Debug)]
pub struct CreateUtility {
    /// [`utility::Name`] of the [`Utility`].
    pub name: utility::Name,
}

impl<Db, Ntf> Command<CreateUtility> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Utility>, utility::Name>>,
            Ok = Option<Utility>,
            Err = Traced<database::Error>,
        > + Database<Insert<Utility>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Utility;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUtility) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUtility { name } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let taken = tx
            .execute(Select(By::<Option<Utility>, _>::new(name.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if taken.is_some() {
            return Err(tracerr::new!(E::NameOccupied(name)));
        }

        let utility = Utility {
            id: utility::Id::new(),
            name,
        };
        tx.execute(Insert(utility.clone()))
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

/// Error of [`CreateUtility`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`utility::Name`] is occupied by another [`Utility`].
    #[display("`Utility(name: {_0})` already exists")]
    NameOccupied(#[error(not(source))] utility::Name),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::NameOccupied(_) => Failure::BadRequest,
        }
    }
}
