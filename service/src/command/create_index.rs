//! [`Command`] for registering a new adjustment [`Index`].

use common::operations::{By, Commit, Insert, Select, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{index, Index},
    infra::{database, Database},
    Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for registering a new adjustment [`Index`] in the catalog.
#[derive(Clone, Debug)]
pub struct CreateIndex {
    /// Unique [`index::Code`] of the [`Index`].
    pub code: index::Code,

    /// [`index::Name`] of the [`Index`].
    pub name: index::Name,
}

impl<Db, Ntf> Command<CreateIndex> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Index>, index::Code>>,
            Ok = Option<Index>,
            Err = Traced<database::Error>,
        > + Database<Insert<Index>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Index;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateIndex) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateIndex { code, name } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let taken = tx
            .execute(Select(By::<Option<Index>, _>::new(code.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if taken.is_some() {
            return Err(tracerr::new!(E::CodeOccupied(code)));
        }

        let index = Index {
            id: index::Id::new(),
            code,
            name,
        };
        tx.execute(Insert(index.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(index)
    }
}

/// Error of [`CreateIndex`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`index::Code`] is occupied by another [`Index`].
    #[display("`Index(code: {_0})` already exists")]
    CodeOccupied(#[error(not(source))] index::Code),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::CodeOccupied(_) => Failure::BadRequest,
        }
    }
}
