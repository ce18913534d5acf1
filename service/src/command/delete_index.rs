//! [`Command`] for deleting an adjustment [`Index`].

use common::operations::{By, Commit, Delete, Select, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{index, Index},
    infra::{database, Database},
    read::Referenced,
    Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for deleting an adjustment [`Index`] not referenced by any
/// [`Contract`] or [`Increase`].
///
/// [`Contract`]: crate::domain::Contract
/// [`Increase`]: crate::domain::Increase
#[derive(Clone, Copy, Debug)]
pub struct DeleteIndex {
    /// ID of the [`Index`] to be deleted.
    pub index_id: index::Id,
}

impl<Db, Ntf> Command<DeleteIndex> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Index>, index::Id>>,
            Ok = Option<Index>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Referenced<Index>, index::Id>>,
            Ok = bool,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Index, index::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Index;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteIndex) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteIndex { index_id: id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let index = tx
            .execute(Select(By::<Option<Index>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::IndexNotExists(id))
            .map_err(tracerr::wrap!())?;

        let in_use = tx
            .execute(Select(By::<Referenced<Index>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if in_use {
            return Err(tracerr::new!(E::IndexInUse(id)));
        }

        tx.execute(Delete(By::<Index, _>::new(id)))
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

/// Error of [`DeleteIndex`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Index`] is still referenced.
    #[display("`Index(id: {_0})` is in use")]
    IndexInUse(#[error(not(source))] index::Id),

    /// [`Index`] with the provided ID does not exist.
    #[display("`Index(id: {_0})` does not exist")]
    IndexNotExists(#[error(not(source))] index::Id),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::IndexInUse(_) => Failure::Conflict,
            Self::IndexNotExists(_) => Failure::NotFound,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{index, Index},
        spec::Fixture,
        Classified as _, Command as _, Failure,
    };

    use super::DeleteIndex;

    #[tokio::test]
    async fn referenced_index_is_kept() {
        let f = Fixture::new().await;
        _ = f.contract("2024-01-01", "2025-01-01").await;

        let err = f
            .service
            .execute(DeleteIndex {
                index_id: f.index.id,
            })
            .await
            .unwrap_err();

        assert_eq!(err.failure(), Failure::Conflict);
        assert!(f.state().await.indices.contains_key(&f.index.id));
    }

    #[tokio::test]
    async fn deletes_unused_index() {
        let f = Fixture::new().await;
        let unused = Index {
            id: index::Id::new(),
            code: index::Code::new("CAC").unwrap(),
            name: index::Name::new("Costo de la Construcción").unwrap(),
        };
        let id = unused.id;
        f.db.seed(|s| {
            _ = s.indices.insert(unused.id, unused);
        })
        .await;

        let deleted = f
            .service
            .execute(DeleteIndex { index_id: id })
            .await
            .unwrap();
        assert_eq!(deleted.id, id);
        assert!(!f.state().await.indices.contains_key(&id));

        let err = f
            .service
            .execute(DeleteIndex { index_id: id })
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Failure::NotFound);
    }
}
