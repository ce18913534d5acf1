//! Postgres database clients.

use std::sync::Arc;

use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tokio_postgres::{Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{
        self,
        connection::{self, Params},
        Connection,
    },
};

/// Non-transactional Postgres database client.
///
/// Every statement runs on a [`Connection`] borrowed from the pool for this
/// statement only.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] to borrow [`Connection`]s from.
    pool: connection::Pool,
}

impl NonTx {
    /// Creates a new [`NonTx`] client over the provided [`connection::Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: connection::Pool) -> Self {
        Self { pool }
    }

    /// Borrows a [`connection::NonTx`] from the pool.
    pub(crate) async fn connection(
        &self,
    ) -> Result<connection::NonTx, Traced<database::Error>> {
        self.pool
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

/// Transactional Postgres database client.
///
/// The transaction begins lazily on the first statement and is shared by all
/// the clones of this client, so the statements are executed one at a time.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`NonTx`] client to borrow the transaction [`Connection`] from.
    non_tx: NonTx,

    /// Open transaction, if any has begun yet.
    tx: Arc<Mutex<Option<connection::Tx>>>,
}

impl Tx {
    /// Creates a new [`Tx`] client on top of the provided [`NonTx`] one.
    #[must_use]
    pub fn begin(non_tx: &NonTx) -> Self {
        Self {
            non_tx: non_tx.clone(),
            tx: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the open [`connection::Tx`], beginning it if none has begun
    /// yet.
    async fn connection(
        &self,
    ) -> Result<MappedMutexGuard<'_, connection::Tx>, Traced<database::Error>>
    {
        let mut slot = self.tx.lock().await;
        let tx = match slot.take() {
            Some(tx) => tx,
            None => {
                let conn =
                    self.non_tx.connection().await.map_err(tracerr::wrap!())?;
                connection::Tx::begin(conn)
                    .await
                    .map_err(tracerr::wrap!())?
            }
        };
        Ok(MutexGuard::map(slot, |slot| slot.insert(tx)))
    }

    /// Commits the open transaction of this [`Tx`] client, if any.
    ///
    /// Next statement of this [`Tx`] client begins a new transaction.
    ///
    /// # Errors
    ///
    /// If failed to commit the transaction.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let Some(tx) = self.tx.lock().await.take() else {
            return Ok(());
        };
        tx.commit().await.map_err(tracerr::wrap!())
    }
}

impl Connection for NonTx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &Params<'_>,
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let conn = self.connection().await.map_err(tracerr::wrap!())?;
        Connection::query(&conn, stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &Params<'_>,
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let conn = self.connection().await.map_err(tracerr::wrap!())?;
        Connection::query_opt(&conn, stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &Params<'_>,
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let conn = self.connection().await.map_err(tracerr::wrap!())?;
        Connection::exec(&conn, stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }
}

impl Connection for Tx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &Params<'_>,
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let tx = self.connection().await.map_err(tracerr::wrap!())?;
        Connection::query(&*tx, stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &Params<'_>,
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let tx = self.connection().await.map_err(tracerr::wrap!())?;
        Connection::query_opt(&*tx, stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &Params<'_>,
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let tx = self.connection().await.map_err(tracerr::wrap!())?;
        Connection::exec(&*tx, stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }
}
