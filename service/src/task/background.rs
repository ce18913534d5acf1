//! Background environment for running [`Task`]s.

use std::{
    error::Error,
    future::{Future, IntoFuture},
};

use futures::{future::LocalBoxFuture, FutureExt as _, TryFutureExt as _};
use tokio::task;

#[cfg(doc)]
use crate::Task;

/// Boxed error of a failed background [`Task`].
type BoxError = Box<dyn Error + 'static>;

/// Background environment for running [`Task`]s on the current thread.
///
/// Spawned [`Task`]s make no progress until the [`Background`] is awaited.
#[derive(Debug, Default)]
pub struct Background {
    /// Local set the [`Task`]s are running on.
    local: task::LocalSet,

    /// Spawned [`Task`]s.
    tasks: task::JoinSet<Result<(), BoxError>>,
}

impl Background {
    /// Spawns a new [`Task`] inside the [`Background`] environment.
    pub fn spawn<F, E>(&mut self, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        _ = self.tasks.spawn_local_on(
            future.map_err(|e| BoxError::from(Box::new(e))),
            &self.local,
        );
    }
}

impl IntoFuture for Background {
    type Output = Result<(), BoxError>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    /// Runs all the spawned [`Task`]s until they complete, or until the first
    /// of them fails, aborting the rest.
    fn into_future(self) -> Self::IntoFuture {
        let Self { local, mut tasks } = self;
        async move {
            local
                .run_until(async move {
                    while let Some(res) = tasks.join_next().await {
                        match res {
                            Ok(res) => res?,
                            Err(e) => return Err(BoxError::from(Box::new(e))),
                        }
                    }
                    Ok(())
                })
                .await
        }
        .boxed_local()
    }
}
