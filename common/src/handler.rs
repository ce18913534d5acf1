//! [`Handler`] abstractions.

use std::future::Future;

/// Executable handler.
///
/// The same abstraction is used for commands, queries, background tasks,
/// database operations and notification delivery: the `Args` type selects
/// the operation, while [`Handler::Ok`] and [`Handler::Err`] describe its
/// outcome.
pub trait Handler<Args = ()> {
    /// Type of successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Executes this [`Handler`] with the provided arguments.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
