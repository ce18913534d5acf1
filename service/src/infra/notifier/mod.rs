//! [`Notifier`]-related implementations.

pub mod recorder;

use derive_more::{Display, Error as StdError, From};

use crate::{domain::user, infra::database};

pub use self::recorder::Recorder;

/// Delivery of [`Notice`]s.
///
/// [`Notice`]: crate::notice::Notice
pub use common::Handler as Notifier;

/// [`Notifier`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// [`Database`] error while storing the [`Notice`] to be delivered.
    ///
    /// [`Database`]: crate::infra::Database
    /// [`Notice`]: crate::notice::Notice
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Notice`] payload cannot be encoded.
    ///
    /// [`Notice`]: crate::notice::Notice
    #[display("Failed to encode `Notice` payload: {_0}")]
    Encoding(serde_json::Error),

    /// Recipient refused the [`Notice`].
    ///
    /// [`Notice`]: crate::notice::Notice
    #[display("`{_0}` rejected the `Notice`")]
    #[from(ignore)]
    Rejected(#[error(not(source))] user::Email),
}
