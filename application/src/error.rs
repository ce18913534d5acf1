//! [`Error`]-related definitions.

use std::fmt;

use derive_more::Error as StdError;
use itertools::Itertools as _;
use service::{Classified, Failure};
use tracerr::{Trace, Traced};
use tracing as log;

/// [`Error`] exposed to the callers of the [`Service`].
///
/// [`Service`]: service::Service
#[derive(Clone, Debug, StdError)]
pub struct Error {
    /// [`Error`] code.
    pub code: Code,

    /// [`http::StatusCode`] of this [`Error`].
    pub status_code: http::StatusCode,

    /// Backtrace of this [`Error`].
    #[error(not(backtrace))]
    pub backtrace: Option<Trace>,

    /// [`Error`] message.
    pub message: String,
}

impl Error {
    /// Message of an [`Error`] representing an internal server error.
    pub const INTERNAL_MESSAGE: &'static str = "Internal server error";

    /// Create a new [`Error`] representing an internal server error.
    ///
    /// Its message never discloses the underlying failure.
    #[must_use]
    pub fn internal() -> Self {
        Self {
            code: "INTERNAL_SERVER_ERROR",
            status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
            message: Self::INTERNAL_MESSAGE.to_owned(),
            backtrace: None,
        }
    }

    /// Creates a new [`Error`] of the provided [`Failure`] category.
    ///
    /// [`None`] is returned for a [`Failure::Internal`] one.
    #[must_use]
    pub fn of(failure: Failure, message: &impl ToString) -> Option<Self> {
        let (code, status_code) = match failure {
            Failure::NotFound => ("NOT_FOUND", http::StatusCode::NOT_FOUND),
            Failure::BadRequest => {
                ("BAD_REQUEST", http::StatusCode::BAD_REQUEST)
            }
            Failure::Conflict => ("CONFLICT", http::StatusCode::CONFLICT),
            Failure::Internal => return None,
        };
        Some(Self {
            code,
            status_code,
            message: message.to_string(),
            backtrace: None,
        })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            code,
            status_code: _,
            backtrace,
            message,
        } = self;

        write!(
            f,
            "[{code}]: {message}{}",
            backtrace
                .iter()
                .format_with("\n", |trace, f| f(&format_args!("{trace}"))),
        )
    }
}

/// [`Error`] code.
pub type Code = &'static str;

/// Helper trait for converting types into [`Error`]s.
pub trait AsError {
    /// Tries to convert the type into an [`Error`].
    ///
    /// [`None`] is returned if the type cannot be converted into an [`Error`].
    fn try_as_error(&self) -> Option<Error>;

    /// Converts the type into an [`Error`].
    ///
    /// Types not convertible into an [`Error`] are logged and reported as an
    /// [`Error::internal()`] one.
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error().unwrap_or_else(|| {
            log::error!("internal error: {self}");
            Error::internal()
        })
    }

    /// Converts the type into an [`Error`] by consuming it.
    fn into_error(self) -> Error
    where
        Self: fmt::Display + Sized,
    {
        self.as_error()
    }
}

impl<E> AsError for Traced<E>
where
    E: Classified + fmt::Display,
{
    fn try_as_error(&self) -> Option<Error> {
        let err = self.as_ref();
        let mut error = Error::of(err.failure(), err)?;
        error.backtrace = Some(self.trace().clone());
        Some(error)
    }
}

#[cfg(test)]
mod spec {
    use service::{
        command::{
            delete_contract, delete_guarantor, update_commission_status,
        },
        domain::{contract, guarantor},
        infra::database,
    };

    use super::{AsError as _, Error};

    #[test]
    fn maps_failures_onto_status_codes() {
        let not_found = tracerr::new!(
            delete_contract::ExecutionError::ContractNotExists(
                contract::Id::new(),
            )
        )
        .into_error();
        assert_eq!(not_found.code, "NOT_FOUND");
        assert_eq!(not_found.status_code, http::StatusCode::NOT_FOUND);
        assert!(not_found.backtrace.is_some());

        let conflict = tracerr::new!(
            delete_guarantor::ExecutionError::GuarantorLinked(
                guarantor::Id::new(),
            )
        )
        .into_error();
        assert_eq!(conflict.code, "CONFLICT");
        assert_eq!(conflict.status_code, http::StatusCode::CONFLICT);
    }

    #[test]
    fn hides_internal_details() {
        let err = tracerr::new!(update_commission_status::ExecutionError::Db(
            database::memory::Error::TxFinished.into(),
        ))
        .into_error();

        assert_eq!(err.code, "INTERNAL_SERVER_ERROR");
        assert_eq!(
            err.status_code,
            http::StatusCode::INTERNAL_SERVER_ERROR,
        );
        assert_eq!(err.message, Error::INTERNAL_MESSAGE);
        assert!(err.backtrace.is_none());
    }
}
