//! Service contains the business logic of the contract lifecycle engine.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod notice;
pub mod query;
pub mod read;
#[cfg(test)]
mod spec;
pub mod task;

use common::operations::{By, Notify, Start};
use derive_more::{Debug, Display, Error};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::user,
    infra::{notifier, Notifier},
    notice::Notice,
};
#[cfg(doc)]
use crate::infra::Database;

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [`user::Email`] administrative digests and notices are sent to.
    pub admin_email: user::Email,

    /// Day of the month rent payment reminders are sent at.
    pub rent_reminder_day: u8,

    /// [`task::RunSweeps`] configuration.
    pub sweeps: task::run_sweeps::Config,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db, Ntf> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`Notifier`] of this [`Service`].
    notifier: Ntf,
}

impl<Db, Ntf> Service<Db, Ntf> {
    /// Creates a new [`Service`] with the provided parameters, spawning its
    /// background [`Task`]s.
    pub fn new(
        config: Config,
        database: Db,
        notifier: Ntf,
    ) -> (Self, task::Background)
    where
        Self: Task<
                Start<By<task::RunSweeps<Self>, task::run_sweeps::Config>>,
                Ok = (),
                Err: Error,
            > + Clone
            + 'static,
    {
        let this = Self::detached(config, database, notifier);

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn(async move {
            svc.execute(Start(By::new(svc.config().sweeps))).await
        });

        (this, bg)
    }

    /// Creates a new [`Service`] with the provided parameters, without
    /// spawning any background [`Task`]s.
    #[must_use]
    pub fn detached(config: Config, database: Db, notifier: Ntf) -> Self {
        Self {
            config,
            database,
            notifier,
        }
    }

    /// Returns [`Config`] of this [`Service`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns [`Notifier`] of this [`Service`].
    #[must_use]
    pub fn notifier(&self) -> &Ntf {
        &self.notifier
    }

    /// Sends the provided [`Notice`], returning whether it was delivered.
    ///
    /// Delivery failures are logged and never propagated.
    pub(crate) async fn notify<N>(&self, notice: N) -> bool
    where
        N: Notice,
        Ntf: Notifier<Notify<N>, Ok = (), Err = Traced<notifier::Error>>,
    {
        let recipient = notice.recipient().clone();
        match self.notifier.execute(Notify(notice)).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!(
                    "failed to send `{}` notice to `{recipient}`: {e}",
                    N::TEMPLATE,
                );
                false
            }
        }
    }
}

/// Category of a failed [`Command`] or [`Query`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Failure {
    /// Referenced entity does not exist.
    #[display("not found")]
    NotFound,

    /// Provided input is malformed or logically inconsistent.
    #[display("bad request")]
    BadRequest,

    /// Operation conflicts with the current state of the data.
    #[display("conflict")]
    Conflict,

    /// Unexpected infrastructure failure.
    #[display("internal")]
    Internal,
}

/// Error classified into a [`Failure`] category.
pub trait Classified {
    /// Returns the [`Failure`] category of this error.
    fn failure(&self) -> Failure;
}

impl<E: Classified> Classified for Traced<E> {
    fn failure(&self) -> Failure {
        self.as_ref().failure()
    }
}

impl Classified for infra::database::Error {
    fn failure(&self) -> Failure {
        Failure::Internal
    }
}
