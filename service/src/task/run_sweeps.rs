//! [`RunSweeps`] [`Task`].

use std::{convert::Infallible, fmt, time};

use common::{
    operations::{By, Perform, Start},
    Date,
};
use derive_more::{Display, Error};
use tokio::time::interval;
use tracing as log;

use crate::{
    command::{
        ApplyScheduledIncreases, NotifyContractExpirations,
        NotifyUpcomingIncreases, RemindRentPayments, RemindUtilityCharges,
    },
    read, Command, Service,
};

use super::Task;

/// Configuration for [`RunSweeps`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between sweep passes.
    pub interval: time::Duration,
}

/// [`Task`] periodically running all the time-triggered sweeps.
#[derive(Clone, Copy, Debug)]
pub struct RunSweeps<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<S> RunSweeps<S> {
    /// Creates a new [`RunSweeps`] [`Task`] over the provided `service`.
    #[must_use]
    pub fn new(config: Config, service: S) -> Self {
        Self { config, service }
    }
}

impl<Db, Ntf> Task<Start<By<RunSweeps<Self>, Config>>> for Service<Db, Ntf>
where
    RunSweeps<Service<Db, Ntf>>:
        Task<Perform<Date>, Ok = (), Err: Error> + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<RunSweeps<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let task = RunSweeps::new(by.into_inner(), self.clone());

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(Date::today())).await.map_err(|e| {
                log::error!("`task::RunSweeps` failed: {e}");
            });
        }
    }
}

impl<Db, Ntf> Task<Perform<Date>> for RunSweeps<Service<Db, Ntf>>
where
    Service<Db, Ntf>: Command<
            NotifyUpcomingIncreases,
            Ok = read::Report,
            Err: fmt::Display,
        > + Command<
            NotifyContractExpirations,
            Ok = read::Report,
            Err: fmt::Display,
        > + Command<RemindRentPayments, Ok = read::Report, Err: fmt::Display>
        + Command<
            ApplyScheduledIncreases,
            Ok = read::Report,
            Err: fmt::Display,
        > + Command<RemindUtilityCharges, Ok = read::Report, Err: fmt::Display>,
{
    type Ok = ();
    type Err = ExecutionError;

    async fn execute(
        &self,
        Perform(today): Perform<Date>,
    ) -> Result<Self::Ok, Self::Err> {
        let svc = &self.service;
        // Increases are applied first, so the notices count from them.
        let results = [
            (
                "ApplyScheduledIncreases",
                svc.execute(ApplyScheduledIncreases { today })
                    .await
                    .map_err(|e| e.to_string()),
            ),
            (
                "NotifyUpcomingIncreases",
                svc.execute(NotifyUpcomingIncreases { today })
                    .await
                    .map_err(|e| e.to_string()),
            ),
            (
                "NotifyContractExpirations",
                svc.execute(NotifyContractExpirations { today })
                    .await
                    .map_err(|e| e.to_string()),
            ),
            (
                "RemindRentPayments",
                svc.execute(RemindRentPayments { today })
                    .await
                    .map_err(|e| e.to_string()),
            ),
            (
                "RemindUtilityCharges",
                svc.execute(RemindUtilityCharges { today })
                    .await
                    .map_err(|e| e.to_string()),
            ),
        ];

        let mut failed = 0;
        for (sweep, result) in results {
            match result {
                Ok(report) => {
                    log::info!("`command::{sweep}` at {today}: {report}");
                }
                Err(e) => {
                    failed += 1;
                    log::error!("`command::{sweep}` at {today} failed: {e}");
                }
            }
        }
        if failed > 0 {
            return Err(ExecutionError { failed });
        }
        Ok(())
    }
}

/// Error of [`RunSweeps`] execution.
///
/// Details of every failed sweep are logged as they happen.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("{failed} of the sweeps failed")]
pub struct ExecutionError {
    /// Number of the failed sweeps.
    pub failed: usize,
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::operations::Perform;

    use crate::{
        domain::contract::Frequency,
        notice::{self, Notice as _},
        spec::{date, Fixture},
        Task as _,
    };

    use super::{Config, RunSweeps};

    #[tokio::test]
    async fn runs_every_sweep() {
        let f = Fixture::new().await;
        _ = f.contract("2024-01-01", "2024-06-01").await;
        _ = f.contract("2024-01-01", "2025-01-01").await;
        let task = RunSweeps::new(
            Config {
                interval: Duration::from_secs(60),
            },
            f.service.clone(),
        );

        task.execute(Perform(date("2024-05-01"))).await.unwrap();

        let expiring = f
            .notifier
            .sent_with(notice::UpcomingExpiration::TEMPLATE)
            .await;
        assert_eq!(expiring.len(), 1);
        let reminded = f
            .notifier
            .sent_with(notice::RentPaymentReminder::TEMPLATE)
            .await;
        assert_eq!(reminded.len(), 1);
    }

    #[tokio::test]
    async fn announces_adjustments_following_applied_ones() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-15", "2025-01-15").await;
        f.db.seed(|s| {
            if let Some(c) = s.contracts.get_mut(&c.id) {
                c.adjustment_frequency = Frequency::new(1).unwrap();
            }
        })
        .await;
        f.increase(c.id, "2024-04-15").await;
        let task = RunSweeps::new(
            Config {
                interval: Duration::from_secs(60),
            },
            f.service.clone(),
        );

        for today in ["2024-05-15", "2024-05-16"] {
            task.execute(Perform(date(today))).await.unwrap();
        }

        let mut dates = f
            .state()
            .await
            .increases
            .into_values()
            .map(|i| i.date.coerce::<()>())
            .collect::<Vec<_>>();
        dates.sort();
        assert_eq!(dates, [date("2024-04-15"), date("2024-05-15")]);
        let upcoming = f
            .notifier
            .sent_with(notice::UpcomingIncrease::TEMPLATE)
            .await;
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].payload["date"], "2024-06-15");
    }
}
