//! [`Command`] for announcing rent adjustments due in a month.

use common::{
    operations::{By, Notify, Select},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        contract::{self, is_one_month_ahead},
        increase, user, Contract, Increase, User,
    },
    infra::{database, notifier, Database, Notifier},
    notice, read, Classified, Failure, Service,
};

use super::Command;

/// [`Command`] notifying tenants of the [`Active`] [`Contract`]s, whose next
/// rent adjustment is exactly one calendar month after `today`, and sending
/// a digest of all of them to the administration.
///
/// Only [`Contract`]s having at least one [`Increase`] are considered, the
/// same as by [`ApplyScheduledIncreases`].
///
/// [`ApplyScheduledIncreases`]: super::ApplyScheduledIncreases
/// [`Active`]: contract::Status::Active
#[derive(Clone, Copy, Debug)]
pub struct NotifyUpcomingIncreases {
    /// [`Date`] the sweep is performed at.
    pub today: Date,
}

impl<Db, Ntf> Command<NotifyUpcomingIncreases> for Service<Db, Ntf>
where
    Db: Database<
            Select<By<Vec<Contract>, contract::Status>>,
            Ok = Vec<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Increase>, contract::Id>>,
            Ok = Vec<Increase>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        >,
    Ntf: Notifier<
            Notify<notice::UpcomingIncrease>,
            Ok = (),
            Err = Traced<notifier::Error>,
        > + Notifier<
            Notify<notice::UpcomingIncreaseDigest>,
            Ok = (),
            Err = Traced<notifier::Error>,
        >,
{
    type Ok = read::Report;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: NotifyUpcomingIncreases,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let NotifyUpcomingIncreases { today } = cmd;
        let target = today.checked_add_months(1);

        let contracts = self
            .database()
            .execute(Select(By::new(contract::Status::Active)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut report = read::Report::default();
        let mut digest = Vec::new();
        for contract in contracts {
            let increases = match self
                .database()
                .execute(Select(By::<Vec<Increase>, _>::new(contract.id)))
                .await
            {
                Ok(increases) => increases,
                Err(e) => {
                    log::error!(
                        "failed to load `Increase`s of `Contract(id: {})`: {e}",
                        contract.id,
                    );
                    report.failed += 1;
                    continue;
                }
            };
            let Some(date) = increase::latest(&increases)
                .and_then(|i| contract.next_adjustment_date(i.date.coerce()))
            else {
                continue;
            };
            if !is_one_month_ahead(date, today)
                || date > contract.end_date.coerce()
            {
                continue;
            }
            report.matched += 1;

            let tenant = match self
                .database()
                .execute(Select(By::<Option<User>, _>::new(contract.user_id)))
                .await
            {
                Ok(Some(tenant)) => tenant,
                Ok(None) => {
                    log::warn!(
                        "`User(id: {})` of `Contract(id: {})` does not exist, \
                         upcoming increase is not notified",
                        contract.user_id,
                        contract.id,
                    );
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    log::error!(
                        "failed to load `User(id: {})`: {e}",
                        contract.user_id,
                    );
                    report.failed += 1;
                    continue;
                }
            };

            digest.push(notice::DigestEntry {
                contract_id: contract.id,
                tenant: tenant.full_name(),
                email: tenant.email.clone(),
            });
            report.sent(
                self.notify(notice::UpcomingIncrease {
                    to: tenant.email,
                    first_name: tenant.first_name,
                    contract_id: contract.id,
                    date,
                })
                .await,
            );
        }

        if let (false, Some(date)) = (digest.is_empty(), target) {
            report.sent(
                self.notify(notice::UpcomingIncreaseDigest {
                    to: self.config().admin_email.clone(),
                    date,
                    contracts: digest,
                })
                .await,
            );
        }

        Ok(report)
    }
}

/// Error of [`NotifyUpcomingIncreases`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{contract, increase::spec::increase, user, Contract},
        spec::{date, Fixture, ADMIN},
        Command as _,
    };

    use super::NotifyUpcomingIncreases;

    #[tokio::test]
    async fn notifies_exactly_one_month_ahead() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-15", "2025-01-15").await;
        f.increase(c.id, "2024-01-15").await;

        for today in ["2024-03-14", "2024-03-16", "2024-04-15"] {
            let report = f
                .service
                .execute(NotifyUpcomingIncreases { today: date(today) })
                .await
                .unwrap();
            assert_eq!(report.matched, 0, "{today}");
        }
        assert!(f.notifier.sent().await.is_empty());

        let report = f
            .service
            .execute(NotifyUpcomingIncreases {
                today: date("2024-03-15"),
            })
            .await
            .unwrap();

        assert_eq!(report.matched, 1);
        assert_eq!(report.notified, 2);
        let sent = f.notifier.sent_with("increase.upcoming").await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, f.tenant.email);
        let digest = f.notifier.sent_with("increase.upcoming.digest").await;
        assert_eq!(digest.len(), 1);
        assert_eq!(digest[0].to.to_string(), ADMIN);
    }

    #[tokio::test]
    async fn counts_from_latest_increase() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-15", "2025-01-15").await;
        let inc = increase(c.id, "2024-04-15", 1100);
        f.db.seed(|s| {
            _ = s.increases.insert(inc.id, inc);
        })
        .await;

        let report = f
            .service
            .execute(NotifyUpcomingIncreases {
                today: date("2024-03-15"),
            })
            .await
            .unwrap();
        assert_eq!(report.matched, 0);

        let report = f
            .service
            .execute(NotifyUpcomingIncreases {
                today: date("2024-06-15"),
            })
            .await
            .unwrap();
        assert_eq!(report.matched, 1);
    }

    #[tokio::test]
    async fn ignores_adjustments_after_the_end() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-15", "2024-04-01").await;
        f.increase(c.id, "2024-01-15").await;

        let report = f
            .service
            .execute(NotifyUpcomingIncreases {
                today: date("2024-03-15"),
            })
            .await
            .unwrap();

        assert_eq!(report.matched, 0);
    }

    #[tokio::test]
    async fn skips_unresolved_tenants_and_tolerates_failures() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-15", "2025-01-15").await;
        let c_id = c.id;
        let orphan = Contract {
            id: contract::Id::new(),
            user_id: user::Id::new(),
            ..c.clone()
        };
        let other = Fixture::user("Juan", "Pérez", "juan@mail.example");
        f.add_user(&other).await;
        let rejecting = Contract {
            id: contract::Id::new(),
            user_id: other.id,
            ..c
        };
        let (orphan_id, rejecting_id) = (orphan.id, rejecting.id);
        f.db.seed(|s| {
            _ = s.contracts.insert(orphan.id, orphan);
            _ = s.contracts.insert(rejecting.id, rejecting);
        })
        .await;
        for id in [c_id, orphan_id, rejecting_id] {
            f.increase(id, "2024-01-15").await;
        }
        f.notifier.reject(other.email.clone()).await;

        let report = f
            .service
            .execute(NotifyUpcomingIncreases {
                today: date("2024-03-15"),
            })
            .await
            .unwrap();

        assert_eq!(report.matched, 3);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.notified, 2);
        assert_eq!(f.notifier.sent_with("increase.upcoming").await.len(), 1);
        let digest = f.notifier.sent_with("increase.upcoming.digest").await;
        assert_eq!(digest[0].payload["contracts"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn skips_contracts_without_increases() {
        let f = Fixture::new().await;
        _ = f.contract("2024-01-15", "2025-01-15").await;

        let report = f
            .service
            .execute(NotifyUpcomingIncreases {
                today: date("2024-03-15"),
            })
            .await
            .unwrap();

        assert_eq!(report.matched, 0);
        assert!(f.notifier.sent().await.is_empty());
    }
}
