//! [`Command`] for announcing and applying [`Contract`] expirations.

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
        user, Contract, User,
    },
    infra::{database, notifier, Database, Notifier},
    notice, read, Classified, Failure, Service,
};

use super::{update_contract_status, Command, UpdateContractStatus};

/// [`Command`] sweeping the [`Active`] [`Contract`]s by their end date.
///
/// Tenants of the [`Contract`]s ending exactly one calendar month after
/// `today` are notified, and a digest of them is sent to the administration.
/// [`Contract`]s ending `today` are deactivated.
///
/// [`Active`]: contract::Status::Active
#[derive(Clone, Copy, Debug)]
pub struct NotifyContractExpirations {
    /// [`Date`] the sweep is performed at.
    pub today: Date,
}

impl<Db, Ntf> Command<NotifyContractExpirations> for Service<Db, Ntf>
where
    Db: Database<
            Select<By<Vec<Contract>, contract::Status>>,
            Ok = Vec<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        >,
    Ntf: Notifier<
            Notify<notice::UpcomingExpiration>,
            Ok = (),
            Err = Traced<notifier::Error>,
        > + Notifier<
            Notify<notice::UpcomingExpirationDigest>,
            Ok = (),
            Err = Traced<notifier::Error>,
        >,
    Self: Command<
        UpdateContractStatus,
        Ok = Contract,
        Err = Traced<update_contract_status::ExecutionError>,
    >,
{
    type Ok = read::Report;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: NotifyContractExpirations,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let NotifyContractExpirations { today } = cmd;

        let contracts = self
            .database()
            .execute(Select(By::new(contract::Status::Active)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut report = read::Report::default();
        let mut digest = Vec::new();
        for contract in contracts {
            let end_date = contract.end_date.coerce();

            if end_date == today {
                report.matched += 1;
                match self
                    .execute(UpdateContractStatus {
                        contract_id: contract.id,
                    })
                    .await
                {
                    Ok(_) => report.updated += 1,
                    Err(e) if e.failure() == Failure::NotFound => {
                        log::warn!(
                            "expired `Contract(id: {})` is not deactivated: \
                             {e}",
                            contract.id,
                        );
                        report.skipped += 1;
                    }
                    Err(e) => {
                        log::error!(
                            "failed to deactivate expired \
                             `Contract(id: {})`: {e}",
                            contract.id,
                        );
                        report.failed += 1;
                    }
                }
                continue;
            }

            if !is_one_month_ahead(end_date, today) {
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
                         upcoming expiration is not notified",
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
                self.notify(notice::UpcomingExpiration {
                    to: tenant.email,
                    first_name: tenant.first_name,
                    contract_id: contract.id,
                    end_date,
                })
                .await,
            );
        }

        if let (false, Some(end_date)) =
            (digest.is_empty(), today.checked_add_months(1))
        {
            report.sent(
                self.notify(notice::UpcomingExpirationDigest {
                    to: self.config().admin_email.clone(),
                    end_date,
                    contracts: digest,
                })
                .await,
            );
        }

        Ok(report)
    }
}

/// Error of [`NotifyContractExpirations`] [`Command`] execution.
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
        domain::{contract, property, user, Contract},
        spec::{date, Fixture, ADMIN},
        Command as _,
    };

    use super::NotifyContractExpirations;

    #[tokio::test]
    async fn notifies_exactly_one_month_ahead() {
        let f = Fixture::new().await;
        _ = f.contract("2024-01-01", "2024-06-15").await;

        for today in ["2024-05-14", "2024-05-16"] {
            let report = f
                .service
                .execute(NotifyContractExpirations { today: date(today) })
                .await
                .unwrap();
            assert_eq!(report.matched, 0, "{today}");
        }

        let report = f
            .service
            .execute(NotifyContractExpirations {
                today: date("2024-05-15"),
            })
            .await
            .unwrap();

        assert_eq!(report.matched, 1);
        assert_eq!(report.notified, 2);
        assert_eq!(f.notifier.sent_with("contract.expiring").await.len(), 1);
        let digest = f.notifier.sent_with("contract.expiring.digest").await;
        assert_eq!(digest.len(), 1);
        assert_eq!(digest[0].to.to_string(), ADMIN);
    }

    #[tokio::test]
    async fn deactivates_contracts_ending_today() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2024-06-15").await;

        let report = f
            .service
            .execute(NotifyContractExpirations {
                today: date("2024-06-15"),
            })
            .await
            .unwrap();

        assert_eq!(report.matched, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(
            f.stored(c.id).await.map(|c| c.status),
            Some(contract::Status::Inactive),
        );
        assert!(!f.is_tenant(f.tenant.id).await);
        assert_eq!(f.property_status().await, property::Status::Available);
        assert_eq!(f.notifier.sent_with("contract.expired").await.len(), 1);
        assert!(f
            .notifier
            .sent_with("contract.expiring.digest")
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn skips_unresolved_tenants() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2024-06-15").await;
        let expiring = Contract {
            id: contract::Id::new(),
            user_id: user::Id::new(),
            ..c.clone()
        };
        let ending = Contract {
            id: contract::Id::new(),
            user_id: user::Id::new(),
            end_date: date("2024-05-15").coerce(),
            ..c
        };
        f.db.seed(|s| {
            _ = s.contracts.insert(expiring.id, expiring);
            _ = s.contracts.insert(ending.id, ending.clone());
        })
        .await;

        let report = f
            .service
            .execute(NotifyContractExpirations {
                today: date("2024-05-15"),
            })
            .await
            .unwrap();

        assert_eq!(report.matched, 3);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(f.stored(ending.id).await, Some(ending));
        assert_eq!(f.notifier.sent_with("contract.expiring").await.len(), 1);
    }
}
