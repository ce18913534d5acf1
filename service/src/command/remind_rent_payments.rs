//! [`Command`] for reminding tenants of their rent payments.

use common::{
    operations::{By, Notify, Select},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{contract, increase, user, Contract, Increase, User},
    infra::{database, notifier, Database, Notifier},
    notice, read, Classified, Failure, Service,
};

use super::Command;

/// [`Command`] reminding tenants of the [`Active`] [`Contract`]s, not expiring
/// within a month, to pay their rent.
///
/// Reminders are sent only on the configured day of the month.
///
/// [`Active`]: contract::Status::Active
#[derive(Clone, Copy, Debug)]
pub struct RemindRentPayments {
    /// [`Date`] the sweep is performed at.
    pub today: Date,
}

impl<Db, Ntf> Command<RemindRentPayments> for Service<Db, Ntf>
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
        Notify<notice::RentPaymentReminder>,
        Ok = (),
        Err = Traced<notifier::Error>,
    >,
{
    type Ok = read::Report;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RemindRentPayments,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RemindRentPayments { today } = cmd;

        let mut report = read::Report::default();
        if today.day() != self.config().rent_reminder_day {
            return Ok(report);
        }

        let contracts = self
            .database()
            .execute(Select(By::new(contract::Status::Active)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        for contract in contracts {
            if contract.expires_within_month(today) {
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
                         rent payment is not reminded",
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

            let amount = match self
                .database()
                .execute(Select(By::<Vec<Increase>, _>::new(contract.id)))
                .await
            {
                Ok(increases) => increase::effective(&increases, today)
                    .map_or(contract.initial_amount, |i| i.amount),
                Err(e) => {
                    log::error!(
                        "failed to load `Increase`s of `Contract(id: {})`: {e}",
                        contract.id,
                    );
                    report.failed += 1;
                    continue;
                }
            };

            report.sent(
                self.notify(notice::RentPaymentReminder {
                    to: tenant.email,
                    first_name: tenant.first_name,
                    contract_id: contract.id,
                    due_date: today,
                    amount,
                })
                .await,
            );
        }

        Ok(report)
    }
}

/// Error of [`RemindRentPayments`] [`Command`] execution.
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
    use rust_decimal::Decimal;

    use crate::{
        domain::increase::spec::increase,
        spec::{date, Fixture},
        Command as _,
    };

    use super::RemindRentPayments;

    #[tokio::test]
    async fn reminds_only_on_configured_day() {
        let f = Fixture::new().await;
        _ = f.contract("2024-01-01", "2025-01-01").await;

        let report = f
            .service
            .execute(RemindRentPayments {
                today: date("2024-05-02"),
            })
            .await
            .unwrap();
        assert_eq!(report.matched, 0);
        assert!(f.notifier.sent().await.is_empty());

        let report = f
            .service
            .execute(RemindRentPayments {
                today: date("2024-05-01"),
            })
            .await
            .unwrap();
        assert_eq!(report.matched, 1);
        assert_eq!(report.notified, 1);
        let sent = f.notifier.sent_with("rent.payment.reminder").await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, f.tenant.email);
    }

    #[tokio::test]
    async fn skips_contracts_expiring_within_month() {
        let f = Fixture::new().await;
        _ = f.contract("2024-01-01", "2024-06-01").await;

        let report = f
            .service
            .execute(RemindRentPayments {
                today: date("2024-05-01"),
            })
            .await
            .unwrap();

        assert_eq!(report.matched, 0);
        assert!(f.notifier.sent().await.is_empty());
    }

    #[tokio::test]
    async fn reminds_effective_amount() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;
        let effective = increase(c.id, "2024-04-01", 1100);
        let future = increase(c.id, "2024-07-01", 1210);
        f.db.seed(|s| {
            _ = s.increases.insert(effective.id, effective);
            _ = s.increases.insert(future.id, future);
        })
        .await;

        _ = f
            .service
            .execute(RemindRentPayments {
                today: date("2024-05-01"),
            })
            .await
            .unwrap();

        let sent = f.notifier.sent_with("rent.payment.reminder").await;
        let amount: Decimal = sent[0].payload["amount"]["amount"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(amount, Decimal::from(1100));
        assert_eq!(sent[0].payload["due_date"], "2024-05-01");
    }
}
