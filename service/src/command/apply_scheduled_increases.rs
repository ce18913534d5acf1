//! [`Command`] for applying the rent adjustments that became due.

use common::{
    operations::{By, Select},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{contract, increase, Contract, Increase},
    infra::{database, Database},
    read, Classified, Failure, Service,
};

use super::{apply_increase, ApplyIncrease, Command};

/// [`Command`] catching up the rent adjustments of the [`Active`]
/// [`Contract`]s that became due by `today`.
///
/// Only [`Contract`]s having at least one [`Increase`] are adjusted, carrying
/// forward the adjustment and the [`Index`] of the latest one.
///
/// [`Active`]: contract::Status::Active
/// [`Index`]: crate::domain::Index
#[derive(Clone, Copy, Debug)]
pub struct ApplyScheduledIncreases {
    /// [`Date`] the sweep is performed at.
    pub today: Date,
}

impl<Db, Ntf> Command<ApplyScheduledIncreases> for Service<Db, Ntf>
where
    Db: Database<
            Select<By<Vec<Contract>, contract::Status>>,
            Ok = Vec<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Increase>, contract::Id>>,
            Ok = Vec<Increase>,
            Err = Traced<database::Error>,
        >,
    Self: Command<
        ApplyIncrease,
        Ok = Increase,
        Err = Traced<apply_increase::ExecutionError>,
    >,
{
    type Ok = read::Report;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ApplyScheduledIncreases,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ApplyScheduledIncreases { today } = cmd;

        let contracts = self
            .database()
            .execute(Select(By::new(contract::Status::Active)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut report = read::Report::default();
        for contract in contracts {
            let end_date: Date = contract.end_date.coerce();
            if end_date <= today {
                continue;
            }

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
            let Some(latest) = increase::latest(&increases) else {
                continue;
            };

            let mut last = latest.date.coerce();
            let mut matched = false;
            while let Some(next) = contract
                .next_adjustment_date(last)
                .filter(|d| *d <= today && *d <= end_date)
            {
                matched = true;
                let applied = self
                    .execute(ApplyIncrease {
                        contract_id: contract.id,
                        date: next.coerce(),
                        adjustment: latest.adjustment,
                        index_id: Some(latest.index_id),
                        note: None,
                    })
                    .await;
                if let Err(e) = applied {
                    log::error!(
                        "failed to apply scheduled increase of \
                         `Contract(id: {})` at `{next}`: {e}",
                        contract.id,
                    );
                    report.failed += 1;
                    break;
                }
                report.updated += 1;
                last = next;
            }
            if matched {
                report.matched += 1;
            }
        }

        Ok(report)
    }
}

/// Error of [`ApplyScheduledIncreases`] [`Command`] execution.
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
