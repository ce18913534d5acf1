//! [`Command`] for reminding tenants of upcoming utility charges.

use common::{
    operations::{By, Notify, Select},
    Date,
};
use derive_more::{Display, Error, From};
use rust_decimal::Decimal;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        contract, contract_utility, user, Contract, ContractUtility, User,
    },
    infra::{database, notifier, Database, Notifier},
    notice,
    query::UtilitiesDueInTenDays,
    read, Classified, Failure, Query, Service,
};

use super::Command;

/// [`Command`] reminding tenants of the [`ContractUtility`] charges due in
/// ten days, and sending a digest of all of them to the administration.
///
/// The digest lists the charges even when their tenant cannot be resolved.
#[derive(Clone, Copy, Debug)]
pub struct RemindUtilityCharges {
    /// [`Date`] the sweep is performed at.
    pub today: Date,
}

impl<Db, Ntf> Command<RemindUtilityCharges> for Service<Db, Ntf>
where
    Db: Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<contract_utility::Increase>, contract_utility::Id>>,
            Ok = Vec<contract_utility::Increase>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        >,
    Ntf: Notifier<
            Notify<notice::UtilityChargeReminder>,
            Ok = (),
            Err = Traced<notifier::Error>,
        > + Notifier<
            Notify<notice::UtilityChargeDigest>,
            Ok = (),
            Err = Traced<notifier::Error>,
        >,
    Self: Query<
        UtilitiesDueInTenDays,
        Ok = Vec<ContractUtility>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = read::Report;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RemindUtilityCharges,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RemindUtilityCharges { today } = cmd;
        let due_date = today
            .checked_add_days(UtilitiesDueInTenDays::DAYS)
            .ok_or(E::DateOutOfRange)
            .map_err(tracerr::wrap!())?;

        let utilities = self
            .execute(UtilitiesDueInTenDays { today })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut report = read::Report::default();
        let mut charges = Vec::new();
        for utility in utilities {
            report.matched += 1;

            let contract = match self
                .database()
                .execute(Select(By::<Option<Contract>, _>::new(
                    utility.contract_id,
                )))
                .await
            {
                Ok(Some(contract)) => contract,
                Ok(None) => {
                    log::warn!(
                        "`Contract(id: {})` of `ContractUtility(id: {})` does \
                         not exist, charge is not reminded",
                        utility.contract_id,
                        utility.id,
                    );
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    log::error!(
                        "failed to load `Contract(id: {})`: {e}",
                        utility.contract_id,
                    );
                    report.failed += 1;
                    continue;
                }
            };

            let amount = match self
                .database()
                .execute(Select(By::<Vec<contract_utility::Increase>, _>::new(
                    utility.id,
                )))
                .await
            {
                Ok(increases) => charged_amount(&utility, &increases, due_date),
                Err(e) => {
                    log::error!(
                        "failed to load increases of \
                         `ContractUtility(id: {})`: {e}",
                        utility.id,
                    );
                    report.failed += 1;
                    continue;
                }
            };

            let tenant = self
                .database()
                .execute(Select(By::<Option<User>, _>::new(contract.user_id)))
                .await;
            charges.push(notice::UtilityDigestEntry {
                contract_id: contract.id,
                contract_utility_id: utility.id,
                tenant: tenant
                    .as_ref()
                    .ok()
                    .and_then(Option::as_ref)
                    .map(User::full_name),
                amount,
            });
            let tenant = match tenant {
                Ok(Some(tenant)) => tenant,
                Ok(None) => {
                    log::warn!(
                        "`User(id: {})` of `Contract(id: {})` does not exist, \
                         charge of `ContractUtility(id: {})` is not reminded",
                        contract.user_id,
                        contract.id,
                        utility.id,
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
            report.sent(
                self.notify(notice::UtilityChargeReminder {
                    to: tenant.email,
                    first_name: tenant.first_name,
                    contract_id: contract.id,
                    contract_utility_id: utility.id,
                    due_date,
                    amount,
                })
                .await,
            );
        }

        if !charges.is_empty() {
            report.sent(
                self.notify(notice::UtilityChargeDigest {
                    to: self.config().admin_email.clone(),
                    due_date,
                    charges,
                })
                .await,
            );
        }

        Ok(report)
    }
}

/// Returns the amount the provided [`ContractUtility`] is charged at the
/// `due_date`: the one of its latest [`contract_utility::Increase`] in effect
/// by then, or its last paid amount, or its initial one.
fn charged_amount(
    utility: &ContractUtility,
    increases: &[contract_utility::Increase],
    due_date: Date,
) -> Decimal {
    increases
        .iter()
        .filter(|i| i.date.coerce::<()>() <= due_date)
        .max_by_key(|i| i.date)
        .map(|i| i.amount)
        .or(utility.last_paid_amount)
        .unwrap_or(utility.initial_amount)
}

/// Error of [`RemindUtilityCharges`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Due date is out of the supported range.
    #[display("Due date is out of the supported date range")]
    DateOutOfRange,

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::DateOutOfRange => Failure::BadRequest,
        }
    }
}
