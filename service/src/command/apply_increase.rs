//! [`Command`] for applying a percentage adjustment to the rent of a
//! [`Contract`].

use common::{
    operations::{
        By, Commit, Insert, Lock, Notify, Select, Transact, Transacted,
    },
    Money, Percent,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        contract, increase, index, user, Contract, Increase, Index, Note, User,
    },
    infra::{database, notifier, Database, Notifier},
    notice, Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for applying a percentage adjustment to the rent of a
/// [`Contract`].
///
/// The adjusted amount is computed from the latest [`Increase`] (or from the
/// initial amount of the [`Contract`], if there were none), and is effective
/// until the next adjustment.
#[derive(Clone, Debug)]
pub struct ApplyIncrease {
    /// ID of the adjusted [`Contract`].
    pub contract_id: contract::Id,

    /// [`Date`] the adjustment takes effect at.
    ///
    /// [`Date`]: common::Date
    pub date: increase::AdjustmentDate,

    /// Applied adjustment.
    pub adjustment: Percent,

    /// ID of the [`Index`] the adjustment is computed from.
    ///
    /// The one of the [`Contract`] is used, if omitted.
    pub index_id: Option<index::Id>,

    /// Free-text [`Note`] about the adjustment.
    pub note: Option<Note>,
}

impl<Db, Ntf> Command<ApplyIncrease> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Contract, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Index>, index::Id>>,
            Ok = Option<Index>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Increase>, contract::Id>>,
            Ok = Vec<Increase>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Insert<Increase>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Ntf: Notifier<
        Notify<notice::IncreaseCreated>,
        Ok = (),
        Err = Traced<notifier::Error>,
    >,
{
    type Ok = Increase;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ApplyIncrease,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ApplyIncrease {
            contract_id,
            date,
            adjustment,
            index_id,
            note,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent modifications.
        tx.execute(Lock(By::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let contract = tx
            .execute(Select(By::<Option<Contract>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractNotExists(contract_id))
            .map_err(tracerr::wrap!())?;

        let index_id = index_id.unwrap_or(contract.adjustment_index_id);
        tx.execute(Select(By::<Option<Index>, _>::new(index_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::IndexNotExists(index_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let increases = tx
            .execute(Select(By::<Vec<Increase>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let base = increase::latest(&increases)
            .map_or(contract.initial_amount, |i| i.amount);

        let period = increase::Period::starting_at(
            date.coerce(),
            contract.adjustment_frequency.months(),
        )
        .ok_or(E::DateOutOfRange)
        .map_err(tracerr::wrap!())?;

        let tenant = tx
            .execute(Select(By::<Option<User>, _>::new(contract.user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let increase = Increase {
            id: increase::Id::new(),
            contract_id,
            index_id,
            date,
            amount: Money {
                amount: adjustment.increase(base.amount),
                currency: base.currency,
            },
            adjustment,
            note,
            period: Some(period),
        };
        tx.execute(Insert(increase.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if let Some(tenant) = tenant {
            _ = self
                .notify(notice::IncreaseCreated {
                    to: tenant.email,
                    first_name: tenant.first_name,
                    contract_id,
                    date: increase.date.coerce(),
                    amount: increase.amount,
                    adjustment,
                })
                .await;
        } else {
            log::warn!(
                "`User(id: {})` of `Contract(id: {contract_id})` does not \
                 exist, `Increase(id: {})` is not notified",
                contract.user_id,
                increase.id,
            );
        }

        Ok(increase)
    }
}

/// Error of [`ApplyIncrease`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// Effective period of the [`Increase`] is out of the supported range.
    #[display("`Increase` period is out of the supported date range")]
    DateOutOfRange,

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Index`] with the provided ID does not exist.
    #[display("`Index(id: {_0})` does not exist")]
    IndexNotExists(#[error(not(source))] index::Id),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::ContractNotExists(_) | Self::IndexNotExists(_) => {
                Failure::NotFound
            }
            Self::DateOutOfRange => Failure::BadRequest,
        }
    }
}
