//! [`Command`] for replacing an existing [`Increase`].

use common::{
    operations::{
        By, Commit, Insert, Lock, Notify, Select, Transact, Transacted,
    },
    Currency, Money, Percent,
};
use derive_more::{Display, Error, From};
use rust_decimal::Decimal;
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

/// [`Command`] for replacing all the fields of an existing [`Increase`].
#[derive(Clone, Debug)]
pub struct UpdateIncrease {
    /// ID of the [`Increase`] to be replaced.
    pub increase_id: increase::Id,

    /// ID of the adjusted [`Contract`].
    pub contract_id: contract::Id,

    /// ID of the [`Index`] the [`Increase`] is computed from.
    pub index_id: index::Id,

    /// [`Date`] the [`Increase`] takes effect at.
    ///
    /// [`Date`]: common::Date
    pub date: increase::AdjustmentDate,

    /// Adjusted rent amount.
    pub amount: Money,

    /// Applied adjustment.
    pub adjustment: Percent,

    /// Free-text [`Note`] about the [`Increase`].
    pub note: Option<Note>,

    /// [`increase::Period`] the [`Increase`] is effective in.
    pub period: Option<increase::Period>,
}

impl<Db, Ntf> Command<UpdateIncrease> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Contract, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Increase>, increase::Id>>,
            Ok = Option<Increase>,
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
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Insert<Increase>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Ntf: Notifier<
        Notify<notice::IncreaseUpdated>,
        Ok = (),
        Err = Traced<notifier::Error>,
    >,
{
    type Ok = Increase;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateIncrease,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateIncrease {
            increase_id,
            contract_id,
            index_id,
            date,
            amount,
            adjustment,
            note,
            period,
        } = cmd;

        if amount.amount < Decimal::ZERO {
            return Err(tracerr::new!(E::NegativeAmount(amount.amount)));
        }

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

        let existing = tx
            .execute(Select(By::<Option<Increase>, _>::new(increase_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::IncreaseNotExists(increase_id))
            .map_err(tracerr::wrap!())?;
        if existing.contract_id != contract_id {
            // Serialize with the mutations of the previous owner too.
            tx.execute(Lock(By::new(existing.contract_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        let contract = tx
            .execute(Select(By::<Option<Contract>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractNotExists(contract_id))
            .map_err(tracerr::wrap!())?;
        if amount.currency != contract.currency() {
            return Err(tracerr::new!(E::CurrencyMismatch(
                amount.currency,
                contract.currency(),
            )));
        }

        tx.execute(Select(By::<Option<Index>, _>::new(index_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::IndexNotExists(index_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let tenant = tx
            .execute(Select(By::<Option<User>, _>::new(contract.user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let increase = Increase {
            id: increase_id,
            contract_id,
            index_id,
            date,
            amount,
            adjustment,
            note,
            period,
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
                .notify(notice::IncreaseUpdated {
                    to: tenant.email,
                    first_name: tenant.first_name,
                    contract_id,
                    date: increase.date.coerce(),
                    amount: increase.amount,
                    adjustment: increase.adjustment,
                })
                .await;
        } else {
            log::warn!(
                "`User(id: {})` of `Contract(id: {contract_id})` does not \
                 exist, `Increase(id: {increase_id})` update is not notified",
                contract.user_id,
            );
        }

        Ok(increase)
    }
}

/// Error of [`UpdateIncrease`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Currency`] of the [`Increase`] differs from the [`Contract`] one.
    #[display("`Increase` currency `{_0}` differs from `Contract` one `{_1}`")]
    CurrencyMismatch(Currency, Currency),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Increase`] with the provided ID does not exist.
    #[display("`Increase(id: {_0})` does not exist")]
    IncreaseNotExists(#[error(not(source))] increase::Id),

    /// [`Index`] with the provided ID does not exist.
    #[display("`Index(id: {_0})` does not exist")]
    IndexNotExists(#[error(not(source))] index::Id),

    /// Adjusted amount is negative.
    #[display("`Increase` amount must not be negative, but is `{_0}`")]
    NegativeAmount(#[error(not(source))] Decimal),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::ContractNotExists(_)
            | Self::IncreaseNotExists(_)
            | Self::IndexNotExists(_) => Failure::NotFound,
            Self::CurrencyMismatch(..) | Self::NegativeAmount(_) => {
                Failure::BadRequest
            }
        }
    }
}
