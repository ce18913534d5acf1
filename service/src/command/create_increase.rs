//! [`Command`] for recording a new [`Increase`] of a [`Contract`].

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

/// [`Command`] for recording a new [`Increase`] of a [`Contract`].
#[derive(Clone, Debug)]
pub struct CreateIncrease {
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

impl<Db, Ntf> Command<CreateIncrease> for Service<Db, Ntf>
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
        cmd: CreateIncrease,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateIncrease {
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
            id: increase::Id::new(),
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
                .notify(notice::IncreaseCreated {
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
                 exist, `Increase(id: {})` is not notified",
                contract.user_id,
                increase.id,
            );
        }

        Ok(increase)
    }
}

/// Error of [`CreateIncrease`] [`Command`] execution.
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
            Self::ContractNotExists(_) | Self::IndexNotExists(_) => {
                Failure::NotFound
            }
            Self::CurrencyMismatch(..) | Self::NegativeAmount(_) => {
                Failure::BadRequest
            }
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{Currency, Money, Percent};
    use rust_decimal::Decimal;

    use crate::{
        domain::{contract, increase, index},
        spec::{date, Fixture},
        Classified as _, Command as _, Failure,
    };

    use super::CreateIncrease;

    fn request(f: &Fixture, contract_id: contract::Id) -> CreateIncrease {
        CreateIncrease {
            contract_id,
            index_id: f.index.id,
            date: date("2024-04-01").coerce(),
            amount: Money {
                amount: Decimal::from(1100),
                currency: Currency::Ars,
            },
            adjustment: Percent::new(Decimal::TEN).unwrap(),
            note: None,
            period: increase::Period::starting_at(date("2024-04-01"), 3),
        }
    }

    #[tokio::test]
    async fn records_and_notifies() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;

        let inc = f.service.execute(request(&f, c.id)).await.unwrap();

        assert_eq!(f.state().await.increases.get(&inc.id), Some(&inc));
        let sent = f.notifier.sent_with("increase.created").await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, f.tenant.email);
    }

    #[tokio::test]
    async fn rejects_negative_amount() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;

        for req in [
            request(&f, c.id),
            request(&f, contract::Id::new()),
            CreateIncrease {
                index_id: index::Id::new(),
                ..request(&f, c.id)
            },
        ] {
            let req = CreateIncrease {
                amount: Money {
                    amount: Decimal::from(-1),
                    currency: Currency::Ars,
                },
                ..req
            };
            let err = f.service.execute(req).await.unwrap_err();
            assert_eq!(err.failure(), Failure::BadRequest);
        }

        assert!(f.state().await.increases.is_empty());
        assert!(f.notifier.sent().await.is_empty());
    }

    #[tokio::test]
    async fn rejects_foreign_currency() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;

        let req = CreateIncrease {
            amount: Money {
                amount: Decimal::from(10),
                currency: Currency::Usd,
            },
            ..request(&f, c.id)
        };
        let err = f.service.execute(req).await.unwrap_err();

        assert_eq!(err.failure(), Failure::BadRequest);
    }

    #[tokio::test]
    async fn requires_existing_contract_and_index() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;

        let err = f
            .service
            .execute(request(&f, contract::Id::new()))
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Failure::NotFound);

        let req = CreateIncrease {
            index_id: index::Id::new(),
            ..request(&f, c.id)
        };
        let err = f.service.execute(req).await.unwrap_err();
        assert_eq!(err.failure(), Failure::NotFound);
    }
}
