//! [`Command`] for recording a new [`Commission`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    Date, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{commission, contract, Commission, Contract, Note},
    infra::{database, Database},
    Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for recording a new [`Commission`] of a [`Contract`].
#[derive(Clone, Debug)]
pub struct CreateCommission {
    /// ID of the [`Contract`] the [`Commission`] is charged for.
    pub contract_id: contract::Id,

    /// Total charged amount.
    pub amount: Money,

    /// [`Date`] the [`Commission`] is charged at.
    pub date: Date,

    /// How the [`Commission`] is paid.
    pub payment_type: commission::PaymentType,

    /// Number of installments the [`Commission`] is paid in.
    pub installments: commission::Installments,

    /// Initial [`commission::Status`].
    pub status: commission::Status,

    /// Free-text [`Note`] about the [`Commission`].
    pub note: Option<Note>,
}

impl<Db, Ntf> Command<CreateCommission> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Contract, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<Insert<Commission>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Commission;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateCommission,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateCommission {
            contract_id,
            amount,
            date,
            payment_type,
            installments,
            status,
            note,
        } = cmd;

        let commission = Commission {
            id: commission::Id::new(),
            contract_id,
            amount,
            date,
            payment_type,
            installments,
            status,
            note,
        };
        commission
            .validate()
            .map_err(tracerr::from_and_wrap!(=> E))?;

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

        tx.execute(Select(By::<Option<Contract>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractNotExists(contract_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        tx.execute(Insert(commission.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(commission)
    }
}

/// Error of [`CreateCommission`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Commission`] is inconsistent.
    #[display("Invalid `Commission`: {_0}")]
    #[from]
    Invalid(commission::Violation),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::ContractNotExists(_) => Failure::NotFound,
            Self::Invalid(_) => Failure::BadRequest,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{Currency, Money};
    use rust_decimal::Decimal;

    use crate::{
        domain::{commission, contract},
        spec::{date, Fixture},
        Classified as _, Command as _, Failure,
    };

    use super::CreateCommission;

    fn request(contract_id: contract::Id, amount: i64) -> CreateCommission {
        CreateCommission {
            contract_id,
            amount: Money {
                amount: Decimal::from(amount),
                currency: Currency::Ars,
            },
            date: date("2024-01-10"),
            payment_type: commission::PaymentType::LumpSum,
            installments: commission::Installments::ONE,
            status: commission::Status::Pending,
            note: None,
        }
    }

    #[tokio::test]
    async fn records_commission() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;

        let created = f.service.execute(request(c.id, 1000)).await.unwrap();

        assert_eq!(
            f.state().await.commissions.get(&created.id),
            Some(&created),
        );
    }

    #[tokio::test]
    async fn rejects_invalid_input() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;

        let err = f.service.execute(request(c.id, -5)).await.unwrap_err();
        assert_eq!(err.failure(), Failure::BadRequest);

        let err = f
            .service
            .execute(CreateCommission {
                installments: commission::Installments::new(3).unwrap(),
                ..request(c.id, 1000)
            })
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Failure::BadRequest);

        let err = f
            .service
            .execute(request(contract::Id::new(), 1000))
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Failure::NotFound);

        assert!(f.state().await.commissions.is_empty());
    }
}
