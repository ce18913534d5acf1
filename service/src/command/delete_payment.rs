//! [`Command`] for deleting a [`Payment`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{contract, payment, Contract, Payment},
    infra::{database, Database},
    Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for deleting a [`Payment`].
///
/// Last paid amounts and dates advanced by the [`Payment`] are kept as is.
#[derive(Clone, Copy, Debug)]
pub struct DeletePayment {
    /// ID of the [`Payment`] to be deleted.
    pub payment_id: payment::Id,
}

impl<Db, Ntf> Command<DeletePayment> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Payment>, payment::Id>>,
            Ok = Option<Payment>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Contract, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Payment, payment::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Payment;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeletePayment) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeletePayment { payment_id: id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let payment = tx
            .execute(Select(By::<Option<Payment>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PaymentNotExists(id))
            .map_err(tracerr::wrap!())?;

        // Avoid concurrent modifications.
        tx.execute(Lock(By::new(payment.contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Delete(By::<Payment, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(payment)
    }
}

/// Error of [`DeletePayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Payment`] with the provided ID does not exist.
    #[display("`Payment(id: {_0})` does not exist")]
    PaymentNotExists(#[error(not(source))] payment::Id),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::PaymentNotExists(_) => Failure::NotFound,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{Currency, Money};
    use rust_decimal::Decimal;

    use crate::{
        domain::{
            payment::{self, Concept},
            Payment,
        },
        spec::{date, Fixture},
        Classified as _, Command as _, Failure,
    };

    use super::DeletePayment;

    #[tokio::test]
    async fn deletes_payment() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;
        let paid = Payment {
            id: payment::Id::new(),
            contract_id: c.id,
            amount: Money {
                amount: Decimal::from(100),
                currency: Currency::Ars,
            },
            date: date("2024-01-11"),
            description: None,
            concept: Concept::Rent,
        };
        let stored = paid.clone();
        f.db.seed(|s| {
            _ = s.payments.insert(stored.id, stored);
        })
        .await;

        let deleted = f
            .service
            .execute(DeletePayment { payment_id: paid.id })
            .await
            .unwrap();
        assert_eq!(deleted, paid);
        assert!(f.state().await.payments.is_empty());

        let err = f
            .service
            .execute(DeletePayment { payment_id: paid.id })
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Failure::NotFound);
    }
}
