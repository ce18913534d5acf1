//! [`Command`] for replacing an existing [`Commission`].

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

/// [`Command`] for replacing all the fields of an existing [`Commission`].
#[derive(Clone, Debug)]
pub struct UpdateCommission {
    /// ID of the [`Commission`] to be replaced.
    pub commission_id: commission::Id,

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

    /// New [`commission::Status`].
    pub status: commission::Status,

    /// Free-text [`Note`] about the [`Commission`].
    pub note: Option<Note>,
}

impl<Db, Ntf> Command<UpdateCommission> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Contract, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Commission>, commission::Id>>,
            Ok = Option<Commission>,
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
        cmd: UpdateCommission,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateCommission {
            commission_id,
            contract_id,
            amount,
            date,
            payment_type,
            installments,
            status,
            note,
        } = cmd;

        let commission = Commission {
            id: commission_id,
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

        let existing = tx
            .execute(Select(By::<Option<Commission>, _>::new(commission_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::CommissionNotExists(commission_id))
            .map_err(tracerr::wrap!())?;
        if existing.contract_id != contract_id {
            tx.execute(Lock(By::new(existing.contract_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

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

/// Error of [`UpdateCommission`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Commission`] with the provided ID does not exist.
    #[display("`Commission(id: {_0})` does not exist")]
    CommissionNotExists(#[error(not(source))] commission::Id),

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
            Self::CommissionNotExists(_) | Self::ContractNotExists(_) => {
                Failure::NotFound
            }
            Self::Invalid(_) => Failure::BadRequest,
        }
    }
}
