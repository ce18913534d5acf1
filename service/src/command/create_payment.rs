//! [`Command`] for recording a new [`Payment`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    Currency, Date, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        commission, contract, contract_utility, payment, Commission, Contract,
        ContractUtility, Note, Payment,
    },
    infra::{database, Database},
    Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for recording a new [`Payment`] against a [`Contract`].
///
/// A rent [`Payment`] advances the last paid amount and date of its
/// [`Contract`], and a utility [`Payment`] the ones of its
/// [`ContractUtility`], unless an already recorded payment is more recent.
#[derive(Clone, Debug)]
pub struct CreatePayment {
    /// ID of the [`Contract`] the [`Payment`] is recorded against.
    pub contract_id: contract::Id,

    /// Paid amount.
    pub amount: Money,

    /// [`Date`] the [`Payment`] was made at.
    pub date: Date,

    /// Free-text description of the [`Payment`].
    pub description: Option<Note>,

    /// What the [`Payment`] is for.
    pub concept: payment::Concept,
}

impl<Db, Ntf> Command<CreatePayment> for Service<Db, Ntf>
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
            Select<By<Option<ContractUtility>, contract_utility::Id>>,
            Ok = Option<ContractUtility>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Commission>, commission::Id>>,
            Ok = Option<Commission>,
            Err = Traced<database::Error>,
        > + Database<Insert<Contract>, Err = Traced<database::Error>>
        + Database<Insert<ContractUtility>, Err = Traced<database::Error>>
        + Database<Insert<Payment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Payment;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreatePayment) -> Result<Self::Ok, Self::Err> {
        use payment::Concept as C;
        use ExecutionError as E;

        let CreatePayment {
            contract_id,
            amount,
            date,
            description,
            concept,
        } = cmd;

        let payment = Payment {
            id: payment::Id::new(),
            contract_id,
            amount,
            date,
            description,
            concept,
        };
        payment.validate().map_err(tracerr::from_and_wrap!(=> E))?;

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

        match concept {
            C::Rent => {
                if amount.currency != contract.currency() {
                    return Err(tracerr::new!(E::CurrencyMismatch(
                        amount.currency,
                        contract.currency(),
                    )));
                }
                let is_latest = contract
                    .last_paid_date
                    .map_or(true, |last| date >= last.coerce());
                if is_latest {
                    let contract = Contract {
                        last_paid_amount: Some(amount.amount),
                        last_paid_date: Some(date.coerce()),
                        ..contract
                    };
                    tx.execute(Insert(contract))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))
                        .map(drop)?;
                }
            }
            C::Utility(id) => {
                let utility = tx
                    .execute(Select(By::<Option<ContractUtility>, _>::new(id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::ContractUtilityNotExists(id))
                    .map_err(tracerr::wrap!())?;
                if utility.contract_id != contract_id {
                    return Err(tracerr::new!(E::ForeignContractUtility(id)));
                }
                if date >= utility.last_paid_date.coerce() {
                    let utility = ContractUtility {
                        last_paid_amount: Some(amount.amount),
                        last_paid_date: date.coerce(),
                        ..utility
                    };
                    tx.execute(Insert(utility))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))
                        .map(drop)?;
                }
            }
            C::Commission(id) => {
                let commission = tx
                    .execute(Select(By::<Option<Commission>, _>::new(id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::CommissionNotExists(id))
                    .map_err(tracerr::wrap!())?;
                if commission.contract_id != contract_id {
                    return Err(tracerr::new!(E::ForeignCommission(id)));
                }
            }
        }

        tx.execute(Insert(payment.clone()))
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

/// Error of [`CreatePayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Commission`] with the provided ID does not exist.
    #[display("`Commission(id: {_0})` does not exist")]
    CommissionNotExists(#[error(not(source))] commission::Id),

    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`ContractUtility`] with the provided ID does not exist.
    #[display("`ContractUtility(id: {_0})` does not exist")]
    ContractUtilityNotExists(#[error(not(source))] contract_utility::Id),

    /// Rent is paid in a [`Currency`] other than the [`Contract`] one.
    #[display(
        "Rent payment currency `{_0}` differs from `Contract` one `{_1}`"
    )]
    CurrencyMismatch(Currency, Currency),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Referenced [`Commission`] belongs to another [`Contract`].
    #[display("`Commission(id: {_0})` belongs to another `Contract`")]
    ForeignCommission(#[error(not(source))] commission::Id),

    /// Referenced [`ContractUtility`] belongs to another [`Contract`].
    #[display("`ContractUtility(id: {_0})` belongs to another `Contract`")]
    ForeignContractUtility(#[error(not(source))] contract_utility::Id),

    /// [`Payment`] is inconsistent.
    #[display("Invalid `Payment`: {_0}")]
    #[from]
    Invalid(payment::Violation),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::CommissionNotExists(_)
            | Self::ContractNotExists(_)
            | Self::ContractUtilityNotExists(_) => Failure::NotFound,
            Self::CurrencyMismatch(..)
            | Self::ForeignCommission(_)
            | Self::ForeignContractUtility(_)
            | Self::Invalid(_) => Failure::BadRequest,
        }
    }
}
