//! [`Command`] for billing a new [`ContractUtility`] through a [`Contract`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use rust_decimal::Decimal;
use tracerr::Traced;

use crate::{
    domain::{
        contract, contract_utility, utility, Contract, ContractUtility, Note,
        Utility,
    },
    infra::{database, Database},
    Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for billing a new [`ContractUtility`] through a [`Contract`].
#[derive(Clone, Debug)]
pub struct CreateContractUtility {
    /// ID of the [`Contract`] the charge is billed through.
    pub contract_id: contract::Id,

    /// ID of the charged [`Utility`].
    pub utility_id: utility::Id,

    /// How often the charge is due.
    pub periodicity: contract_utility::Periodicity,

    /// Amount the charge starts with.
    pub initial_amount: Decimal,

    /// Amount of the last recorded payment.
    pub last_paid_amount: Option<Decimal>,

    /// [`Date`] of the last recorded payment.
    ///
    /// [`Date`]: common::Date
    pub last_paid_date: contract_utility::PaymentDate,

    /// Free-text [`Note`] about the charge.
    pub note: Option<Note>,
}

impl<Db, Ntf> Command<CreateContractUtility> for Service<Db, Ntf>
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
            Select<By<Option<Utility>, utility::Id>>,
            Ok = Option<Utility>,
            Err = Traced<database::Error>,
        > + Database<Insert<ContractUtility>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ContractUtility;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateContractUtility,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateContractUtility {
            contract_id,
            utility_id,
            periodicity,
            initial_amount,
            last_paid_amount,
            last_paid_date,
            note,
        } = cmd;

        let utility = ContractUtility {
            id: contract_utility::Id::new(),
            contract_id,
            utility_id,
            periodicity,
            initial_amount,
            last_paid_amount,
            last_paid_date,
            note,
        };
        utility
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

        tx.execute(Select(By::<Option<Utility>, _>::new(utility_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UtilityNotExists(utility_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        tx.execute(Insert(utility.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(utility)
    }
}

/// Error of [`CreateContractUtility`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Some amount is negative.
    #[display("Invalid `ContractUtility`: {_0}")]
    #[from]
    Invalid(contract_utility::NegativeAmount),

    /// [`Utility`] with the provided ID does not exist.
    #[display("`Utility(id: {_0})` does not exist")]
    UtilityNotExists(#[error(not(source))] utility::Id),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::ContractNotExists(_) | Self::UtilityNotExists(_) => {
                Failure::NotFound
            }
            Self::Invalid(_) => Failure::BadRequest,
        }
    }
}

#[cfg(test)]
pub(crate) mod spec {
    use rust_decimal::Decimal;

    use crate::{
        domain::{contract, contract_utility::Periodicity, utility, Utility},
        spec::{date, Fixture},
        Classified as _, Command as _, Failure,
    };

    use super::CreateContractUtility;

    /// Stores a new [`Utility`] in the provided [`Fixture`].
    pub(crate) async fn seed_utility(f: &Fixture, name: &str) -> Utility {
        let u = Utility {
            id: utility::Id::new(),
            name: utility::Name::new(name).unwrap(),
        };
        let stored = u.clone();
        f.db.seed(|s| {
            _ = s.utilities.insert(stored.id, stored);
        })
        .await;
        u
    }

    fn request(
        contract_id: contract::Id,
        utility_id: utility::Id,
    ) -> CreateContractUtility {
        CreateContractUtility {
            contract_id,
            utility_id,
            periodicity: Periodicity::Bimonthly,
            initial_amount: Decimal::from(4500),
            last_paid_amount: None,
            last_paid_date: date("2024-01-10").coerce(),
            note: None,
        }
    }

    #[tokio::test]
    async fn bills_utility_through_contract() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;
        let gas = seed_utility(&f, "Gas").await;

        let cu = f.service.execute(request(c.id, gas.id)).await.unwrap();

        assert_eq!(cu.next_due_date(), Some(date("2024-03-10")));
        assert_eq!(f.state().await.contract_utilities.get(&cu.id), Some(&cu));
    }

    #[tokio::test]
    async fn requires_existing_contract_and_utility() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;
        let gas = seed_utility(&f, "Gas").await;

        let err = f
            .service
            .execute(request(contract::Id::new(), gas.id))
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Failure::NotFound);

        let err = f
            .service
            .execute(request(c.id, utility::Id::new()))
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Failure::NotFound);
    }

    #[tokio::test]
    async fn rejects_negative_amounts() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;
        let gas = seed_utility(&f, "Gas").await;

        let req = CreateContractUtility {
            last_paid_amount: Some(Decimal::from(-1)),
            ..request(c.id, gas.id)
        };
        let err = f.service.execute(req).await.unwrap_err();

        assert_eq!(err.failure(), Failure::BadRequest);
        assert!(f.state().await.contract_utilities.is_empty());
    }
}
