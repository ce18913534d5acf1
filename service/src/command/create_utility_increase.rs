//! [`Command`] for loading a new amount of a [`ContractUtility`].

use common::operations::{
    By, Commit, Insert, Lock, Notify, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use rust_decimal::Decimal;
use tracerr::Traced;

use crate::{
    domain::{
        contract, contract_utility, user, Contract, ContractUtility, User,
    },
    infra::{database, notifier, Database, Notifier},
    notice, Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for loading a new amount of a [`ContractUtility`] charge as a
/// [`contract_utility::Increase`], notifying the tenant about it.
#[derive(Clone, Copy, Debug)]
pub struct CreateUtilityIncrease {
    /// ID of the adjusted [`ContractUtility`].
    pub contract_utility_id: contract_utility::Id,

    /// [`Date`] the new amount takes effect at.
    ///
    /// [`Date`]: common::Date
    pub date: contract_utility::increase::AdjustmentDate,

    /// New charged amount.
    pub amount: Decimal,
}

impl<Db, Ntf> Command<CreateUtilityIncrease> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<ContractUtility>, contract_utility::Id>>,
            Ok = Option<ContractUtility>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Contract, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Insert<contract_utility::Increase>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
    Ntf: Notifier<
        Notify<notice::UtilityAmountLoaded>,
        Ok = (),
        Err = Traced<notifier::Error>,
    >,
{
    type Ok = contract_utility::Increase;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateUtilityIncrease,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUtilityIncrease {
            contract_utility_id,
            date,
            amount,
        } = cmd;

        let increase = contract_utility::Increase {
            id: contract_utility::increase::Id::new(),
            contract_utility_id,
            date,
            amount,
        };
        increase
            .validate()
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let utility = tx
            .execute(Select(By::<Option<ContractUtility>, _>::new(
                contract_utility_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractUtilityNotExists(contract_utility_id))
            .map_err(tracerr::wrap!())?;

        // Avoid concurrent modifications.
        tx.execute(Lock(By::new(utility.contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let contract = tx
            .execute(Select(By::<Option<Contract>, _>::new(
                utility.contract_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractNotExists(utility.contract_id))
            .map_err(tracerr::wrap!())?;

        let tenant = tx
            .execute(Select(By::<Option<User>, _>::new(contract.user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(contract.user_id))
            .map_err(tracerr::wrap!())?;

        tx.execute(Insert(increase.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        _ = self
            .notify(notice::UtilityAmountLoaded {
                to: tenant.email,
                first_name: tenant.first_name,
                contract_id: contract.id,
                contract_utility_id,
                date: date.coerce(),
                amount,
            })
            .await;

        Ok(increase)
    }
}

/// Error of [`CreateUtilityIncrease`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] of the [`ContractUtility`] does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`ContractUtility`] with the provided ID does not exist.
    #[display("`ContractUtility(id: {_0})` does not exist")]
    ContractUtilityNotExists(#[error(not(source))] contract_utility::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// New amount is negative.
    #[display("Invalid `ContractUtility` increase: {_0}")]
    #[from]
    Invalid(contract_utility::NegativeAmount),

    /// Tenant [`User`] of the [`Contract`] does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::ContractNotExists(_)
            | Self::ContractUtilityNotExists(_)
            | Self::UserNotExists(_) => Failure::NotFound,
            Self::Invalid(_) => Failure::BadRequest,
        }
    }
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use crate::{
        domain::{
            contract,
            contract_utility::{self, spec::contract_utility, Periodicity},
            user, Contract,
        },
        spec::{date, Fixture},
        Classified as _, Command as _, Failure,
    };

    use super::CreateUtilityIncrease;

    fn request(id: contract_utility::Id, amount: i64) -> CreateUtilityIncrease {
        CreateUtilityIncrease {
            contract_utility_id: id,
            date: date("2024-03-01").coerce(),
            amount: Decimal::from(amount),
        }
    }

    #[tokio::test]
    async fn loads_amount_and_notifies() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;
        let cu = contract_utility(c.id, "2024-02-01", Periodicity::Monthly);
        let stored = cu.clone();
        f.db.seed(|s| {
            _ = s.contract_utilities.insert(stored.id, stored);
        })
        .await;

        let inc = f.service.execute(request(cu.id, 5600)).await.unwrap();

        assert_eq!(f.state().await.utility_increases.get(&inc.id), Some(&inc));
        let sent = f.notifier.sent_with("utility.amount.loaded").await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, f.tenant.email);
        assert_eq!(sent[0].payload["amount"], "5600");
    }

    #[tokio::test]
    async fn requires_resolvable_tenant() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;
        let orphan = Contract {
            id: contract::Id::new(),
            user_id: user::Id::new(),
            ..c
        };
        let cu =
            contract_utility(orphan.id, "2024-02-01", Periodicity::Monthly);
        let stored = cu.clone();
        f.db.seed(|s| {
            _ = s.contracts.insert(orphan.id, orphan);
            _ = s.contract_utilities.insert(stored.id, stored);
        })
        .await;

        let err = f.service.execute(request(cu.id, 5600)).await.unwrap_err();

        assert_eq!(err.failure(), Failure::NotFound);
        assert!(f.state().await.utility_increases.is_empty());
        assert!(f.notifier.sent().await.is_empty());

        let err = f
            .service
            .execute(request(contract_utility::Id::new(), 5600))
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Failure::NotFound);
    }

    #[tokio::test]
    async fn rejects_negative_amount() {
        let f = Fixture::new().await;

        let err = f
            .service
            .execute(request(contract_utility::Id::new(), -1))
            .await
            .unwrap_err();

        assert_eq!(err.failure(), Failure::BadRequest);
    }
}
