//! [`Command`] for updating a loaded amount of a [`ContractUtility`].

use common::operations::{
    By, Commit, Insert, Lock, Notify, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        contract, contract_utility, user, Contract, ContractUtility, User,
    },
    infra::{database, notifier, Database, Notifier},
    notice, Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for updating an existing [`contract_utility::Increase`],
/// notifying the tenant about the new amount.
#[derive(Clone, Copy, Debug)]
pub struct UpdateUtilityIncrease {
    /// ID of the [`contract_utility::Increase`] to be updated.
    pub increase_id: contract_utility::increase::Id,

    /// Changes to be applied.
    pub patch: contract_utility::increase::Patch,
}

impl<Db, Ntf> Command<UpdateUtilityIncrease> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<
                By<
                    Option<contract_utility::Increase>,
                    contract_utility::increase::Id,
                >,
            >,
            Ok = Option<contract_utility::Increase>,
            Err = Traced<database::Error>,
        > + Database<
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
        cmd: UpdateUtilityIncrease,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateUtilityIncrease { increase_id, patch } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let increase = tx
            .execute(Select(
                By::<Option<contract_utility::Increase>, _>::new(increase_id),
            ))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::IncreaseNotExists(increase_id))
            .map_err(tracerr::wrap!())?;

        let utility_id = increase.contract_utility_id;
        let utility = tx
            .execute(Select(By::<Option<ContractUtility>, _>::new(utility_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractUtilityNotExists(utility_id))
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

        let increase = patch
            .apply(&increase)
            .map_err(tracerr::from_and_wrap!(=> E))?;

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
                contract_utility_id: utility_id,
                date: increase.date.coerce(),
                amount: increase.amount,
            })
            .await;

        Ok(increase)
    }
}

/// Error of [`UpdateUtilityIncrease`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] of the [`ContractUtility`] does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`ContractUtility`] of the increase does not exist.
    #[display("`ContractUtility(id: {_0})` does not exist")]
    ContractUtilityNotExists(#[error(not(source))] contract_utility::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`contract_utility::Increase`] with the provided ID does not exist.
    #[display("`ContractUtilityIncrease(id: {_0})` does not exist")]
    IncreaseNotExists(#[error(not(source))] contract_utility::increase::Id),

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
            | Self::IncreaseNotExists(_)
            | Self::UserNotExists(_) => Failure::NotFound,
            Self::Invalid(_) => Failure::BadRequest,
        }
    }
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use crate::{
        domain::contract_utility::{
            self, increase::Patch, spec::contract_utility, Periodicity,
        },
        spec::{date, Fixture},
        Classified as _, Command as _, Failure,
    };

    use super::UpdateUtilityIncrease;

    #[tokio::test]
    async fn updates_amount_and_notifies() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;
        let cu = contract_utility(c.id, "2024-02-01", Periodicity::Monthly);
        let inc = contract_utility::Increase {
            id: contract_utility::increase::Id::new(),
            contract_utility_id: cu.id,
            date: date("2024-03-01").coerce(),
            amount: Decimal::from(5500),
        };
        let stored = inc.clone();
        f.db.seed(|s| {
            _ = s.contract_utilities.insert(cu.id, cu);
            _ = s.utility_increases.insert(stored.id, stored);
        })
        .await;

        let updated = f
            .service
            .execute(UpdateUtilityIncrease {
                increase_id: inc.id,
                patch: Patch {
                    amount: Some(Decimal::from(5700)),
                    ..Patch::default()
                },
            })
            .await
            .unwrap();

        assert_eq!(updated.amount, Decimal::from(5700));
        assert_eq!(updated.date, inc.date);
        assert_eq!(
            f.state().await.utility_increases.get(&inc.id),
            Some(&updated),
        );
        assert_eq!(
            f.notifier.sent_with("utility.amount.loaded").await.len(),
            1,
        );
    }

    #[tokio::test]
    async fn missing_increase_is_not_found() {
        let f = Fixture::new().await;

        let err = f
            .service
            .execute(UpdateUtilityIncrease {
                increase_id: contract_utility::increase::Id::new(),
                patch: Patch::default(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.failure(), Failure::NotFound);
    }
}
