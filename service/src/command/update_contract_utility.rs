//! [`Command`] for updating an existing [`ContractUtility`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{contract, contract_utility, Contract, ContractUtility},
    infra::{database, Database},
    Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for updating an existing [`ContractUtility`].
///
/// Only the fields provided in the [`contract_utility::Patch`] are
/// overwritten.
#[derive(Clone, Debug)]
pub struct UpdateContractUtility {
    /// ID of the [`ContractUtility`] to be updated.
    pub contract_utility_id: contract_utility::Id,

    /// Changes to be applied.
    pub patch: contract_utility::Patch,
}

impl<Db, Ntf> Command<UpdateContractUtility> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<ContractUtility>, contract_utility::Id>>,
            Ok = Option<ContractUtility>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Contract, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<Insert<ContractUtility>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ContractUtility;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateContractUtility,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateContractUtility {
            contract_utility_id: id,
            patch,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let utility = tx
            .execute(Select(By::<Option<ContractUtility>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractUtilityNotExists(id))
            .map_err(tracerr::wrap!())?;

        // Avoid concurrent modifications.
        tx.execute(Lock(By::new(utility.contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let utility = patch
            .apply(&utility)
            .map_err(tracerr::from_and_wrap!(=> E))?;

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

/// Error of [`UpdateContractUtility`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`ContractUtility`] with the provided ID does not exist.
    #[display("`ContractUtility(id: {_0})` does not exist")]
    ContractUtilityNotExists(#[error(not(source))] contract_utility::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Some amount is negative.
    #[display("Invalid `ContractUtility`: {_0}")]
    #[from]
    Invalid(contract_utility::NegativeAmount),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::ContractUtilityNotExists(_) => Failure::NotFound,
            Self::Invalid(_) => Failure::BadRequest,
        }
    }
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use crate::{
        domain::contract_utility::{
            self, spec::contract_utility, Patch, Periodicity,
        },
        spec::Fixture,
        Classified as _, Command as _, Failure,
    };

    use super::UpdateContractUtility;

    #[tokio::test]
    async fn patches_stored_utility() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;
        let cu = contract_utility(c.id, "2024-02-01", Periodicity::Monthly);
        let stored = cu.clone();
        f.db.seed(|s| {
            _ = s.contract_utilities.insert(stored.id, stored);
        })
        .await;

        let updated = f
            .service
            .execute(UpdateContractUtility {
                contract_utility_id: cu.id,
                patch: Patch {
                    periodicity: Some(Periodicity::Annual),
                    ..Patch::default()
                },
            })
            .await
            .unwrap();

        assert_eq!(updated.periodicity, Periodicity::Annual);
        assert_eq!(updated.initial_amount, cu.initial_amount);
        assert_eq!(
            f.state().await.contract_utilities.get(&cu.id),
            Some(&updated),
        );

        let err = f
            .service
            .execute(UpdateContractUtility {
                contract_utility_id: cu.id,
                patch: Patch {
                    initial_amount: Some(Decimal::from(-1)),
                    ..Patch::default()
                },
            })
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Failure::BadRequest);
    }

    #[tokio::test]
    async fn missing_utility_is_not_found() {
        let f = Fixture::new().await;

        let err = f
            .service
            .execute(UpdateContractUtility {
                contract_utility_id: contract_utility::Id::new(),
                patch: Patch::default(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.failure(), Failure::NotFound);
    }
}
