//! [`Command`] for deleting a [`Contract`].

use common::{
    operations::{
        By, Commit, Delete, Lock, Notify, Select, Transact, Transacted, Update,
    },
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        contract, property, user, Commission, Contract, ContractUtility,
        Increase, Property, User,
    },
    infra::{database, notifier, Database, Notifier},
    notice, Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for deleting a [`Contract`] along with its [`Increase`]s,
/// [`ContractUtility`]s and [`Commission`]s.
///
/// The [`Property`] is released, and the tenant role is revoked if the
/// [`Contract`] was active. The administration is notified when the
/// [`Contract`] is deleted before its end.
#[derive(Clone, Copy, Debug)]
pub struct DeleteContract {
    /// ID of the [`Contract`] to be deleted.
    pub contract_id: contract::Id,
}

impl<Db, Ntf> Command<DeleteContract> for Service<Db, Ntf>
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
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Vec<Increase>, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Vec<ContractUtility>, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Vec<Commission>, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Contract, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<Update<Property>, Err = Traced<database::Error>>
        + Database<Delete<user::RoleBinding>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Ntf: Notifier<
        Notify<notice::ContractDeleted>,
        Ok = (),
        Err = Traced<notifier::Error>,
    >,
{
    type Ok = Contract;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteContract { contract_id } = cmd;

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

        let tenant = tx
            .execute(Select(By::<Option<User>, _>::new(contract.user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Delete(By::<Vec<Increase>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Delete(By::<Vec<ContractUtility>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Delete(By::<Vec<Commission>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Delete(By::<Contract, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let property = tx
            .execute(Select(By::<Option<Property>, _>::new(
                contract.property_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(mut property) = property {
            property.status = property::Status::Available;
            tx.execute(Update(property))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        } else {
            log::warn!(
                "`Property(id: {})` of deleted `Contract(id: {contract_id})` \
                 does not exist",
                contract.property_id,
            );
        }

        if contract.is_active() {
            tx.execute(Delete(user::RoleBinding::tenant(contract.user_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if !contract.has_lapsed(Date::today()) {
            _ = self
                .notify(notice::ContractDeleted {
                    to: self.config().admin_email.clone(),
                    contract_id,
                    tenant: tenant.as_ref().map(User::full_name),
                    end_date: contract.end_date.coerce(),
                })
                .await;
        }

        Ok(contract)
    }
}

/// Error of [`DeleteContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::ContractNotExists(_) => Failure::NotFound,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{Currency, Date};

    use crate::{
        domain::{
            commission::{self, spec::commission},
            contract,
            contract_utility::{self, spec::contract_utility},
            increase::spec::increase,
            property,
        },
        spec::{Fixture, ADMIN},
        Classified as _, Command as _, Failure,
    };

    use super::DeleteContract;

    fn years_from_today(years: i32) -> String {
        Date::today()
            .checked_add_months(12 * years)
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn cascades_and_releases_property() {
        let f = Fixture::new().await;
        let c = f
            .contract(&years_from_today(-1), &years_from_today(1))
            .await;
        let other = f
            .contract(&years_from_today(-1), &years_from_today(1))
            .await;
        let inc = increase(c.id, "2024-04-01", 1100);
        let cu = contract_utility(
            c.id,
            "2024-05-01",
            contract_utility::Periodicity::Monthly,
        );
        let cm = commission(
            c.id,
            "2024-01-10",
            100,
            Currency::Ars,
            commission::Status::Pending,
        );
        let kept = increase(other.id, "2024-04-01", 1100);
        f.db.seed(|s| {
            _ = s.increases.insert(inc.id, inc);
            _ = s.increases.insert(kept.id, kept);
            _ = s.contract_utilities.insert(cu.id, cu);
            _ = s.commissions.insert(cm.id, cm);
        })
        .await;

        let deleted = f
            .service
            .execute(DeleteContract { contract_id: c.id })
            .await
            .unwrap();

        assert_eq!(deleted.id, c.id);
        let state = f.state().await;
        assert!(!state.contracts.contains_key(&c.id));
        assert!(state.contracts.contains_key(&other.id));
        assert_eq!(state.increases.len(), 1);
        assert!(state.contract_utilities.is_empty());
        assert!(state.commissions.is_empty());
        assert_eq!(f.property_status().await, property::Status::Available);
        assert!(!f.is_tenant(f.tenant.id).await);
    }

    #[tokio::test]
    async fn notifies_administration_on_early_termination() {
        let f = Fixture::new().await;
        let c = f
            .contract(&years_from_today(-1), &years_from_today(1))
            .await;

        _ = f
            .service
            .execute(DeleteContract { contract_id: c.id })
            .await
            .unwrap();

        let sent = f.notifier.sent_with("contract.deleted").await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to.to_string(), ADMIN);
    }

    #[tokio::test]
    async fn lapsed_contract_is_deleted_silently() {
        let f = Fixture::new().await;
        let c = f
            .contract(&years_from_today(-2), &years_from_today(-1))
            .await;

        _ = f
            .service
            .execute(DeleteContract { contract_id: c.id })
            .await
            .unwrap();

        assert!(f.stored(c.id).await.is_none());
        assert!(f.notifier.sent().await.is_empty());
    }

    #[tokio::test]
    async fn missing_contract_is_not_found() {
        let f = Fixture::new().await;

        let err = f
            .service
            .execute(DeleteContract {
                contract_id: contract::Id::new(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.failure(), Failure::NotFound);
    }
}
