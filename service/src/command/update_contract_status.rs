//! [`Command`] for toggling the [`contract::Status`] of a [`Contract`].

use common::operations::{
    By, Commit, Delete, Insert, Lock, Notify, Select, Transact, Transacted,
    Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        contract::{self, Effect},
        property, user, Contract, Property, User,
    },
    infra::{database, notifier, Database, Notifier},
    notice, Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for toggling the [`contract::Status`] of a [`Contract`]
/// between [`Active`] and [`Inactive`].
///
/// Deactivation revokes the tenant role and releases the [`Property`], while
/// activation grants the role back and rents the [`Property`] again.
///
/// [`Active`]: contract::Status::Active
/// [`Inactive`]: contract::Status::Inactive
#[derive(Clone, Copy, Debug)]
pub struct UpdateContractStatus {
    /// ID of the [`Contract`] to toggle the [`contract::Status`] of.
    pub contract_id: contract::Id,
}

impl<Db, Ntf> Command<UpdateContractStatus> for Service<Db, Ntf>
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
        > + Database<Insert<Contract>, Err = Traced<database::Error>>
        + Database<Update<Property>, Err = Traced<database::Error>>
        + Database<Insert<user::RoleBinding>, Err = Traced<database::Error>>
        + Database<Delete<user::RoleBinding>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Ntf: Notifier<
            Notify<notice::ContractReactivated>,
            Ok = (),
            Err = Traced<notifier::Error>,
        > + Notifier<
            Notify<notice::ContractExpired>,
            Ok = (),
            Err = Traced<notifier::Error>,
        >,
{
    type Ok = Contract;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateContractStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateContractStatus { contract_id } = cmd;

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

        let mut contract = tx
            .execute(Select(By::<Option<Contract>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractNotExists(contract_id))
            .map_err(tracerr::wrap!())?;

        let tenant = tx
            .execute(Select(By::<Option<User>, _>::new(contract.user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(contract.user_id))
            .map_err(tracerr::wrap!())?;

        let transition = contract.status.transition();
        contract.status = transition.to;

        tx.execute(Insert(contract.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let role = user::RoleBinding::tenant(tenant.id);
        let mut notices = Vec::new();
        for effect in transition.effects {
            match effect {
                Effect::GrantTenantRole => tx
                    .execute(Insert(role))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?,
                Effect::RevokeTenantRole => tx
                    .execute(Delete(role))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?,
                Effect::OccupyProperty | Effect::ReleaseProperty => {
                    let status = if effect == Effect::OccupyProperty {
                        property::Status::Rented
                    } else {
                        property::Status::Available
                    };
                    let property = tx
                        .execute(Select(By::<Option<Property>, _>::new(
                            contract.property_id,
                        )))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))?;
                    if let Some(mut property) = property {
                        property.status = status;
                        tx.execute(Update(property))
                            .await
                            .map_err(tracerr::map_from_and_wrap!(=> E))
                            .map(drop)?;
                    } else {
                        log::warn!(
                            "`Property(id: {})` of `Contract(id: {})` does not \
                             exist, its status is not updated",
                            contract.property_id,
                            contract.id,
                        );
                    }
                }
                Effect::NotifyReactivated | Effect::NotifyExpired => {
                    notices.push(effect);
                }
            }
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        for effect in notices {
            _ = if effect == Effect::NotifyReactivated {
                self.notify(notice::ContractReactivated {
                    to: tenant.email.clone(),
                    first_name: tenant.first_name.clone(),
                    contract_id: contract.id,
                })
                .await
            } else {
                self.notify(notice::ContractExpired {
                    to: tenant.email.clone(),
                    first_name: tenant.first_name.clone(),
                    contract_id: contract.id,
                    end_date: contract.end_date.coerce(),
                })
                .await
            };
        }

        Ok(contract)
    }
}

/// Error of [`UpdateContractStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Tenant [`User`] of the [`Contract`] does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::ContractNotExists(_) | Self::UserNotExists(_) => {
                Failure::NotFound
            }
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{contract, property, user, Contract},
        spec::Fixture,
        Classified as _, Command as _, Failure,
    };

    use super::UpdateContractStatus;

    #[tokio::test]
    async fn deactivation_revokes_role_and_releases_property() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;

        let updated = f
            .service
            .execute(UpdateContractStatus { contract_id: c.id })
            .await
            .unwrap();

        assert_eq!(updated.status, contract::Status::Inactive);
        assert!(!f.is_tenant(f.tenant.id).await);
        assert_eq!(f.property_status().await, property::Status::Available);

        let sent = f.notifier.sent_with("contract.expired").await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, f.tenant.email);
    }

    #[tokio::test]
    async fn toggling_twice_restores_status_and_role() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;

        for _ in 0..2 {
            _ = f
                .service
                .execute(UpdateContractStatus { contract_id: c.id })
                .await
                .unwrap();
        }

        assert_eq!(f.stored(c.id).await.map(|c| c.status), Some(c.status));
        assert!(f.is_tenant(f.tenant.id).await);
        assert_eq!(f.property_status().await, property::Status::Rented);
        assert_eq!(f.notifier.sent_with("contract.reactivated").await.len(), 1);
    }

    #[tokio::test]
    async fn missing_tenant_is_not_found() {
        let f = Fixture::new().await;
        let c = f.contract("2024-01-01", "2025-01-01").await;
        let orphan = Contract {
            id: contract::Id::new(),
            user_id: user::Id::new(),
            ..c
        };
        let stored = orphan.clone();
        f.db.seed(|s| {
            _ = s.contracts.insert(stored.id, stored);
        })
        .await;

        let err = f
            .service
            .execute(UpdateContractStatus {
                contract_id: orphan.id,
            })
            .await
            .unwrap_err();

        assert_eq!(err.failure(), Failure::NotFound);
        assert_eq!(f.stored(orphan.id).await, Some(orphan));
        assert!(f.notifier.sent().await.is_empty());
    }

    #[tokio::test]
    async fn missing_contract_is_not_found() {
        let f = Fixture::new().await;

        let err = f
            .service
            .execute(UpdateContractStatus {
                contract_id: contract::Id::new(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.failure(), Failure::NotFound);
    }
}
