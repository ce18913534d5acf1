//! Shared fixtures of the [`Service`] tests.

use std::time::Duration;

use common::Date;

use crate::{
    domain::{
        contract::{self, spec::contract},
        increase::spec::increase,
        index, property, user, Contract, Increase, Index, Property, User,
    },
    infra::{database::memory::State, Memory, Recorder},
    task, Config, Service,
};

/// [`user::Email`] of the administration.
pub(crate) const ADMIN: &str = "admin@agency.example";

/// Parses the provided [`Date`].
pub(crate) fn date(s: &str) -> Date {
    s.parse().unwrap()
}

/// [`Service`] backed by a [`Memory`] database and a [`Recorder`].
pub(crate) struct Fixture {
    /// [`Service`] under test.
    pub(crate) service: Service<Memory, Recorder>,

    /// [`Memory`] database of the [`Service`].
    pub(crate) db: Memory,

    /// [`Recorder`] of the [`Service`] notices.
    pub(crate) notifier: Recorder,

    /// Seeded tenant.
    pub(crate) tenant: User,

    /// Seeded available [`Property`].
    pub(crate) property: Property,

    /// Seeded adjustment [`Index`].
    pub(crate) index: Index,
}

impl Fixture {
    /// Creates a new [`Fixture`] with a tenant, an available [`Property`] and
    /// an adjustment [`Index`].
    pub(crate) async fn new() -> Self {
        let db = Memory::new();
        let notifier = Recorder::new();
        let service = Service::detached(
            Config {
                admin_email: user::Email::new(ADMIN).unwrap(),
                rent_reminder_day: 1,
                sweeps: task::run_sweeps::Config {
                    interval: Duration::from_secs(86_400),
                },
            },
            db.clone(),
            notifier.clone(),
        );

        let tenant = Self::user("Ana", "Gómez", "ana@mail.example");
        let property = Property {
            id: property::Id::new(),
            status: property::Status::Available,
        };
        let index = Index {
            id: index::Id::new(),
            code: index::Code::new("ICL").unwrap(),
            name: index::Name::new("Índice de Contratos de Locación")
                .unwrap(),
        };
        db.seed(|s| {
            _ = s.users.insert(tenant.id, tenant.clone());
            _ = s.properties.insert(property.id, property);
            _ = s.indices.insert(index.id, index.clone());
        })
        .await;

        Self {
            service,
            db,
            notifier,
            tenant,
            property,
            index,
        }
    }

    /// Creates a new [`User`] without storing it.
    pub(crate) fn user(first: &str, last: &str, email: &str) -> User {
        User {
            id: user::Id::new(),
            first_name: user::Name::new(first).unwrap(),
            last_name: user::Name::new(last).unwrap(),
            email: user::Email::new(email).unwrap(),
        }
    }

    /// Stores the provided [`User`].
    pub(crate) async fn add_user(&self, user: &User) {
        let user = user.clone();
        self.db
            .seed(|s| {
                _ = s.users.insert(user.id, user);
            })
            .await;
    }

    /// Stores a new active [`Contract`] of the seeded tenant upon the seeded
    /// [`Property`], renting it and granting the tenant role.
    pub(crate) async fn contract(&self, start: &str, end: &str) -> Contract {
        self.contract_of(&self.tenant, start, end).await
    }

    /// Stores a new active [`Contract`] of the provided tenant upon the seeded
    /// [`Property`], renting it and granting the tenant role.
    pub(crate) async fn contract_of(
        &self,
        tenant: &User,
        start: &str,
        end: &str,
    ) -> Contract {
        let c = Contract {
            user_id: tenant.id,
            property_id: self.property.id,
            adjustment_index_id: self.index.id,
            ..contract(start, end)
        };
        let stored = c.clone();
        self.db
            .seed(|s| {
                _ = s.contracts.insert(stored.id, stored.clone());
                _ = s.roles.insert(user::RoleBinding::tenant(stored.user_id));
                if let Some(p) = s.properties.get_mut(&stored.property_id) {
                    p.status = property::Status::Rented;
                }
            })
            .await;
        c
    }

    /// Stores a new [`Increase`] of the provided [`Contract`] by the seeded
    /// [`Index`], dated at the provided `on` date.
    pub(crate) async fn increase(&self, contract_id: contract::Id, on: &str) {
        let inc = Increase {
            index_id: self.index.id,
            ..increase(contract_id, on, 1000)
        };
        self.db
            .seed(|s| {
                _ = s.increases.insert(inc.id, inc);
            })
            .await;
    }

    /// Returns a snapshot of the [`Memory`] database [`State`].
    pub(crate) async fn state(&self) -> State {
        self.db.state().await
    }

    /// Returns the stored [`Contract`] with the provided ID.
    pub(crate) async fn stored(&self, id: contract::Id) -> Option<Contract> {
        self.state().await.contracts.remove(&id)
    }

    /// Returns whether the seeded tenant holds the tenant role.
    pub(crate) async fn is_tenant(&self, id: user::Id) -> bool {
        self.state()
            .await
            .roles
            .contains(&user::RoleBinding::tenant(id))
    }

    /// Returns the current status of the seeded [`Property`].
    pub(crate) async fn property_status(&self) -> property::Status {
        self.state().await.properties[&self.property.id].status
    }
}
