//! [`Query`] collection related to [`Contract`]s.

use common::operations::By;

use crate::domain::{contract, property, user, Contract};
#[cfg(doc)]
use crate::{
    domain::{Property, User},
    Query,
};

use super::DatabaseQuery;

/// Queries a [`Contract`] by its [`contract::Id`].
pub type ById = DatabaseQuery<By<Option<Contract>, contract::Id>>;

/// Queries all the [`Contract`]s of a tenant [`User`], ordered by their start
/// date.
pub type ByUser = DatabaseQuery<By<Vec<Contract>, user::Id>>;

/// Queries all the [`Contract`]s in the provided [`contract::Status`].
pub type ByStatus = DatabaseQuery<By<Vec<Contract>, contract::Status>>;

/// Queries all the [`Contract`]s upon a [`Property`], ordered by their start
/// date.
pub type ByProperty = DatabaseQuery<By<Vec<Contract>, property::Id>>;

/// Queries all the [`Contract`]s of the provided [`contract::Kind`], ordered
/// by their start date.
pub type ByKind = DatabaseQuery<By<Vec<Contract>, contract::Kind>>;

/// Queries all the [`Contract`]s lasting within the provided
/// [`contract::Period`], ordered by their start date.
pub type ByPeriod = DatabaseQuery<By<Vec<Contract>, contract::Period>>;

#[cfg(test)]
mod spec {
    use crate::{
        domain::{contract, property},
        spec::{date, Fixture},
        Query as _,
    };

    use super::{ByKind, ByPeriod, ByProperty};

    #[tokio::test]
    async fn selects_contracts_upon_property() {
        let f = Fixture::new().await;
        let later = f.contract("2025-01-01", "2026-01-01").await;
        let earlier = f.contract("2023-01-01", "2024-01-01").await;

        let found = f.service.execute(ByProperty::by(f.property.id)).await;

        assert_eq!(found.unwrap(), vec![earlier, later]);
        let none = f.service.execute(ByProperty::by(property::Id::new())).await;
        assert!(none.unwrap().is_empty());
    }

    #[tokio::test]
    async fn selects_contracts_of_kind() {
        let f = Fixture::new().await;
        let housing = f.contract("2024-01-01", "2025-01-01").await;
        let shop = f.contract("2023-01-01", "2024-01-01").await;
        f.db.seed(|s| {
            if let Some(c) = s.contracts.get_mut(&shop.id) {
                c.kind = contract::Kind::Commercial;
            }
        })
        .await;

        let found = f
            .service
            .execute(ByKind::by(contract::Kind::Housing))
            .await
            .unwrap();
        assert_eq!(found, vec![housing]);

        let found = f
            .service
            .execute(ByKind::by(contract::Kind::Commercial))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, shop.id);
    }

    #[tokio::test]
    async fn selects_contracts_lasting_within_period() {
        let f = Fixture::new().await;
        let inside = f.contract("2024-02-01", "2024-12-31").await;
        let starts_before = f.contract("2023-12-01", "2024-06-01").await;
        let ends_after = f.contract("2024-06-01", "2025-06-01").await;

        let found = f
            .service
            .execute(ByPeriod::by(contract::Period {
                from: date("2024-01-01"),
                to: date("2024-12-31"),
            }))
            .await
            .unwrap();

        assert_eq!(found, vec![inside]);
        assert!(!found.iter().any(|c| c.id == starts_before.id));
        assert!(!found.iter().any(|c| c.id == ends_after.id));
    }

    #[tokio::test]
    async fn inverted_period_selects_nothing() {
        let f = Fixture::new().await;
        _ = f.contract("2024-02-01", "2024-12-31").await;

        let found = f
            .service
            .execute(ByPeriod::by(contract::Period {
                from: date("2024-12-31"),
                to: date("2024-01-01"),
            }))
            .await
            .unwrap();

        assert!(found.is_empty());
    }
}
