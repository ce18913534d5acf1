//! [`Query`] collection related to [`ContractUtility`]s.

use common::{
    operations::{By, Select},
    Date,
};
use tracerr::Traced;

use crate::{
    domain::{contract, contract_utility, ContractUtility},
    infra::{database, Database},
    Service,
};
#[cfg(doc)]
use crate::domain::Contract;

use super::{DatabaseQuery, Query};

/// Queries a [`ContractUtility`] by its [`contract_utility::Id`].
pub type ById =
    DatabaseQuery<By<Option<ContractUtility>, contract_utility::Id>>;

/// Queries all the [`ContractUtility`]s of a [`Contract`].
pub type ByContract = DatabaseQuery<By<Vec<ContractUtility>, contract::Id>>;

/// Queries all the [`contract_utility::Increase`]s of a [`ContractUtility`],
/// ordered by their date.
pub type Increases = DatabaseQuery<
    By<Vec<contract_utility::Increase>, contract_utility::Id>,
>;

/// Queries all the [`ContractUtility`]s whose next charge is due exactly
/// [`UtilitiesDueInTenDays::DAYS`] after `today`.
#[derive(Clone, Copy, Debug)]
pub struct UtilitiesDueInTenDays {
    /// [`Date`] the due date is counted from.
    pub today: Date,
}

impl UtilitiesDueInTenDays {
    /// Number of days ahead of `today` the charges are due at.
    pub const DAYS: i64 = 10;
}

impl<Db, Ntf> Query<UtilitiesDueInTenDays> for Service<Db, Ntf>
where
    Db: Database<
        Select<By<Vec<ContractUtility>, ()>>,
        Ok = Vec<ContractUtility>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<ContractUtility>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        query: UtilitiesDueInTenDays,
    ) -> Result<Self::Ok, Self::Err> {
        let UtilitiesDueInTenDays { today } = query;
        let Some(due_date) =
            today.checked_add_days(UtilitiesDueInTenDays::DAYS)
        else {
            return Ok(vec![]);
        };

        let utilities = self
            .database()
            .execute(Select(By::<Vec<ContractUtility>, _>::new(())))
            .await
            .map_err(tracerr::wrap!())?;
        Ok(utilities
            .into_iter()
            .filter(|u| u.is_due_on(due_date))
            .collect())
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{
            contract,
            contract_utility::{spec::contract_utility, Periodicity},
        },
        spec::{date, Fixture},
        Query as _,
    };

    use super::UtilitiesDueInTenDays;

    #[tokio::test]
    async fn selects_charges_due_in_ten_days() {
        let f = Fixture::new().await;
        let id = contract::Id::new();
        // Today is `2024-03-05`, so the charges due at `2024-03-15` match.
        let due = contract_utility(id, "2024-02-15", Periodicity::Monthly);
        let overdue = contract_utility(id, "2024-01-15", Periodicity::Monthly);
        let bimonthly =
            contract_utility(id, "2024-01-15", Periodicity::Bimonthly);
        let expected = [due.id, bimonthly.id];
        f.db.seed(|s| {
            for u in [due, overdue, bimonthly] {
                _ = s.contract_utilities.insert(u.id, u);
            }
        })
        .await;

        let mut found = f
            .service
            .execute(UtilitiesDueInTenDays {
                today: date("2024-03-05"),
            })
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.id)
            .collect::<Vec<_>>();
        found.sort_by_key(|id| expected.iter().position(|e| e == id));

        assert_eq!(found, expected);
    }

    #[tokio::test]
    async fn nothing_is_due_past_the_calendar() {
        let f = Fixture::new().await;

        let found = f
            .service
            .execute(UtilitiesDueInTenDays {
                today: date("9999-12-30"),
            })
            .await
            .unwrap();

        assert!(found.is_empty());
    }
}
