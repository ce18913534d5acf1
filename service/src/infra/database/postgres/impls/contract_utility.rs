//! [`ContractUtility`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Select};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{contract, contract_utility, ContractUtility},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Columns of the `contract_utilities` table.
const COLUMNS: &str = "\
    id, contract_id, utility_id, periodicity, \
    initial_amount, last_paid_amount, last_paid_date, note";

/// Decodes a [`ContractUtility`] out of the provided `contract_utilities`
/// [`Row`].
fn contract_utility_from(row: &Row) -> ContractUtility {
    ContractUtility {
        id: row.get("id"),
        contract_id: row.get("contract_id"),
        utility_id: row.get("utility_id"),
        periodicity: row.get("periodicity"),
        initial_amount: row.get("initial_amount"),
        last_paid_amount: row.get("last_paid_amount"),
        last_paid_date: row.get("last_paid_date"),
        note: row.get("note"),
    }
}

/// Decodes a [`contract_utility::Increase`] out of the provided
/// `contract_utility_increases` [`Row`].
fn increase_from(row: &Row) -> contract_utility::Increase {
    contract_utility::Increase {
        id: row.get("id"),
        contract_utility_id: row.get("contract_utility_id"),
        date: row.get("date"),
        amount: row.get("amount"),
    }
}

impl<C> Database<Select<By<Option<ContractUtility>, contract_utility::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<ContractUtility>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<ContractUtility>, contract_utility::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM contract_utilities \
             WHERE id = $1::UUID"
        );
        Ok(self
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(contract_utility_from))
    }
}

impl<C> Database<Select<By<Vec<ContractUtility>, contract::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<ContractUtility>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<ContractUtility>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM contract_utilities \
             WHERE contract_id = $1::UUID \
             ORDER BY last_paid_date"
        );
        Ok(self
            .query(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(contract_utility_from)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<ContractUtility>, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<ContractUtility>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<ContractUtility>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let sql = format!(
            "SELECT {COLUMNS} \
             FROM contract_utilities \
             ORDER BY last_paid_date"
        );
        Ok(self
            .query(sql.as_str(), &[])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(contract_utility_from)
            .collect())
    }
}

impl<C> Database<Insert<ContractUtility>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(utility): Insert<ContractUtility>,
    ) -> Result<Self::Ok, Self::Err> {
        let ContractUtility {
            id,
            contract_id,
            utility_id,
            periodicity,
            initial_amount,
            last_paid_amount,
            last_paid_date,
            note,
        } = utility;

        const SQL: &str = "\
            INSERT INTO contract_utilities (\
                id, contract_id, utility_id, periodicity, \
                initial_amount, last_paid_amount, last_paid_date, note\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::INT2, \
                $5::NUMERIC, $6::NUMERIC, $7::DATE, $8::TEXT\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET contract_id = EXCLUDED.contract_id, \
                utility_id = EXCLUDED.utility_id, \
                periodicity = EXCLUDED.periodicity, \
                initial_amount = EXCLUDED.initial_amount, \
                last_paid_amount = EXCLUDED.last_paid_amount, \
                last_paid_date = EXCLUDED.last_paid_date, \
                note = EXCLUDED.note";
        self.exec(
            SQL,
            &[
                &id,
                &contract_id,
                &utility_id,
                &periodicity,
                &initial_amount,
                &last_paid_amount,
                &last_paid_date,
                &note,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<ContractUtility, contract_utility::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<ContractUtility, contract_utility::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        // Increases and payments are removed by `ON DELETE CASCADE`.
        const SQL: &str = "\
            DELETE FROM contract_utilities \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Delete<By<Vec<ContractUtility>, contract::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Vec<ContractUtility>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM contract_utilities \
            WHERE contract_id = $1::UUID";
        self.exec(SQL, &[&id]).await.map_err(tracerr::wrap!())
    }
}

impl<C>
    Database<
        Select<
            By<
                Option<contract_utility::Increase>,
                contract_utility::increase::Id,
            >,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<contract_utility::Increase>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<
                Option<contract_utility::Increase>,
                contract_utility::increase::Id,
            >,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, contract_utility_id, date, amount \
            FROM contract_utility_increases \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(increase_from))
    }
}

impl<C>
    Database<
        Select<By<Vec<contract_utility::Increase>, contract_utility::Id>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<contract_utility::Increase>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<contract_utility::Increase>, contract_utility::Id>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, contract_utility_id, date, amount \
            FROM contract_utility_increases \
            WHERE contract_utility_id = $1::UUID \
            ORDER BY date";
        Ok(self
            .query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(increase_from)
            .collect())
    }
}

impl<C> Database<Insert<contract_utility::Increase>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(increase): Insert<contract_utility::Increase>,
    ) -> Result<Self::Ok, Self::Err> {
        let contract_utility::Increase {
            id,
            contract_utility_id,
            date,
            amount,
        } = increase;

        const SQL: &str = "\
            INSERT INTO contract_utility_increases (\
                id, contract_utility_id, date, amount\
            ) \
            VALUES ($1::UUID, $2::UUID, $3::DATE, $4::NUMERIC) \
            ON CONFLICT (id) DO UPDATE \
            SET contract_utility_id = EXCLUDED.contract_utility_id, \
                date = EXCLUDED.date, \
                amount = EXCLUDED.amount";
        self.exec(SQL, &[&id, &contract_utility_id, &date, &amount])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C>
    Database<
        Delete<
            By<contract_utility::Increase, contract_utility::increase::Id>,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<
            By<contract_utility::Increase, contract_utility::increase::Id>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM contract_utility_increases \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
