//! [`Contract`]-related [`Database`] implementations.

use common::{
    operations::{By, Delete, Insert, Lock, Select},
    Money,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{contract, increase, property, user, Contract, Increase},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Columns of the `contracts` table, in the order [`contract_from()`]
/// expects them.
const CONTRACT_COLUMNS: &str = "\
    id, user_id, property_id, kind, \
    start_date, end_date, status, \
    initial_amount, currency, \
    adjustment_index_id, adjustment_frequency, \
    last_paid_amount, last_paid_date, \
    note, deposit_amount, deposit_note";

/// Decodes a [`Contract`] out of the provided `contracts` [`Row`].
fn contract_from(row: &Row) -> Contract {
    Contract {
        id: row.get("id"),
        user_id: row.get("user_id"),
        property_id: row.get("property_id"),
        kind: row.get("kind"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        status: row.get("status"),
        initial_amount: Money {
            amount: row.get("initial_amount"),
            currency: row.get("currency"),
        },
        adjustment_index_id: row.get("adjustment_index_id"),
        adjustment_frequency: row.get("adjustment_frequency"),
        last_paid_amount: row.get("last_paid_amount"),
        last_paid_date: row.get("last_paid_date"),
        note: row.get("note"),
        deposit: row.get::<_, Option<_>>("deposit_amount").map(|amount| {
            contract::Deposit {
                amount,
                note: row.get("deposit_note"),
            }
        }),
    }
}

impl<C> Database<Select<By<Option<Contract>, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "SELECT {CONTRACT_COLUMNS} \
             FROM contracts \
             WHERE id = $1::UUID"
        );
        Ok(self
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(contract_from))
    }
}

impl<C> Database<Select<By<Vec<Contract>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Contract>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "SELECT {CONTRACT_COLUMNS} \
             FROM contracts \
             WHERE user_id = $1::UUID \
             ORDER BY start_date"
        );
        Ok(self
            .query(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(contract_from)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Contract>, contract::Status>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Contract>, contract::Status>>,
    ) -> Result<Self::Ok, Self::Err> {
        let status = by.into_inner();

        let sql = format!(
            "SELECT {CONTRACT_COLUMNS} \
             FROM contracts \
             WHERE status = $1::INT2 \
             ORDER BY end_date"
        );
        Ok(self
            .query(sql.as_str(), &[&status])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(contract_from)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Contract>, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Contract>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "SELECT {CONTRACT_COLUMNS} \
             FROM contracts \
             WHERE property_id = $1::UUID \
             ORDER BY start_date"
        );
        Ok(self
            .query(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(contract_from)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Contract>, contract::Kind>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Contract>, contract::Kind>>,
    ) -> Result<Self::Ok, Self::Err> {
        let kind = by.into_inner();

        let sql = format!(
            "SELECT {CONTRACT_COLUMNS} \
             FROM contracts \
             WHERE kind = $1::INT2 \
             ORDER BY start_date"
        );
        Ok(self
            .query(sql.as_str(), &[&kind])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(contract_from)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Contract>, contract::Period>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Contract>, contract::Period>>,
    ) -> Result<Self::Ok, Self::Err> {
        let contract::Period { from, to } = by.into_inner();

        let sql = format!(
            "SELECT {CONTRACT_COLUMNS} \
             FROM contracts \
             WHERE start_date >= $1::DATE \
               AND end_date <= $2::DATE \
             ORDER BY start_date"
        );
        Ok(self
            .query(sql.as_str(), &[&from, &to])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(contract_from)
            .collect())
    }
}

impl<C> Database<Insert<Contract>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(contract): Insert<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        let Contract {
            id,
            user_id,
            property_id,
            kind,
            start_date,
            end_date,
            status,
            initial_amount,
            adjustment_index_id,
            adjustment_frequency,
            last_paid_amount,
            last_paid_date,
            note,
            deposit,
        } = contract;
        let (deposit_amount, deposit_note) = deposit
            .map_or((None, None), |d| (Some(d.amount), d.note));

        const SQL: &str = "\
            INSERT INTO contracts (\
                id, user_id, property_id, kind, \
                start_date, end_date, status, \
                initial_amount, currency, \
                adjustment_index_id, adjustment_frequency, \
                last_paid_amount, last_paid_date, \
                note, deposit_amount, deposit_note\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::INT2, \
                $5::DATE, $6::DATE, $7::INT2, \
                $8::NUMERIC, $9::INT2, \
                $10::UUID, $11::INT2, \
                $12::NUMERIC, $13::DATE, \
                $14::TEXT, $15::NUMERIC, $16::TEXT\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET user_id = EXCLUDED.user_id, \
                property_id = EXCLUDED.property_id, \
                kind = EXCLUDED.kind, \
                start_date = EXCLUDED.start_date, \
                end_date = EXCLUDED.end_date, \
                status = EXCLUDED.status, \
                initial_amount = EXCLUDED.initial_amount, \
                currency = EXCLUDED.currency, \
                adjustment_index_id = EXCLUDED.adjustment_index_id, \
                adjustment_frequency = EXCLUDED.adjustment_frequency, \
                last_paid_amount = EXCLUDED.last_paid_amount, \
                last_paid_date = EXCLUDED.last_paid_date, \
                note = EXCLUDED.note, \
                deposit_amount = EXCLUDED.deposit_amount, \
                deposit_note = EXCLUDED.deposit_note";
        self.exec(
            SQL,
            &[
                &id,
                &user_id,
                &property_id,
                &kind,
                &start_date,
                &end_date,
                &status,
                &initial_amount.amount,
                &initial_amount.currency,
                &adjustment_index_id,
                &adjustment_frequency,
                &last_paid_amount,
                &last_paid_date,
                &note,
                &deposit_amount,
                &deposit_note,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Contract, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Contract, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        // Owned rows are removed by `ON DELETE CASCADE`.
        const SQL: &str = "\
            DELETE FROM contracts \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Contract, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Contract, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        // Upserting locks the row until the end of the transaction.
        const SQL: &str = "\
            INSERT INTO contracts_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE \
            SET id = EXCLUDED.id";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

/// Columns of the `increases` table.
const INCREASE_COLUMNS: &str = "\
    id, contract_id, index_id, date, \
    amount, currency, adjustment, note, \
    period_from, period_to";

/// Decodes an [`Increase`] out of the provided `increases` [`Row`].
fn increase_from(row: &Row) -> Increase {
    let period_from = row.get::<_, Option<_>>("period_from");
    let period_to = row.get::<_, Option<_>>("period_to");
    Increase {
        id: row.get("id"),
        contract_id: row.get("contract_id"),
        index_id: row.get("index_id"),
        date: row.get("date"),
        amount: Money {
            amount: row.get("amount"),
            currency: row.get("currency"),
        },
        adjustment: row.get("adjustment"),
        note: row.get("note"),
        period: period_from
            .zip(period_to)
            .and_then(|(from, to)| increase::Period::new(from, to)),
    }
}

impl<C> Database<Select<By<Option<Increase>, increase::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Increase>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Increase>, increase::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "SELECT {INCREASE_COLUMNS} \
             FROM increases \
             WHERE id = $1::UUID"
        );
        Ok(self
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(increase_from))
    }
}

impl<C> Database<Select<By<Vec<Increase>, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Increase>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Increase>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "SELECT {INCREASE_COLUMNS} \
             FROM increases \
             WHERE contract_id = $1::UUID \
             ORDER BY date"
        );
        Ok(self
            .query(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(increase_from)
            .collect())
    }
}

impl<C> Database<Insert<Increase>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(increase): Insert<Increase>,
    ) -> Result<Self::Ok, Self::Err> {
        let Increase {
            id,
            contract_id,
            index_id,
            date,
            amount,
            adjustment,
            note,
            period,
        } = increase;
        let period_from = period.map(increase::Period::from);
        let period_to = period.map(increase::Period::to);

        const SQL: &str = "\
            INSERT INTO increases (\
                id, contract_id, index_id, date, \
                amount, currency, adjustment, note, \
                period_from, period_to\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::DATE, \
                $5::NUMERIC, $6::INT2, $7::NUMERIC, $8::TEXT, \
                $9::DATE, $10::DATE\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET contract_id = EXCLUDED.contract_id, \
                index_id = EXCLUDED.index_id, \
                date = EXCLUDED.date, \
                amount = EXCLUDED.amount, \
                currency = EXCLUDED.currency, \
                adjustment = EXCLUDED.adjustment, \
                note = EXCLUDED.note, \
                period_from = EXCLUDED.period_from, \
                period_to = EXCLUDED.period_to";
        self.exec(
            SQL,
            &[
                &id,
                &contract_id,
                &index_id,
                &date,
                &amount.amount,
                &amount.currency,
                &adjustment,
                &note,
                &period_from,
                &period_to,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Increase, increase::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Increase, increase::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM increases \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Delete<By<Vec<Increase>, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Vec<Increase>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM increases \
            WHERE contract_id = $1::UUID";
        self.exec(SQL, &[&id]).await.map_err(tracerr::wrap!())
    }
}
