//! [`Commission`] and [`Payment`] [`Database`] implementations.

use common::{
    operations::{By, Delete, Insert, Select},
    Money,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{commission, contract, payment, Commission, Payment},
    infra::{
        database::{
            self,
            postgres::{self, Connection},
            Postgres,
        },
        Database,
    },
};

/// Columns of the `commissions` table.
const COMMISSION_COLUMNS: &str = "\
    id, contract_id, amount, currency, date, \
    payment_type, installments, status, note";

/// Decodes a [`Commission`] out of the provided `commissions` [`Row`].
fn commission_from(row: &Row) -> Commission {
    Commission {
        id: row.get("id"),
        contract_id: row.get("contract_id"),
        amount: Money {
            amount: row.get("amount"),
            currency: row.get("currency"),
        },
        date: row.get("date"),
        payment_type: row.get("payment_type"),
        installments: row.get("installments"),
        status: row.get("status"),
        note: row.get("note"),
    }
}

impl<C> Database<Select<By<Option<Commission>, commission::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Commission>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Commission>, commission::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "SELECT {COMMISSION_COLUMNS} \
             FROM commissions \
             WHERE id = $1::UUID"
        );
        Ok(self
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(commission_from))
    }
}

impl<C> Database<Select<By<Vec<Commission>, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Commission>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Commission>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "SELECT {COMMISSION_COLUMNS} \
             FROM commissions \
             WHERE contract_id = $1::UUID \
             ORDER BY date"
        );
        Ok(self
            .query(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(commission_from)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Commission>, commission::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Commission>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Commission>, commission::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let commission::Filter {
            status,
            currency,
            dates,
        } = by.into_inner();
        let (from, to) = dates.unzip();

        // `NULL` parameters disable the corresponding condition.
        let sql = format!(
            "SELECT {COMMISSION_COLUMNS} \
             FROM commissions \
             WHERE ($1::INT2 IS NULL OR status = $1::INT2) \
               AND ($2::INT2 IS NULL OR currency = $2::INT2) \
               AND ($3::DATE IS NULL OR date >= $3::DATE) \
               AND ($4::DATE IS NULL OR date <= $4::DATE) \
             ORDER BY date"
        );
        Ok(self
            .query(sql.as_str(), &[&status, &currency, &from, &to])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(commission_from)
            .collect())
    }
}

impl<C> Database<Insert<Commission>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(commission): Insert<Commission>,
    ) -> Result<Self::Ok, Self::Err> {
        let Commission {
            id,
            contract_id,
            amount,
            date,
            payment_type,
            installments,
            status,
            note,
        } = commission;

        const SQL: &str = "\
            INSERT INTO commissions (\
                id, contract_id, amount, currency, date, \
                payment_type, installments, status, note\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::NUMERIC, $4::INT2, $5::DATE, \
                $6::INT2, $7::INT2, $8::INT2, $9::TEXT\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET contract_id = EXCLUDED.contract_id, \
                amount = EXCLUDED.amount, \
                currency = EXCLUDED.currency, \
                date = EXCLUDED.date, \
                payment_type = EXCLUDED.payment_type, \
                installments = EXCLUDED.installments, \
                status = EXCLUDED.status, \
                note = EXCLUDED.note";
        self.exec(
            SQL,
            &[
                &id,
                &contract_id,
                &amount.amount,
                &amount.currency,
                &date,
                &payment_type,
                &installments,
                &status,
                &note,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Commission, commission::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Commission, commission::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        // Payments are removed by `ON DELETE CASCADE`.
        const SQL: &str = "\
            DELETE FROM commissions \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Delete<By<Vec<Commission>, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Vec<Commission>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM commissions \
            WHERE contract_id = $1::UUID";
        self.exec(SQL, &[&id]).await.map_err(tracerr::wrap!())
    }
}

/// Columns of the `payments` table.
const PAYMENT_COLUMNS: &str = "\
    id, contract_id, amount, currency, date, description, \
    concept, contract_utility_id, commission_id";

/// Decodes a [`Payment`] out of the provided `payments` [`Row`].
fn payment_from(row: &Row) -> Result<Payment, Traced<database::Error>> {
    let concept = payment::Concept::from_parts(
        row.get("concept"),
        row.get("contract_utility_id"),
        row.get("commission_id"),
    )
    .map_err(|e| postgres::Error::MalformedPayment(row.get("id"), e))
    .map_err(tracerr::from_and_wrap!())?;
    Ok(Payment {
        id: row.get("id"),
        contract_id: row.get("contract_id"),
        amount: Money {
            amount: row.get("amount"),
            currency: row.get("currency"),
        },
        date: row.get("date"),
        description: row.get("description"),
        concept,
    })
}

impl<C> Database<Select<By<Option<Payment>, payment::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Payment>, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} \
             FROM payments \
             WHERE id = $1::UUID"
        );
        self.query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(payment_from)
            .transpose()
    }
}

impl<C> Database<Select<By<Vec<Payment>, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} \
             FROM payments \
             WHERE contract_id = $1::UUID \
             ORDER BY date"
        );
        self.query(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(payment_from)
            .collect()
    }
}

impl<C> Database<Insert<Payment>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(payment): Insert<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        let Payment {
            id,
            contract_id,
            amount,
            date,
            description,
            concept,
        } = payment;

        const SQL: &str = "\
            INSERT INTO payments (\
                id, contract_id, amount, currency, date, description, \
                concept, contract_utility_id, commission_id\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::NUMERIC, $4::INT2, $5::DATE, \
                $6::TEXT, $7::INT2, $8::UUID, $9::UUID\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET contract_id = EXCLUDED.contract_id, \
                amount = EXCLUDED.amount, \
                currency = EXCLUDED.currency, \
                date = EXCLUDED.date, \
                description = EXCLUDED.description, \
                concept = EXCLUDED.concept, \
                contract_utility_id = EXCLUDED.contract_utility_id, \
                commission_id = EXCLUDED.commission_id";
        self.exec(
            SQL,
            &[
                &id,
                &contract_id,
                &amount.amount,
                &amount.currency,
                &date,
                &description,
                &concept.kind(),
                &concept.contract_utility_id(),
                &concept.commission_id(),
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Payment, payment::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Payment, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM payments \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
