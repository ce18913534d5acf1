//! [`Guarantor`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Lock, Select};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{contract, guarantor, user, Guarantor},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::Referenced,
};

/// Decodes a [`Guarantor`] out of the provided `guarantors` [`Row`].
fn guarantor_from(row: &Row) -> Guarantor {
    Guarantor {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
    }
}

impl<C> Database<Select<By<Option<Guarantor>, guarantor::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Guarantor>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Guarantor>, guarantor::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, name, email, phone \
            FROM guarantors \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(guarantor_from))
    }
}

impl<C> Database<Select<By<Option<Guarantor>, user::Email>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Guarantor>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Guarantor>, user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();

        const SQL: &str = "\
            SELECT id, name, email, phone \
            FROM guarantors \
            WHERE email = $1::VARCHAR";
        Ok(self
            .query_opt(SQL, &[&email])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(guarantor_from))
    }
}

impl<C> Database<Select<By<Option<Guarantor>, guarantor::Phone>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Guarantor>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Guarantor>, guarantor::Phone>>,
    ) -> Result<Self::Ok, Self::Err> {
        let phone = by.into_inner();

        const SQL: &str = "\
            SELECT id, name, email, phone \
            FROM guarantors \
            WHERE phone = $1::VARCHAR";
        Ok(self
            .query_opt(SQL, &[&phone])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(guarantor_from))
    }
}

impl<C> Database<Select<By<Vec<Guarantor>, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Guarantor>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Guarantor>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT g.id, g.name, g.email, g.phone \
            FROM guarantors AS g \
            INNER JOIN contract_guarantors AS cg \
                    ON cg.guarantor_id = g.id \
            WHERE cg.contract_id = $1::UUID \
            ORDER BY g.name";
        Ok(self
            .query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(guarantor_from)
            .collect())
    }
}

impl<C> Database<Select<By<Referenced<Guarantor>, guarantor::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Referenced<Guarantor>, guarantor::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT EXISTS (\
                SELECT 1 FROM contract_guarantors \
                WHERE guarantor_id = $1::UUID\
            ) AS referenced";
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.is_some_and(|r| r.get("referenced")))
    }
}

impl<C> Database<Insert<Guarantor>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(guarantor): Insert<Guarantor>,
    ) -> Result<Self::Ok, Self::Err> {
        let Guarantor {
            id,
            name,
            email,
            phone,
        } = guarantor;

        const SQL: &str = "\
            INSERT INTO guarantors (id, name, email, phone) \
            VALUES ($1::UUID, $2::VARCHAR, $3::VARCHAR, $4::VARCHAR) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                email = EXCLUDED.email, \
                phone = EXCLUDED.phone";
        self.exec(SQL, &[&id, &name, &email, &phone])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Delete<By<Guarantor, guarantor::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Guarantor, guarantor::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        // Links are removed by `ON DELETE CASCADE`.
        const SQL: &str = "\
            DELETE FROM guarantors \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Guarantor, guarantor::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Guarantor, guarantor::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO guarantors_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE \
            SET id = EXCLUDED.id";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Insert<guarantor::Link>> for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(link): Insert<guarantor::Link>,
    ) -> Result<Self::Ok, Self::Err> {
        let guarantor::Link {
            guarantor_id,
            contract_id,
        } = link;

        const SQL: &str = "\
            INSERT INTO contract_guarantors (contract_id, guarantor_id) \
            VALUES ($1::UUID, $2::UUID) \
            ON CONFLICT DO NOTHING";
        self.exec(SQL, &[&contract_id, &guarantor_id])
            .await
            .map_err(tracerr::wrap!())
            .map(|inserted| inserted > 0)
    }
}

impl<C> Database<Delete<guarantor::Link>> for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(link): Delete<guarantor::Link>,
    ) -> Result<Self::Ok, Self::Err> {
        let guarantor::Link {
            guarantor_id,
            contract_id,
        } = link;

        const SQL: &str = "\
            DELETE FROM contract_guarantors \
            WHERE contract_id = $1::UUID \
              AND guarantor_id = $2::UUID";
        self.exec(SQL, &[&contract_id, &guarantor_id])
            .await
            .map_err(tracerr::wrap!())
            .map(|deleted| deleted > 0)
    }
}
