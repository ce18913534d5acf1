//! [`Database`] implementations of the reference data: [`User`]s,
//! [`Property`]s, adjustment [`Index`]es and [`Utility`] types.

use common::operations::{By, Delete, Insert, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{
        index, property, user, utility, Index, Property, User, Utility,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::Referenced,
};

impl<C> Database<Select<By<Option<User>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, first_name, last_name, email \
            FROM users \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| User {
                id: row.get("id"),
                first_name: row.get("first_name"),
                last_name: row.get("last_name"),
                email: row.get("email"),
            }))
    }
}

impl<C> Database<Insert<user::RoleBinding>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(binding): Insert<user::RoleBinding>,
    ) -> Result<Self::Ok, Self::Err> {
        let user::RoleBinding { user_id, role } = binding;

        const SQL: &str = "\
            INSERT INTO user_roles (user_id, role) \
            VALUES ($1::UUID, $2::INT2) \
            ON CONFLICT DO NOTHING";
        self.exec(SQL, &[&user_id, &role])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Delete<user::RoleBinding>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(binding): Delete<user::RoleBinding>,
    ) -> Result<Self::Ok, Self::Err> {
        let user::RoleBinding { user_id, role } = binding;

        const SQL: &str = "\
            DELETE FROM user_roles \
            WHERE user_id = $1::UUID \
              AND role = $2::INT2";
        self.exec(SQL, &[&user_id, &role])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Option<Property>, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, status \
            FROM properties \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Property {
                id: row.get("id"),
                status: row.get("status"),
            }))
    }
}

impl<C> Database<Update<Property>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(property): Update<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        let Property { id, status } = property;

        const SQL: &str = "\
            UPDATE properties \
            SET status = $2::INT2 \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id, &status])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Option<Index>, index::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Index>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Index>, index::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, code, name \
            FROM adjustment_indices \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Index {
                id: row.get("id"),
                code: row.get("code"),
                name: row.get("name"),
            }))
    }
}

impl<C> Database<Select<By<Option<Index>, index::Code>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Index>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Index>, index::Code>>,
    ) -> Result<Self::Ok, Self::Err> {
        let code = by.into_inner();

        const SQL: &str = "\
            SELECT id, code, name \
            FROM adjustment_indices \
            WHERE code = $1::VARCHAR";
        Ok(self
            .query_opt(SQL, &[&code])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Index {
                id: row.get("id"),
                code: row.get("code"),
                name: row.get("name"),
            }))
    }
}

impl<C> Database<Select<By<Referenced<Index>, index::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Referenced<Index>, index::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT EXISTS (\
                SELECT 1 FROM contracts \
                WHERE adjustment_index_id = $1::UUID\
            ) OR EXISTS (\
                SELECT 1 FROM increases \
                WHERE index_id = $1::UUID\
            ) AS referenced";
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.is_some_and(|r| r.get("referenced")))
    }
}

impl<C> Database<Insert<Index>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(index): Insert<Index>,
    ) -> Result<Self::Ok, Self::Err> {
        let Index { id, code, name } = index;

        const SQL: &str = "\
            INSERT INTO adjustment_indices (id, code, name) \
            VALUES ($1::UUID, $2::VARCHAR, $3::VARCHAR) \
            ON CONFLICT (id) DO UPDATE \
            SET code = EXCLUDED.code, \
                name = EXCLUDED.name";
        self.exec(SQL, &[&id, &code, &name])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Delete<By<Index, index::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Index, index::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM adjustment_indices \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Option<Utility>, utility::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Utility>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Utility>, utility::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, name \
            FROM utilities \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Utility {
                id: row.get("id"),
                name: row.get("name"),
            }))
    }
}

impl<C> Database<Select<By<Option<Utility>, utility::Name>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Utility>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Utility>, utility::Name>>,
    ) -> Result<Self::Ok, Self::Err> {
        let name = by.into_inner();

        const SQL: &str = "\
            SELECT id, name \
            FROM utilities \
            WHERE lower(name) = lower($1::VARCHAR)";
        Ok(self
            .query_opt(SQL, &[&name])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Utility {
                id: row.get("id"),
                name: row.get("name"),
            }))
    }
}

impl<C> Database<Select<By<Referenced<Utility>, utility::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Referenced<Utility>, utility::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT EXISTS (\
                SELECT 1 FROM contract_utilities \
                WHERE utility_id = $1::UUID\
            ) AS referenced";
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.is_some_and(|r| r.get("referenced")))
    }
}

impl<C> Database<Insert<Utility>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(utility): Insert<Utility>,
    ) -> Result<Self::Ok, Self::Err> {
        let Utility { id, name } = utility;

        const SQL: &str = "\
            INSERT INTO utilities (id, name) \
            VALUES ($1::UUID, $2::VARCHAR) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name";
        self.exec(SQL, &[&id, &name])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Delete<By<Utility, utility::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Utility, utility::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM utilities \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
