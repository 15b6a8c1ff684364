//! [`User`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        user::{self, Credential},
        User,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Builds a [`User`] out of a `users` table [`Row`].
fn from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        currency: row.get("currency"),
        credential: Credential {
            hash: row.get("password_hash"),
            salt: row.get("password_salt"),
        },
        created_at: row.get("created_at"),
    }
}

impl Database<Select<By<Option<User>, user::Id>>> for Postgres {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, name, email, currency, \
                   password_hash, password_salt, \
                   created_at \
            FROM users \
            WHERE id = $1::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<'e> Database<Select<By<Option<User>, &'e user::Email>>> for Postgres {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'e user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();

        const SQL: &str = "\
            SELECT id, name, email, currency, \
                   password_hash, password_salt, \
                   created_at \
            FROM users \
            WHERE email = $1::VARCHAR \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[email])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl Database<Insert<User>> for Postgres {
    /// Whether the [`User`] has been inserted.
    ///
    /// `false` means a [`User`] with the same ID, name or email exists.
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let User {
            id,
            name,
            email,
            currency,
            credential: Credential { hash, salt },
            created_at,
        } = user;

        const SQL: &str = "\
            INSERT INTO users (\
                id, name, email, currency, \
                password_hash, password_salt, \
                created_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, $4::INT2, \
                $5::VARCHAR, $6::VARCHAR, \
                $7::TIMESTAMPTZ\
            ) \
            ON CONFLICT DO NOTHING";
        let inserted = self
            .exec(
                SQL,
                &[
                    &id,
                    &name,
                    &email,
                    &currency,
                    &hash,
                    &salt,
                    &created_at,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;

        Ok(inserted == 1)
    }
}
