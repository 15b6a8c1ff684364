//! [`Command`] for creating a new [`User`] (registration).

use common::{
    operations::{By, Insert, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox};
use tokio::task::JoinError;
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Email, Name, Password};
use crate::{
    domain::{
        user::{self, credential, Credential, Currency, Profile},
        User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`User`].
#[derive(Debug)]
pub struct CreateUser {
    /// [`Name`] of a new [`User`].
    pub name: user::Name,

    /// [`Email`] of a new [`User`].
    pub email: user::Email,

    /// [`Password`] of a new [`User`].
    pub password: SecretBox<user::Password>,

    /// [`Currency`] of a new [`User`].
    pub currency: Currency,
}

impl<Db, C> Command<CreateUser> for Service<Db, C>
where
    Db: for<'e> Database<
            Select<By<Option<User>, &'e user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Insert<User>, Ok = bool, Err = Traced<database::Error>>,
{
    type Ok = Profile;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser {
            name,
            email,
            password,
            currency,
        } = cmd;

        let existing = self
            .database()
            .execute(Select(By::new(&email)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::UserExists));
        }

        let credential = tokio::task::spawn_blocking(move || {
            Credential::new(password.expose_secret())
        })
        .await
        .map_err(tracerr::from_and_wrap!(=> E))?
        .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let user = User {
            id: user::Id::new(),
            name,
            email,
            currency,
            credential,
            created_at: DateTime::now().coerce(),
        };

        let inserted = self
            .database()
            .execute(Insert(user.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !inserted {
            return Err(tracerr::new!(E::UserExists));
        }

        Ok(user.into())
    }
}

/// Error of [`CreateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Credential`] creation failed.
    #[display("Failed to create `Credential`: {_0}")]
    Credential(credential::Error),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Creating the [`Credential`] didn't complete.
    #[display("`Credential` creation was interrupted: {_0}")]
    Interrupted(JoinError),

    /// [`User`] with the same [`Name`] or [`Email`] already exists.
    #[display("`User` already exists")]
    UserExists,
}
