//! [`Command`] for creating a [`User`] session (logging in).

use common::operations::{By, Insert, Select};
use derive_more::{Display, Error, From};
use secrecy::{zeroize::Zeroizing, ExposeSecret as _, SecretString};
use tokio::task::JoinError;
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{session::Token, Email, Password};
use crate::{
    domain::{
        user::{self, session, Profile},
        User,
    },
    infra::{cache, database, Cache, Database},
    token, Service,
};

use super::Command;

/// [`Command`] for creating a [`User`] session by its credentials.
///
/// Credentials are taken as provided: ones not even forming a valid
/// [`Email`] or [`Password`] are rejected as wrong.
#[derive(Debug)]
pub struct CreateUserSession {
    /// [`Email`] of the [`User`].
    pub email: String,

    /// [`Password`] of the [`User`].
    pub password: SecretString,
}

/// Output of [`CreateUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// [`Profile`] of the logged in [`User`].
    pub user: Profile,

    /// [`Token`]s of the created session.
    pub tokens: session::Pair,
}

impl<Db, C> Command<CreateUserSession> for Service<Db, C>
where
    Db: for<'e> Database<
        Select<By<Option<User>, &'e user::Email>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
    C: Cache<Insert<cache::Entry>, Ok = (), Err = Traced<cache::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUserSession { email, password } = cmd;

        let Some((email, password)) = user::Email::new(email).zip(
            user::Password::new(password.expose_secret()).map(Zeroizing::new),
        ) else {
            return Err(tracerr::new!(E::WrongCredentials));
        };

        let user = match self.database().execute(Select(By::new(&email))).await
        {
            Ok(Some(user)) => user,
            Ok(None) => return Err(tracerr::new!(E::WrongCredentials)),
            Err(e) => {
                tracing::error!(
                    step = "login_user_lookup",
                    error = %e,
                    "failed to look up `User` by email",
                );
                return Err(tracerr::new!(E::WrongCredentials));
            }
        };

        let credential = user.credential.clone();
        let verified =
            tokio::task::spawn_blocking(move || credential.verify(&password))
                .await
                .map_err(tracerr::from_and_wrap!(=> E))?;
        if !verified {
            return Err(tracerr::new!(E::WrongCredentials));
        }

        let tokens = self
            .tokens()
            .issue_pair(user.id)
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        if let Err(e) = self.sessions().put(user.id, &tokens.refresh).await {
            tracing::error!(
                step = "login_cache_set",
                user_id = %user.id,
                error = %e,
                "failed to store session",
            );
        }

        Ok(Output {
            user: user.into(),
            tokens,
        })
    }
}

/// Error of [`CreateUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Verifying the [`Password`] didn't complete.
    #[display("`Password` verification was interrupted: {_0}")]
    Interrupted(JoinError),

    /// Signing a [`Token`] failed.
    #[display("Failed to issue session `Token`s: {_0}")]
    Token(token::EncodeError),

    /// [`User`] doesn't exist or the [`Password`] doesn't match.
    #[display("Wrong `User` credentials")]
    WrongCredentials,
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use secrecy::SecretString;

    use crate::{
        command::Command as _,
        domain::user::{self, session::Kind},
        infra::mock::{self, Call, Logs},
    };

    use super::{CreateUserSession, ExecutionError};

    fn login(email: &str, password: &str) -> CreateUserSession {
        CreateUserSession {
            email: email.to_owned(),
            password: SecretString::from(password.to_owned()),
        }
    }

    #[tokio::test]
    async fn issues_tokens_and_stores_session() {
        let user = mock::user("alice@example.com", "pw123456");
        let svc = mock::service(mock::Database::with([user.clone()]));

        let out = svc
            .execute(login("alice@example.com", "pw123456"))
            .await
            .unwrap();

        assert_eq!(out.user.id, user.id);
        assert_eq!(out.user.email, user.email);
        assert!(!out.tokens.access.to_string().is_empty());
        assert!(!out.tokens.refresh.to_string().is_empty());

        let access = svc.tokens().parse(&out.tokens.access).unwrap();
        let refresh = svc.tokens().parse(&out.tokens.refresh).unwrap();
        assert_eq!(access.kind, Kind::Access);
        assert_eq!(refresh.kind, Kind::Refresh);
        assert_eq!(access.user_id().unwrap(), user.id);

        assert_eq!(
            svc.sessions().cache().calls(),
            [Call::Set {
                key: format!("user_refresh_token:{}", user.id),
                value: out.tokens.refresh.to_string(),
                ttl: Duration::from_secs(7 * 24 * 60 * 60),
            }],
        );
    }

    #[tokio::test]
    async fn rejects_wrong_password_without_touching_cache() {
        let user = mock::user("alice@example.com", "pw123456");
        let svc = mock::service(mock::Database::with([user]));

        let err = svc
            .execute(login("alice@example.com", "wrong-password"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::WrongCredentials));
        assert_eq!(
            err.as_ref().to_string(),
            ExecutionError::WrongCredentials.to_string(),
        );
        assert!(svc.sessions().cache().calls().is_empty());
    }

    #[tokio::test]
    async fn rejects_unknown_email_the_same_way() {
        let svc = mock::service(mock::Database::default());

        let err = svc
            .execute(login("nobody@example.com", "pw123456"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::WrongCredentials));
        assert!(svc.sessions().cache().calls().is_empty());
    }

    #[tokio::test]
    async fn rejects_malformed_credentials_the_same_way() {
        let user = mock::user("alice@example.com", "pw123456");
        let svc = mock::service(mock::Database::with([user]));

        for (email, password) in [
            ("not an email", "pw123456"),
            ("alice@example.com", "p"),
            ("alice@example.com", ""),
            ("alice@example.com", "p".repeat(100).as_str()),
        ] {
            let err = svc.execute(login(email, password)).await.unwrap_err();

            assert!(
                matches!(err.as_ref(), ExecutionError::WrongCredentials),
                "{email} / {password}",
            );
        }
        assert!(svc.sessions().cache().calls().is_empty());
    }

    #[cfg(feature = "postgres")]
    #[tokio::test]
    async fn hides_lookup_failure_behind_wrong_credentials() {
        let svc = mock::service(mock::Database::failing());
        let (logs, _guard) = Logs::capture();

        let err = svc
            .execute(login("alice@example.com", "pw123456"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::WrongCredentials));
        assert!(logs.contains("login_user_lookup"));
    }

    #[tokio::test]
    async fn succeeds_when_cache_fails() {
        let user = mock::user("alice@example.com", "pw123456");
        let svc = mock::service_with_cache(
            mock::Database::with([user.clone()]),
            mock::Cache::failing(),
        );
        let (logs, _guard) = Logs::capture();

        let out = svc
            .execute(login("alice@example.com", "pw123456"))
            .await
            .unwrap();

        assert_eq!(out.user.id, user.id);
        assert_eq!(svc.sessions().cache().calls().len(), 1);
        assert!(logs.contains("login_cache_set"));
        assert!(logs.contains(&user.id.to_string()));
    }

    #[tokio::test]
    async fn logs_nothing_when_cache_succeeds() {
        let user = mock::user("alice@example.com", "pw123456");
        let svc = mock::service(mock::Database::with([user]));
        let (logs, _guard) = Logs::capture();

        drop(
            svc.execute(login("alice@example.com", "pw123456"))
                .await
                .unwrap(),
        );

        assert!(!logs.contains("login_cache_set"));
    }
}
