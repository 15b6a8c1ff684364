//! [`Command`] for deleting a [`User`] session (logging out).

use common::operations::Delete;
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    domain::user::session,
    infra::{cache, Cache},
    token, Service,
};

use super::Command;

/// [`Command`] for deleting the session a [`session::Token`] belongs to.
///
/// Any valid [`session::Token`] is accepted regardless of its
/// [`session::Kind`].
#[derive(Clone, Debug, From)]
pub struct DeleteUserSession {
    /// [`session::Token`] of the session to delete.
    pub token: session::Token,
}

impl<Db, C> Command<DeleteUserSession> for Service<Db, C>
where
    C: Cache<Delete<cache::Key>, Ok = (), Err = Traced<cache::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteUserSession { token } = cmd;

        let claims = self
            .tokens()
            .parse(&token)
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        if let Err(e) = self.sessions().delete(&claims.subject).await {
            tracing::error!(
                step = "logout_cache_delete",
                subject = %claims.subject,
                error = %e,
                "failed to delete session",
            );
        }

        Ok(())
    }
}

/// Error of [`DeleteUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Provided [`session::Token`] is malformed, forged or expired.
    #[display("Invalid session `Token`: {_0}")]
    InvalidToken(token::DecodeError),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::Command as _,
        domain::user::{self, session::Token},
        infra::mock::{self, Call, Logs},
    };

    use super::{DeleteUserSession, ExecutionError};

    #[tokio::test]
    async fn deletes_session_of_token_subject() {
        let svc = mock::service(mock::Database::default());
        let id = user::Id::new();

        for token in [
            svc.tokens().issue_access(id).unwrap(),
            svc.tokens().issue_refresh(id).unwrap(),
        ] {
            svc.execute(DeleteUserSession { token }).await.unwrap();
        }

        let deleted = Call::Delete {
            key: format!("user_refresh_token:{id}"),
        };
        assert_eq!(
            svc.sessions().cache().calls(),
            [deleted.clone(), deleted],
        );
    }

    #[tokio::test]
    async fn rejects_malformed_token_without_touching_cache() {
        let svc = mock::service(mock::Database::default());

        let err = svc
            .execute(DeleteUserSession {
                token: Token::from("not.a.token".to_owned()),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::InvalidToken(_)));
        assert!(svc.sessions().cache().calls().is_empty());
    }

    #[tokio::test]
    async fn succeeds_when_cache_fails() {
        let svc = mock::service_with_cache(
            mock::Database::default(),
            mock::Cache::failing(),
        );
        let id = user::Id::new();
        let token = svc.tokens().issue_access(id).unwrap();
        let (logs, _guard) = Logs::capture();

        svc.execute(DeleteUserSession { token }).await.unwrap();

        assert_eq!(svc.sessions().cache().calls().len(), 1);
        assert!(logs.contains("logout_cache_delete"));
        assert!(logs.contains(&id.to_string()));
    }
}
