//! [`Command`] for refreshing a [`User`] session.

use common::operations::{Delete, Insert};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    domain::user::session::{self, Kind},
    infra::{cache, Cache},
    token, Service,
};

use super::Command;

/// [`Command`] for rotating the [`session::Pair`] of a session by its
/// [`Kind::Refresh`] [`session::Token`].
#[derive(Clone, Debug, From)]
pub struct RefreshUserSession {
    /// [`Kind::Refresh`] [`session::Token`] of the session.
    pub token: session::Token,
}

impl<Db, C> Command<RefreshUserSession> for Service<Db, C>
where
    C: Cache<Insert<cache::Entry>, Ok = (), Err = Traced<cache::Error>>
        + Cache<Delete<cache::Key>, Ok = (), Err = Traced<cache::Error>>,
{
    type Ok = session::Pair;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RefreshUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RefreshUserSession { token } = cmd;

        let claims = self
            .tokens()
            .parse(&token)
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        if claims.kind != Kind::Refresh {
            if let Err(e) = self.sessions().delete(&claims.subject).await {
                tracing::error!(
                    step = "refresh_token_cache_delete",
                    subject = %claims.subject,
                    error = %e,
                    "failed to delete session",
                );
            }
            tracing::error!(
                step = "refresh_token_invalid_type",
                subject = %claims.subject,
                kind = %claims.kind,
                "non-refresh `Token` presented for refreshing",
            );
            return Err(tracerr::new!(E::WrongTokenKind(claims.kind)));
        }

        let user_id = claims
            .user_id()
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let tokens = self
            .tokens()
            .issue_pair(user_id)
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        if let Err(e) = self.sessions().put(user_id, &tokens.refresh).await {
            tracing::error!(
                step = "refresh_token_cache_set",
                user_id = %user_id,
                error = %e,
                "failed to store session",
            );
        }

        Ok(tokens)
    }
}

/// Error of [`RefreshUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Provided [`session::Token`] is malformed, forged or expired.
    #[display("Invalid refresh `Token`: {_0}")]
    InvalidToken(token::DecodeError),

    /// Subject of the provided [`session::Token`] is not a [`User`] ID.
    #[display("Invalid `User` ID in refresh `Token`: {_0}")]
    InvalidSubject(uuid::Error),

    /// Signing a new [`session::Token`] failed.
    #[display("Failed to issue session `Token`s: {_0}")]
    Token(token::EncodeError),

    /// Provided [`session::Token`] is not a [`Kind::Refresh`] one.
    #[display("`{_0}` token cannot refresh a session")]
    #[from(ignore)]
    WrongTokenKind(#[error(not(source))] Kind),
}
