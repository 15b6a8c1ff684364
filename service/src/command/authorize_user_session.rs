//! [`Command`] for authorizing a [`User`] session.

use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    domain::user::{
        self,
        session::{self, Kind},
    },
    token, Service,
};

use super::Command;

/// [`Command`] for authorizing an API call by a [`Kind::Access`]
/// [`session::Token`].
#[derive(Clone, Debug, From)]
pub struct AuthorizeUserSession {
    /// [`session::Token`] to authorize.
    pub token: session::Token,
}

/// Output of [`AuthorizeUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// ID of the authorized [`User`].
    pub user_id: user::Id,

    /// [`session::Claims`] of the authorized [`session::Token`].
    pub claims: session::Claims,
}

impl<Db, C> Command<AuthorizeUserSession> for Service<Db, C> {
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeUserSession { token } = cmd;

        let claims = self
            .tokens()
            .parse(&token)
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if claims.kind != Kind::Access {
            return Err(tracerr::new!(E::WrongTokenKind(claims.kind)));
        }
        let user_id = claims
            .user_id()
            .map_err(tracerr::from_and_wrap!(=> E))?;

        Ok(Output { user_id, claims })
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Provided [`session::Token`] is malformed, forged or expired.
    #[display("Invalid access `Token`: {_0}")]
    InvalidToken(token::DecodeError),

    /// Subject of the provided [`session::Token`] is not a [`User`] ID.
    #[display("Invalid `User` ID in access `Token`: {_0}")]
    InvalidSubject(uuid::Error),

    /// Provided [`session::Token`] is not a [`Kind::Access`] one.
    #[display("`{_0}` token cannot authorize API calls")]
    #[from(ignore)]
    WrongTokenKind(#[error(not(source))] Kind),
}
