//! GraphQL [`Mutation`]s definitions.

use juniper::graphql_object;
use service::{command, Command as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Registers a new `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `USER_EXISTS` - provided `UserName` or `UserEmail` is occupied by
    ///                   another `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            currency = ?currency,
            email = %email,
            gql.name = "createUser",
            name = %name,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_user(
        name: api::user::Name,
        email: api::user::Email,
        password: api::user::Password,
        currency: api::user::Currency,
        ctx: &Context,
    ) -> Result<api::User, Error> {
        ctx.service()
            .execute(command::CreateUser {
                name: name.into(),
                email: email.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
                currency: currency.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Logs a `User` in with the provided credentials, creating a new
    /// session.
    ///
    /// Replaces any previous session of the `User`.
    ///
    /// Credentials are not checked against the registration rules, so any
    /// string is accepted.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `UNAUTHORIZED` - provided credentials do not match any `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            email = %email,
            gql.name = "createUserSession",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_user_session(
        email: String,
        password: String,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        ctx.service()
            .execute(command::CreateUserSession {
                email,
                password: password.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Exchanges the provided refresh token for a new `TokenPair`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `UNAUTHORIZED` - provided token is invalid, expired, is not a
    ///                    refresh token, or carries a malformed `User` ID.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "refreshUserSession",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn refresh_user_session(
        refresh_token: api::user::session::Token,
        ctx: &Context,
    ) -> Result<api::user::session::TokenPair, Error> {
        ctx.service()
            .execute(command::RefreshUserSession {
                token: refresh_token.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Logs out the session the bearer token of the request belongs to.
    ///
    /// Accepts both access and refresh tokens.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `UNAUTHORIZED` - the bearer token is missing or invalid.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteUserSession",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_user_session(ctx: &Context) -> Result<bool, Error> {
        let token = ctx.bearer_token().await?;
        ctx.service()
            .execute(command::DeleteUserSession { token })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|()| true)
    }
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "USER_EXISTS"]
                #[status = CONFLICT]
                #[message = "`User` with the provided name or email already \
                             exists"]
                UserExists,
            }
        }

        match self {
            Self::UserExists => Some(Error::UserExists.into()),
            Self::Db(e) => e.try_as_error(),
            Self::Credential(_) | Self::Interrupted(_) => None,
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "UNAUTHORIZED"]
                #[status = UNAUTHORIZED]
                #[message = "Invalid email or password"]
                WrongCredentials,
            }
        }

        match self {
            Self::WrongCredentials => Some(Error::WrongCredentials.into()),
            Self::Interrupted(_) | Self::Token(_) => None,
        }
    }
}

impl AsError for command::refresh_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "UNAUTHORIZED"]
                #[status = UNAUTHORIZED]
                #[message = "Invalid refresh token"]
                InvalidToken,

                #[code = "UNAUTHORIZED"]
                #[status = UNAUTHORIZED]
                #[message = "Invalid refresh token type"]
                WrongTokenKind,

                #[code = "UNAUTHORIZED"]
                #[status = UNAUTHORIZED]
                #[message = "Invalid user code in refresh token"]
                InvalidSubject,
            }
        }

        match self {
            Self::InvalidToken(_) => Some(Error::InvalidToken.into()),
            Self::WrongTokenKind(_) => Some(Error::WrongTokenKind.into()),
            Self::InvalidSubject(_) => Some(Error::InvalidSubject.into()),
            Self::Token(_) => None,
        }
    }
}

impl AsError for command::delete_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "UNAUTHORIZED"]
                #[status = UNAUTHORIZED]
                #[message = "Invalid token"]
                InvalidToken,
            }
        }

        match self {
            Self::InvalidToken(_) => Some(Error::InvalidToken.into()),
        }
    }
}
