//! [`Context`]-related definitions.

use std::sync::atomic::{self, AtomicU16};

use axum::{async_trait, extract::FromRequestParts, RequestPartsExt as _};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use common::DateTime;
use juniper::{
    http::{GraphQLBatchResponse, GraphQLResponse},
    IntoFieldError as _,
};
use service::{
    command::{self, Command as _},
    domain::user::session,
};
use tokio::sync::OnceCell;

#[cfg(doc)]
use crate::api::User;
use crate::{api, define_error, AsError, Error, JuniperResponse, Service};

/// Application context.
#[derive(Debug)]
pub struct Context {
    /// [`Service`] instance.
    service: Service,

    /// Error status code.
    error_status_code: AtomicU16,

    /// Parts of the HTTP request.
    parts: http::request::Parts,

    /// Current [`Session`].
    current_session: OnceCell<Session>,

    /// Last authentication [`Error`].
    auth_error: OnceCell<Error>,
}

impl Context {
    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns the error status code of this [`Context`].
    #[must_use]
    pub fn error_status_code(&self) -> http::StatusCode {
        http::StatusCode::from_u16(
            self.error_status_code.load(atomic::Ordering::Relaxed),
        )
        .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Sets the error status code for this [`Context`].
    ///
    /// Provided [`http::StatusCode`] will be applied to the response.
    pub fn set_error_status_code(&self, status_code: http::StatusCode) {
        self.error_status_code
            .store(status_code.as_u16(), atomic::Ordering::Relaxed);
    }

    /// Helper method calling [`Context::set_error_status_code()`] inside
    /// [`Result::map_err()`] closure.
    pub fn error(&self) -> impl FnOnce(Error) -> Error + '_ {
        move |err| {
            self.set_error_status_code(err.status_code);
            err
        }
    }

    /// Returns the current [`Session`] for this [`Context`].
    ///
    /// # Errors
    ///
    /// Errors if:
    /// - the current HTTP request is not authorized;
    /// - the provided access token is invalid.
    pub async fn current_session(&self) -> Result<Session, Error> {
        self.current_session
            .get_or_try_init(|| async {
                match self
                    .auth_error
                    .get_or_try_init(|| async {
                        match self.do_authentication().await {
                            Ok(s) => Err(s),
                            Err(e) => Ok(e),
                        }
                    })
                    .await
                {
                    Ok(e) => Err(e),
                    Err(s) => Ok(s),
                }
            })
            .await
            .cloned()
            .map_err(Clone::clone)
    }

    /// Returns the bearer [`session::Token`] of the current HTTP request,
    /// without validating it.
    ///
    /// # Errors
    ///
    /// Errors if the `Authorization` header is missing, or is not a bearer
    /// one, which is reported the same way as an invalid token.
    pub async fn bearer_token(&self) -> Result<session::Token, Error> {
        self.parts
            .clone()
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map(|TypedHeader(Authorization(bearer))| {
                session::Token::from(bearer.token().to_owned())
            })
            .map_err(|e| {
                let err = if e.is_missing() {
                    AuthError::AuthorizationRequired
                } else {
                    AuthError::InvalidToken
                };
                err.into()
            })
            .map_err(self.error())
    }

    /// Performs the [`Session`] authentication.
    ///
    /// # Errors
    ///
    /// Errors if the provided access token is missing or invalid.
    async fn do_authentication(&self) -> Result<Session, Error> {
        let token = self.bearer_token().await?;
        self.service
            .execute(command::AuthorizeUserSession {
                token: token.clone(),
            })
            .await
            .map(|out| Session {
                user_id: out.user_id.into(),
                token,
                expires_at: out.claims.expires_at.coerce(),
            })
            .map_err(AsError::into_error)
            .map_err(self.error())
    }
}

impl juniper::Context for Context {}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = JuniperResponse;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service =
            parts.extensions.get::<Service>().cloned().ok_or_else(|| {
                tracing::error!("missing `Service` extension");
                JuniperResponse {
                    status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
                    response: GraphQLBatchResponse::Single(
                        GraphQLResponse::error(
                            Error::internal().into_field_error(),
                        ),
                    ),
                }
            })?;

        Ok(Self {
            service,
            error_status_code: AtomicU16::new(
                http::StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            ),
            parts: parts.clone(),
            current_session: OnceCell::new(),
            auth_error: OnceCell::new(),
        })
    }
}

/// Authenticated session of a [`User`].
#[derive(Clone, Debug)]
pub struct Session {
    /// ID of the [`User`] associated with this [`Session`].
    pub user_id: api::user::Id,

    /// Access token of this [`Session`].
    pub token: session::Token,

    /// [`DateTime`] when this [`Session`] expires.
    pub expires_at: DateTime,
}

impl AsError for command::authorize_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::InvalidToken(_)
            | Self::InvalidSubject(_)
            | Self::WrongTokenKind(_) => Some(AuthError::InvalidToken.into()),
        }
    }
}

define_error! {
    enum AuthError {
        #[code = "UNAUTHORIZED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization required"]
        AuthorizationRequired,

        #[code = "UNAUTHORIZED"]
        #[status = UNAUTHORIZED]
        #[message = "Invalid token"]
        InvalidToken,
    }
}

#[cfg(test)]
pub(crate) mod spec {
    use std::time::Duration;

    use axum::extract::FromRequestParts as _;
    use service::{
        domain::user::{self, session::Token},
        infra::{cache, Postgres},
    };

    use crate::Service;

    use super::Context;

    /// Creates a [`Service`] whose [`Postgres`] pool never connects until a
    /// query is made.
    pub(crate) fn service() -> Service {
        let postgres = Postgres::new(&service::infra::postgres::Config {
            host: Some("127.0.0.1".to_owned()),
            ..Default::default()
        })
        .unwrap();
        Service::new(
            service::Config {
                token: service::token::Config {
                    secret: "test-secret".to_owned().into(),
                    issuer: "zenith-financial".to_owned(),
                    access_ttl: Duration::from_secs(60),
                    refresh_ttl: Duration::from_secs(60 * 60 * 24),
                    algorithm: service::token::Algorithm::default(),
                },
                session: service::store::Config {
                    ttl: Duration::from_secs(60 * 60 * 24),
                    timeout: Duration::from_secs(1),
                },
            },
            postgres,
            cache::Memory::new().into(),
        )
    }

    /// Creates a [`Context`] of a request with the provided `Authorization`
    /// header value.
    pub(crate) async fn context(
        service: &Service,
        authorization: Option<&str>,
    ) -> Context {
        let mut req = http::Request::builder()
            .uri("/graphql")
            .extension(service.clone());
        if let Some(auth) = authorization {
            req = req.header(http::header::AUTHORIZATION, auth);
        }
        let (mut parts, ()) = req.body(()).unwrap().into_parts();
        Context::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn authenticates_access_token() {
        let svc = service();
        let id = user::Id::new();
        let token = svc.tokens().issue_access(id).unwrap();
        let ctx = context(&svc, Some(&format!("Bearer {token}"))).await;

        let session = ctx.current_session().await.unwrap();

        assert_eq!(user::Id::from(session.user_id), id);
        assert_eq!(session.token, token);
    }

    #[tokio::test]
    async fn requires_authorization_header() {
        let svc = service();
        let ctx = context(&svc, None).await;

        let err = ctx.current_session().await.unwrap_err();

        assert_eq!(err.code, "UNAUTHORIZED");
        assert_eq!(err.message, "Authorization required");
        assert_eq!(ctx.error_status_code(), http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejects_refresh_token() {
        let svc = service();
        let token = svc.tokens().issue_refresh(user::Id::new()).unwrap();
        let ctx = context(&svc, Some(&format!("Bearer {token}"))).await;

        let err = ctx.current_session().await.unwrap_err();

        assert_eq!(err.code, "UNAUTHORIZED");
        assert_eq!(err.message, "Invalid token");
    }

    #[tokio::test]
    async fn extracts_bearer_token_unchecked() {
        let svc = service();
        let ctx = context(&svc, Some("Bearer not.a.jwt")).await;

        assert_eq!(
            ctx.bearer_token().await.unwrap(),
            Token::from("not.a.jwt".to_owned()),
        );
    }

    #[tokio::test]
    async fn rejects_non_bearer_authorization() {
        let svc = service();

        for header in ["Basic YWxpY2U6cHc=", "raw.jwt.value", "Bearer"] {
            let ctx = context(&svc, Some(header)).await;

            let err = ctx.bearer_token().await.unwrap_err();

            assert_eq!(err.message, "Invalid token", "{header}");
            assert_eq!(
                ctx.error_status_code(),
                http::StatusCode::UNAUTHORIZED,
            );
        }
    }
}
