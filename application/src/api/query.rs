//! GraphQL [`Query`]s definitions.

use juniper::graphql_object;
use service::{query, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the currently authenticated `User`.
    ///
    /// Requires an access token in the `Authorization: Bearer` header.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `UNAUTHORIZED` - the access token is missing or invalid;
    /// - `USER_NOT_EXISTS` - the `User` the token was issued for is gone.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myUser",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_user(ctx: &Context) -> Result<api::User, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(query::user::ById::by(my_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| UserError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }
}

define_error! {
    enum UserError {
        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` does not exist"]
        NotExists,
    }
}

#[cfg(test)]
mod spec {
    use juniper::Variables;

    use crate::{api, context};

    #[tokio::test]
    async fn my_user_requires_authorization() {
        let svc = context::spec::service();
        let ctx = context::spec::context(&svc, None).await;

        let (_, errs) = juniper::execute(
            "{ myUser { id } }",
            None,
            &api::schema(),
            &Variables::new(),
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].error().message(), "Authorization required");
        assert_eq!(ctx.error_status_code(), http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn my_user_rejects_forged_token() {
        let svc = context::spec::service();
        let ctx = context::spec::context(&svc, Some("Bearer a.b.c")).await;

        let (_, errs) = juniper::execute(
            "{ myUser { id } }",
            None,
            &api::schema(),
            &Variables::new(),
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].error().message(), "Invalid token");
    }
}
