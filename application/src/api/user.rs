//! [`User`]-related definitions.

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    Context,
};

/// A [`User`] of the system.
#[derive(Clone, Debug, From)]
pub struct User(domain::user::Profile);

impl From<domain::User> for User {
    fn from(user: domain::User) -> Self {
        Self(user.into())
    }
}

/// A `User` of the system.
#[graphql_object(context = Context)]
impl User {
    /// Unique identifier of this `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Name of this `User`.
    pub fn name(&self) -> Name {
        self.0.name.clone().into()
    }

    /// Email of this `User`.
    pub fn email(&self) -> Email {
        self.0.email.clone().into()
    }

    /// `Currency` this `User` keeps their books in.
    pub fn currency(&self) -> Currency {
        self.0.currency.into()
    }

    /// `DateTime` when this `User` was created.
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of a `User`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::user::Id)]
#[into(domain::user::Id)]
#[graphql(name = "UserId", transparent)]
pub struct Id(Uuid);

/// Name of a `User`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "UserName",
    with = scalar::Via::<domain::user::Name>,
)]
pub struct Name(domain::user::Name);

/// Password of a `User`.
#[derive(AsRef, Clone, Debug, From, GraphQLScalar, Into)]
#[graphql(
    name = "UserPassword",
    with = scalar::Via::<domain::user::Password>,
)]
pub struct Password(domain::user::Password);

/// Email of a `User`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "UserEmail",
    with = scalar::Via::<domain::user::Email>,
)]
pub struct Email(domain::user::Email);

/// Currency a `User` keeps their books in.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
pub enum Currency {
    /// US Dollar.
    Usd,

    /// Euro.
    Eur,

    /// Pound Sterling.
    Gbp,

    /// Colombian Peso.
    Cop,
}

impl From<domain::user::Currency> for Currency {
    fn from(currency: domain::user::Currency) -> Self {
        use domain::user::Currency as C;

        match currency {
            C::Usd => Self::Usd,
            C::Eur => Self::Eur,
            C::Gbp => Self::Gbp,
            C::Cop => Self::Cop,
        }
    }
}

impl From<Currency> for domain::user::Currency {
    fn from(currency: Currency) -> Self {
        match currency {
            Currency::Usd => Self::Usd,
            Currency::Eur => Self::Eur,
            Currency::Gbp => Self::Gbp,
            Currency::Cop => Self::Cop,
        }
    }
}

pub mod session {
    //! Session-related definitions.

    use derive_more::{Display, From, Into};
    use juniper::{GraphQLObject, GraphQLScalar};
    use service::{command, domain};

    use crate::{api, Context};

    /// Signed session token.
    #[derive(Clone, Debug, Display, From, GraphQLScalar, Into)]
    #[graphql(name = "UserToken", transparent)]
    pub struct Token(String);

    impl From<domain::user::session::Token> for Token {
        fn from(token: domain::user::session::Token) -> Self {
            Self(token.into())
        }
    }

    impl From<Token> for domain::user::session::Token {
        fn from(token: Token) -> Self {
            token.0.into()
        }
    }

    /// Access and refresh tokens of a session.
    #[derive(Clone, Debug, GraphQLObject)]
    #[graphql(context = Context)]
    pub struct TokenPair {
        /// Short-lived token authorizing API calls.
        pub access_token: Token,

        /// Long-lived token used to obtain a new `TokenPair`.
        pub refresh_token: Token,
    }

    impl From<domain::user::session::Pair> for TokenPair {
        fn from(pair: domain::user::session::Pair) -> Self {
            let domain::user::session::Pair { access, refresh } = pair;
            Self {
                access_token: access.into(),
                refresh_token: refresh.into(),
            }
        }
    }

    /// Result of a session creation.
    #[derive(Clone, Debug, GraphQLObject)]
    #[graphql(context = Context, name = "CreateSessionResult")]
    pub struct CreateResult {
        /// `User` the session was created for.
        pub user: api::User,

        /// Tokens of the created session.
        pub tokens: TokenPair,
    }

    impl From<command::create_user_session::Output> for CreateResult {
        fn from(output: command::create_user_session::Output) -> Self {
            let command::create_user_session::Output { user, tokens } = output;
            Self {
                user: user.into(),
                tokens: tokens.into(),
            }
        }
    }
}

#[cfg(test)]
mod spec {
    use service::domain;

    use super::Currency;

    #[test]
    fn currency_maps_both_ways() {
        for c in [
            domain::user::Currency::Usd,
            domain::user::Currency::Eur,
            domain::user::Currency::Gbp,
            domain::user::Currency::Cop,
        ] {
            assert_eq!(domain::user::Currency::from(Currency::from(c)), c);
        }
    }
}
