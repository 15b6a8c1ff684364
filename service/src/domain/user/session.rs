//! Session [`Token`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::User;
use crate::domain::user;

/// Signed bearer token of a [`User`] session.
///
/// Holding a [`Token`] proves nothing by itself: it must be parsed by the
/// token codec before its [`Claims`] can be trusted.
#[derive(AsRef, Clone, Debug, Display, Eq, From, Into, PartialEq)]
#[as_ref(str)]
pub struct Token(String);

/// Kind of a [`Token`].
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// Short-lived [`Token`] authorizing API calls.
    #[display("access")]
    Access,

    /// Long-lived [`Token`] used solely to obtain a new [`Pair`].
    #[display("refresh")]
    Refresh,
}

/// Claims carried by a [`Token`].
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Claims {
    /// Subject of the [`Token`]: ID of the [`User`] it was issued for.
    ///
    /// Kept raw, as a malformed subject of a correctly signed [`Token`] is a
    /// distinct failure.
    #[serde(rename = "sub")]
    pub subject: String,

    /// [`DateTime`] when the [`Token`] was issued.
    #[serde(rename = "iat", with = "common::datetime::serde::unix_timestamp")]
    pub issued_at: IssuanceDateTime,

    /// [`DateTime`] when the [`Token`] expires.
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub expires_at: ExpirationDateTime,

    /// Name of the service that issued the [`Token`].
    #[serde(rename = "iss")]
    pub issuer: String,

    /// [`Kind`] of the [`Token`].
    #[serde(rename = "type")]
    pub kind: Kind,

    /// Unique ID of the [`Token`].
    #[serde(rename = "jti")]
    pub id: Uuid,
}

impl Claims {
    /// Parses the [`Claims::subject`] into a [`user::Id`].
    ///
    /// # Errors
    ///
    /// If the subject is not a valid UUID.
    pub fn user_id(&self) -> Result<user::Id, uuid::Error> {
        self.subject.parse::<Uuid>().map(Into::into)
    }
}

/// Pair of [`Token`]s issued together.
#[derive(Clone, Debug)]
pub struct Pair {
    /// [`Kind::Access`] [`Token`].
    pub access: Token,

    /// [`Kind::Refresh`] [`Token`].
    pub refresh: Token,
}

/// [`DateTime`] when a [`Token`] was issued.
pub type IssuanceDateTime = DateTimeOf<(Token, unit::Issuance)>;

/// [`DateTime`] when a [`Token`] expires.
pub type ExpirationDateTime = DateTimeOf<(Token, unit::Expiration)>;

#[cfg(test)]
mod spec {
    use common::DateTime;
    use uuid::Uuid;

    use super::{Claims, Kind};

    fn claims(subject: &str) -> Claims {
        Claims {
            subject: subject.to_owned(),
            issued_at: DateTime::now().coerce(),
            expires_at: DateTime::now().coerce(),
            issuer: "zenith-financial".to_owned(),
            kind: Kind::Refresh,
            id: Uuid::new_v4(),
        }
    }

    #[test]
    fn kind_display() {
        assert_eq!(Kind::Access.to_string(), "access");
        assert_eq!(Kind::Refresh.to_string(), "refresh");
    }

    #[test]
    fn user_id_from_subject() {
        let id = Uuid::new_v4();

        assert_eq!(
            claims(&id.to_string()).user_id().unwrap(),
            id.into(),
        );
        assert!(claims("not-a-uuid").user_id().is_err());
        assert!(claims("").user_id().is_err());
    }
}
