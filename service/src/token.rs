//! [JWT] codec of session [`Token`]s.
//!
//! [JWT]: https://datatracker.ietf.org/doc/html/rfc7519

use std::{fmt, time::Duration};

use common::DateTime;
use derive_more::{Debug, Display, Error, From};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use tracerr::Traced;
use uuid::Uuid;

use crate::domain::user::session::{Claims, Kind, Pair, Token};

/// [`Codec`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Secret the [`Token`]s are signed with.
    pub secret: SecretString,

    /// Name of the service issuing [`Token`]s.
    pub issuer: String,

    /// Lifetime of a [`Kind::Access`] [`Token`].
    pub access_ttl: Duration,

    /// Lifetime of a [`Kind::Refresh`] [`Token`].
    pub refresh_ttl: Duration,

    /// [`Algorithm`] the [`Token`]s are signed with.
    pub algorithm: Algorithm,
}

/// HMAC algorithm signing [`Token`]s.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Algorithm {
    /// HMAC using SHA-256.
    #[default]
    Hs256,

    /// HMAC using SHA-384.
    Hs384,

    /// HMAC using SHA-512.
    Hs512,
}

impl From<Algorithm> for jsonwebtoken::Algorithm {
    fn from(alg: Algorithm) -> Self {
        match alg {
            Algorithm::Hs256 => Self::HS256,
            Algorithm::Hs384 => Self::HS384,
            Algorithm::Hs512 => Self::HS512,
        }
    }
}

/// Issuer and validator of signed [`Token`]s.
///
/// Immutable once created, so may be freely shared between concurrent
/// operations.
#[derive(Clone, Debug)]
pub struct Codec {
    /// Name of the service issuing [`Token`]s.
    issuer: String,

    /// Lifetime of a [`Kind::Access`] [`Token`].
    access_ttl: Duration,

    /// Lifetime of a [`Kind::Refresh`] [`Token`].
    refresh_ttl: Duration,

    /// Header of every issued [`Token`].
    header: Header,

    /// Key signing [`Token`]s.
    #[debug(skip)]
    encoding_key: EncodingKey,

    /// Key verifying [`Token`] signatures.
    #[debug(skip)]
    decoding_key: DecodingKey,

    /// Rules a parsed [`Token`] must satisfy.
    validation: Validation,
}

impl Codec {
    /// Creates a new [`Codec`] out of the provided [`Config`].
    #[must_use]
    pub fn new(config: Config) -> Self {
        let Config {
            secret,
            issuer,
            access_ttl,
            refresh_ttl,
            algorithm,
        } = config;
        let algorithm = algorithm.into();
        let secret = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);
        validation.set_issuer(&[&issuer]);

        Self {
            issuer,
            access_ttl,
            refresh_ttl,
            header: Header::new(algorithm),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issues a new [`Kind::Access`] [`Token`] for the provided `subject`.
    ///
    /// # Errors
    ///
    /// If signing fails.
    pub fn issue_access(
        &self,
        subject: impl fmt::Display,
    ) -> Result<Token, Traced<EncodeError>> {
        self.issue(subject, Kind::Access, DateTime::now(), self.access_ttl)
    }

    /// Issues a new [`Kind::Refresh`] [`Token`] for the provided `subject`.
    ///
    /// # Errors
    ///
    /// If signing fails.
    pub fn issue_refresh(
        &self,
        subject: impl fmt::Display,
    ) -> Result<Token, Traced<EncodeError>> {
        self.issue(subject, Kind::Refresh, DateTime::now(), self.refresh_ttl)
    }

    /// Issues a new [`Pair`] of [`Token`]s for the provided `subject`.
    ///
    /// # Errors
    ///
    /// If signing fails.
    pub fn issue_pair(
        &self,
        subject: impl fmt::Display,
    ) -> Result<Pair, Traced<EncodeError>> {
        Ok(Pair {
            access: self
                .issue_access(&subject)
                .map_err(tracerr::wrap!())?,
            refresh: self
                .issue_refresh(&subject)
                .map_err(tracerr::wrap!())?,
        })
    }

    /// Signs a new [`Token`] of the provided [`Kind`], living for the
    /// provided `ttl` since `issued_at`.
    fn issue(
        &self,
        subject: impl fmt::Display,
        kind: Kind,
        issued_at: DateTime,
        ttl: Duration,
    ) -> Result<Token, Traced<EncodeError>> {
        let expires_at = issued_at
            .checked_add(ttl)
            .ok_or_else(|| tracerr::new!(EncodeError::Lifetime(ttl)))?;
        let claims = Claims {
            subject: subject.to_string(),
            issued_at: issued_at.coerce(),
            expires_at: expires_at.coerce(),
            issuer: self.issuer.clone(),
            kind,
            id: Uuid::new_v4(),
        };
        jsonwebtoken::encode(&self.header, &claims, &self.encoding_key)
            .map(Token::from)
            .map_err(tracerr::from_and_wrap!(=> EncodeError))
    }

    /// Parses the provided [`Token`] into its [`Claims`].
    ///
    /// Successfully returned [`Claims`] are valid: the signature, algorithm,
    /// issuer, structure and expiration are all checked with zero leeway.
    /// The [`Kind`] is not checked.
    ///
    /// # Errors
    ///
    /// If the [`Token`] is malformed, forged or expired.
    pub fn parse(
        &self,
        token: &Token,
    ) -> Result<Claims, Traced<DecodeError>> {
        jsonwebtoken::decode::<Claims>(
            token.as_ref(),
            &self.decoding_key,
            &self.validation,
        )
        .map(|data| data.claims)
        .map_err(tracerr::from_and_wrap!(=> DecodeError))
    }
}

/// Error of signing a [`Token`].
#[derive(Debug, Display, Error, From)]
pub enum EncodeError {
    /// JSON Web Token encoding failed.
    #[display("Failed to encode a JSON Web Token: {_0}")]
    Jwt(jsonwebtoken::errors::Error),

    /// Expiration of a [`Token`] is not representable.
    #[display("`Token` lifetime {_0:?} is out of range")]
    #[from(ignore)]
    Lifetime(#[error(not(source))] Duration),
}

/// Error of parsing an invalid [`Token`].
#[derive(Debug, Display, Error, From)]
#[display("Failed to decode a JSON Web Token: {_0}")]
pub struct DecodeError(jsonwebtoken::errors::Error);
