//! [`SessionStore`] definitions.

use std::{fmt, time::Duration};

use common::operations::{Delete, Insert};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    domain::user::session::Token,
    infra::{
        cache::{self, Entry, Key},
        Cache,
    },
};

/// Prefix of the [`Key`] a session is stored under.
pub const KEY_PREFIX: &str = "user_refresh_token:";

/// [`SessionStore`] configuration.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Time a stored session lives.
    pub ttl: Duration,

    /// Maximum time a single [`Cache`] operation may take.
    pub timeout: Duration,
}

/// Record of the single currently valid refresh [`Token`] of every [`User`],
/// kept in a [`Cache`].
#[derive(Clone, Debug)]
pub struct SessionStore<C> {
    /// [`Cache`] the sessions are kept in.
    cache: C,

    /// [`Config`] of this [`SessionStore`].
    config: Config,
}

impl<C> SessionStore<C> {
    /// Creates a new [`SessionStore`] on top of the provided [`Cache`].
    #[must_use]
    pub fn new(cache: C, config: Config) -> Self {
        Self { cache, config }
    }

    /// Returns the [`Cache`] of this [`SessionStore`].
    #[must_use]
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Returns the [`Key`] of the provided `subject`'s session.
    #[must_use]
    pub fn key(subject: impl fmt::Display) -> Key {
        Key::from(format!("{KEY_PREFIX}{subject}"))
    }

    /// Overwrites the session of the provided `subject` with the provided
    /// refresh [`Token`].
    ///
    /// # Errors
    ///
    /// If the [`Cache`] fails or doesn't respond in time.
    pub async fn put(
        &self,
        subject: impl fmt::Display,
        token: &Token,
    ) -> Result<(), Traced<cache::Error>>
    where
        C: Cache<Insert<Entry>, Ok = (), Err = Traced<cache::Error>>,
    {
        let entry = Entry {
            key: Self::key(subject),
            value: token.to_string(),
            ttl: self.config.ttl,
        };
        tokio::time::timeout(
            self.config.timeout,
            self.cache.execute(Insert(entry)),
        )
        .await
        .map_err(|_| {
            tracerr::new!(cache::Error::Timeout(self.config.timeout))
        })?
        .map_err(tracerr::wrap!())
    }

    /// Removes the session of the provided `subject`, if any.
    ///
    /// # Errors
    ///
    /// If the [`Cache`] fails or doesn't respond in time.
    pub async fn delete(
        &self,
        subject: impl fmt::Display,
    ) -> Result<(), Traced<cache::Error>>
    where
        C: Cache<Delete<Key>, Ok = (), Err = Traced<cache::Error>>,
    {
        tokio::time::timeout(
            self.config.timeout,
            self.cache.execute(Delete(Self::key(subject))),
        )
        .await
        .map_err(|_| {
            tracerr::new!(cache::Error::Timeout(self.config.timeout))
        })?
        .map_err(tracerr::wrap!())
    }
}
