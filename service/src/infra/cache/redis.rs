//! [Redis] [`Cache`] implementation.
//!
//! [Redis]: https://redis.io

use std::fmt;

use common::operations::{Delete, Insert};
use deadpool_redis::{redis::AsyncCommands as _, Connection, Pool, Runtime};
use tracerr::Traced;

use crate::infra::{cache, Cache};

use super::{Entry, Key};

/// [`Redis`] server location.
#[derive(Clone, Debug)]
pub struct Config {
    /// Host of the server.
    pub host: String,

    /// Port of the server.
    pub port: u16,
}

impl Config {
    /// Returns the connection URL of the server.
    #[must_use]
    pub fn url(&self) -> String {
        let Self { host, port } = self;
        format!("redis://{host}:{port}")
    }
}

/// [`Cache`] kept on a [Redis] server, shared by every instance of the
/// application and surviving its restarts.
///
/// Connections are established lazily, on the first operation.
///
/// [Redis]: https://redis.io
#[derive(Clone, Debug)]
pub struct Redis {
    /// Pool of connections to the server.
    pool: Pool,
}

impl Redis {
    /// Creates a new [`Redis`] client with the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If the [`Config`] doesn't form a valid connection URL.
    pub fn new(conf: &Config) -> Result<Self, Traced<cache::Error>> {
        deadpool_redis::Config::from_url(conf.url())
            .create_pool(Some(Runtime::Tokio1))
            .map(|pool| Self { pool })
            .map_err(|e| tracerr::new!(unavailable(e)))
    }

    /// Checks out a [`Connection`] from the pool.
    async fn connection(&self) -> Result<Connection, Traced<cache::Error>> {
        self.pool.get().await.map_err(|e| tracerr::new!(unavailable(e)))
    }
}

impl Cache<Insert<Entry>> for Redis {
    type Ok = ();
    type Err = Traced<cache::Error>;

    async fn execute(
        &self,
        Insert(entry): Insert<Entry>,
    ) -> Result<Self::Ok, Self::Err> {
        let Entry { key, value, ttl } = entry;
        // `PSETEX` refuses a zero lifetime.
        let millis = u64::try_from(ttl.as_millis())
            .map_err(|_| tracerr::new!(cache::Error::Ttl(ttl)))?
            .max(1);

        let mut conn = self.connection().await.map_err(tracerr::wrap!())?;
        conn.pset_ex::<_, _, ()>(String::from(key), value, millis)
            .await
            .map_err(|e| tracerr::new!(unavailable(e)))
    }
}

impl Cache<Delete<Key>> for Redis {
    type Ok = ();
    type Err = Traced<cache::Error>;

    async fn execute(
        &self,
        Delete(key): Delete<Key>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut conn = self.connection().await.map_err(tracerr::wrap!())?;
        conn.del::<_, ()>(String::from(key))
            .await
            .map_err(|e| tracerr::new!(unavailable(e)))
    }
}

/// Wraps the provided Redis failure into a [`cache::Error::Unavailable`].
fn unavailable(e: impl fmt::Display) -> cache::Error {
    cache::Error::Unavailable(e.to_string())
}
