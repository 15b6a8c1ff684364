//! [`Cache`]-related implementations.

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

use std::time::Duration;

use common::operations::{Delete, Insert};
use derive_more::{AsRef, Display, Error as StdError, From, Into};
use tracerr::Traced;

#[cfg(feature = "redis")]
pub use self::redis::Redis;
pub use self::memory::Memory;

/// Key-value cache operation.
pub use common::Handler as Cache;

/// Key of a [`Cache`] entry.
#[derive(AsRef, Clone, Debug, Display, Eq, From, Hash, Into, PartialEq)]
#[as_ref(str)]
pub struct Key(String);

/// [`Cache`] entry to be stored.
#[derive(Clone, Debug)]
pub struct Entry {
    /// [`Key`] of this [`Entry`].
    pub key: Key,

    /// Value of this [`Entry`].
    pub value: String,

    /// Time this [`Entry`] lives before it expires.
    pub ttl: Duration,
}

/// [`Cache`] error.
#[derive(Debug, Display, StdError)]
pub enum Error {
    /// [`Cache`] backend cannot serve the request.
    #[display("`Cache` is unavailable: {_0}")]
    Unavailable(#[error(not(source))] String),

    /// [`Cache`] operation didn't complete in time.
    #[display("`Cache` operation timed out after {_0:?}")]
    Timeout(#[error(not(source))] Duration),

    /// [`Entry`] lifetime cannot be represented by the [`Cache`].
    #[display("`Entry` lifetime {_0:?} is out of range")]
    Ttl(#[error(not(source))] Duration),
}

/// [`Cache`] chosen on startup.
#[derive(Clone, Debug)]
pub enum Backend {
    /// Process-local [`Memory`] cache.
    Memory(Memory),

    /// Networked [`Redis`] cache.
    #[cfg(feature = "redis")]
    Redis(Redis),
}

impl From<Memory> for Backend {
    fn from(cache: Memory) -> Self {
        Self::Memory(cache)
    }
}

#[cfg(feature = "redis")]
impl From<Redis> for Backend {
    fn from(cache: Redis) -> Self {
        Self::Redis(cache)
    }
}

impl Cache<Insert<Entry>> for Backend {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(&self, op: Insert<Entry>) -> Result<Self::Ok, Self::Err> {
        match self {
            Self::Memory(cache) => cache.execute(op).await,
            #[cfg(feature = "redis")]
            Self::Redis(cache) => cache.execute(op).await,
        }
    }
}

impl Cache<Delete<Key>> for Backend {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(&self, op: Delete<Key>) -> Result<Self::Ok, Self::Err> {
        match self {
            Self::Memory(cache) => cache.execute(op).await,
            #[cfg(feature = "redis")]
            Self::Redis(cache) => cache.execute(op).await,
        }
    }
}
