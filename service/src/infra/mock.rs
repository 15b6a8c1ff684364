//! In-test doubles of infrastructure capabilities.

use std::{
    io,
    sync::{Arc, Mutex},
    time::Duration,
};

use common::{
    operations::{By, Delete, Insert, Select},
    Currency, DateTime,
};
use tracerr::Traced;

use crate::{
    domain::{
        user::{self, Credential},
        User,
    },
    infra::{
        cache::{self, Entry, Key},
        database,
    },
    store, token, Config, Service,
};

/// Log output of the current thread, captured while its guard is alive.
#[derive(Clone, Debug, Default)]
pub(crate) struct Logs(Arc<Mutex<Vec<u8>>>);

impl Logs {
    /// Starts capturing the log output of the current thread.
    pub(crate) fn capture() -> (Self, tracing::subscriber::DefaultGuard) {
        let logs = Self::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        (logs, tracing::subscriber::set_default(subscriber))
    }

    /// Checks whether the captured output contains the provided text.
    pub(crate) fn contains(&self, text: &str) -> bool {
        String::from_utf8_lossy(&self.0.lock().unwrap()).contains(text)
    }
}

impl io::Write for Logs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Call made to a [`Cache`] double.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Call {
    /// [`Insert`]ion of an [`Entry`].
    Set {
        key: String,
        value: String,
        ttl: Duration,
    },

    /// [`Delete`]ion of a [`Key`].
    Delete { key: String },
}

/// [`cache::Cache`] double recording every call made to it.
#[derive(Clone, Debug, Default)]
pub(crate) struct Cache {
    /// Recorded calls.
    calls: Arc<Mutex<Vec<Call>>>,

    /// Indicator whether every call fails.
    failing: bool,

    /// Time every call takes.
    delay: Option<Duration>,
}

impl Cache {
    /// Creates a new [`Cache`] double succeeding on every call.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Creates a new [`Cache`] double failing on every call.
    pub(crate) fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Creates a new [`Cache`] double taking the provided time on every call.
    pub(crate) fn stalling(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Returns all the calls recorded so far.
    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    async fn record(&self, call: Call) -> Result<(), Traced<cache::Error>> {
        self.calls.lock().unwrap().push(call);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(tracerr::new!(cache::Error::Unavailable(
                "connection refused".to_owned(),
            )));
        }
        Ok(())
    }
}

impl cache::Cache<Insert<Entry>> for Cache {
    type Ok = ();
    type Err = Traced<cache::Error>;

    async fn execute(
        &self,
        Insert(entry): Insert<Entry>,
    ) -> Result<Self::Ok, Self::Err> {
        let Entry { key, value, ttl } = entry;
        self.record(Call::Set {
            key: key.into(),
            value,
            ttl,
        })
        .await
    }
}

impl cache::Cache<Delete<Key>> for Cache {
    type Ok = ();
    type Err = Traced<cache::Error>;

    async fn execute(
        &self,
        Delete(key): Delete<Key>,
    ) -> Result<Self::Ok, Self::Err> {
        self.record(Call::Delete { key: key.into() }).await
    }
}

/// [`database::Database`] double keeping [`User`]s in memory.
#[derive(Clone, Debug, Default)]
pub(crate) struct Database {
    /// Stored [`User`]s.
    users: Arc<Mutex<Vec<User>>>,

    /// Indicator whether every operation fails.
    failing: bool,
}

impl Database {
    /// Creates a new [`Database`] double holding the provided [`User`]s.
    pub(crate) fn with(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: Arc::new(Mutex::new(users.into_iter().collect())),
            failing: false,
        }
    }

    /// Creates a new [`Database`] double failing on every operation.
    #[cfg(feature = "postgres")]
    pub(crate) fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Returns all the stored [`User`]s.
    pub(crate) fn users(&self) -> Vec<User> {
        self.users.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), Traced<database::Error>> {
        #[cfg(feature = "postgres")]
        if self.failing {
            let closed = database::postgres::Error::PoolError(
                deadpool_postgres::PoolError::Closed,
            );
            return Err(tracerr::new!(database::Error::from(closed)));
        }
        Ok(())
    }

    fn find(&self, pred: impl Fn(&User) -> bool) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| pred(u)).cloned()
    }
}

impl database::Database<Select<By<Option<User>, user::Id>>> for Database {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.check()?;
        let id = by.into_inner();
        Ok(self.find(|u| u.id == id))
    }
}

impl<'e> database::Database<Select<By<Option<User>, &'e user::Email>>>
    for Database
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'e user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.check()?;
        let email = by.into_inner();
        Ok(self.find(|u| &u.email == email))
    }
}

impl database::Database<Insert<User>> for Database {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| {
            u.id == user.id || u.email == user.email || u.name == user.name
        }) {
            return Ok(false);
        }
        users.push(user);
        Ok(true)
    }
}

/// Creates a new [`User`] with the provided [`user::Email`] and
/// [`user::Password`].
pub(crate) fn user(email: &str, password: &str) -> User {
    let password = user::Password::new(password).unwrap();
    User {
        id: user::Id::new(),
        name: user::Name::new(email.split('@').next().unwrap()).unwrap(),
        email: user::Email::new(email).unwrap(),
        currency: Currency::Eur,
        credential: Credential::new(&password).unwrap(),
        created_at: DateTime::now().coerce(),
    }
}

/// [`store::Config`] of the [`Service`] created by [`service()`].
pub(crate) const SESSION: store::Config = store::Config {
    ttl: Duration::from_secs(7 * 24 * 60 * 60),
    timeout: Duration::from_secs(1),
};

/// Creates a new [`Service`] on top of the provided [`Database`] double and
/// a fresh [`Cache`] double.
pub(crate) fn service(database: Database) -> Service<Database, Cache> {
    service_with_cache(database, Cache::new())
}

/// Creates a new [`Service`] on top of the provided doubles.
pub(crate) fn service_with_cache(
    database: Database,
    cache: Cache,
) -> Service<Database, Cache> {
    Service::new(
        Config {
            token: token::spec::config(),
            session: SESSION,
        },
        database,
        cache,
    )
}
