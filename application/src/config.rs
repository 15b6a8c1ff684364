//! [`Config`]-related definitions.

use std::time;

use common::DateTime;
use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use serde::Deserialize;
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Session cache configuration.
    pub cache: Cache,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        let conf: Self = ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()?;
        conf.service.check_lifetimes()?;
        Ok(conf)
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Service configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Service {
    /// [JWT] configuration.
    ///
    /// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
    pub jwt: Jwt,

    /// Session storage configuration.
    pub session: Session,
}

impl Service {
    /// Checks that every configured lifetime ends at a representable date.
    fn check_lifetimes(&self) -> Result<(), ConfigError> {
        let now = DateTime::now();
        for (name, ttl) in [
            ("service.jwt.access_ttl", self.jwt.access_ttl),
            ("service.jwt.refresh_ttl", self.jwt.refresh_ttl),
            ("service.session.ttl", self.session.ttl),
        ] {
            if now.checked_add(ttl).is_none() {
                return Err(ConfigError::Message(format!(
                    "`{name}` of {ttl:?} is out of range",
                )));
            }
        }
        Ok(())
    }
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        let Service {
            jwt:
                Jwt {
                    secret,
                    issuer,
                    access_ttl,
                    refresh_ttl,
                    algorithm,
                },
            session: Session { ttl, cache_timeout },
        } = value;
        Self {
            token: service::token::Config {
                secret: secret.into(),
                issuer,
                access_ttl,
                refresh_ttl,
                algorithm,
            },
            session: service::store::Config {
                ttl,
                timeout: cache_timeout,
            },
        }
    }
}

/// [JWT] configuration.
///
/// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Jwt {
    /// Secret the tokens are signed with.
    #[default("secret".to_owned())]
    pub secret: String,

    /// Issuer of the tokens.
    #[default("zenith-financial".to_owned())]
    pub issuer: String,

    /// Lifetime of an access token.
    #[default(time::Duration::from_secs(60))]
    #[serde(with = "humantime_serde")]
    pub access_ttl: time::Duration,

    /// Lifetime of a refresh token.
    #[default(time::Duration::from_secs(60 * 60 * 24))]
    #[serde(with = "humantime_serde")]
    pub refresh_ttl: time::Duration,

    /// Algorithm the tokens are signed with.
    pub algorithm: service::token::Algorithm,
}

/// Session storage configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Session {
    /// Time a stored session lives.
    #[default(time::Duration::from_secs(60 * 60 * 24 * 7))]
    #[serde(with = "humantime_serde")]
    pub ttl: time::Duration,

    /// Maximum time a single session cache operation may take.
    #[default(time::Duration::from_secs(1))]
    #[serde(with = "humantime_serde")]
    pub cache_timeout: time::Duration,
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Session cache configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cache {
    /// Kind of the cache to keep sessions in.
    pub kind: CacheKind,

    /// Host of the Redis server.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port of the Redis server.
    #[default(6379)]
    pub port: u16,
}

/// Kind of the session cache.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    /// Process-local cache, lost on restart and not shared between
    /// instances.
    Memory,

    /// Redis server.
    #[default]
    Redis,
}

impl From<Cache> for service::infra::cache::redis::Config {
    fn from(value: Cache) -> Self {
        let Cache {
            kind: _,
            host,
            port,
        } = value;
        Self { host, port }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}
