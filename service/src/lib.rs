//! Service contains the authentication and session logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod store;
pub mod token;

#[cfg(doc)]
use infra::{Cache, Database};

pub use self::{command::Command, query::Query, store::SessionStore};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [`token::Codec`] configuration.
    pub token: token::Config,

    /// [`SessionStore`] configuration.
    pub session: store::Config,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db, C> {
    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`token::Codec`] of this [`Service`].
    tokens: token::Codec,

    /// [`SessionStore`] of this [`Service`].
    sessions: SessionStore<C>,
}

impl<Db, C> Service<Db, C> {
    /// Creates a new [`Service`] with the provided [`Database`] and [`Cache`].
    #[must_use]
    pub fn new(config: Config, database: Db, cache: C) -> Self {
        let Config {
            token: tokens,
            session,
        } = config;

        if session.ttl != tokens.refresh_ttl {
            tracing::warn!(
                session_ttl = ?session.ttl,
                refresh_ttl = ?tokens.refresh_ttl,
                "session lifetime differs from refresh token lifetime",
            );
        }

        Self {
            database,
            tokens: token::Codec::new(tokens),
            sessions: SessionStore::new(cache, session),
        }
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns [`token::Codec`] of this [`Service`].
    #[must_use]
    pub fn tokens(&self) -> &token::Codec {
        &self.tokens
    }

    /// Returns [`SessionStore`] of this [`Service`].
    #[must_use]
    pub fn sessions(&self) -> &SessionStore<C> {
        &self.sessions
    }
}
