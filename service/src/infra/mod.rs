//! Infrastructure layer.

pub mod cache;
pub mod database;
#[cfg(test)]
pub(crate) mod mock;

pub use self::{cache::Cache, database::Database};
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
