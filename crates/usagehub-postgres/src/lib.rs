#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Embeds all migrations into the final binary.
pub(crate) const MIGRATIONS: diesel_migrations::EmbeddedMigrations =
    diesel_migrations::embed_migrations!();

mod client;
mod error;
pub mod model;
pub mod query;
pub mod schema;
mod store;
pub mod types;

pub use client::{ConnectionPool, PgClient, PgConfig, PooledConnection};
pub use diesel_async::AsyncPgConnection as PgConnection;
pub use error::{PgError, PgResult};
pub use store::PgStatusStore;

/// Tracing target for database operations.
pub const TRACING_TARGET: &str = "usagehub_postgres";
