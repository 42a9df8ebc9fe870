//! PostgreSQL client with connection pooling.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use deadpool::managed::{Object, Pool};
use diesel_async::AsyncPgConnection;
use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_migrations::MigrationHarness;
use serde::{Deserialize, Serialize};
use tokio::task::spawn_blocking;

use crate::{MIGRATIONS, PgError, PgResult, TRACING_TARGET};

/// Type alias for the connection pool used throughout the crate.
pub type ConnectionPool = Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

/// Type alias for a connection object from the pool.
pub type PooledConnection = Object<AsyncDieselConnectionManager<AsyncPgConnection>>;

/// Database configuration including connection string and pool settings.
#[derive(Clone, Serialize, Deserialize)]
#[must_use = "database configurations must be used to create connection pools"]
pub struct PgConfig {
    /// PostgreSQL connection URL.
    pub postgres_url: String,
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
    /// Connection acquisition timeout in seconds.
    pub connection_timeout_secs: u64,
}

impl PgConfig {
    /// Creates a new database configuration with default pool settings.
    pub fn new(postgres_url: impl Into<String>) -> Self {
        Self {
            postgres_url: postgres_url.into(),
            max_connections: 10,
            connection_timeout_secs: 30,
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> PgResult<()> {
        if self.postgres_url.is_empty() {
            return Err(PgError::Config("postgres URL cannot be empty".into()));
        }
        if !self.postgres_url.starts_with("postgresql://")
            && !self.postgres_url.starts_with("postgres://")
        {
            return Err(PgError::Config(
                "postgres URL must start with 'postgresql://' or 'postgres://'".into(),
            ));
        }
        if self.max_connections == 0 {
            return Err(PgError::Config("pool must allow at least one connection".into()));
        }
        Ok(())
    }

    fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Returns the connection URL with credentials masked, for logging.
    pub fn masked_url(&self) -> String {
        match self.postgres_url.split_once('@') {
            Some((_, host)) => format!("postgresql://***@{host}"),
            None => self.postgres_url.clone(),
        }
    }
}

impl fmt::Debug for PgConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConfig")
            .field("postgres_url", &self.masked_url())
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Database client managing the connection pool.
#[derive(Clone)]
pub struct PgClient {
    inner: Arc<PgClientInner>,
}

struct PgClientInner {
    pool: ConnectionPool,
    config: PgConfig,
}

impl PgClient {
    /// Creates a new database client with the provided configuration.
    pub fn new(config: PgConfig) -> PgResult<Self> {
        config.validate()?;

        tracing::info!(
            target: TRACING_TARGET,
            database_url = %config.masked_url(),
            "Initializing database client"
        );

        let manager = AsyncDieselConnectionManager::new(&config.postgres_url);
        let pool = Pool::builder(manager)
            .max_size(config.max_connections as usize)
            .wait_timeout(Some(config.connection_timeout()))
            .create_timeout(Some(config.connection_timeout()))
            .runtime(deadpool::Runtime::Tokio1)
            .build()
            .map_err(|e| PgError::Unexpected(format!("failed to build pool: {e}").into()))?;

        Ok(Self {
            inner: Arc::new(PgClientInner { pool, config }),
        })
    }

    /// Acquires a connection from the pool.
    pub async fn get_connection(&self) -> PgResult<PooledConnection> {
        self.inner.pool.get().await.map_err(PgError::from)
    }

    /// Applies all pending embedded schema migrations.
    ///
    /// Migrations run on a blocking thread; the harness is synchronous.
    pub async fn run_pending_migrations(&self) -> PgResult<Vec<String>> {
        let conn = self.get_connection().await?;
        let mut conn: AsyncConnectionWrapper<PooledConnection> = conn.into();

        let versions = spawn_blocking(move || {
            conn.run_pending_migrations(MIGRATIONS).map(|versions| {
                versions
                    .into_iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
            })
        })
        .await
        .map_err(|err| PgError::Migration(err.into()))?
        .map_err(PgError::Migration)?;

        tracing::info!(
            target: TRACING_TARGET,
            migrations_count = versions.len(),
            "Applied pending schema migrations"
        );
        Ok(versions)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PgConfig {
        &self.inner.config
    }
}

impl fmt::Debug for PgClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgClient")
            .field("config", &self.inner.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_bad_url() {
        assert!(PgConfig::new("mysql://nope").validate().is_err());
        assert!(PgConfig::new("").validate().is_err());
        assert!(PgConfig::new("postgresql://localhost/usagehub").validate().is_ok());
    }

    #[test]
    fn test_masked_url_hides_credentials() {
        let config = PgConfig::new("postgresql://user:secret@db:5432/usagehub");
        assert!(!config.masked_url().contains("secret"));
        assert!(config.masked_url().contains("db:5432"));
    }
}
