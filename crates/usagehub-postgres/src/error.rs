//! Error types and utilities for database operations.

use std::borrow::Cow;

use deadpool::managed::TimeoutType;
use diesel::result::{ConnectionError, DatabaseErrorKind, Error};

/// Type-erased error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for database operations.
pub type PgResult<T> = Result<T, PgError>;

/// Error type for all PostgreSQL database operations.
#[derive(Debug, thiserror::Error)]
#[must_use = "database errors should be handled appropriately"]
pub enum PgError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database operation timed out.
    #[error("Database operation timed out")]
    Timeout(TimeoutType),

    /// Failed to establish or maintain a database connection.
    #[error("Database connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Database migration operation failed.
    #[error("Database migration error: {0}")]
    Migration(BoxError),

    /// Database query execution failed.
    #[error("Database query error: {0}")]
    Query(#[from] Error),

    /// Unexpected error occurred.
    #[error("Unexpected error: {0}")]
    Unexpected(Cow<'static, str>),
}

impl PgError {
    /// Returns whether this error is a unique constraint violation.
    ///
    /// The insert path treats a unique violation on the request-id index as
    /// an expected outcome (a concurrent duplicate submission), never as a
    /// failure.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            PgError::Query(Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _))
        )
    }

    /// Extracts the constraint name from a constraint violation error.
    pub fn constraint(&self) -> Option<&str> {
        let PgError::Query(Error::DatabaseError(_, info)) = self else {
            return None;
        };
        info.constraint_name()
    }

    /// Returns whether this error indicates a transient failure that might
    /// succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PgError::Timeout(_) | PgError::Connection(ConnectionError::BadConnection(_))
        )
    }
}

impl From<deadpool::managed::PoolError<diesel_async::pooled_connection::PoolError>> for PgError {
    fn from(err: deadpool::managed::PoolError<diesel_async::pooled_connection::PoolError>) -> Self {
        use deadpool::managed::PoolError;

        match err {
            PoolError::Timeout(timeout_type) => PgError::Timeout(timeout_type),
            other => PgError::Unexpected(format!("connection pool error: {other}").into()),
        }
    }
}

impl From<PgError> for usagehub_core::Error {
    fn from(err: PgError) -> Self {
        match &err {
            PgError::Query(Error::NotFound) => usagehub_core::Error::not_found(),
            PgError::Config(msg) => {
                usagehub_core::Error::configuration().with_message(msg.clone())
            }
            _ => usagehub_core::Error::internal()
                .with_message("status store operation failed")
                .with_source(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_core_not_found() {
        let core: usagehub_core::Error = PgError::Query(Error::NotFound).into();
        assert!(core.is_not_found());
    }

    #[test]
    fn test_unique_violation_detection() {
        let err = PgError::Query(Error::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint".to_string()),
        ));
        assert!(err.is_unique_violation());
        assert!(!PgError::Config("x".into()).is_unique_violation());
    }

    #[test]
    fn test_timeout_is_transient() {
        assert!(PgError::Timeout(TimeoutType::Wait).is_transient());
        assert!(!PgError::Config("x".into()).is_transient());
    }
}
