//! Storage error types.

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to initialize the storage backend.
    #[error("storage initialization failed: {0}")]
    Init(String),

    /// Object not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Permission denied.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Backend-specific error.
    #[error("backend error: {0}")]
    Backend(opendal::Error),
}

impl StorageError {
    /// Creates a new initialization error.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Creates a new not found error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        use opendal::ErrorKind;

        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(err.to_string()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(err.to_string()),
            _ => Self::Backend(err),
        }
    }
}

impl From<StorageError> for usagehub_core::Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(path) => {
                usagehub_core::Error::not_found().with_message(path)
            }
            StorageError::Init(msg) => {
                usagehub_core::Error::configuration().with_message(msg)
            }
            other => usagehub_core::Error::storage().with_source(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_core_not_found() {
        let core: usagehub_core::Error = StorageError::not_found("a/b").into();
        assert!(core.is_not_found());
    }

    #[test]
    fn test_init_maps_to_configuration() {
        let core: usagehub_core::Error = StorageError::init("bad endpoint").into();
        assert_eq!(core.kind(), usagehub_core::ErrorKind::Configuration);
    }
}
