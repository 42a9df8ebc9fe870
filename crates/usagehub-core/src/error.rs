//! Common error type definitions.

use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error as ThisError;

/// Type alias for boxed dynamic errors that can be sent across threads.
///
/// Used as the source slot in [`Error`] so that adapter crates can attach
/// their own error types without the core depending on them.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable error codes recorded on status records and steps.
///
/// These are persisted and compared across process restarts, so they must
/// never change once written.
pub mod codes {
    /// A prior submission of this request never finished processing and is
    /// eligible to be replayed instead of deduplicated against.
    pub const PREVIOUS_STILL_PROCESSING: &str = "previous_still_processing";
}

/// Categories of errors that can occur in usagehub operations.
///
/// The snake_case rendering of a kind is the stable error code surfaced to
/// clients and recorded on status steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Request validation failed; never retried.
    InvalidRequest,
    /// Uploaded file is not of the declared media type.
    UnsupportedMedia,
    /// The request conflicts with an existing record.
    Conflict,
    /// Resource not found.
    NotFound,
    /// Object storage read/write failed; retryable via resubmission.
    Storage,
    /// A downstream dependency (message broker) is unavailable.
    ServiceUnavailable,
    /// Serialization/deserialization error.
    Serialization,
    /// Configuration error.
    Configuration,
    /// Internal error.
    Internal,
}

/// A structured error type for usagehub operations.
#[derive(Debug, ThisError)]
#[error("{kind:?}{}", message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional error message.
    pub message: Option<String>,
    /// Optional source error.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Creates a new invalid request error.
    pub fn invalid_request() -> Self {
        Self::new(ErrorKind::InvalidRequest)
    }

    /// Creates a new unsupported media error.
    pub fn unsupported_media() -> Self {
        Self::new(ErrorKind::UnsupportedMedia)
    }

    /// Creates a new conflict error.
    pub fn conflict() -> Self {
        Self::new(ErrorKind::Conflict)
    }

    /// Creates a new not found error.
    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound)
    }

    /// Creates a new storage error.
    pub fn storage() -> Self {
        Self::new(ErrorKind::Storage)
    }

    /// Creates a new service unavailable error naming the dependency.
    pub fn service_unavailable(dependency: &str) -> Self {
        Self::new(ErrorKind::ServiceUnavailable)
            .with_message(format!("{dependency} is unavailable"))
    }

    /// Creates a new serialization error.
    pub fn serialization() -> Self {
        Self::new(ErrorKind::Serialization)
    }

    /// Creates a new configuration error.
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Creates a new internal error.
    pub fn internal() -> Self {
        Self::new(ErrorKind::Internal)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the stable error code for this error.
    pub fn code(&self) -> &'static str {
        self.kind.into()
    }

    /// Returns whether this error represents a missing resource.
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    /// Returns whether this error represents a conflict.
    pub fn is_conflict(&self) -> bool {
        self.kind == ErrorKind::Conflict
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Error::serialization().with_source(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_snake_case() {
        assert_eq!(Error::invalid_request().code(), "invalid_request");
        assert_eq!(Error::service_unavailable("nats").code(), "service_unavailable");
        assert_eq!(Error::unsupported_media().code(), "unsupported_media");
    }

    #[test]
    fn test_message_is_rendered() {
        let err = Error::conflict().with_message("already submitted");
        assert!(err.to_string().contains("already submitted"));
    }

    #[test]
    fn test_predicates() {
        assert!(Error::not_found().is_not_found());
        assert!(Error::conflict().is_conflict());
        assert!(!Error::storage().is_conflict());
    }
}
