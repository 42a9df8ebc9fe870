//! Error types and utilities for NATS operations.

use std::time::Duration;

/// Result type for all NATS operations in this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unified error type for NATS operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// NATS client/connection errors.
    #[error("NATS connection error: {0}")]
    Connection(Box<dyn std::error::Error + Send + Sync>),

    /// Serialization errors when sending or receiving messages.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Operation timeout.
    #[error("Operation timed out after {timeout:?}")]
    Timeout {
        /// The elapsed timeout.
        timeout: Duration,
    },

    /// Message delivery failed.
    #[error("Message delivery failed to subject '{subject}': {reason}")]
    DeliveryFailed {
        /// Target subject.
        subject: String,
        /// Failure description.
        reason: String,
    },

    /// Stream operation failed.
    #[error("Stream operation failed on '{stream}': {error}")]
    Stream {
        /// Stream name.
        stream: String,
        /// Failure description.
        error: String,
    },
}

impl Error {
    /// Creates a delivery failure error.
    pub fn delivery_failed(subject: &str, reason: impl Into<String>) -> Self {
        Self::DeliveryFailed {
            subject: subject.to_owned(),
            reason: reason.into(),
        }
    }

    /// Creates a stream operation error.
    pub fn stream(stream: &str, error: impl Into<String>) -> Self {
        Self::Stream {
            stream: stream.to_owned(),
            error: error.into(),
        }
    }
}

impl From<Error> for usagehub_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Serialization(source) => {
                usagehub_core::Error::serialization().with_source(source)
            }
            other => usagehub_core::Error::service_unavailable("message broker").with_source(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_failure_maps_to_service_unavailable() {
        let core: usagehub_core::Error = Error::delivery_failed("router.ingest", "down").into();
        assert_eq!(core.kind(), usagehub_core::ErrorKind::ServiceUnavailable);
    }
}
