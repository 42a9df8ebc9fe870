//! Content identity derivation.
//!
//! A [`RequestId`] is the sha256 digest of the exact bytes that get stored,
//! which makes it the idempotency key for the whole pipeline: identical
//! bytes always resolve to the same id, no matter how often or by whom they
//! are submitted.

use derive_more::{AsRef, Display};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Content-hash identity of an uploaded artifact.
///
/// Stored as the lowercase hex rendering of the sha256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[derive(AsRef, Display, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Derives the request id from the bytes that will be stored.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hex::encode(hasher.finalize()))
    }

    /// Parses a request id from its hex rendering.
    pub fn parse(value: &str) -> Result<Self> {
        if !Self::is_request_id(value) {
            return Err(Error::invalid_request()
                .with_message(format!("'{value}' is not a valid request id")));
        }
        Ok(Self(value.to_owned()))
    }

    /// Returns whether a string has the shape of a request id.
    ///
    /// Used to disambiguate request ids from correlation ids (UUIDs) on the
    /// status query path.
    pub fn is_request_id(value: &str) -> bool {
        value.len() == 64 && value.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
    }

    /// Returns the hex rendering of this id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_deterministic() {
        let a = RequestId::from_bytes(b"usage report bytes");
        let b = RequestId::from_bytes(b"usage report bytes");
        assert_eq!(a, b);
    }

    #[test]
    fn test_identity_differs_for_different_bytes() {
        let a = RequestId::from_bytes(b"report one");
        let b = RequestId::from_bytes(b"report two");
        assert_ne!(a, b);
    }

    #[test]
    fn test_shape_check() {
        let id = RequestId::from_bytes(b"x");
        assert!(RequestId::is_request_id(id.as_str()));
        assert!(!RequestId::is_request_id("5ce5e229-7b49-4a27-a78a-9dd4cc1b61b6"));
        assert!(!RequestId::is_request_id("short"));
    }

    #[test]
    fn test_parse_rejects_uppercase() {
        let upper = RequestId::from_bytes(b"x").as_str().to_uppercase();
        assert!(RequestId::parse(&upper).is_err());
    }
}
