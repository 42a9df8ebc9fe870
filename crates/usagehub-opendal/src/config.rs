//! Storage configuration types.

use serde::{Deserialize, Serialize};

/// Storage backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum StorageConfig {
    /// Amazon S3 compatible storage.
    #[cfg(feature = "s3")]
    S3(S3Config),
    /// In-memory storage for development and tests.
    Memory,
}

impl StorageConfig {
    /// Returns the backend name as a static string.
    pub fn backend_name(&self) -> &'static str {
        match self {
            #[cfg(feature = "s3")]
            Self::S3(_) => "s3",
            Self::Memory => "memory",
        }
    }
}

/// Connection settings for S3-compatible storage.
///
/// Buckets are not part of the configuration: the adapter serves whatever
/// bucket the caller names, so the incoming and archive buckets share one
/// backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3Config {
    /// Region of the buckets.
    pub region: Option<String>,
    /// Endpoint override for S3-compatible services.
    pub endpoint: Option<String>,
    /// Access key id.
    pub access_key_id: Option<String>,
    /// Secret access key.
    pub secret_access_key: Option<String>,
}
