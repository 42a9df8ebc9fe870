//! Tenant-scoped object access with two-bucket fallback reads.

use std::sync::Arc;

use bytes::Bytes;
use usagehub_core::Result;
use usagehub_core::ports::ObjectStore;

use crate::TRACING_TARGET;

/// Object access for one tenant scope.
///
/// Keys are prefixed with the tenant's `account_or_prefix` when present, so
/// tenants can never collide on a file name.
#[derive(Clone)]
pub struct TenantObjects {
    store: Arc<dyn ObjectStore>,
    prefix: Option<String>,
}

impl TenantObjects {
    /// Creates tenant-scoped access over a store.
    pub fn new(store: Arc<dyn ObjectStore>, prefix: Option<String>) -> Self {
        Self { store, prefix }
    }

    /// Builds the storage key for a file name.
    pub fn key(&self, file_name: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}/{file_name}"),
            None => file_name.to_owned(),
        }
    }

    /// Writes a blob under the tenant-scoped key.
    pub async fn write(&self, bucket: &str, file_name: &str, bytes: Bytes) -> Result<()> {
        self.store.write(bucket, &self.key(file_name), bytes).await
    }

    /// Reads a blob from the primary bucket, falling back to the secondary
    /// bucket only when the primary read reports not-found.
    ///
    /// The fallback tolerates records a downstream archiver has not moved
    /// yet; any other primary error propagates unchanged.
    pub async fn fetch_with_fallback(
        &self,
        primary_bucket: &str,
        fallback_bucket: &str,
        file_name: &str,
    ) -> Result<Bytes> {
        let key = self.key(file_name);
        match self.store.read(primary_bucket, &key).await {
            Ok(bytes) => Ok(bytes),
            Err(error) if error.is_not_found() => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    key = %key,
                    primary_bucket = %primary_bucket,
                    fallback_bucket = %fallback_bucket,
                    "Object not in primary bucket, trying fallback"
                );
                self.store.read(fallback_bucket, &key).await
            }
            Err(error) => Err(error),
        }
    }
}
