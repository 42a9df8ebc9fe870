//! Object storage backend implementation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use opendal::Operator;
use usagehub_core::ports::ObjectStore;

use crate::TRACING_TARGET;
use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};

/// Bucket-addressed object storage over OpenDAL operators.
///
/// One operator is built per bucket on first use and cached; the memory
/// backend relies on this cache so that writes and reads within a process
/// observe the same namespace.
#[derive(Clone)]
pub struct ObjectStorage {
    config: StorageConfig,
    operators: Arc<Mutex<HashMap<String, Operator>>>,
}

impl ObjectStorage {
    /// Creates a new object storage adapter from configuration.
    pub fn new(config: StorageConfig) -> Self {
        tracing::info!(
            target: TRACING_TARGET,
            backend = config.backend_name(),
            "Object storage initialized"
        );

        Self {
            config,
            operators: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the configuration for this backend.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Returns the cached operator for a bucket, creating it on first use.
    fn operator_for(&self, bucket: &str) -> StorageResult<Operator> {
        let mut operators = self
            .operators
            .lock()
            .map_err(|_| StorageError::init("operator cache poisoned"))?;

        if let Some(operator) = operators.get(bucket) {
            return Ok(operator.clone());
        }

        let operator = self.create_operator(bucket)?;
        operators.insert(bucket.to_owned(), operator.clone());
        Ok(operator)
    }

    /// Creates an OpenDAL operator for a bucket based on configuration.
    fn create_operator(&self, bucket: &str) -> StorageResult<Operator> {
        match &self.config {
            #[cfg(feature = "s3")]
            StorageConfig::S3(s3) => {
                let mut builder = opendal::services::S3::default().bucket(bucket);

                if let Some(ref region) = s3.region {
                    builder = builder.region(region);
                }

                if let Some(ref endpoint) = s3.endpoint {
                    builder = builder.endpoint(endpoint);
                }

                if let Some(ref access_key_id) = s3.access_key_id {
                    builder = builder.access_key_id(access_key_id);
                }

                if let Some(ref secret_access_key) = s3.secret_access_key {
                    builder = builder.secret_access_key(secret_access_key);
                }

                Operator::new(builder)
                    .map(|op| op.finish())
                    .map_err(|e| StorageError::init(e.to_string()))
            }

            StorageConfig::Memory => {
                let builder = opendal::services::Memory::default().root(&format!("/{bucket}"));

                Operator::new(builder)
                    .map(|op| op.finish())
                    .map_err(|e| StorageError::init(e.to_string()))
            }
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for ObjectStorage {
    async fn write(&self, bucket: &str, key: &str, bytes: Bytes) -> usagehub_core::Result<()> {
        tracing::debug!(
            target: TRACING_TARGET,
            bucket = %bucket,
            key = %key,
            size = bytes.len(),
            "Writing object"
        );

        let operator = self.operator_for(bucket)?;
        operator
            .write(key, bytes)
            .await
            .map_err(StorageError::from)?;

        tracing::debug!(
            target: TRACING_TARGET,
            bucket = %bucket,
            key = %key,
            "Object write complete"
        );

        Ok(())
    }

    async fn read(&self, bucket: &str, key: &str) -> usagehub_core::Result<Bytes> {
        tracing::debug!(
            target: TRACING_TARGET,
            bucket = %bucket,
            key = %key,
            "Reading object"
        );

        let operator = self.operator_for(bucket)?;
        let data = operator.read(key).await.map_err(StorageError::from)?;

        tracing::debug!(
            target: TRACING_TARGET,
            bucket = %bucket,
            key = %key,
            size = data.len(),
            "Object read complete"
        );

        Ok(data.to_bytes())
    }
}

impl std::fmt::Debug for ObjectStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStorage")
            .field("backend", &self.config.backend_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_storage() -> ObjectStorage {
        ObjectStorage::new(StorageConfig::Memory)
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let storage = memory_storage();
        storage
            .write("incoming", "t1/report.tar.gz", Bytes::from_static(b"bytes"))
            .await
            .unwrap();

        let data = storage.read("incoming", "t1/report.tar.gz").await.unwrap();
        assert_eq!(&data[..], b"bytes");
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let storage = memory_storage();
        let err = storage.read("incoming", "missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_buckets_are_isolated() {
        let storage = memory_storage();
        storage
            .write("incoming", "key", Bytes::from_static(b"a"))
            .await
            .unwrap();

        let err = storage.read("archive", "key").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
