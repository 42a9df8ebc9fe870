//! Service configuration and production wiring.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use usagehub_core::{Error, Result};
use usagehub_nats::{NatsClient, NatsConfig, RouterPublisher};
use usagehub_opendal::{ObjectStorage, StorageConfig};
use usagehub_postgres::{PgClient, PgConfig, PgStatusStore};

use crate::state::ServiceState;
use crate::TRACING_TARGET;

/// Settings consumed by the ingestion state machine itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Bucket that freshly ingested artifacts are written into.
    pub incoming_bucket: String,
    /// Bucket a downstream archiver moves processed artifacts into.
    pub archive_bucket: String,
    /// Archive bucket for spreadsheet reports.
    pub spreadsheet_archive_bucket: String,
    /// How long to wait after a create conflict before fetching the
    /// existing record, in milliseconds.
    #[serde(default = "default_existing_status_delay_ms")]
    pub existing_status_delay_ms: u64,
}

fn default_existing_status_delay_ms() -> u64 {
    500
}

impl IngestConfig {
    /// Bounded delay applied on a create conflict, giving the racing
    /// submission time to finish committing.
    pub fn existing_status_delay(&self) -> Duration {
        Duration::from_millis(self.existing_status_delay_ms)
    }
}

/// Top-level configuration assembling the adapter configs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Status store database.
    pub postgres: PgConfig,
    /// Downstream message router.
    pub nats: NatsConfig,
    /// Object storage backend.
    pub storage: StorageConfig,
    /// Ingestion settings.
    pub ingest: IngestConfig,
}

impl ServiceConfig {
    /// Validates the configuration without connecting anywhere.
    pub fn validate(&self) -> Result<()> {
        self.postgres
            .validate()
            .map_err(usagehub_core::Error::from)?;
        for (name, bucket) in [
            ("incoming_bucket", &self.ingest.incoming_bucket),
            ("archive_bucket", &self.ingest.archive_bucket),
            (
                "spreadsheet_archive_bucket",
                &self.ingest.spreadsheet_archive_bucket,
            ),
        ] {
            if bucket.is_empty() {
                return Err(Error::configuration()
                    .with_message(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }

    /// Connects all production adapters and assembles the service state.
    ///
    /// Tests never call this; they inject mock ports into
    /// [`ServiceState`] directly.
    pub async fn connect(self) -> Result<ServiceState> {
        self.validate()?;

        tracing::info!(
            target: TRACING_TARGET,
            storage_backend = self.storage.backend_name(),
            incoming_bucket = %self.ingest.incoming_bucket,
            "Connecting service dependencies"
        );

        let pg_client = PgClient::new(self.postgres)?;
        let status_store = Arc::new(PgStatusStore::new(pg_client));

        let nats_client = NatsClient::connect(self.nats).await?;
        let publisher = Arc::new(RouterPublisher::new(&nats_client).await?);

        let objects = Arc::new(ObjectStorage::new(self.storage));

        Ok(ServiceState {
            status_store: status_store.clone(),
            usage_events: status_store,
            objects,
            publisher,
            subscriptions: None,
            config: self.ingest,
        })
    }
}
