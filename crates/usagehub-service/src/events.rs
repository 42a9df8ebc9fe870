//! Reading back the events of an ingested batch from object storage.
//!
//! Early status responses echo the originally submitted events. They are
//! not kept in the database; they are re-read from the stored archive and
//! unpacked on demand.

use usagehub_core::types::StatusRecord;
use usagehub_core::{Error, Result, archive};

use crate::objects::TenantObjects;
use crate::state::ServiceState;

/// Reads submitted events back out of stored archives.
#[derive(Debug, Clone)]
pub struct EventArchiveReader {
    state: ServiceState,
}

impl EventArchiveReader {
    /// Creates the reader over injected ports.
    pub fn new(state: ServiceState) -> Self {
        Self { state }
    }

    /// Loads the events originally submitted for a record.
    ///
    /// Reads the archive bucket with an incoming-bucket fallback, unpacks
    /// the stored archive and extracts the report document's event list.
    pub async fn submitted_events(
        &self,
        record: &StatusRecord,
    ) -> Result<Vec<serde_json::Value>> {
        let objects =
            TenantObjects::new(self.state.objects.clone(), record.account_or_prefix.clone());
        let file_name = format!("{}.tar.gz", record.request_id);
        let bytes = objects
            .fetch_with_fallback(
                &self.state.config.archive_bucket,
                &self.state.config.incoming_bucket,
                &file_name,
            )
            .await?;

        if !archive::is_gzip(&bytes) {
            return Err(Error::serialization()
                .with_message(format!("stored artifact '{file_name}' is not a gzip archive")));
        }

        let files = archive::unpack(&bytes)?;
        let report = files.get(archive::REPORT_FILE).ok_or_else(|| {
            Error::serialization()
                .with_message(format!("archive is missing {}", archive::REPORT_FILE))
        })?;
        let report: serde_json::Value = serde_json::from_slice(report)?;

        Ok(Self::events_of(report))
    }

    fn events_of(report: serde_json::Value) -> Vec<serde_json::Value> {
        match report {
            serde_json::Value::Array(events) => events,
            serde_json::Value::Object(mut fields) => match fields.remove("events") {
                Some(serde_json::Value::Array(events)) => events,
                Some(other) => vec![other],
                None => vec![serde_json::Value::Object(fields)],
            },
            other => vec![other],
        }
    }
}
