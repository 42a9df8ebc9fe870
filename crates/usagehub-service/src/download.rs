//! Download of previously ingested spreadsheet reports.

use bytes::Bytes;
use usagehub_core::types::StatusFilter;
use usagehub_core::{Error, Result, archive};

use crate::TRACING_TARGET;
use crate::objects::TenantObjects;
use crate::state::ServiceState;

/// A report ready to hand back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadedReport {
    /// Original upload file name.
    pub file_name: String,
    /// Spreadsheet bytes.
    pub bytes: Bytes,
}

/// Serves the most recent submission of a spreadsheet report version.
#[derive(Debug, Clone)]
pub struct DownloadService {
    state: ServiceState,
}

impl DownloadService {
    /// Creates the service over injected ports.
    pub fn new(state: ServiceState) -> Self {
        Self { state }
    }

    /// Downloads the latest report submitted under a report version.
    ///
    /// Reads the archive bucket first and falls back to the incoming
    /// bucket for records a downstream archiver has not moved yet. Records
    /// archived as tar+gzip are unpacked to the inner spreadsheet;
    /// pre-archival records are served as stored.
    pub async fn latest_report(
        &self,
        report_urn: i64,
        scope: Option<&str>,
    ) -> Result<DownloadedReport> {
        let filter = StatusFilter {
            report_urn: Some(report_urn),
            request_level_only: true,
            ..StatusFilter::default()
        };
        let record = self
            .state
            .status_store
            .query(filter, scope)
            .await?
            .into_iter()
            .max_by_key(|r| r.start_time)
            .ok_or_else(|| {
                Error::not_found()
                    .with_message(format!("no report submitted for version {report_urn}"))
            })?;

        tracing::debug!(
            target: TRACING_TARGET,
            report_urn,
            request_id = %record.request_id,
            "Serving latest report submission"
        );

        let objects =
            TenantObjects::new(self.state.objects.clone(), record.account_or_prefix.clone());
        let archive_bucket = &self.state.config.spreadsheet_archive_bucket;
        let incoming_bucket = &self.state.config.incoming_bucket;

        let archived_name = format!("{}.tar.gz", record.request_id);
        let bytes = match objects
            .fetch_with_fallback(archive_bucket, incoming_bucket, &archived_name)
            .await
        {
            Ok(bytes) => Self::unpack_spreadsheet(&bytes)?,
            Err(error) if error.is_not_found() => {
                // Not archived yet; the artifact is still the plain upload.
                let plain_name = format!("{}.xlsx", record.request_id);
                objects
                    .fetch_with_fallback(archive_bucket, incoming_bucket, &plain_name)
                    .await?
            }
            Err(error) => return Err(error),
        };

        Ok(DownloadedReport {
            file_name: record.input_file_name,
            bytes,
        })
    }

    fn unpack_spreadsheet(bytes: &Bytes) -> Result<Bytes> {
        if !archive::is_gzip(bytes) {
            return Ok(bytes.clone());
        }
        let files = archive::unpack(bytes)?;
        files
            .into_iter()
            .find(|(name, _)| name != archive::MANIFEST_FILE)
            .map(|(_, content)| Bytes::from(content))
            .ok_or_else(|| {
                Error::serialization().with_message("archived report contains no payload file")
            })
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use usagehub_core::RequestId;
    use usagehub_core::types::{RequestMetadata, RequestType, StatusRecord};

    use super::*;
    use crate::testing::{MockState, mock_state, sample_record};

    const SHEET: &[u8] = b"PK\x03\x04spreadsheet-bytes";

    fn report_record(mocks: &MockState, urn: i64, start_time: Timestamp) -> StatusRecord {
        let mut record = sample_record(
            RequestId::from_bytes(start_time.to_string().as_bytes()),
            Some("acc-1"),
        );
        record.request_type = RequestType::SpreadsheetReport;
        record.request_metadata = Some(RequestMetadata::for_report(urn));
        record.input_file_name = "quarterly.xlsx".into();
        record.start_time = start_time;
        mocks.store.seed_record(record.clone());
        record
    }

    #[tokio::test]
    async fn test_archived_report_is_unpacked() {
        let mocks = mock_state();
        let record = report_record(&mocks, 7, Timestamp::UNIX_EPOCH);
        let packed = archive::pack(&[("quarterly.xlsx", SHEET)]).unwrap();
        mocks.objects.put(
            "reports-archive",
            &format!("acc-1/{}.tar.gz", record.request_id),
            packed,
        );

        let service = DownloadService::new(mocks.state.clone());
        let report = service.latest_report(7, Some("acc-1")).await.unwrap();
        assert_eq!(report.file_name, "quarterly.xlsx");
        assert_eq!(report.bytes.as_ref(), SHEET);
    }

    #[tokio::test]
    async fn test_unarchived_report_is_served_via_fallback() {
        let mocks = mock_state();
        let record = report_record(&mocks, 7, Timestamp::UNIX_EPOCH);
        // Only the plain upload exists, and only in the incoming bucket.
        mocks.objects.put(
            "incoming",
            &format!("acc-1/{}.xlsx", record.request_id),
            SHEET,
        );

        let service = DownloadService::new(mocks.state.clone());
        let report = service.latest_report(7, Some("acc-1")).await.unwrap();
        assert_eq!(report.bytes.as_ref(), SHEET);
    }

    #[tokio::test]
    async fn test_latest_submission_wins() {
        let mocks = mock_state();
        let _old = report_record(&mocks, 7, Timestamp::UNIX_EPOCH);
        let new = report_record(&mocks, 7, Timestamp::from_second(86_400).unwrap());
        mocks.objects.put(
            "incoming",
            &format!("acc-1/{}.xlsx", new.request_id),
            SHEET,
        );

        let service = DownloadService::new(mocks.state.clone());
        let report = service.latest_report(7, Some("acc-1")).await.unwrap();
        assert_eq!(report.bytes.as_ref(), SHEET);
    }

    #[tokio::test]
    async fn test_unknown_report_version_is_not_found() {
        let mocks = mock_state();
        let service = DownloadService::new(mocks.state.clone());
        let error = service.latest_report(99, None).await.unwrap_err();
        assert!(error.is_not_found());
    }
}
