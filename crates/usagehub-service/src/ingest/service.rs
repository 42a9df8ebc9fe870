//! Upload orchestrator: create-or-fetch, object write, publish.

use jiff::Timestamp;
use serde::Serialize;
use usagehub_core::types::{
    CreateOutcome, PipelineMessage, Route, RouterMessage, StatusPatch, StatusStep, StepAction,
};
use usagehub_core::{Error, RequestId, Result};
use uuid::Uuid;

use super::{IngestContext, ResolvedRequest};
use crate::TRACING_TARGET;
use crate::intake::PreparedUpload;
use crate::objects::TenantObjects;
use crate::replay;
use crate::state::ServiceState;

/// Synchronous response of a successful ingestion.
///
/// Identical resubmissions of the same content receive the identical
/// receipt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReceipt {
    /// Content-hash identity of the stored artifact.
    pub request_id: RequestId,
    /// Correlation handle for status polling.
    pub correlation_id: Uuid,
}

/// The idempotent ingestion state machine.
///
/// Sequencing guarantees: duplicate submissions of the same content
/// collapse to one status record; a crash between the object write and the
/// publish is recovered by resubmitting identical bytes (the write
/// short-circuits, the publish retries); object store and router never
/// participate in one transaction.
#[derive(Debug, Clone)]
pub struct IngestService {
    state: ServiceState,
}

impl IngestService {
    /// Creates the service over injected ports.
    pub fn new(state: ServiceState) -> Self {
        Self { state }
    }

    /// Ingests one prepared upload end to end.
    pub async fn ingest(&self, prepared: PreparedUpload) -> Result<IngestReceipt> {
        let ctx = IngestContext::new(prepared, self.state.config.incoming_bucket.clone());

        tracing::info!(
            target: TRACING_TARGET,
            request_id = %ctx.request_id,
            request_type = %ctx.draft.request_type,
            "Ingesting upload"
        );

        let resolved = self.create_or_fetch(&ctx).await?;
        let step = self.store_object(&ctx, &resolved).await?;
        self.publish_pointer(&ctx, &resolved, step).await?;

        let receipt = IngestReceipt {
            request_id: ctx.request_id.clone(),
            correlation_id: resolved.correlation_id,
        };
        self.mark_response_returned(&ctx, resolved.status_id);
        Ok(receipt)
    }

    /// Phase 1: create the status record, or resolve the existing owner of
    /// this request id.
    async fn create_or_fetch(&self, ctx: &IngestContext) -> Result<ResolvedRequest> {
        match self.state.status_store.create(ctx.draft.clone()).await? {
            CreateOutcome::Created(handle) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    request_id = %ctx.request_id,
                    status_id = %handle.id,
                    "First submission for this content"
                );
                Ok(ResolvedRequest {
                    status_id: handle.id,
                    correlation_id: handle.correlation_id,
                    replay_attempt: ctx.draft.replay_attempt,
                    existing_step: None,
                })
            }
            CreateOutcome::Conflict => self.resolve_existing(ctx).await,
        }
    }

    /// Conflict branch of phase 1: wait out the racing submission, then
    /// deduplicate against (or replay) the existing record.
    async fn resolve_existing(&self, ctx: &IngestContext) -> Result<ResolvedRequest> {
        // Give the racing submission a bounded window to finish committing
        // before reading its record.
        tokio::time::sleep(self.state.config.existing_status_delay()).await;

        let consolidated = self
            .state
            .status_store
            .consolidated_by_request_id(&ctx.request_id, ctx.scope())
            .await?;
        let record = &consolidated.record;

        if ctx.draft.report_urn() != record.report_urn() {
            return Err(Error::invalid_request().with_message(
                "identical content was already submitted under a different report version",
            ));
        }

        if record.is_stuck() {
            tracing::info!(
                target: TRACING_TARGET,
                request_id = %ctx.request_id,
                status_id = %record.id,
                "Prior submission is stuck, replaying instead of deduplicating"
            );
            let record = replay::reset_for_replay(
                self.state.status_store.as_ref(),
                record,
                ctx.scope(),
                Timestamp::now(),
            )
            .await?;
            return Ok(ResolvedRequest {
                status_id: record.id,
                correlation_id: record.correlation_id,
                replay_attempt: record.replay_attempt,
                existing_step: None,
            });
        }

        let existing_step = consolidated
            .step_for(StepAction::PutInIncomingBucket, record.replay_attempt)
            .cloned();

        if record.request_type.is_spreadsheet()
            && existing_step.as_ref().is_some_and(|s| s.is_published)
        {
            return Err(Error::conflict().with_message(
                "this report was already submitted and handed off; submit new content instead",
            ));
        }

        Ok(ResolvedRequest {
            status_id: record.id,
            correlation_id: record.correlation_id,
            replay_attempt: record.replay_attempt,
            existing_step,
        })
    }

    /// Phase 2: write the artifact, unless this generation already did.
    ///
    /// The step is persisted whatever the write outcome; when both the
    /// write and the step save fail, the write error is the one surfaced.
    async fn store_object(
        &self,
        ctx: &IngestContext,
        resolved: &ResolvedRequest,
    ) -> Result<StatusStep> {
        if let Some(step) = &resolved.existing_step {
            if step.succeeded() {
                tracing::debug!(
                    target: TRACING_TARGET,
                    request_id = %ctx.request_id,
                    status_id = %resolved.status_id,
                    "Artifact already stored, skipping write"
                );
                return Ok(step.clone());
            }
        }

        let mut step = resolved.existing_step.clone().unwrap_or_else(|| {
            StatusStep::begin(
                resolved.status_id,
                StepAction::PutInIncomingBucket,
                resolved.replay_attempt,
                Timestamp::now(),
            )
        });

        let objects = TenantObjects::new(self.state.objects.clone(), ctx.scope.clone());
        let write_result = objects
            .write(&ctx.bucket, &ctx.stored_file_name, ctx.bytes.clone())
            .await;

        match &write_result {
            Ok(()) => step.complete_success(Timestamp::now()),
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    request_id = %ctx.request_id,
                    status_id = %resolved.status_id,
                    error = %error,
                    "Object write failed"
                );
                step.complete_failure(Timestamp::now(), error.to_string(), error.code());
            }
        }

        let saved = self
            .state
            .status_store
            .update_step(step.clone(), ctx.scope())
            .await;

        match (write_result, saved) {
            (Ok(()), Ok(saved)) => Ok(saved),
            (Ok(()), Err(save_error)) => Err(save_error),
            // The caller's view of what failed must reflect the primary
            // operation, not the bookkeeping.
            (Err(write_error), _) => Err(write_error),
        }
    }

    /// Phase 3: hand the pointer to the downstream router, unless this
    /// generation already did.
    async fn publish_pointer(
        &self,
        ctx: &IngestContext,
        resolved: &ResolvedRequest,
        mut step: StatusStep,
    ) -> Result<StatusStep> {
        if step.is_published {
            tracing::debug!(
                target: TRACING_TARGET,
                request_id = %ctx.request_id,
                status_id = %resolved.status_id,
                "Pointer already published, skipping"
            );
            return Ok(step);
        }

        let route = if ctx.draft.request_type.is_spreadsheet() {
            Route::SpreadsheetReport
        } else {
            Route::Ingest
        };
        let message = RouterMessage::Pipeline(PipelineMessage {
            correlation_id: resolved.correlation_id,
            status_id: resolved.status_id,
            account_or_prefix: ctx.scope.clone(),
        });

        self.state.publisher.publish(route, &message).await?;

        step.is_published = true;
        let saved = self
            .state
            .status_store
            .update_step(step, ctx.scope())
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            request_id = %ctx.request_id,
            status_id = %resolved.status_id,
            correlation_id = %resolved.correlation_id,
            "Pointer published"
        );
        Ok(saved)
    }

    /// Phase 4 bookkeeping: mark that the synchronous response was
    /// delivered. Fire and forget; a failure here is logged, never
    /// surfaced to the caller.
    fn mark_response_returned(&self, ctx: &IngestContext, status_id: Uuid) {
        let store = self.state.status_store.clone();
        let scope = ctx.scope.clone();
        let request_id = ctx.request_id.clone();
        tokio::spawn(async move {
            let patch = StatusPatch::response_returned();
            if let Err(error) = store.save_partial(patch, status_id, scope.as_deref()).await {
                tracing::warn!(
                    target: TRACING_TARGET,
                    request_id = %request_id,
                    status_id = %status_id,
                    error = %error,
                    "Failed to mark response as returned"
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use bytes::Bytes;
    use usagehub_core::ErrorKind;
    use usagehub_core::codes;
    use usagehub_core::types::{AuthMethod, RequestMetadata, RequestType};

    use super::*;
    use crate::intake::{Submitter, UploadPayload};
    use crate::testing::{MockState, mock_state, sample_record};

    const GZIP: &[u8] = &[0x1f, 0x8b, 0x08, 0x00, 0x42];

    fn submitter() -> Submitter {
        Submitter {
            auth_method: AuthMethod::Bearer,
            account_id: Some("acc-1".into()),
            account_or_prefix: Some("acc-1".into()),
            iam_id: Some("iam-1".into()),
            email: None,
        }
    }

    fn archive_upload() -> PreparedUpload {
        PreparedUpload::prepare(
            UploadPayload::Archive {
                file_name: "usage.tar.gz".into(),
                bytes: Bytes::from_static(GZIP),
            },
            submitter(),
            Timestamp::UNIX_EPOCH,
        )
        .unwrap()
    }

    fn spreadsheet_upload(report_urn: i64) -> PreparedUpload {
        PreparedUpload::prepare(
            UploadPayload::Spreadsheet {
                file_name: "report.xlsx".into(),
                bytes: Bytes::from_static(b"PK\x03\x04sheet"),
                report_urn,
                start_date: None,
                end_date: None,
            },
            submitter(),
            Timestamp::UNIX_EPOCH,
        )
        .unwrap()
    }

    fn service(mocks: &MockState) -> IngestService {
        IngestService::new(mocks.state.clone())
    }

    #[tokio::test]
    async fn test_first_upload_writes_and_publishes() {
        let mocks = mock_state();
        let upload = archive_upload();
        let request_id = upload.request_id.clone();

        let receipt = service(&mocks).ingest(upload).await.unwrap();
        assert_eq!(receipt.request_id, request_id);

        let key = format!("acc-1/{request_id}.tar.gz");
        assert!(mocks.objects.get("incoming", &key).is_some());

        let published = mocks.publisher.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, Route::Ingest);

        let steps = mocks.store.steps_for(
            match &published[0].1 {
                RouterMessage::Pipeline(m) => m.status_id,
                other => panic!("unexpected message: {other:?}"),
            },
        );
        assert_eq!(steps.len(), 1);
        assert!(steps[0].succeeded());
        assert!(steps[0].is_published);
    }

    #[tokio::test]
    async fn test_duplicate_upload_is_deduplicated() {
        let mocks = mock_state();
        let service = service(&mocks);

        let first = service.ingest(archive_upload()).await.unwrap();
        let second = service.ingest(archive_upload()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(mocks.store.create_calls.load(Ordering::SeqCst), 2);
        assert_eq!(mocks.objects.write_calls.load(Ordering::SeqCst), 1);
        assert_eq!(mocks.publisher.published().await.len(), 1);
    }

    #[tokio::test]
    async fn test_partial_failure_resume() {
        let mocks = mock_state();
        let service = service(&mocks);

        // Write fails: storage error surfaces, step records the failure.
        mocks.objects.fail_writes.store(true, Ordering::SeqCst);
        let error = service.ingest(archive_upload()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Storage);

        // Write succeeds, publish fails: service unavailable, write done.
        mocks.objects.fail_writes.store(false, Ordering::SeqCst);
        mocks.publisher.fail.store(true, Ordering::SeqCst);
        let error = service.ingest(archive_upload()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ServiceUnavailable);
        assert_eq!(mocks.objects.write_calls.load(Ordering::SeqCst), 2);

        // Resubmission: zero writes, exactly one publish.
        mocks.publisher.fail.store(false, Ordering::SeqCst);
        service.ingest(archive_upload()).await.unwrap();
        assert_eq!(mocks.objects.write_calls.load(Ordering::SeqCst), 2);
        assert_eq!(mocks.publisher.published().await.len(), 1);
    }

    #[tokio::test]
    async fn test_publish_happens_once_per_generation() {
        let mocks = mock_state();
        let service = service(&mocks);

        for _ in 0..3 {
            service.ingest(archive_upload()).await.unwrap();
        }
        assert_eq!(mocks.publisher.published().await.len(), 1);
    }

    #[tokio::test]
    async fn test_spreadsheet_version_mismatch_is_user_error() {
        let mocks = mock_state();
        let service = service(&mocks);

        service.ingest(spreadsheet_upload(1)).await.unwrap();
        let error = service.ingest(spreadsheet_upload(2)).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn test_published_spreadsheet_is_rejected_with_conflict() {
        let mocks = mock_state();
        let service = service(&mocks);

        // First submission fully publishes.
        service.ingest(spreadsheet_upload(1)).await.unwrap();
        // A later identical submission for the same version conflicts.
        let error = service.ingest(spreadsheet_upload(1)).await.unwrap_err();
        assert!(error.is_conflict());
    }

    #[tokio::test]
    async fn test_stuck_record_is_replayed_not_deduplicated() {
        let mocks = mock_state();
        let upload = archive_upload();

        let mut record = sample_record(upload.request_id.clone(), Some("acc-1"));
        record.request_type = RequestType::ArchiveUpload;
        record.error_code = Some(codes::PREVIOUS_STILL_PROCESSING.to_owned());
        let status_id = record.id;
        mocks.store.seed_record(record);

        let mut published_step = StatusStep::begin(
            status_id,
            StepAction::PutInIncomingBucket,
            0,
            Timestamp::UNIX_EPOCH,
        );
        published_step.complete_success(Timestamp::UNIX_EPOCH);
        published_step.is_published = true;
        mocks.store.seed_step(published_step);

        service(&mocks).ingest(upload).await.unwrap();

        let record = mocks.store.record(status_id).unwrap();
        assert_eq!(record.replay_attempt, 1);
        assert!(record.error_code.is_none());

        // The new generation ran a full write + publish cycle.
        assert_eq!(mocks.objects.write_calls.load(Ordering::SeqCst), 1);
        assert_eq!(mocks.publisher.published().await.len(), 1);
        let steps = mocks.store.steps_for(status_id);
        assert_eq!(steps.len(), 2);
    }

    #[tokio::test]
    async fn test_report_version_checked_against_existing_record() {
        let mocks = mock_state();
        let upload = spreadsheet_upload(7);

        let mut record = sample_record(upload.request_id.clone(), Some("acc-1"));
        record.request_type = RequestType::SpreadsheetReport;
        record.request_metadata = Some(RequestMetadata::for_report(8));
        mocks.store.seed_record(record);

        let error = service(&mocks).ingest(upload).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn test_response_returned_mark_is_fire_and_forget() {
        let mocks = mock_state();
        let receipt = service(&mocks).ingest(archive_upload()).await.unwrap();

        let status_id = match mocks.publisher.published().await[0].1 {
            RouterMessage::Pipeline(ref m) => m.status_id,
            ref other => panic!("unexpected message: {other:?}"),
        };

        // The spawned bookkeeping settles shortly after the receipt.
        let mut marked = false;
        for _ in 0..100 {
            if mocks.store.record(status_id).unwrap().user_response_returned {
                marked = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(marked, "response-returned mark never persisted");
        drop(receipt);
    }

    #[tokio::test]
    async fn test_bookkeeping_failure_never_reaches_caller() {
        let mocks = mock_state();
        mocks.store.fail_save_partial.store(true, Ordering::SeqCst);

        // Ingestion still succeeds even though the response-returned mark
        // will fail.
        let receipt = service(&mocks).ingest(archive_upload()).await;
        assert!(receipt.is_ok());

        for _ in 0..100 {
            if mocks.store.save_partial_calls.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(mocks.store.save_partial_calls.load(Ordering::SeqCst) > 0);
    }
}
