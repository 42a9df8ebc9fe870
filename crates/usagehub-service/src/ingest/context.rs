//! Immutable context values threaded through the ingestion phases.
//!
//! Each phase takes the context by reference and returns its own derived
//! value; nothing in the state machine mutates shared state, which makes
//! every phase testable in isolation.

use bytes::Bytes;
use usagehub_core::RequestId;
use usagehub_core::types::{CreateStatus, StatusStep};
use uuid::Uuid;

use crate::intake::PreparedUpload;

/// Everything the ingestion phases need to know about one submission.
#[derive(Debug, Clone)]
pub struct IngestContext {
    /// Content-hash identity of the upload.
    pub request_id: RequestId,
    /// The exact bytes to store.
    pub bytes: Bytes,
    /// Name the artifact is stored under.
    pub stored_file_name: String,
    /// Bucket the artifact is written into.
    pub bucket: String,
    /// Tenant scoping key.
    pub scope: Option<String>,
    /// Status record draft for the create phase.
    pub draft: CreateStatus,
}

impl IngestContext {
    /// Builds the context from a prepared upload.
    pub fn new(prepared: PreparedUpload, bucket: impl Into<String>) -> Self {
        Self {
            request_id: prepared.request_id,
            bytes: prepared.bytes,
            stored_file_name: prepared.stored_file_name,
            bucket: bucket.into(),
            scope: prepared.draft.account_or_prefix.clone(),
            draft: prepared.draft,
        }
    }

    /// Tenant scope as the store ports expect it.
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }
}

/// Output of the create-or-fetch phase: which record owns this request id
/// and where its current generation stands.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    /// Owning status record.
    pub status_id: Uuid,
    /// Correlation handle, stable across replays.
    pub correlation_id: Uuid,
    /// Current replay generation.
    pub replay_attempt: i32,
    /// The store-object step of the current generation, when one exists.
    pub existing_step: Option<StatusStep>,
}
