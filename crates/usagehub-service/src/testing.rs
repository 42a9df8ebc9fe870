//! In-memory ports for unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use jiff::Timestamp;
use tokio::sync::Mutex;
use usagehub_core::ports::{
    ObjectStore, Publisher, StatusStore, SubscriptionDirectory, UsageEventStore,
};
use usagehub_core::types::{
    ConsolidatedStatus, CreateOutcome, CreateStatus, Route, RouterMessage, StatusFilter,
    StatusHandle, StatusPatch, StatusRecord, StatusStep, UsageEvent,
};
use usagehub_core::{Error, RequestId, Result};
use uuid::Uuid;

use crate::config::IngestConfig;
use crate::state::ServiceState;

/// In-memory status store mirroring the uniqueness semantics of the real
/// one.
#[derive(Default)]
pub struct MockStatusStore {
    records: std::sync::Mutex<Vec<StatusRecord>>,
    steps: std::sync::Mutex<Vec<StatusStep>>,
    events: std::sync::Mutex<Vec<UsageEvent>>,
    pub create_calls: AtomicUsize,
    pub save_partial_calls: AtomicUsize,
    pub fail_save_partial: AtomicBool,
}

impl MockStatusStore {
    fn in_scope(record: &StatusRecord, scope: Option<&str>) -> bool {
        match scope {
            Some(prefix) => record.account_or_prefix.as_deref() == Some(prefix),
            None => true,
        }
    }

    /// Inserts a record directly, bypassing create semantics.
    pub fn seed_record(&self, record: StatusRecord) {
        self.records.lock().unwrap().push(record);
    }

    /// Inserts a step directly.
    pub fn seed_step(&self, step: StatusStep) {
        self.steps.lock().unwrap().push(step);
    }

    /// Inserts a usage event directly.
    pub fn seed_event(&self, event: UsageEvent) {
        self.events.lock().unwrap().push(event);
    }

    /// Returns a copy of a record by id.
    pub fn record(&self, id: Uuid) -> Option<StatusRecord> {
        self.records.lock().unwrap().iter().find(|r| r.id == id).cloned()
    }

    /// Returns copies of all steps for a record.
    pub fn steps_for(&self, status_id: Uuid) -> Vec<StatusStep> {
        self.steps
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.status_id == status_id)
            .cloned()
            .collect()
    }

    fn record_from_draft(draft: CreateStatus) -> StatusRecord {
        StatusRecord {
            id: Uuid::new_v4(),
            request_id: draft.request_id,
            correlation_id: Uuid::new_v4(),
            account_id: draft.account_id,
            account_or_prefix: draft.account_or_prefix,
            request_type: draft.request_type,
            input_file_name: draft.input_file_name,
            start_time: draft.start_time,
            end_time: None,
            final_result: None,
            replay_attempt: draft.replay_attempt,
            auth_method: draft.auth_method,
            iam_id: draft.iam_id,
            email: draft.email,
            event_id: None,
            request_metadata: draft.request_metadata,
            user_response_returned: false,
            error_code: None,
            error_response_message: None,
        }
    }
}

#[async_trait]
impl StatusStore for MockStatusStore {
    async fn create(&self, draft: CreateStatus) -> Result<CreateOutcome> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock().unwrap();
        let duplicate = records
            .iter()
            .any(|r| r.request_id == draft.request_id && r.is_request_level());
        if duplicate {
            return Ok(CreateOutcome::Conflict);
        }
        let record = Self::record_from_draft(draft);
        let handle = StatusHandle {
            id: record.id,
            correlation_id: record.correlation_id,
        };
        records.push(record);
        Ok(CreateOutcome::Created(handle))
    }

    async fn consolidated_by_request_id(
        &self,
        request_id: &RequestId,
        scope: Option<&str>,
    ) -> Result<ConsolidatedStatus> {
        let record = self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| {
                r.request_id == *request_id && r.is_request_level() && Self::in_scope(r, scope)
            })
            .cloned()
            .ok_or_else(Error::not_found)?;
        let steps = self.steps_for(record.id);
        Ok(ConsolidatedStatus { record, steps })
    }

    async fn consolidated_by_id(
        &self,
        id: Uuid,
        scope: Option<&str>,
    ) -> Result<ConsolidatedStatus> {
        let record = self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id && Self::in_scope(r, scope))
            .cloned()
            .ok_or_else(Error::not_found)?;
        let steps = self.steps_for(record.id);
        Ok(ConsolidatedStatus { record, steps })
    }

    async fn status_by_id(&self, id: Uuid, scope: Option<&str>) -> Result<StatusRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id && Self::in_scope(r, scope))
            .cloned()
            .ok_or_else(Error::not_found)
    }

    async fn query(&self, filter: StatusFilter, scope: Option<&str>) -> Result<Vec<StatusRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .filter(|r| Self::in_scope(r, scope))
            .filter(|r| {
                filter
                    .request_id
                    .as_ref()
                    .is_none_or(|id| r.request_id == *id)
            })
            .filter(|r| {
                filter
                    .correlation_id
                    .is_none_or(|id| r.correlation_id == id)
            })
            .filter(|r| filter.report_urn.is_none_or(|urn| r.report_urn() == Some(urn)))
            .filter(|r| !filter.request_level_only || r.is_request_level())
            .cloned()
            .collect())
    }

    async fn update_step(&self, step: StatusStep, _scope: Option<&str>) -> Result<StatusStep> {
        let mut steps = self.steps.lock().unwrap();
        match steps.iter_mut().find(|s| s.key() == step.key()) {
            Some(existing) => *existing = step.clone(),
            None => steps.push(step.clone()),
        }
        Ok(step)
    }

    async fn save_partial(
        &self,
        patch: StatusPatch,
        id: Uuid,
        scope: Option<&str>,
    ) -> Result<StatusRecord> {
        self.save_partial_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_save_partial.load(Ordering::SeqCst) {
            return Err(Error::internal().with_message("save rejected by test"));
        }
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == id && Self::in_scope(r, scope))
            .ok_or_else(Error::not_found)?;
        if let Some(final_result) = patch.final_result {
            record.final_result = final_result;
        }
        if let Some(start_time) = patch.start_time {
            record.start_time = start_time;
        }
        if let Some(end_time) = patch.end_time {
            record.end_time = end_time;
        }
        if let Some(error_code) = patch.error_code {
            record.error_code = error_code;
        }
        if let Some(error_response_message) = patch.error_response_message {
            record.error_response_message = error_response_message;
        }
        if let Some(replay_attempt) = patch.replay_attempt {
            record.replay_attempt = replay_attempt;
        }
        if let Some(user_response_returned) = patch.user_response_returned {
            record.user_response_returned = user_response_returned;
        }
        Ok(record.clone())
    }
}

#[async_trait]
impl UsageEventStore for MockStatusStore {
    async fn by_event_and_account(
        &self,
        event_id: &str,
        account_id: &str,
        _scope: Option<&str>,
    ) -> Result<Vec<UsageEvent>> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.event_id == event_id && e.account_id.as_deref() == Some(account_id))
            .cloned()
            .collect())
    }
}

/// In-memory object store counting writes, with a failure switch.
#[derive(Default)]
pub struct MockObjectStore {
    objects: std::sync::Mutex<HashMap<(String, String), Bytes>>,
    pub write_calls: AtomicUsize,
    pub fail_writes: AtomicBool,
}

impl MockObjectStore {
    /// Stores a blob directly, without counting a write.
    pub fn put(&self, bucket: &str, key: &str, bytes: impl Into<Bytes>) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_owned(), key.to_owned()), bytes.into());
    }

    /// Returns a stored blob.
    pub fn get(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_owned(), key.to_owned()))
            .cloned()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn write(&self, bucket: &str, key: &str, bytes: Bytes) -> Result<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::storage().with_message("write rejected by test"));
        }
        self.put(bucket, key, bytes);
        Ok(())
    }

    async fn read(&self, bucket: &str, key: &str) -> Result<Bytes> {
        self.get(bucket, key)
            .ok_or_else(|| Error::not_found().with_message(format!("{bucket}/{key}")))
    }
}

/// Publisher recording every message, with a failure switch.
#[derive(Default)]
pub struct MockPublisher {
    published: Mutex<Vec<(Route, RouterMessage)>>,
    pub fail: AtomicBool,
}

impl MockPublisher {
    /// Returns everything published so far.
    pub async fn published(&self) -> Vec<(Route, RouterMessage)> {
        self.published.lock().await.clone()
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    async fn publish(&self, route: Route, message: &RouterMessage) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::service_unavailable("message broker"));
        }
        self.published.lock().await.push((route, message.clone()));
        Ok(())
    }
}

/// Subscription directory over a fixed map.
#[derive(Default)]
pub struct MockDirectory {
    subscriptions: std::sync::Mutex<HashMap<String, serde_json::Value>>,
}

impl MockDirectory {
    /// Registers a subscription document.
    pub fn seed(&self, id: &str, value: serde_json::Value) {
        self.subscriptions.lock().unwrap().insert(id.to_owned(), value);
    }
}

#[async_trait]
impl SubscriptionDirectory for MockDirectory {
    async fn container_subscription(&self, id: &str) -> Result<serde_json::Value> {
        self.subscriptions
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(Error::not_found)
    }
}

/// A service state wired to fresh mocks, handed back alongside them.
pub struct MockState {
    pub state: ServiceState,
    pub store: Arc<MockStatusStore>,
    pub objects: Arc<MockObjectStore>,
    pub publisher: Arc<MockPublisher>,
    pub directory: Arc<MockDirectory>,
}

/// Builds a [`ServiceState`] over fresh in-memory ports.
pub fn mock_state() -> MockState {
    let store = Arc::new(MockStatusStore::default());
    let objects = Arc::new(MockObjectStore::default());
    let publisher = Arc::new(MockPublisher::default());
    let directory = Arc::new(MockDirectory::default());
    let state = ServiceState {
        status_store: store.clone(),
        usage_events: store.clone(),
        objects: objects.clone(),
        publisher: publisher.clone(),
        subscriptions: Some(directory.clone()),
        config: IngestConfig {
            incoming_bucket: "incoming".into(),
            archive_bucket: "archive".into(),
            spreadsheet_archive_bucket: "reports-archive".into(),
            // Keep conflict waits negligible in tests.
            existing_status_delay_ms: 1,
        },
    };
    MockState {
        state,
        store,
        objects,
        publisher,
        directory,
    }
}

/// A request-level record with sensible defaults for tests.
pub fn sample_record(request_id: RequestId, account_or_prefix: Option<&str>) -> StatusRecord {
    StatusRecord {
        id: Uuid::new_v4(),
        request_id,
        correlation_id: Uuid::new_v4(),
        account_id: account_or_prefix.map(str::to_owned),
        account_or_prefix: account_or_prefix.map(str::to_owned),
        request_type: usagehub_core::types::RequestType::ArchiveUpload,
        input_file_name: "usage.tar.gz".into(),
        start_time: Timestamp::UNIX_EPOCH,
        end_time: None,
        final_result: None,
        replay_attempt: 0,
        auth_method: usagehub_core::types::AuthMethod::Bearer,
        iam_id: Some("iam-1".into()),
        email: Some("user@example.com".into()),
        event_id: None,
        request_metadata: None,
        user_response_returned: false,
        error_code: None,
        error_response_message: None,
    }
}
