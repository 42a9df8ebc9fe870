//! Ports consumed by the ingestion core.
//!
//! Adapter crates implement these traits; the service crate receives them as
//! trait objects through explicit dependency injection — there are no
//! ambient singletons anywhere in the core.

use bytes::Bytes;
use uuid::Uuid;

use crate::Result;
use crate::identity::RequestId;
use crate::types::{
    ConsolidatedStatus, CreateOutcome, CreateStatus, Route, RouterMessage, StatusFilter,
    StatusPatch, StatusRecord, StatusStep, UsageEvent,
};

/// Persistent status storage.
///
/// The store's uniqueness constraint on `request_id` is the sole
/// cross-process synchronization primitive: a duplicate create resolves to
/// [`CreateOutcome::Conflict`], never an error.
#[async_trait::async_trait]
pub trait StatusStore: Send + Sync {
    /// Creates a status record, or reports that one already owns the
    /// request id.
    async fn create(&self, draft: CreateStatus) -> Result<CreateOutcome>;

    /// Fetches the request-level record plus step history by request id.
    async fn consolidated_by_request_id(
        &self,
        request_id: &RequestId,
        scope: Option<&str>,
    ) -> Result<ConsolidatedStatus>;

    /// Fetches the record plus step history by record id.
    async fn consolidated_by_id(&self, id: Uuid, scope: Option<&str>)
    -> Result<ConsolidatedStatus>;

    /// Fetches a bare record by record id.
    async fn status_by_id(&self, id: Uuid, scope: Option<&str>) -> Result<StatusRecord>;

    /// Fetches all records matching a filter (request-level and
    /// event-level).
    async fn query(&self, filter: StatusFilter, scope: Option<&str>) -> Result<Vec<StatusRecord>>;

    /// Creates or updates the step identified by
    /// `(status_id, action, replay_attempt)` and returns the stored row.
    async fn update_step(&self, step: StatusStep, scope: Option<&str>) -> Result<StatusStep>;

    /// Applies a partial update to a record and returns the updated row.
    async fn save_partial(
        &self,
        patch: StatusPatch,
        id: Uuid,
        scope: Option<&str>,
    ) -> Result<StatusRecord>;
}

/// Event-level record lookup, bypassing the request-level join.
#[async_trait::async_trait]
pub trait UsageEventStore: Send + Sync {
    /// Fetches the usage events for an event id within an account.
    async fn by_event_and_account(
        &self,
        event_id: &str,
        account_id: &str,
        scope: Option<&str>,
    ) -> Result<Vec<UsageEvent>>;
}

/// Blob storage, one namespace per bucket.
///
/// Writes are never retried here; retry is the orchestrator's
/// responsibility via resubmission.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes a blob under a key.
    async fn write(&self, bucket: &str, key: &str, bytes: Bytes) -> Result<()>;

    /// Reads a blob; a missing key surfaces as [`ErrorKind::NotFound`].
    ///
    /// [`ErrorKind::NotFound`]: crate::ErrorKind::NotFound
    async fn read(&self, bucket: &str, key: &str) -> Result<Bytes>;
}

/// Pointer-message publishing toward the downstream router.
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    /// Publishes a message to a route; failure surfaces as
    /// [`ErrorKind::ServiceUnavailable`].
    ///
    /// [`ErrorKind::ServiceUnavailable`]: crate::ErrorKind::ServiceUnavailable
    async fn publish(&self, route: Route, message: &RouterMessage) -> Result<()>;
}

/// Downstream container-subscription directory joined into detailed
/// event-level status responses.
#[async_trait::async_trait]
pub trait SubscriptionDirectory: Send + Sync {
    /// Fetches a container subscription by id.
    async fn container_subscription(&self, id: &str) -> Result<serde_json::Value>;
}
