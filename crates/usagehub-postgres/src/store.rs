//! Port implementations over the connection pool.

use async_trait::async_trait;
use usagehub_core::ports::{StatusStore, UsageEventStore};
use usagehub_core::types::{
    ConsolidatedStatus, CreateOutcome, CreateStatus, StatusFilter, StatusHandle, StatusPatch,
    StatusRecord, StatusStep, UsageEvent,
};
use usagehub_core::{RequestId, Result};
use uuid::Uuid;

use crate::model::{NewStatusRecord, UpdateStatusRecord, UpsertStatusStep};
use crate::query::{StatusRepository, StatusStepRepository, UsageEventRepository};
use crate::{PgClient, PgResult, PooledConnection, TRACING_TARGET};

/// Status storage backed by PostgreSQL.
///
/// The unique index on `request_id` makes creation race-free: of any number
/// of concurrent submissions with identical content, exactly one insert
/// succeeds and the rest observe a conflict.
#[derive(Debug, Clone)]
pub struct PgStatusStore {
    client: PgClient,
}

impl PgStatusStore {
    /// Creates a store over an existing client.
    pub fn new(client: PgClient) -> Self {
        Self { client }
    }

    async fn conn(&self) -> PgResult<PooledConnection> {
        self.client.get_connection().await
    }

    async fn consolidate(
        &self,
        conn: &mut PooledConnection,
        record: StatusRecord,
    ) -> PgResult<ConsolidatedStatus> {
        let steps = conn
            .find_steps_for_status(record.id)
            .await?
            .into_iter()
            .map(|row| row.into_domain())
            .collect();
        Ok(ConsolidatedStatus { record, steps })
    }
}

#[async_trait]
impl StatusStore for PgStatusStore {
    async fn create(&self, draft: CreateStatus) -> Result<CreateOutcome> {
        let mut conn = self.conn().await.map_err(usagehub_core::Error::from)?;
        let new_record = NewStatusRecord::from_draft(draft)?;
        let request_id = new_record.request_id.clone();

        match conn.create_status(new_record).await {
            Ok(row) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    request_id = %request_id,
                    status_id = %row.id,
                    "Created status record"
                );
                Ok(CreateOutcome::Created(StatusHandle {
                    id: row.id,
                    correlation_id: row.correlation_id,
                }))
            }
            Err(err) if err.is_unique_violation() => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    request_id = %request_id,
                    "Status record already exists"
                );
                Ok(CreateOutcome::Conflict)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn consolidated_by_request_id(
        &self,
        request_id: &RequestId,
        scope: Option<&str>,
    ) -> Result<ConsolidatedStatus> {
        let mut conn = self.conn().await.map_err(usagehub_core::Error::from)?;
        let row = conn
            .find_request_level_status(request_id.as_str(), scope)
            .await
            .map_err(usagehub_core::Error::from)?
            .ok_or_else(usagehub_core::Error::not_found)?;
        let record = row.into_domain()?;
        Ok(self.consolidate(&mut conn, record).await?)
    }

    async fn consolidated_by_id(
        &self,
        id: Uuid,
        scope: Option<&str>,
    ) -> Result<ConsolidatedStatus> {
        let mut conn = self.conn().await.map_err(usagehub_core::Error::from)?;
        let row = conn
            .find_status_by_id(id, scope)
            .await
            .map_err(usagehub_core::Error::from)?
            .ok_or_else(usagehub_core::Error::not_found)?;
        let record = row.into_domain()?;
        Ok(self.consolidate(&mut conn, record).await?)
    }

    async fn status_by_id(&self, id: Uuid, scope: Option<&str>) -> Result<StatusRecord> {
        let mut conn = self.conn().await.map_err(usagehub_core::Error::from)?;
        let row = conn
            .find_status_by_id(id, scope)
            .await
            .map_err(usagehub_core::Error::from)?
            .ok_or_else(usagehub_core::Error::not_found)?;
        Ok(row.into_domain()?)
    }

    async fn query(&self, filter: StatusFilter, scope: Option<&str>) -> Result<Vec<StatusRecord>> {
        let mut conn = self.conn().await.map_err(usagehub_core::Error::from)?;
        let rows = conn
            .find_statuses(&filter, scope)
            .await
            .map_err(usagehub_core::Error::from)?;
        let records = rows
            .into_iter()
            .map(|row| row.into_domain())
            .collect::<PgResult<Vec<_>>>()?;
        Ok(records)
    }

    async fn update_step(&self, step: StatusStep, scope: Option<&str>) -> Result<StatusStep> {
        let mut conn = self.conn().await.map_err(usagehub_core::Error::from)?;

        // Steps are reached through their owning record; verify the record
        // is visible in this scope before touching the step.
        if scope.is_some() {
            conn.find_status_by_id(step.status_id, scope)
                .await
                .map_err(usagehub_core::Error::from)?
                .ok_or_else(usagehub_core::Error::not_found)?;
        }

        let row = conn
            .upsert_step(UpsertStatusStep::from(step))
            .await
            .map_err(usagehub_core::Error::from)?;
        Ok(row.into_domain())
    }

    async fn save_partial(
        &self,
        patch: StatusPatch,
        id: Uuid,
        scope: Option<&str>,
    ) -> Result<StatusRecord> {
        if patch == StatusPatch::default() {
            return self.status_by_id(id, scope).await;
        }

        let mut conn = self.conn().await.map_err(usagehub_core::Error::from)?;
        let row = conn
            .update_status(id, UpdateStatusRecord::from(patch), scope)
            .await
            .map_err(usagehub_core::Error::from)?;
        Ok(row.into_domain()?)
    }
}

#[async_trait]
impl UsageEventStore for PgStatusStore {
    async fn by_event_and_account(
        &self,
        event_id: &str,
        account_id: &str,
        scope: Option<&str>,
    ) -> Result<Vec<UsageEvent>> {
        let mut conn = self.conn().await.map_err(usagehub_core::Error::from)?;
        let rows = conn
            .find_events_by_event_and_account(event_id, account_id, scope)
            .await
            .map_err(usagehub_core::Error::from)?;
        Ok(rows.into_iter().map(|row| row.into_domain()).collect())
    }
}
