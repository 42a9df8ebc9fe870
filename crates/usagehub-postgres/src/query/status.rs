//! Status record repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use usagehub_core::types::StatusFilter;
use uuid::Uuid;

use crate::model::{NewStatusRecord, StatusRecordRow, UpdateStatusRecord};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for status record database operations.
pub trait StatusRepository {
    /// Inserts a status record.
    ///
    /// A duplicate request id surfaces as a unique-violation query error;
    /// callers translate it via [`PgError::is_unique_violation`].
    fn create_status(
        &mut self,
        new_record: NewStatusRecord,
    ) -> impl Future<Output = PgResult<StatusRecordRow>> + Send;

    /// Finds a record by its identifier.
    fn find_status_by_id(
        &mut self,
        status_id: Uuid,
        scope: Option<&str>,
    ) -> impl Future<Output = PgResult<Option<StatusRecordRow>>> + Send;

    /// Finds the request-level record (no event id) for a request id.
    fn find_request_level_status(
        &mut self,
        request_id: &str,
        scope: Option<&str>,
    ) -> impl Future<Output = PgResult<Option<StatusRecordRow>>> + Send;

    /// Finds all records matching a filter, request-level and event-level,
    /// newest first.
    fn find_statuses(
        &mut self,
        filter: &StatusFilter,
        scope: Option<&str>,
    ) -> impl Future<Output = PgResult<Vec<StatusRecordRow>>> + Send;

    /// Applies a partial update to a record and returns the updated row.
    fn update_status(
        &mut self,
        status_id: Uuid,
        changes: UpdateStatusRecord,
        scope: Option<&str>,
    ) -> impl Future<Output = PgResult<StatusRecordRow>> + Send;
}

impl StatusRepository for PgConnection {
    async fn create_status(&mut self, new_record: NewStatusRecord) -> PgResult<StatusRecordRow> {
        use schema::status_records;

        diesel::insert_into(status_records::table)
            .values(&new_record)
            .returning(StatusRecordRow::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn find_status_by_id(
        &mut self,
        status_id: Uuid,
        scope: Option<&str>,
    ) -> PgResult<Option<StatusRecordRow>> {
        use schema::status_records::{self, dsl};

        let mut query = status_records::table
            .filter(dsl::id.eq(status_id))
            .into_boxed();
        if let Some(prefix) = scope {
            query = query.filter(dsl::account_or_prefix.eq(prefix.to_owned()));
        }

        query
            .select(StatusRecordRow::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn find_request_level_status(
        &mut self,
        request_id: &str,
        scope: Option<&str>,
    ) -> PgResult<Option<StatusRecordRow>> {
        use schema::status_records::{self, dsl};

        let mut query = status_records::table
            .filter(dsl::request_id.eq(request_id.to_owned()))
            .filter(dsl::event_id.is_null())
            .into_boxed();
        if let Some(prefix) = scope {
            query = query.filter(dsl::account_or_prefix.eq(prefix.to_owned()));
        }

        query
            .select(StatusRecordRow::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn find_statuses(
        &mut self,
        filter: &StatusFilter,
        scope: Option<&str>,
    ) -> PgResult<Vec<StatusRecordRow>> {
        use schema::status_records::{self, dsl};

        let mut query = status_records::table.into_boxed();
        if let Some(ref request_id) = filter.request_id {
            query = query.filter(dsl::request_id.eq(request_id.as_str().to_owned()));
        }
        if let Some(correlation_id) = filter.correlation_id {
            query = query.filter(dsl::correlation_id.eq(correlation_id));
        }
        if let Some(report_urn) = filter.report_urn {
            let urn = serde_json::json!(report_urn);
            query = query
                .filter(dsl::request_metadata.retrieve_as_object("report_urn").eq(urn));
        }
        if filter.request_level_only {
            query = query.filter(dsl::event_id.is_null());
        }
        if let Some(prefix) = scope {
            query = query.filter(dsl::account_or_prefix.eq(prefix.to_owned()));
        }

        query
            .order(dsl::start_time.desc())
            .select(StatusRecordRow::as_select())
            .load(self)
            .await
            .map_err(PgError::from)
    }

    async fn update_status(
        &mut self,
        status_id: Uuid,
        changes: UpdateStatusRecord,
        scope: Option<&str>,
    ) -> PgResult<StatusRecordRow> {
        use schema::status_records::{self, dsl};

        let result = match scope {
            Some(prefix) => {
                diesel::update(
                    status_records::table
                        .filter(dsl::id.eq(status_id))
                        .filter(dsl::account_or_prefix.eq(prefix.to_owned())),
                )
                .set(&changes)
                .returning(StatusRecordRow::as_returning())
                .get_result(self)
                .await
            }
            None => {
                diesel::update(status_records::table.filter(dsl::id.eq(status_id)))
                    .set(&changes)
                    .returning(StatusRecordRow::as_returning())
                    .get_result(self)
                    .await
            }
        };

        result.map_err(PgError::from)
    }
}
