//! Status step repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{StatusStepRow, UpsertStatusStep};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for status step database operations.
pub trait StatusStepRepository {
    /// Inserts the step, or rewrites its mutable columns when the
    /// `(status_id, action, replay_attempt)` key already exists.
    fn upsert_step(
        &mut self,
        step: UpsertStatusStep,
    ) -> impl Future<Output = PgResult<StatusStepRow>> + Send;

    /// Loads the full step history of a record, oldest generation first.
    fn find_steps_for_status(
        &mut self,
        status_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<StatusStepRow>>> + Send;
}

impl StatusStepRepository for PgConnection {
    async fn upsert_step(&mut self, step: UpsertStatusStep) -> PgResult<StatusStepRow> {
        use schema::status_steps::{self, dsl};

        let changes = step.changeset();
        diesel::insert_into(status_steps::table)
            .values(&step)
            .on_conflict((dsl::status_id, dsl::action, dsl::replay_attempt))
            .do_update()
            .set(&changes)
            .returning(StatusStepRow::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn find_steps_for_status(&mut self, status_id: Uuid) -> PgResult<Vec<StatusStepRow>> {
        use schema::status_steps::{self, dsl};

        status_steps::table
            .filter(dsl::status_id.eq(status_id))
            .order((dsl::replay_attempt.asc(), dsl::start_time.asc()))
            .select(StatusStepRow::as_select())
            .load(self)
            .await
            .map_err(PgError::from)
    }
}
