//! Status step model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use usagehub_core::types::StatusStep;

use crate::schema::status_steps;
use crate::types::{PgStepAction, PgStepState};

/// Status step row: progress of one pipeline phase within one replay
/// generation.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = status_steps)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StatusStepRow {
    /// Unique step identifier.
    pub id: Uuid,
    /// Owning status record.
    pub status_id: Uuid,
    /// Pipeline phase.
    pub action: PgStepAction,
    /// Replay generation this step belongs to.
    pub replay_attempt: i32,
    /// Retry counter within this generation.
    pub attempt: i32,
    /// Outcome of the latest attempt.
    pub state: PgStepState,
    /// When the first attempt of this generation started.
    pub start_time: Timestamp,
    /// When the latest attempt finished.
    pub end_time: Option<Timestamp>,
    /// Whether the pointer message for this generation has been published.
    pub is_published: bool,
    /// Failure message of the latest attempt, if any.
    pub message: Option<String>,
    /// Stable error code of the latest attempt, if any.
    pub error_code: Option<String>,
}

impl StatusStepRow {
    /// Converts the row into the domain step.
    pub fn into_domain(self) -> StatusStep {
        StatusStep {
            status_id: self.status_id,
            action: self.action.into(),
            replay_attempt: self.replay_attempt,
            attempt: self.attempt,
            state: self.state.into(),
            start_time: self.start_time.into(),
            end_time: self.end_time.map(Into::into),
            is_published: self.is_published,
            message: self.message,
            error_code: self.error_code,
        }
    }
}

/// Insertable form of a step.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = status_steps)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpsertStatusStep {
    /// Step identifier for the insert arm; ignored when updating.
    pub id: Uuid,
    /// Owning status record.
    pub status_id: Uuid,
    /// Pipeline phase.
    pub action: PgStepAction,
    /// Replay generation.
    pub replay_attempt: i32,
    /// Retry counter.
    pub attempt: i32,
    /// Latest outcome.
    pub state: PgStepState,
    /// Generation start time.
    pub start_time: Timestamp,
    /// Latest completion time.
    pub end_time: Option<Timestamp>,
    /// Publish flag.
    pub is_published: bool,
    /// Latest failure message.
    pub message: Option<String>,
    /// Latest failure code.
    pub error_code: Option<String>,
}

impl UpsertStatusStep {
    /// Columns rewritten when the `(status_id, action, replay_attempt)` key
    /// already exists.
    pub fn changeset(&self) -> UpdateStatusStep {
        UpdateStatusStep {
            attempt: self.attempt,
            state: self.state,
            end_time: self.end_time,
            is_published: self.is_published,
            message: self.message.clone(),
            error_code: self.error_code.clone(),
        }
    }
}

impl From<StatusStep> for UpsertStatusStep {
    fn from(step: StatusStep) -> Self {
        Self {
            id: Uuid::new_v4(),
            status_id: step.status_id,
            action: step.action.into(),
            replay_attempt: step.replay_attempt,
            attempt: step.attempt,
            state: step.state.into(),
            start_time: step.start_time.into(),
            end_time: step.end_time.map(Into::into),
            is_published: step.is_published,
            message: step.message,
            error_code: step.error_code,
        }
    }
}

/// Update arm of the step upsert.
///
/// `treat_none_as_null` makes the update overwrite cleared failure details
/// instead of skipping them.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = status_steps)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct UpdateStatusStep {
    /// Retry counter.
    pub attempt: i32,
    /// Latest outcome.
    pub state: PgStepState,
    /// Latest completion time.
    pub end_time: Option<Timestamp>,
    /// Publish flag.
    pub is_published: bool,
    /// Latest failure message.
    pub message: Option<String>,
    /// Latest failure code.
    pub error_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use usagehub_core::types::StepAction;

    use super::*;

    #[test]
    fn test_upsert_preserves_step_key() {
        let mut step = StatusStep::begin(
            Uuid::new_v4(),
            StepAction::PutInIncomingBucket,
            2,
            Timestamp::UNIX_EPOCH,
        );
        step.complete_success(Timestamp::UNIX_EPOCH);

        let upsert = UpsertStatusStep::from(step.clone());
        assert_eq!(upsert.status_id, step.status_id);
        assert_eq!(upsert.replay_attempt, 2);
        assert_eq!(upsert.attempt, 0);
        assert_eq!(StepAction::from(upsert.action), step.action);
    }
}
