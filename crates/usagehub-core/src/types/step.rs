//! Per-phase progress records within one replay generation.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Pipeline phase a step tracks.
///
/// Keyed together with `(status_id, replay_attempt)`; adding a phase means
/// adding a variant, not a schema change.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StepAction {
    /// Write the uploaded artifact into the incoming bucket.
    PutInIncomingBucket,
}

/// Outcome of a step attempt.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StepState {
    /// The attempt completed.
    Success,
    /// The attempt failed on our side; retryable via resubmission.
    SystemError,
}

/// Identity of a step: one step exists per key, new replay generations
/// append a new step instead of overwriting history.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepKey {
    /// Owning status record.
    pub status_id: Uuid,
    /// Pipeline phase.
    pub action: StepAction,
    /// Replay generation.
    pub replay_attempt: i32,
}

/// Progress record for one pipeline phase within one replay generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusStep {
    /// Owning status record.
    pub status_id: Uuid,
    /// Pipeline phase.
    pub action: StepAction,
    /// Replay generation this step belongs to.
    pub replay_attempt: i32,
    /// Retry counter within this generation.
    pub attempt: i32,
    /// Outcome of the latest attempt.
    pub state: StepState,
    /// When the first attempt of this generation started.
    pub start_time: Timestamp,
    /// When the latest attempt finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,
    /// Whether the pointer message for this generation has been published.
    pub is_published: bool,
    /// Failure message of the latest attempt, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Stable error code of the latest attempt, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl StatusStep {
    /// Starts a fresh step for a replay generation.
    ///
    /// `attempt` starts at -1; the first completed attempt brings it to 0.
    pub fn begin(status_id: Uuid, action: StepAction, replay_attempt: i32, now: Timestamp) -> Self {
        Self {
            status_id,
            action,
            replay_attempt,
            attempt: -1,
            state: StepState::Success,
            start_time: now,
            end_time: None,
            is_published: false,
            message: None,
            error_code: None,
        }
    }

    /// Records a successful attempt, clearing any prior failure details.
    pub fn complete_success(&mut self, now: Timestamp) {
        self.attempt += 1;
        self.state = StepState::Success;
        self.end_time = Some(now);
        self.message = None;
        self.error_code = None;
    }

    /// Records a failed attempt.
    pub fn complete_failure(&mut self, now: Timestamp, message: String, error_code: &str) {
        self.attempt += 1;
        self.state = StepState::SystemError;
        self.end_time = Some(now);
        self.message = Some(message);
        self.error_code = Some(error_code.to_owned());
    }

    /// Returns whether the latest attempt succeeded.
    #[inline]
    pub fn succeeded(&self) -> bool {
        self.state == StepState::Success && self.end_time.is_some()
    }

    /// Returns the identity of this step.
    pub fn key(&self) -> StepKey {
        StepKey {
            status_id: self.status_id,
            action: self.action,
            replay_attempt: self.replay_attempt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step() -> StatusStep {
        StatusStep::begin(
            Uuid::new_v4(),
            StepAction::PutInIncomingBucket,
            0,
            Timestamp::UNIX_EPOCH,
        )
    }

    #[test]
    fn test_first_completion_is_attempt_zero() {
        let mut step = step();
        step.complete_success(Timestamp::UNIX_EPOCH);
        assert_eq!(step.attempt, 0);
        assert!(step.succeeded());
    }

    #[test]
    fn test_success_clears_failure_details() {
        let mut step = step();
        step.complete_failure(Timestamp::UNIX_EPOCH, "write failed".into(), "storage");
        assert_eq!(step.attempt, 0);
        assert!(!step.succeeded());

        step.complete_success(Timestamp::UNIX_EPOCH);
        assert_eq!(step.attempt, 1);
        assert!(step.message.is_none());
        assert!(step.error_code.is_none());
    }

    #[test]
    fn test_fresh_step_is_not_succeeded() {
        assert!(!step().succeeded());
    }
}
