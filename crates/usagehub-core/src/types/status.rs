//! Status records: the persistent per-request bookkeeping.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use super::request::{AuthMethod, RequestMetadata, RequestType};
use super::step::{StatusStep, StepAction};
use crate::codes;
use crate::identity::RequestId;

/// Terminal outcome of a logical request.
///
/// Set by the downstream consolidator, never by the ingestion core.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FinalResult {
    /// Every event processed successfully.
    Success,
    /// Some events succeeded, some failed.
    MultiStatus,
    /// The submission itself was invalid.
    UserError,
    /// The submission could not be processed.
    Unprocessable,
    /// Processing was aborted.
    Aborted,
    /// Processing failed on our side.
    SystemError,
}

/// Persistent record of one logical request.
///
/// Exactly one record exists per request id; the store's uniqueness
/// constraint enforces this. Event-level records produced by downstream
/// enrichment share the request id and carry an `event_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Unique record identifier.
    pub id: Uuid,
    /// Content-hash identity; globally unique for request-level records.
    pub request_id: RequestId,
    /// Opaque handle returned to the client, stable across replays.
    pub correlation_id: Uuid,
    /// Tenant account, when the caller is account-bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Tenant scoping key: account id or storage-prefix alias.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_or_prefix: Option<String>,
    /// Kind of submission.
    pub request_type: RequestType,
    /// Original file name of the upload.
    pub input_file_name: String,
    /// When this attempt generation started.
    pub start_time: Timestamp,
    /// When processing finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,
    /// Terminal outcome, set downstream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_result: Option<FinalResult>,
    /// Replay generation counter, starting at 0.
    pub replay_attempt: i32,
    /// How the submitting caller authenticated.
    pub auth_method: AuthMethod,
    /// Identity of the submitting caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iam_id: Option<String>,
    /// Email of the submitting caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Present on event-level records only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Submission metadata (e.g. spreadsheet report version).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_metadata: Option<RequestMetadata>,
    /// Whether the synchronous upload response was delivered.
    pub user_response_returned: bool,
    /// Stable error code of the recorded failure, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Human-readable failure message, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_response_message: Option<String>,
}

impl StatusRecord {
    /// Returns whether this is the request-level record (not event-level).
    #[inline]
    pub fn is_request_level(&self) -> bool {
        self.event_id.is_none()
    }

    /// Returns whether a prior attempt is stuck and eligible for replay
    /// instead of deduplication.
    pub fn is_stuck(&self) -> bool {
        self.error_code.as_deref() == Some(codes::PREVIOUS_STILL_PROCESSING)
    }

    /// Returns the spreadsheet report version, if any.
    pub fn report_urn(&self) -> Option<i64> {
        self.request_metadata.as_ref().map(|m| m.report_urn)
    }
}

/// Draft for creating a status record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateStatus {
    /// Content-hash identity of the upload.
    pub request_id: RequestId,
    /// Kind of submission.
    pub request_type: RequestType,
    /// Original file name of the upload.
    pub input_file_name: String,
    /// When this submission started.
    pub start_time: Timestamp,
    /// Replay generation; always 0 for fresh submissions.
    pub replay_attempt: i32,
    /// Tenant account, when the caller is account-bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Tenant scoping key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_or_prefix: Option<String>,
    /// How the submitting caller authenticated.
    pub auth_method: AuthMethod,
    /// Identity of the submitting caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iam_id: Option<String>,
    /// Email of the submitting caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Submission metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_metadata: Option<RequestMetadata>,
}

impl CreateStatus {
    /// Returns the spreadsheet report version, if any.
    pub fn report_urn(&self) -> Option<i64> {
        self.request_metadata.as_ref().map(|m| m.report_urn)
    }
}

/// Identifiers handed back by the store on a successful create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusHandle {
    /// Record identifier.
    pub id: Uuid,
    /// Correlation id assigned by the store.
    pub correlation_id: Uuid,
}

/// Outcome of a status create attempt.
///
/// A conflict is an expected branch of the state machine, not an error;
/// callers must match on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The record was created; this caller owns the first submission.
    Created(StatusHandle),
    /// Another submission already owns this request id.
    Conflict,
}

/// Request-level record joined with its step history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedStatus {
    /// The request-level record.
    #[serde(flatten)]
    pub record: StatusRecord,
    /// Step history across all replay generations.
    pub steps: Vec<StatusStep>,
}

impl ConsolidatedStatus {
    /// Finds the step for an action within one replay generation.
    pub fn step_for(&self, action: StepAction, replay_attempt: i32) -> Option<&StatusStep> {
        self.steps
            .iter()
            .find(|s| s.action == action && s.replay_attempt == replay_attempt)
    }
}

/// Partial update applied to a status record.
///
/// `None` leaves a field untouched; `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusPatch {
    /// Terminal outcome.
    pub final_result: Option<Option<FinalResult>>,
    /// Attempt start time.
    pub start_time: Option<Timestamp>,
    /// Attempt end time.
    pub end_time: Option<Option<Timestamp>>,
    /// Recorded error code.
    pub error_code: Option<Option<String>>,
    /// Recorded error message.
    pub error_response_message: Option<Option<String>>,
    /// Replay generation counter.
    pub replay_attempt: Option<i32>,
    /// Response delivery flag.
    pub user_response_returned: Option<bool>,
}

impl StatusPatch {
    /// Patch that resets a record into a fresh replay generation.
    ///
    /// Clears the terminal outcome and error fields, stamps a new start
    /// time and bumps the generation counter. Steps are left untouched.
    pub fn replay_reset(next_attempt: i32, now: Timestamp) -> Self {
        Self {
            final_result: Some(None),
            start_time: Some(now),
            end_time: Some(None),
            error_code: Some(None),
            error_response_message: Some(None),
            replay_attempt: Some(next_attempt),
            user_response_returned: None,
        }
    }

    /// Patch that marks the synchronous response as delivered.
    pub fn response_returned() -> Self {
        Self {
            user_response_returned: Some(true),
            ..Self::default()
        }
    }
}

/// Filter for multi-record status queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusFilter {
    /// Match records sharing this request id.
    pub request_id: Option<RequestId>,
    /// Match records sharing this correlation id.
    pub correlation_id: Option<Uuid>,
    /// Match spreadsheet reports with this version.
    pub report_urn: Option<i64>,
    /// Restrict to request-level records (no event id).
    pub request_level_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_reset_patch_clears_terminal_fields() {
        let patch = StatusPatch::replay_reset(3, Timestamp::UNIX_EPOCH);
        assert_eq!(patch.final_result, Some(None));
        assert_eq!(patch.end_time, Some(None));
        assert_eq!(patch.error_code, Some(None));
        assert_eq!(patch.replay_attempt, Some(3));
        assert_eq!(patch.user_response_returned, None);
    }

    #[test]
    fn test_final_result_codes() {
        assert_eq!(FinalResult::MultiStatus.to_string(), "multi_status");
        assert_eq!(
            serde_json::to_string(&FinalResult::UserError).unwrap(),
            "\"user_error\""
        );
    }
}
