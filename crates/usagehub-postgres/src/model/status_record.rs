//! Status record model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use usagehub_core::RequestId;
use usagehub_core::types::{CreateStatus, StatusPatch, StatusRecord};

use crate::schema::status_records;
use crate::types::{PgAuthMethod, PgFinalResult, PgRequestType};
use crate::{PgError, PgResult};

/// Status record row, one per logical request (plus event-level rows
/// written by the downstream pipeline).
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = status_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StatusRecordRow {
    /// Unique record identifier.
    pub id: Uuid,
    /// Content-hash identity of the upload.
    pub request_id: String,
    /// Stable handle returned to the client.
    pub correlation_id: Uuid,
    /// Tenant account, when the caller is account-bound.
    pub account_id: Option<String>,
    /// Tenant scoping key.
    pub account_or_prefix: Option<String>,
    /// Kind of submission.
    pub request_type: PgRequestType,
    /// Original file name of the upload.
    pub input_file_name: String,
    /// When this attempt generation started.
    pub start_time: Timestamp,
    /// When processing finished.
    pub end_time: Option<Timestamp>,
    /// Terminal outcome, set downstream.
    pub final_result: Option<PgFinalResult>,
    /// Replay generation counter.
    pub replay_attempt: i32,
    /// How the submitting caller authenticated.
    pub auth_method: PgAuthMethod,
    /// Identity of the submitting caller.
    pub iam_id: Option<String>,
    /// Email of the submitting caller.
    pub email: Option<String>,
    /// Present on event-level rows only.
    pub event_id: Option<String>,
    /// Submission metadata document.
    pub request_metadata: Option<serde_json::Value>,
    /// Whether the synchronous upload response was delivered.
    pub user_response_returned: bool,
    /// Stable error code of the recorded failure, if any.
    pub error_code: Option<String>,
    /// Human-readable failure message, if any.
    pub error_response_message: Option<String>,
}

impl StatusRecordRow {
    /// Converts the row into the domain record.
    pub fn into_domain(self) -> PgResult<StatusRecord> {
        let request_id = RequestId::parse(&self.request_id).map_err(|_| {
            PgError::Unexpected(format!("malformed request id in row {}", self.id).into())
        })?;
        let request_metadata = self
            .request_metadata
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| {
                PgError::Unexpected(format!("malformed request metadata in row {}: {e}", self.id).into())
            })?;

        Ok(StatusRecord {
            id: self.id,
            request_id,
            correlation_id: self.correlation_id,
            account_id: self.account_id,
            account_or_prefix: self.account_or_prefix,
            request_type: self.request_type.into(),
            input_file_name: self.input_file_name,
            start_time: self.start_time.into(),
            end_time: self.end_time.map(Into::into),
            final_result: self.final_result.map(Into::into),
            replay_attempt: self.replay_attempt,
            auth_method: self.auth_method.into(),
            iam_id: self.iam_id,
            email: self.email,
            event_id: self.event_id,
            request_metadata,
            user_response_returned: self.user_response_returned,
            error_code: self.error_code,
            error_response_message: self.error_response_message,
        })
    }
}

/// Data for creating a new status record.
///
/// All columns are written explicitly; nullable terminal fields start NULL.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = status_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewStatusRecord {
    /// Record identifier (generated by the adapter).
    pub id: Uuid,
    /// Content-hash identity.
    pub request_id: String,
    /// Correlation id (generated by the adapter).
    pub correlation_id: Uuid,
    /// Tenant account.
    pub account_id: Option<String>,
    /// Tenant scoping key.
    pub account_or_prefix: Option<String>,
    /// Kind of submission.
    pub request_type: PgRequestType,
    /// Original file name.
    pub input_file_name: String,
    /// Submission start time.
    pub start_time: Timestamp,
    /// Replay generation; 0 for fresh submissions.
    pub replay_attempt: i32,
    /// Caller authentication method.
    pub auth_method: PgAuthMethod,
    /// Caller identity.
    pub iam_id: Option<String>,
    /// Caller email.
    pub email: Option<String>,
    /// Submission metadata document.
    pub request_metadata: Option<serde_json::Value>,
    /// Response delivery flag; always false at creation.
    pub user_response_returned: bool,
}

impl NewStatusRecord {
    /// Builds an insertable row from a creation draft, assigning fresh
    /// record and correlation ids.
    pub fn from_draft(draft: CreateStatus) -> PgResult<Self> {
        let request_metadata = draft
            .request_metadata
            .map(|m| serde_json::to_value(&m))
            .transpose()
            .map_err(|e| {
                PgError::Unexpected(format!("unserializable request metadata: {e}").into())
            })?;

        Ok(Self {
            id: Uuid::new_v4(),
            request_id: draft.request_id.as_str().to_owned(),
            correlation_id: Uuid::new_v4(),
            account_id: draft.account_id,
            account_or_prefix: draft.account_or_prefix,
            request_type: draft.request_type.into(),
            input_file_name: draft.input_file_name,
            start_time: draft.start_time.into(),
            replay_attempt: draft.replay_attempt,
            auth_method: draft.auth_method.into(),
            iam_id: draft.iam_id,
            email: draft.email,
            request_metadata,
            user_response_returned: false,
        })
    }
}

/// Data for partially updating a status record.
///
/// Outer `None` leaves a column untouched; inner `None` writes NULL.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = status_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateStatusRecord {
    /// Terminal outcome.
    pub final_result: Option<Option<PgFinalResult>>,
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

impl From<StatusPatch> for UpdateStatusRecord {
    fn from(patch: StatusPatch) -> Self {
        Self {
            final_result: patch.final_result.map(|v| v.map(Into::into)),
            start_time: patch.start_time.map(Into::into),
            end_time: patch.end_time.map(|v| v.map(Into::into)),
            error_code: patch.error_code,
            error_response_message: patch.error_response_message,
            replay_attempt: patch.replay_attempt,
            user_response_returned: patch.user_response_returned,
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use usagehub_core::types::{AuthMethod, RequestMetadata, RequestType};

    use super::*;

    fn draft() -> CreateStatus {
        CreateStatus {
            request_id: RequestId::from_bytes(b"report"),
            request_type: RequestType::SpreadsheetReport,
            input_file_name: "report.xlsx".into(),
            start_time: Timestamp::UNIX_EPOCH,
            replay_attempt: 0,
            account_id: Some("acc-1".into()),
            account_or_prefix: Some("acc-1".into()),
            auth_method: AuthMethod::Bearer,
            iam_id: Some("iam-1".into()),
            email: None,
            request_metadata: Some(RequestMetadata::for_report(7)),
        }
    }

    #[test]
    fn test_from_draft_assigns_fresh_identifiers() {
        let a = NewStatusRecord::from_draft(draft()).unwrap();
        let b = NewStatusRecord::from_draft(draft()).unwrap();
        assert_ne!(a.id, b.id);
        assert_ne!(a.correlation_id, b.correlation_id);
        assert_eq!(a.request_id, b.request_id);
        assert!(!a.user_response_returned);
    }

    #[test]
    fn test_from_draft_serializes_metadata() {
        let row = NewStatusRecord::from_draft(draft()).unwrap();
        let meta = row.request_metadata.unwrap();
        assert_eq!(meta.get("report_urn").and_then(|v| v.as_i64()), Some(7));
    }

    #[test]
    fn test_replay_reset_changeset_clears_terminal_fields() {
        let changes: UpdateStatusRecord =
            StatusPatch::replay_reset(2, Timestamp::UNIX_EPOCH).into();
        assert_eq!(changes.final_result, Some(None));
        assert_eq!(changes.end_time, Some(None));
        assert_eq!(changes.replay_attempt, Some(2));
        assert!(changes.user_response_returned.is_none());
    }
}
