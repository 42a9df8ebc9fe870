//! Pointer messages handed to the downstream router.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Routing key for the downstream router.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Route {
    /// Freshly ingested inline/archive uploads.
    Ingest,
    /// Spreadsheet report uploads.
    SpreadsheetReport,
    /// Replay requests.
    Replay,
}

/// Slim pointer published once the artifact is durably stored.
///
/// The downstream pipeline fetches everything else by these ids; the
/// message itself never carries report content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineMessage {
    /// Correlation handle of the logical request.
    pub correlation_id: Uuid,
    /// Status record to process.
    pub status_id: Uuid,
    /// Tenant scoping key.
    pub account_or_prefix: Option<String>,
}

/// Replay request for a single logical request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestReplayMessage {
    /// Correlation handle of the logical request.
    pub correlation_id: Uuid,
    /// Status record to replay.
    pub status_id: Uuid,
    /// Tenant scoping key.
    pub account_or_prefix: Option<String>,
    /// Identity of the operator who triggered the replay.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_iam_id: Option<String>,
    /// Email of the operator who triggered the replay.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_email: Option<String>,
}

/// Replay request covering every stalled request in a time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReplayMessage {
    /// Start of the window to replay.
    pub start_time: Timestamp,
    /// End of the window to replay.
    pub end_time: Timestamp,
    /// Abort matching requests instead of reprocessing them.
    #[serde(default)]
    pub abort: bool,
    /// Tenant scoping key; absent replays across tenants.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_or_prefix: Option<String>,
    /// Identity of the operator who triggered the replay.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_iam_id: Option<String>,
    /// Email of the operator who triggered the replay.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_email: Option<String>,
}

/// Any message the core publishes to the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RouterMessage {
    /// Pointer to a freshly stored artifact.
    Pipeline(PipelineMessage),
    /// Single-request replay.
    RequestReplay(RequestReplayMessage),
    /// Window replay.
    BatchReplay(BatchReplayMessage),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_message_shape() {
        let message = PipelineMessage {
            correlation_id: Uuid::nil(),
            status_id: Uuid::nil(),
            account_or_prefix: None,
        };
        let json = serde_json::to_value(&message).unwrap();
        assert!(json.get("correlation_id").is_some());
        assert!(json.get("status_id").is_some());
        // The slim pointer never carries content.
        assert_eq!(json.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_actor_fields_are_omitted_when_absent() {
        let message = RequestReplayMessage {
            correlation_id: Uuid::nil(),
            status_id: Uuid::nil(),
            account_or_prefix: None,
            actor_iam_id: None,
            actor_email: None,
        };
        let json = serde_json::to_value(&message).unwrap();
        assert!(json.get("actor_iam_id").is_none());
    }
}
