//! Replay: resetting a logical request into a new attempt generation.

use jiff::Timestamp;
use serde::Serialize;
use usagehub_core::ports::StatusStore;
use usagehub_core::types::{
    BatchReplayMessage, RequestReplayMessage, Route, RouterMessage, StatusPatch, StatusRecord,
};
use usagehub_core::{Error, Result};
use uuid::Uuid;

use crate::TRACING_TARGET;
use crate::state::ServiceState;

/// Bumps a record into a fresh replay generation.
///
/// Increments `replay_attempt`, clears the terminal outcome and error
/// fields and stamps a new start time. Steps from prior generations are
/// left untouched as an audit trail; the ingestion state machine finds no
/// step under the new generation and therefore re-runs the full
/// write-then-publish cycle.
pub async fn reset_for_replay(
    store: &dyn StatusStore,
    record: &StatusRecord,
    scope: Option<&str>,
    now: Timestamp,
) -> Result<StatusRecord> {
    let next_attempt = record.replay_attempt + 1;
    tracing::info!(
        target: TRACING_TARGET,
        status_id = %record.id,
        replay_attempt = next_attempt,
        "Resetting record for replay"
    );
    store
        .save_partial(StatusPatch::replay_reset(next_attempt, now), record.id, scope)
        .await
}

/// Identity of the operator triggering a replay.
///
/// Carried on the router message for audit; never echoed back in replay
/// responses.
#[derive(Debug, Clone, Default)]
pub struct ReplayActor {
    /// Operator identity.
    pub iam_id: Option<String>,
    /// Operator email.
    pub email: Option<String>,
}

/// Acknowledgement of one accepted replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReceipt {
    /// The replayed record.
    pub status_id: Uuid,
    /// Correlation handle, unchanged across replays.
    pub correlation_id: Uuid,
    /// The new generation number.
    pub replay_attempt: i32,
}

/// Outcome of one item in a multi-request replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReplayItemOutcome {
    /// The replay was dispatched.
    Accepted(ReplayReceipt),
    /// The item failed; other items are unaffected.
    Failed {
        /// The record that could not be replayed.
        status_id: Uuid,
        /// Stable error code.
        error_code: String,
        /// Human-readable reason.
        message: String,
    },
}

/// Filter for a window replay.
#[derive(Debug, Clone)]
pub struct BatchReplayRequest {
    /// Start of the window.
    pub start_time: Timestamp,
    /// End of the window.
    pub end_time: Timestamp,
    /// Abort matching requests instead of reprocessing them.
    pub abort: bool,
    /// Tenant scoping key; absent replays across tenants.
    pub account_or_prefix: Option<String>,
}

/// Replay trigger over the status store and the router.
#[derive(Debug, Clone)]
pub struct ReplayService {
    state: ServiceState,
}

impl ReplayService {
    /// Creates the service over injected ports.
    pub fn new(state: ServiceState) -> Self {
        Self { state }
    }

    /// Replays a single logical request: reset, then re-publish a replay
    /// pointer through the router.
    pub async fn replay_request(
        &self,
        status_id: Uuid,
        actor: &ReplayActor,
        scope: Option<&str>,
    ) -> Result<ReplayReceipt> {
        let record = self.state.status_store.status_by_id(status_id, scope).await?;
        if !record.is_request_level() {
            return Err(Error::invalid_request()
                .with_message("only request-level records can be replayed"));
        }

        let record =
            reset_for_replay(self.state.status_store.as_ref(), &record, scope, Timestamp::now())
                .await?;

        let message = RouterMessage::RequestReplay(RequestReplayMessage {
            correlation_id: record.correlation_id,
            status_id: record.id,
            account_or_prefix: record.account_or_prefix.clone(),
            actor_iam_id: actor.iam_id.clone(),
            actor_email: actor.email.clone(),
        });
        self.state.publisher.publish(Route::Replay, &message).await?;

        Ok(ReplayReceipt {
            status_id: record.id,
            correlation_id: record.correlation_id,
            replay_attempt: record.replay_attempt,
        })
    }

    /// Replays several requests; each item succeeds or fails on its own,
    /// and a failure never aborts the remaining items.
    pub async fn replay_requests(
        &self,
        status_ids: &[Uuid],
        actor: &ReplayActor,
        scope: Option<&str>,
    ) -> Vec<ReplayItemOutcome> {
        let mut outcomes = Vec::with_capacity(status_ids.len());
        for &status_id in status_ids {
            let outcome = match self.replay_request(status_id, actor, scope).await {
                Ok(receipt) => ReplayItemOutcome::Accepted(receipt),
                Err(error) => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        status_id = %status_id,
                        error = %error,
                        "Replay item failed"
                    );
                    ReplayItemOutcome::Failed {
                        status_id,
                        error_code: error.code().to_owned(),
                        message: error.to_string(),
                    }
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Publishes a window replay for the downstream router to expand.
    pub async fn replay_window(
        &self,
        request: BatchReplayRequest,
        actor: &ReplayActor,
    ) -> Result<()> {
        if request.start_time >= request.end_time {
            return Err(Error::invalid_request()
                .with_message("replay window start must be before its end"));
        }

        let message = RouterMessage::BatchReplay(BatchReplayMessage {
            start_time: request.start_time,
            end_time: request.end_time,
            abort: request.abort,
            account_or_prefix: request.account_or_prefix,
            actor_iam_id: actor.iam_id.clone(),
            actor_email: actor.email.clone(),
        });
        self.state.publisher.publish(Route::Replay, &message).await
    }
}
