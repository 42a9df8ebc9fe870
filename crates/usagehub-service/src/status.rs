//! Read-side status consolidation.
//!
//! Reconstructs the overall status of a logical request from its
//! request-level record, the event-level records written downstream, and
//! the step history. Non-privileged callers receive only summarized labels;
//! identity fields never leave the store for them.

use serde::Serialize;
use usagehub_core::types::{FinalResult, StatusFilter, StatusRecord, StatusStep, UsageEvent};
use usagehub_core::{Error, RequestId, Result};
use uuid::Uuid;

use crate::TRACING_TARGET;
use crate::state::ServiceState;

/// Status label of a request or event that has not finished yet.
const PROCESSING: &str = "processing";

/// Summarized status of one downstream event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventStatusView {
    /// Event identifier.
    pub event_id: String,
    /// Status label.
    pub status: String,
    /// Stable error code, when failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Failure message, when failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Full record and step history, exposed to detailed callers only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusDetail {
    /// The request-level record.
    pub record: StatusRecord,
    /// Step history across all replay generations.
    pub steps: Vec<StatusStep>,
}

/// Consolidated status of one logical request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsolidatedView {
    /// Correlation handle of the request.
    pub correlation_id: Uuid,
    /// Content-hash identity of the request.
    pub request_id: RequestId,
    /// Overall status label.
    pub status: String,
    /// Stable error code, when failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Failure message, when failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Per-event statuses.
    pub events: Vec<EventStatusView>,
    /// Present for detailed callers only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<StatusDetail>,
}

/// Downstream subscription join result for one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubscriptionInfo {
    /// The directory resolved the subscription.
    Found {
        /// The subscription document.
        subscription: serde_json::Value,
    },
    /// No subscription could be resolved; the event itself is unaffected.
    NotFound,
}

/// One usage event with its optional subscription join.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventDetail {
    /// The stored event.
    pub event: UsageEvent,
    /// Subscription join result.
    pub subscription: SubscriptionInfo,
}

/// Read-side status queries.
#[derive(Debug, Clone)]
pub struct StatusQueryService {
    state: ServiceState,
}

impl StatusQueryService {
    /// Creates the service over injected ports.
    pub fn new(state: ServiceState) -> Self {
        Self { state }
    }

    /// Consolidated status by correlation id or request id.
    ///
    /// Request ids are content hashes and correlation ids are UUIDs, so the
    /// identifier is disambiguated by shape.
    pub async fn consolidated(
        &self,
        id: &str,
        scope: Option<&str>,
        detailed: bool,
    ) -> Result<ConsolidatedView> {
        let filter = Self::filter_for(id)?;
        let records = self.state.status_store.query(filter, scope).await?;

        let record = records
            .iter()
            .find(|r| r.is_request_level())
            .cloned()
            .ok_or_else(Error::not_found)?;
        let events: Vec<&StatusRecord> =
            records.iter().filter(|r| !r.is_request_level()).collect();

        let event_views: Vec<EventStatusView> = events
            .iter()
            .map(|r| EventStatusView {
                // Filtered on event_id above; empty never happens.
                event_id: r.event_id.clone().unwrap_or_default(),
                status: Self::label(r.final_result),
                error_code: r.error_code.clone(),
                message: r.error_response_message.clone(),
            })
            .collect();

        let status = Self::overall_label(&record, &events);

        let detail = if detailed {
            let consolidated = self
                .state
                .status_store
                .consolidated_by_id(record.id, scope)
                .await?;
            Some(StatusDetail {
                record: consolidated.record,
                steps: consolidated.steps,
            })
        } else {
            None
        };

        Ok(ConsolidatedView {
            correlation_id: record.correlation_id,
            request_id: record.request_id.clone(),
            status,
            error_code: record.error_code.clone(),
            message: record.error_response_message.clone(),
            events: event_views,
            detail,
        })
    }

    /// Event-level status by usage-event id, bypassing the request-level
    /// join.
    ///
    /// The optional subscription-directory join degrades to an explicit
    /// not-found marker; it never fails the query.
    pub async fn events(
        &self,
        event_id: &str,
        account_id: &str,
        scope: Option<&str>,
    ) -> Result<Vec<EventDetail>> {
        let events = self
            .state
            .usage_events
            .by_event_and_account(event_id, account_id, scope)
            .await?;
        if events.is_empty() {
            return Err(Error::not_found()
                .with_message(format!("no usage events for event id '{event_id}'")));
        }

        let mut details = Vec::with_capacity(events.len());
        for event in events {
            let subscription = self.join_subscription(&event).await?;
            details.push(EventDetail {
                event,
                subscription,
            });
        }
        Ok(details)
    }

    async fn join_subscription(&self, event: &UsageEvent) -> Result<SubscriptionInfo> {
        let (Some(directory), Some(subscription_id)) =
            (&self.state.subscriptions, event.container_subscription_id())
        else {
            return Ok(SubscriptionInfo::NotFound);
        };

        match directory.container_subscription(subscription_id).await {
            Ok(subscription) => Ok(SubscriptionInfo::Found { subscription }),
            Err(error) if error.is_not_found() => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    event_id = %event.event_id,
                    subscription_id = %subscription_id,
                    "Subscription not found, degrading to marker"
                );
                Ok(SubscriptionInfo::NotFound)
            }
            Err(error) => Err(error),
        }
    }

    fn filter_for(id: &str) -> Result<StatusFilter> {
        if RequestId::is_request_id(id) {
            return Ok(StatusFilter {
                request_id: Some(RequestId::parse(id)?),
                ..StatusFilter::default()
            });
        }
        let correlation_id = Uuid::parse_str(id).map_err(|_| {
            Error::invalid_request()
                .with_message(format!("'{id}' is neither a request id nor a correlation id"))
        })?;
        Ok(StatusFilter {
            correlation_id: Some(correlation_id),
            ..StatusFilter::default()
        })
    }

    fn label(final_result: Option<FinalResult>) -> String {
        final_result.map_or_else(|| PROCESSING.to_owned(), |r| r.to_string())
    }

    /// Overall precedence: all events succeeded wins, then a terminal
    /// request-level failure, then multi-status for mixed events.
    fn overall_label(record: &StatusRecord, events: &[&StatusRecord]) -> String {
        if !events.is_empty()
            && events.iter().all(|e| e.final_result == Some(FinalResult::Success))
        {
            return FinalResult::Success.to_string();
        }

        if let Some(result) = record.final_result {
            if matches!(
                result,
                FinalResult::UserError
                    | FinalResult::Unprocessable
                    | FinalResult::Aborted
                    | FinalResult::SystemError
            ) {
                return result.to_string();
            }
        }

        if !events.is_empty() {
            return FinalResult::MultiStatus.to_string();
        }

        Self::label(record.final_result)
    }
}
