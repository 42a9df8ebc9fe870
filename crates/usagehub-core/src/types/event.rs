//! Event-level records produced by downstream enrichment.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One usage event extracted from an ingested report.
///
/// The usage/enrichment/metrics payloads are written by the downstream
/// pipeline; this core only reads them back for status queries, so they stay
/// schemaless JSON here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEvent {
    /// Event identifier assigned downstream.
    pub event_id: String,
    /// Tenant account the event belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Status record the event was extracted from.
    pub status_id: Uuid,
    /// The submitted usage payload.
    pub usage: serde_json::Value,
    /// Enrichment computed downstream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<serde_json::Value>,
    /// Metrics computed downstream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<serde_json::Value>,
}

impl UsageEvent {
    /// Returns the container-subscription id from the enrichment, if the
    /// downstream pipeline resolved one.
    pub fn container_subscription_id(&self) -> Option<&str> {
        self.enrichment
            .as_ref()
            .and_then(|e| e.get("usageContainerSubscriptionId"))
            .and_then(|v| v.as_str())
    }
}
