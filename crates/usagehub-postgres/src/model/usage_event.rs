//! Usage event model for PostgreSQL database operations.

use diesel::prelude::*;
use uuid::Uuid;

use usagehub_core::types::UsageEvent;

use crate::schema::usage_events;

/// Usage event row written by the downstream enrichment pipeline.
///
/// This adapter only reads events back for status queries; inserts happen
/// downstream.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = usage_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UsageEventRow {
    /// Unique row identifier.
    pub id: Uuid,
    /// Event identifier assigned downstream.
    pub event_id: String,
    /// Tenant account the event belongs to.
    pub account_id: Option<String>,
    /// Tenant scoping key.
    pub account_or_prefix: Option<String>,
    /// Status record the event was extracted from.
    pub status_id: Uuid,
    /// The submitted usage payload.
    pub usage: serde_json::Value,
    /// Enrichment computed downstream.
    pub enrichment: Option<serde_json::Value>,
    /// Metrics computed downstream.
    pub metrics: Option<serde_json::Value>,
}

impl UsageEventRow {
    /// Converts the row into the domain event.
    pub fn into_domain(self) -> UsageEvent {
        UsageEvent {
            event_id: self.event_id,
            account_id: self.account_id,
            status_id: self.status_id,
            usage: self.usage,
            enrichment: self.enrichment,
            metrics: self.metrics,
        }
    }
}
