//! Shared service state with explicitly injected ports.

use std::fmt;
use std::sync::Arc;

use usagehub_core::ports::{
    ObjectStore, Publisher, StatusStore, SubscriptionDirectory, UsageEventStore,
};

use crate::config::IngestConfig;

/// All collaborators of the ingestion core, injected at construction.
///
/// There are no ambient singletons: the process entry point builds one
/// `ServiceState` (usually via [`ServiceConfig::connect`]) and hands clones
/// to each service.
///
/// [`ServiceConfig::connect`]: crate::ServiceConfig::connect
#[derive(Clone)]
pub struct ServiceState {
    /// Persistent status storage.
    pub status_store: Arc<dyn StatusStore>,
    /// Read access to downstream-written usage events.
    pub usage_events: Arc<dyn UsageEventStore>,
    /// Blob storage.
    pub objects: Arc<dyn ObjectStore>,
    /// Pointer-message publisher toward the downstream router.
    pub publisher: Arc<dyn Publisher>,
    /// Downstream subscription directory; absent when the deployment has
    /// none, in which case event queries degrade gracefully.
    pub subscriptions: Option<Arc<dyn SubscriptionDirectory>>,
    /// Ingestion settings.
    pub config: IngestConfig,
}

impl fmt::Debug for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
