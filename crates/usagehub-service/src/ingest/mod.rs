//! The idempotent upload-ingestion state machine.

mod context;
mod service;

pub use context::{IngestContext, ResolvedRequest};
pub use service::{IngestReceipt, IngestService};
