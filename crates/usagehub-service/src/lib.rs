#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
pub mod download;
pub mod events;
pub mod ingest;
pub mod intake;
mod objects;
pub mod replay;
mod state;
pub mod status;
pub mod telemetry;
#[cfg(test)]
pub(crate) mod testing;

pub use config::{IngestConfig, ServiceConfig};
pub use download::{DownloadService, DownloadedReport};
pub use events::EventArchiveReader;
pub use ingest::{IngestReceipt, IngestService};
pub use intake::{PreparedUpload, Submitter, UploadPayload};
pub use objects::TenantObjects;
pub use replay::{ReplayActor, ReplayService};
pub use state::ServiceState;
pub use status::StatusQueryService;

/// Tracing target for service operations.
pub const TRACING_TARGET: &str = "usagehub_service";
