//! Domain types shared across the usagehub crates.

mod event;
mod message;
mod request;
mod status;
mod step;

pub use event::UsageEvent;
pub use message::{BatchReplayMessage, PipelineMessage, RequestReplayMessage, Route, RouterMessage};
pub use request::{AuthMethod, RequestMetadata, RequestType};
pub use status::{
    ConsolidatedStatus, CreateOutcome, CreateStatus, FinalResult, StatusFilter, StatusHandle,
    StatusPatch, StatusRecord,
};
pub use step::{StatusStep, StepAction, StepKey, StepState};
