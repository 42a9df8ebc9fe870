//! Database models mapping the status tables to the domain types.

mod status_record;
mod status_step;
mod usage_event;

pub use status_record::{NewStatusRecord, StatusRecordRow, UpdateStatusRecord};
pub use status_step::{StatusStepRow, UpdateStatusStep, UpsertStatusStep};
pub use usage_event::UsageEventRow;
