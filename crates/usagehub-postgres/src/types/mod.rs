//! Database enumerations mirroring the core domain enums.

mod enums;

pub use enums::{PgAuthMethod, PgFinalResult, PgRequestType, PgStepAction, PgStepState};

/// Name of the unique index backing conflict-safe record creation.
pub const REQUEST_ID_UNIQUE_INDEX: &str = "status_records_request_id_key";

/// Name of the unique index backing step upserts.
pub const STEP_KEY_UNIQUE_INDEX: &str = "status_steps_status_id_action_replay_attempt_key";
