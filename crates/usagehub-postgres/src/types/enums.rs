//! Postgres enum types with conversions to and from the core enums.
//!
//! The core crate stays free of diesel; these mirrors exist so the database
//! representation can evolve independently of the domain types.

use diesel_derive_enum::DbEnum;
use usagehub_core::types::{AuthMethod, FinalResult, RequestType, StepAction, StepState};

/// Database mirror of [`RequestType`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, DbEnum)]
#[ExistingTypePath = "crate::schema::sql_types::RequestType"]
pub enum PgRequestType {
    #[db_rename = "inline_batch"]
    InlineBatch,
    #[db_rename = "archive_upload"]
    ArchiveUpload,
    #[db_rename = "spreadsheet_report"]
    SpreadsheetReport,
}

impl From<RequestType> for PgRequestType {
    fn from(value: RequestType) -> Self {
        match value {
            RequestType::InlineBatch => Self::InlineBatch,
            RequestType::ArchiveUpload => Self::ArchiveUpload,
            RequestType::SpreadsheetReport => Self::SpreadsheetReport,
        }
    }
}

impl From<PgRequestType> for RequestType {
    fn from(value: PgRequestType) -> Self {
        match value {
            PgRequestType::InlineBatch => Self::InlineBatch,
            PgRequestType::ArchiveUpload => Self::ArchiveUpload,
            PgRequestType::SpreadsheetReport => Self::SpreadsheetReport,
        }
    }
}

/// Database mirror of [`AuthMethod`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, DbEnum)]
#[ExistingTypePath = "crate::schema::sql_types::AuthMethod"]
pub enum PgAuthMethod {
    #[db_rename = "bearer"]
    Bearer,
    #[db_rename = "access_key"]
    AccessKey,
    #[db_rename = "internal"]
    Internal,
}

impl From<AuthMethod> for PgAuthMethod {
    fn from(value: AuthMethod) -> Self {
        match value {
            AuthMethod::Bearer => Self::Bearer,
            AuthMethod::AccessKey => Self::AccessKey,
            AuthMethod::Internal => Self::Internal,
        }
    }
}

impl From<PgAuthMethod> for AuthMethod {
    fn from(value: PgAuthMethod) -> Self {
        match value {
            PgAuthMethod::Bearer => Self::Bearer,
            PgAuthMethod::AccessKey => Self::AccessKey,
            PgAuthMethod::Internal => Self::Internal,
        }
    }
}

/// Database mirror of [`FinalResult`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, DbEnum)]
#[ExistingTypePath = "crate::schema::sql_types::FinalResult"]
pub enum PgFinalResult {
    #[db_rename = "success"]
    Success,
    #[db_rename = "multi_status"]
    MultiStatus,
    #[db_rename = "user_error"]
    UserError,
    #[db_rename = "unprocessable"]
    Unprocessable,
    #[db_rename = "aborted"]
    Aborted,
    #[db_rename = "system_error"]
    SystemError,
}

impl From<FinalResult> for PgFinalResult {
    fn from(value: FinalResult) -> Self {
        match value {
            FinalResult::Success => Self::Success,
            FinalResult::MultiStatus => Self::MultiStatus,
            FinalResult::UserError => Self::UserError,
            FinalResult::Unprocessable => Self::Unprocessable,
            FinalResult::Aborted => Self::Aborted,
            FinalResult::SystemError => Self::SystemError,
        }
    }
}

impl From<PgFinalResult> for FinalResult {
    fn from(value: PgFinalResult) -> Self {
        match value {
            PgFinalResult::Success => Self::Success,
            PgFinalResult::MultiStatus => Self::MultiStatus,
            PgFinalResult::UserError => Self::UserError,
            PgFinalResult::Unprocessable => Self::Unprocessable,
            PgFinalResult::Aborted => Self::Aborted,
            PgFinalResult::SystemError => Self::SystemError,
        }
    }
}

/// Database mirror of [`StepAction`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, DbEnum)]
#[ExistingTypePath = "crate::schema::sql_types::StepAction"]
pub enum PgStepAction {
    #[db_rename = "put_in_incoming_bucket"]
    PutInIncomingBucket,
}

impl From<StepAction> for PgStepAction {
    fn from(value: StepAction) -> Self {
        match value {
            StepAction::PutInIncomingBucket => Self::PutInIncomingBucket,
        }
    }
}

impl From<PgStepAction> for StepAction {
    fn from(value: PgStepAction) -> Self {
        match value {
            PgStepAction::PutInIncomingBucket => Self::PutInIncomingBucket,
        }
    }
}

/// Database mirror of [`StepState`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, DbEnum)]
#[ExistingTypePath = "crate::schema::sql_types::StepState"]
pub enum PgStepState {
    #[db_rename = "success"]
    Success,
    #[db_rename = "system_error"]
    SystemError,
}

impl From<StepState> for PgStepState {
    fn from(value: StepState) -> Self {
        match value {
            StepState::Success => Self::Success,
            StepState::SystemError => Self::SystemError,
        }
    }
}

impl From<PgStepState> for StepState {
    fn from(value: PgStepState) -> Self {
        match value {
            PgStepState::Success => Self::Success,
            PgStepState::SystemError => Self::SystemError,
        }
    }
}
