//! Upload intake: validation, packaging and identity derivation.
//!
//! Intake turns a raw submission into a [`PreparedUpload`]: the exact bytes
//! that will be stored, the content-hash identity derived from those bytes,
//! and the status record draft. Inline batches are packed into an archive
//! first so the stored artifact and its identity always match byte for
//! byte; archived and spreadsheet uploads pass through unchanged.

use bytes::Bytes;
use jiff::Timestamp;
use usagehub_core::types::{AuthMethod, CreateStatus, RequestMetadata, RequestType};
use usagehub_core::{archive, Error, RequestId, Result};

/// Identity and tenancy of the submitting caller.
#[derive(Debug, Clone)]
pub struct Submitter {
    /// How the caller authenticated.
    pub auth_method: AuthMethod,
    /// Tenant account, when the caller is account-bound.
    pub account_id: Option<String>,
    /// Tenant scoping key: account id or storage-prefix alias.
    pub account_or_prefix: Option<String>,
    /// Caller identity.
    pub iam_id: Option<String>,
    /// Caller email.
    pub email: Option<String>,
}

/// One inbound submission, before validation.
#[derive(Debug, Clone)]
pub enum UploadPayload {
    /// Inline JSON batch; wrapped into an archive at intake.
    InlineBatch {
        /// The submitted report document.
        report: serde_json::Value,
    },
    /// Pre-archived tar+gzip upload.
    Archive {
        /// Original file name of the upload.
        file_name: String,
        /// Raw upload bytes.
        bytes: Bytes,
    },
    /// Spreadsheet report upload.
    Spreadsheet {
        /// Original file name of the upload.
        file_name: String,
        /// Raw upload bytes.
        bytes: Bytes,
        /// Report version identifier.
        report_urn: i64,
        /// Optional explicit date window start.
        start_date: Option<Timestamp>,
        /// Optional explicit date window end.
        end_date: Option<Timestamp>,
    },
}

/// A validated submission, ready for the ingestion state machine.
#[derive(Debug, Clone)]
pub struct PreparedUpload {
    /// Content-hash identity of `bytes`.
    pub request_id: RequestId,
    /// The exact bytes that will be stored.
    pub bytes: Bytes,
    /// Name the artifact is stored under (`{request_id}.tar.gz` or
    /// `{request_id}.xlsx`).
    pub stored_file_name: String,
    /// Status record draft for this submission.
    pub draft: CreateStatus,
}

impl PreparedUpload {
    /// Validates a payload, derives its identity and builds the record
    /// draft.
    pub fn prepare(payload: UploadPayload, submitter: Submitter, now: Timestamp) -> Result<Self> {
        match payload {
            UploadPayload::InlineBatch { report } => {
                let packed = Bytes::from(archive::pack_report(&report)?);
                let request_id = RequestId::from_bytes(&packed);
                let stored_file_name = format!("{request_id}.tar.gz");
                let draft = draft(
                    &request_id,
                    RequestType::InlineBatch,
                    stored_file_name.clone(),
                    submitter,
                    now,
                    None,
                );
                Ok(Self {
                    request_id,
                    bytes: packed,
                    stored_file_name,
                    draft,
                })
            }
            UploadPayload::Archive { file_name, bytes } => {
                if !file_name.ends_with(".tar.gz") || !archive::is_gzip(&bytes) {
                    return Err(Error::unsupported_media().with_message(
                        "upload must end in .tar.gz and be a valid gzip archive",
                    ));
                }
                let request_id = RequestId::from_bytes(&bytes);
                let stored_file_name = format!("{request_id}.tar.gz");
                let draft = draft(
                    &request_id,
                    RequestType::ArchiveUpload,
                    file_name,
                    submitter,
                    now,
                    None,
                );
                Ok(Self {
                    request_id,
                    bytes,
                    stored_file_name,
                    draft,
                })
            }
            UploadPayload::Spreadsheet {
                file_name,
                bytes,
                report_urn,
                start_date,
                end_date,
            } => {
                if !file_name.ends_with(".xlsx") || !archive::is_zip(&bytes) {
                    return Err(Error::unsupported_media()
                        .with_message("upload must end in .xlsx and be a valid spreadsheet"));
                }
                let metadata = report_metadata(report_urn, start_date, end_date, now)?;
                let request_id = RequestId::from_bytes(&bytes);
                let stored_file_name = format!("{request_id}.xlsx");
                let draft = draft(
                    &request_id,
                    RequestType::SpreadsheetReport,
                    file_name,
                    submitter,
                    now,
                    Some(metadata),
                );
                Ok(Self {
                    request_id,
                    bytes,
                    stored_file_name,
                    draft,
                })
            }
        }
    }
}

fn draft(
    request_id: &RequestId,
    request_type: RequestType,
    input_file_name: String,
    submitter: Submitter,
    now: Timestamp,
    request_metadata: Option<RequestMetadata>,
) -> CreateStatus {
    CreateStatus {
        request_id: request_id.clone(),
        request_type,
        input_file_name,
        start_time: now,
        replay_attempt: 0,
        account_id: submitter.account_id,
        account_or_prefix: submitter.account_or_prefix,
        auth_method: submitter.auth_method,
        iam_id: submitter.iam_id,
        email: submitter.email,
        request_metadata,
    }
}

/// Validates the optional date window: both bounds or neither, start
/// strictly before end, end not in the future.
fn report_metadata(
    report_urn: i64,
    start_date: Option<Timestamp>,
    end_date: Option<Timestamp>,
    now: Timestamp,
) -> Result<RequestMetadata> {
    match (start_date, end_date) {
        (None, None) => Ok(RequestMetadata::for_report(report_urn)),
        (Some(start), Some(end)) => {
            if start >= end {
                return Err(Error::invalid_request()
                    .with_message("start date must be before end date"));
            }
            if end > now {
                return Err(
                    Error::invalid_request().with_message("end date must not be in the future")
                );
            }
            Ok(RequestMetadata::for_report(report_urn).with_date_window(start, end))
        }
        _ => Err(Error::invalid_request()
            .with_message("start and end date must be supplied together")),
    }
}
