//! Request classification and submission metadata.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Kind of usage-report submission.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestType {
    /// Inline JSON batch, wrapped into an archive at intake.
    InlineBatch,
    /// Pre-archived tar+gzip upload.
    ArchiveUpload,
    /// Spreadsheet report upload.
    SpreadsheetReport,
}

impl RequestType {
    /// Returns whether this is a spreadsheet report submission.
    #[inline]
    pub fn is_spreadsheet(self) -> bool {
        matches!(self, RequestType::SpreadsheetReport)
    }
}

/// How the submitting caller authenticated.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuthMethod {
    /// Bearer token issued to a user identity.
    Bearer,
    /// Long-lived access key bound to a storage prefix.
    AccessKey,
    /// Internal service-to-service credential.
    Internal,
}

/// Submission metadata recorded alongside a status record.
///
/// Today this only carries spreadsheet-report details; inline and archive
/// submissions have no metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMetadata {
    /// Report version identifier for spreadsheet uploads.
    pub report_urn: i64,
    /// Start of the reported window, when supplied as query parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Timestamp>,
    /// End of the reported window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Timestamp>,
    /// Whether the date window came from query parameters rather than the
    /// report content.
    #[serde(default)]
    pub dates_from_query: bool,
}

impl RequestMetadata {
    /// Metadata for a spreadsheet report without an explicit date window.
    pub fn for_report(report_urn: i64) -> Self {
        Self {
            report_urn,
            start_date: None,
            end_date: None,
            dates_from_query: false,
        }
    }

    /// Attaches an explicit date window supplied by the caller.
    pub fn with_date_window(mut self, start: Timestamp, end: Timestamp) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self.dates_from_query = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_type_codes() {
        assert_eq!(RequestType::InlineBatch.to_string(), "inline_batch");
        assert_eq!(
            serde_json::to_string(&RequestType::SpreadsheetReport).unwrap(),
            "\"spreadsheet_report\""
        );
    }

    #[test]
    fn test_metadata_date_window() {
        let start = Timestamp::UNIX_EPOCH;
        let end = Timestamp::from_second(3600).unwrap();
        let meta = RequestMetadata::for_report(42).with_date_window(start, end);
        assert!(meta.dates_from_query);
        assert!(meta.start_date.is_some());
    }
}
