//! Report archive packaging.
//!
//! Inline batch submissions are wrapped into a single-file tar+gzip archive
//! together with a manifest before anything else happens; the request id is
//! computed over the archive bytes, so the stored artifact and its identity
//! always match byte for byte. Packing is deterministic (fixed header
//! metadata) for exactly that reason.

use std::collections::BTreeMap;
use std::io::Read;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, TRACING_TARGET};

/// File name of the archive manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

/// File name of the report payload inside an inline-batch archive.
pub const REPORT_FILE: &str = "report-file.json";

/// Archive manifest describing the wrapped payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Payload format version.
    pub version: String,
    /// Payload type.
    #[serde(rename = "type")]
    pub kind: String,
}

impl Manifest {
    /// Manifest for inline account-metrics batches.
    pub fn account_metrics() -> Self {
        Self {
            version: "1".to_owned(),
            kind: "accountMetrics".to_owned(),
        }
    }
}

/// Packs an inline report payload plus manifest into a tar+gzip archive.
pub fn pack_report(report: &serde_json::Value) -> Result<Vec<u8>> {
    let manifest = serde_json::to_vec(&Manifest::account_metrics())?;
    let payload = serde_json::to_vec(report)?;
    pack(&[(MANIFEST_FILE, &manifest), (REPORT_FILE, &payload)])
}

/// Packs named files into a tar+gzip archive with fixed header metadata.
pub fn pack(files: &[(&str, &[u8])]) -> Result<Vec<u8>> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (name, data) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        // Fixed mtime keeps identical payloads byte-identical across packs.
        header.set_mtime(0);
        header.set_cksum();
        builder
            .append_data(&mut header, name, *data)
            .map_err(|e| Error::internal().with_message("failed to append archive entry").with_source(e))?;
    }

    let encoder = builder
        .into_inner()
        .map_err(|e| Error::internal().with_message("failed to finish archive").with_source(e))?;
    let archived = encoder
        .finish()
        .map_err(|e| Error::internal().with_message("failed to finish gzip stream").with_source(e))?;

    tracing::trace!(
        target: TRACING_TARGET,
        entries = files.len(),
        archive_bytes = archived.len(),
        "Packed report archive"
    );
    Ok(archived)
}

/// Expands a tar+gzip archive into its named files.
pub fn unpack(bytes: &[u8]) -> Result<BTreeMap<String, Vec<u8>>> {
    let mut archive = tar::Archive::new(GzDecoder::new(bytes));
    let entries = archive
        .entries()
        .map_err(|e| Error::invalid_request().with_message("not a valid gzip archive").with_source(e))?;

    let mut files = BTreeMap::new();
    for entry in entries {
        let mut entry = entry
            .map_err(|e| Error::invalid_request().with_message("corrupt archive entry").with_source(e))?;
        let name = entry
            .path()
            .map_err(|e| Error::invalid_request().with_message("invalid entry path").with_source(e))?
            .to_string_lossy()
            .into_owned();
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut data)
            .map_err(|e| Error::invalid_request().with_message("truncated archive entry").with_source(e))?;
        files.insert(name, data);
    }

    tracing::trace!(
        target: TRACING_TARGET,
        entries = files.len(),
        "Unpacked report archive"
    );
    Ok(files)
}

/// Returns whether the bytes start with the gzip magic number.
pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0x1f, 0x8b])
}

/// Returns whether the bytes start with the zip magic number.
///
/// Spreadsheet (`.xlsx`) uploads are zip containers.
pub fn is_zip(bytes: &[u8]) -> bool {
    bytes.starts_with(b"PK\x03\x04")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_report_round_trip() {
        let report = serde_json::json!({"events": [{"account": "a1", "quantity": 3}]});
        let archived = pack_report(&report).unwrap();
        assert!(is_gzip(&archived));

        let files = unpack(&archived).unwrap();
        assert_eq!(files.len(), 2);

        let manifest: Manifest = serde_json::from_slice(&files[MANIFEST_FILE]).unwrap();
        assert_eq!(manifest, Manifest::account_metrics());

        let payload: serde_json::Value = serde_json::from_slice(&files[REPORT_FILE]).unwrap();
        assert_eq!(payload, report);
    }

    #[test]
    fn test_pack_is_deterministic() {
        let report = serde_json::json!({"events": []});
        let first = pack_report(&report).unwrap();
        let second = pack_report(&report).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unpack_rejects_garbage() {
        assert!(unpack(b"definitely not a tarball").is_err());
    }

    #[test]
    fn test_magic_sniffing() {
        assert!(is_zip(b"PK\x03\x04rest"));
        assert!(!is_gzip(b"PK\x03\x04rest"));
        assert!(!is_zip(b""));
    }
}
