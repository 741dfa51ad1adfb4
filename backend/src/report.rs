//! JSON report of a finished upload.
//!
//! Wraps the parse dump and the error list with enough bookkeeping for a
//! caller to file or display it.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::UploadError;
use crate::upload::{BulkUpload, ErrorRecord, UploadResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    /// Unique report identifier
    pub upload_id: String,

    /// Status: "valid" or "invalid"
    pub status: String,

    /// RFC 3339 timestamp
    pub validated_at: String,

    pub provider_id: String,
    pub encoding: String,
    pub stats: ReportStats,
    pub result: UploadResult,
    pub errors: Vec<ErrorRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    pub rows: usize,
    pub rows_with_errors: usize,
    pub missing: usize,
    pub invalid: usize,
}

impl ReportStats {
    fn collect(row_count: usize, errors: &[ErrorRecord]) -> Self {
        let mut rows: Vec<usize> = errors.iter().map(|e| e.row_index).collect();
        rows.dedup();

        Self {
            rows: row_count,
            rows_with_errors: rows.len(),
            missing: errors.iter().filter(|e| e.missing).count(),
            invalid: errors.iter().filter(|e| e.invalid).count(),
        }
    }
}

impl From<&BulkUpload<'_>> for UploadReport {
    fn from(upload: &BulkUpload<'_>) -> Self {
        let errors = upload.errors().to_vec();

        UploadReport {
            upload_id: Uuid::new_v4().to_string(),
            status: if upload.is_valid() { "valid" } else { "invalid" }.to_string(),
            validated_at: Utc::now().to_rfc3339(),
            provider_id: upload.provider_id().to_string(),
            encoding: upload.encoding().to_string(),
            stats: ReportStats::collect(upload.rows().len(), &errors),
            result: upload.get_parsed(),
            errors,
        }
    }
}

/// Report for an upload rejected before any row was read.
pub fn error_report(error: &UploadError) -> Value {
    let (missing_headers, unknown_headers, duplicate_headers) = match error {
        UploadError::InvalidHeaders { missing } => (json!(missing), json!([]), json!([])),
        UploadError::UnknownHeaders { unknown } => (json!([]), json!(unknown), json!([])),
        UploadError::DuplicateHeaders { duplicate } => (json!([]), json!([]), json!(duplicate)),
        _ => (json!([]), json!([]), json!([])),
    };

    json!({
        "uploadId": Uuid::new_v4().to_string(),
        "status": "error",
        "validatedAt": Utc::now().to_rfc3339(),
        "error": error.to_string(),
        "missingHeaders": missing_headers,
        "unknownHeaders": unknown_headers,
        "duplicateHeaders": duplicate_headers,
        "errors": []
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::fields::testing;

    fn upload_text(rows: &[&str]) -> String {
        let mut text = String::from(
            "title,description,admin,read-write,read-only,bibliographic contributors,\
             category,affiliated institutions,license,subjects,tags,project guid,external id,q1\n\
             s1,,,,,,,,,,,,,\n",
        );
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        text
    }

    fn catalog() -> crate::catalog::FileCatalog {
        let mut catalog = testing::catalog();
        catalog.insert_schema(
            "osf",
            "s1",
            json!({ "pages": [{ "questions": [{ "qid": "q1", "required": true }] }] }),
        );
        catalog
    }

    #[test]
    fn test_report_counts_errors() {
        let catalog = catalog();
        let config = EngineConfig::default();
        let text = upload_text(&[
            "A,d,Jane Doe<jane@example.com>,,,,,,MIT,Psychology,,,,yes",
            ",d,Jane Doe<jane@example.com>,,,,unknown,,MIT,Psychology,,,,",
            "C,d,Jane Doe<jane@example.com>,,,,data,,MIT,Psychology,,,,x",
        ]);

        let mut upload = BulkUpload::parse(&text, "osf", &catalog, &config).unwrap();
        upload.validate();
        let report = UploadReport::from(&upload);

        assert_eq!(report.status, "invalid");
        assert_eq!(report.provider_id, "osf");
        assert_eq!(
            report.stats,
            ReportStats {
                rows: 3,
                rows_with_errors: 1,
                missing: 2,
                invalid: 1,
            }
        );
        assert_eq!(report.result.registrations.len(), 3);
        assert!(Uuid::parse_str(&report.upload_id).is_ok());
    }

    #[test]
    fn test_valid_report_serializes_camel_case() {
        let catalog = catalog();
        let config = EngineConfig::default();
        let text = upload_text(&["A,d,Jane Doe<jane@example.com>,,,,,,MIT,Psychology,,,,yes"]);

        let mut upload = BulkUpload::parse(&text, "osf", &catalog, &config).unwrap();
        upload.validate();
        let value = serde_json::to_value(UploadReport::from(&upload)).unwrap();

        assert_eq!(value["status"], "valid");
        assert_eq!(value["stats"]["rowsWithErrors"], 0);
        assert_eq!(value["result"]["schema_id"], "s1");
        assert!(chrono::DateTime::parse_from_rfc3339(value["validatedAt"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_error_report_lists_missing_headers() {
        let err = UploadError::InvalidHeaders {
            missing: vec!["title".into(), "q1".into()],
        };
        let report = error_report(&err);

        assert_eq!(report["status"], "error");
        assert_eq!(report["missingHeaders"], json!(["title", "q1"]));
        assert_eq!(report["error"], "Invalid csv headers: title,q1");
    }

    #[test]
    fn test_error_report_lists_unknown_and_duplicate_headers() {
        let report = error_report(&UploadError::UnknownHeaders {
            unknown: vec!["notes".into()],
        });
        assert_eq!(report["unknownHeaders"], json!(["notes"]));
        assert_eq!(report["missingHeaders"], json!([]));

        let report = error_report(&UploadError::DuplicateHeaders {
            duplicate: vec!["q1".into()],
        });
        assert_eq!(report["duplicateHeaders"], json!(["q1"]));
        assert_eq!(report["error"], "Duplicate csv headers: q1");
    }
}
