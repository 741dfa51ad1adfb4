//! Bulk upload orchestration.
//!
//! # Document layout
//!
//! ```text
//! line 1   title,description,...,q1,q2        headers (case-insensitive)
//! line 2   <schema id>,,,...                  only column 0 is read
//! line 3+  one registration per line
//! ```
//!
//! # Lifecycle
//!
//! ```text
//! Initializing ──▶ HeaderValidated ──▶ RowsBuilt ──validate()──▶ Validated
//!      │                 │
//!      └──── Err(UploadError) ◀───────┘   (unknown schema, bad headers, ...)
//! ```
//!
//! Fatal problems surface as `Err` from the constructors before any row is
//! touched. Cell problems never do: [`BulkUpload::validate`] walks every cell
//! of every row and collects [`ErrorRecord`]s, and the best-effort parse is
//! available from [`BulkUpload::get_parsed`] whatever the outcome.

pub mod row;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::error::UploadError;
use crate::fields::FieldContext;
use crate::logs::{log_error, log_info, log_success, log_warning};
use crate::parser::{self, CsvDocument};
use crate::schema::SchemaRegistry;

pub use row::{Cell, ErrorRecord, ParsedRow, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadState {
    Initializing,
    HeaderValidated,
    RowsBuilt,
    Validated,
}

/// Raw and parsed echo of one registration line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationDump {
    pub csv_raw: String,
    pub csv_parsed: ParsedRow,
}

/// Everything parsed from an upload, valid or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    pub schema_id: String,
    pub registrations: Vec<RegistrationDump>,
}

/// One uploaded document, bound to a provider and its schema.
pub struct BulkUpload<'a> {
    provider_id: String,
    schema_id: String,
    encoding: String,
    headers: Vec<String>,
    registry: SchemaRegistry,
    rows: Vec<Row>,
    errors: Vec<ErrorRecord>,
    state: UploadState,
    ctx: FieldContext<'a>,
}

impl<'a> BulkUpload<'a> {
    /// Read an upload from UTF-8 text.
    pub fn parse(
        text: &str,
        provider_id: &str,
        catalog: &'a dyn Catalog,
        config: &'a EngineConfig,
    ) -> Result<Self, UploadError> {
        let document = parser::parse_document(text, "utf-8")?;
        Self::from_document(document, provider_id, catalog, config)
    }

    /// Read an upload from raw bytes, detecting their encoding.
    pub fn from_bytes(
        bytes: &[u8],
        provider_id: &str,
        catalog: &'a dyn Catalog,
        config: &'a EngineConfig,
    ) -> Result<Self, UploadError> {
        let document = parser::parse_bytes_auto(bytes)?;
        Self::from_document(document, provider_id, catalog, config)
    }

    pub fn from_document(
        document: CsvDocument,
        provider_id: &str,
        catalog: &'a dyn Catalog,
        config: &'a EngineConfig,
    ) -> Result<Self, UploadError> {
        log_state(UploadState::Initializing);
        if document.headers.is_empty() {
            log_error("Upload is empty");
            return Err(UploadError::EmptyDocument);
        }

        let headers: Vec<String> = document
            .headers
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();

        let mut records = document.records.into_iter();
        let schema_row = records.next().ok_or(UploadError::MissingSchemaRow)?;
        let schema_id = schema_row
            .values
            .first()
            .map(|v| v.trim().to_string())
            .unwrap_or_default();
        if schema_id.is_empty() {
            return Err(UploadError::MissingSchemaId);
        }

        log_info(format!(
            "Resolving schema \"{}\" for provider \"{}\"...",
            schema_id, provider_id
        ));
        let registry = resolve_registry(catalog, provider_id, &schema_id)?;
        log_success(format!(
            "Schema has {} questions",
            registry.question_ids().len()
        ));

        validate_headers(&headers, &registry)?;
        log_state(UploadState::HeaderValidated);

        let rows = records
            .map(|record| Row::new(record.line, &headers, &record.values, &registry))
            .collect::<Result<Vec<_>, _>>()?;
        log_state(UploadState::RowsBuilt);
        log_success(format!("Built {} registration rows", rows.len()));

        Ok(Self {
            provider_id: provider_id.to_string(),
            schema_id,
            encoding: document.encoding,
            headers,
            registry,
            rows,
            errors: Vec::new(),
            state: UploadState::RowsBuilt,
            ctx: FieldContext::new(catalog, &config.categories),
        })
    }

    /// Validate every cell of every row.
    ///
    /// Errors are appended in row-then-column order. A second call is a
    /// no-op: cells are memoized and the error list is built once.
    pub fn validate(&mut self) {
        if self.state == UploadState::Validated {
            return;
        }

        for row in &self.rows {
            row.validate(&self.ctx);
            self.errors.extend(row.errors().cloned());
        }
        self.state = UploadState::Validated;
        log_state(self.state);

        if self.errors.is_empty() {
            log_success(format!("All {} rows valid", self.rows.len()));
        } else {
            let bad_rows: HashSet<usize> = self.errors.iter().map(|e| e.row_index).collect();
            log_warning(format!(
                "{} errors in {} of {} rows",
                self.errors.len(),
                bad_rows.len(),
                self.rows.len()
            ));
        }
    }

    /// True once [`validate`](Self::validate) has run and found nothing.
    pub fn is_valid(&self) -> bool {
        self.state == UploadState::Validated && self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ErrorRecord] {
        &self.errors
    }

    /// Raw and parsed echo of every registration line.
    pub fn get_parsed(&self) -> UploadResult {
        let registrations = self
            .rows
            .iter()
            .map(|row| RegistrationDump {
                csv_raw: row.get_raw_value(),
                csv_parsed: row.get_parsed_value(&self.ctx),
            })
            .collect();

        UploadResult {
            schema_id: self.schema_id.clone(),
            registrations,
        }
    }

    pub fn schema_id(&self) -> &str {
        &self.schema_id
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Lowercased document headers, in column order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn expected_headers(&self) -> Vec<String> {
        self.registry.expected_headers()
    }
}

/// Headers a template for this provider/schema pair must carry.
pub fn template_headers(
    catalog: &dyn Catalog,
    provider_id: &str,
    schema_id: &str,
) -> Result<Vec<String>, UploadError> {
    Ok(resolve_registry(catalog, provider_id, schema_id)?.expected_headers())
}

fn resolve_registry(
    catalog: &dyn Catalog,
    provider_id: &str,
    schema_id: &str,
) -> Result<SchemaRegistry, UploadError> {
    let document = catalog
        .registration_schema(provider_id, schema_id)
        .map_err(|e| {
            log_error(e.to_string());
            e
        })?;
    Ok(SchemaRegistry::from_value(&document)?)
}

/// Every expected header must be present, every present header known, and
/// none repeated.
fn validate_headers(actual: &[String], registry: &SchemaRegistry) -> Result<(), UploadError> {
    let mut present: HashSet<&str> = HashSet::new();
    let mut duplicate: Vec<String> = Vec::new();
    for header in actual {
        if !present.insert(header.as_str()) && !duplicate.contains(header) {
            duplicate.push(header.clone());
        }
    }
    if !duplicate.is_empty() {
        log_error(format!("Duplicate headers: {}", duplicate.join(", ")));
        return Err(UploadError::DuplicateHeaders { duplicate });
    }

    let missing: Vec<String> = registry
        .expected_headers()
        .into_iter()
        .filter(|h| !present.contains(h.as_str()))
        .collect();
    if !missing.is_empty() {
        log_error(format!("Missing headers: {}", missing.join(", ")));
        return Err(UploadError::InvalidHeaders { missing });
    }

    let unknown: Vec<String> = actual
        .iter()
        .filter(|h| !registry.contains(h))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        log_error(format!("Unknown headers: {}", unknown.join(", ")));
        return Err(UploadError::UnknownHeaders { unknown });
    }

    Ok(())
}

fn log_state(state: UploadState) {
    log_info(format!("Upload state: {:?}", state));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FileCatalog;
    use crate::error::SchemaLookupError;
    use crate::fields::testing;
    use serde_json::json;

    const HEADERS: &[&str] = &[
        "Title",
        "Description",
        "Admin",
        "Read-Write",
        "Read-Only",
        "Bibliographic Contributors",
        "Category",
        "Affiliated Institutions",
        "License",
        "Subjects",
        "Tags",
        "Project GUID",
        "External ID",
        "q1",
        "q2",
        "q3",
        "q3a",
    ];

    fn catalog() -> FileCatalog {
        let mut catalog = testing::catalog();
        catalog.insert_schema(
            "osf",
            "prereg",
            json!({
                "pages": [
                    { "questions": [
                        { "qid": "q1", "type": "string", "required": true },
                        { "qid": "q2", "type": "choose", "format": "singleselect",
                          "options": ["Yes", "No"] }
                    ] },
                    { "questions": [
                        { "qid": "q3", "type": "choose", "format": "multiselect",
                          "options": ["a", "b"],
                          "properties": [{ "id": "a", "type": "string" }] }
                    ] }
                ]
            }),
        );
        catalog
    }

    fn valid_row() -> Vec<&'static str> {
        vec![
            "My Study",
            "A description",
            "Jane Doe<jane@example.com>",
            "",
            "",
            "John Roe<john@example.com>",
            "analysis",
            "Center for Open Science",
            "CC-BY; 2020; Jane Doe, John Roe",
            "Psychology; Biology",
            "tag1;tag2",
            "abc12",
            "ext-1",
            "An answer",
            "Yes",
            "a;b",
            "Nested answer",
        ]
    }

    fn document(headers: &[&str], schema_id: &str, rows: &[Vec<&str>]) -> String {
        let mut buf = Vec::new();
        {
            let mut writer = csv::Writer::from_writer(&mut buf);
            writer.write_record(headers).unwrap();
            let mut schema_line = vec![""; headers.len()];
            schema_line[0] = schema_id;
            writer.write_record(&schema_line).unwrap();
            for row in rows {
                writer.write_record(row).unwrap();
            }
            writer.flush().unwrap();
        }
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_valid_upload() {
        let catalog = catalog();
        let config = EngineConfig::default();
        let text = document(HEADERS, "prereg", &[valid_row()]);

        let mut upload = BulkUpload::parse(&text, "osf", &catalog, &config).unwrap();
        assert_eq!(upload.state(), UploadState::RowsBuilt);
        assert!(!upload.is_valid());

        upload.validate();
        assert!(upload.is_valid(), "{:?}", upload.errors());
        assert_eq!(upload.schema_id(), "prereg");

        let parsed = upload.get_parsed();
        let first = &parsed.registrations[0].csv_parsed;
        assert_eq!(first.metadata["license"]["required_field"]["year"], json!("2020"));
        assert_eq!(first.metadata["category"], json!("Analysis"));
        assert_eq!(first.metadata["read-write"], json!([]));
        assert_eq!(first.registration_responses["q3"], json!(["a", "b"]));
        assert_eq!(first.registration_responses["q3a"], json!("Nested answer"));
        assert_eq!(
            first.metadata.len() + first.registration_responses.len(),
            HEADERS.len()
        );
    }

    #[test]
    fn test_mixed_upload_collects_every_error() {
        let catalog = catalog();
        let config = EngineConfig::default();

        let mut missing_title = valid_row();
        missing_title[0] = "  ";
        let mut bad_category = valid_row();
        bad_category[6] = "Not a category";

        let text = document(HEADERS, "prereg", &[valid_row(), missing_title, bad_category]);
        let mut upload = BulkUpload::parse(&text, "osf", &catalog, &config).unwrap();
        upload.validate();

        assert!(!upload.is_valid());
        assert_eq!(
            upload.errors(),
            &[
                ErrorRecord {
                    header: "title".into(),
                    column_index: 0,
                    row_index: 4,
                    missing: true,
                    invalid: false,
                },
                ErrorRecord {
                    header: "category".into(),
                    column_index: 6,
                    row_index: 5,
                    missing: false,
                    invalid: true,
                },
            ]
        );

        let parsed = upload.get_parsed();
        assert_eq!(parsed.registrations.len(), 3);
        assert_eq!(parsed.registrations[1].csv_parsed.metadata["title"], json!(""));
        assert_eq!(parsed.registrations[2].csv_parsed.metadata["category"], json!(""));
        assert_eq!(parsed.registrations[2].csv_parsed.metadata["title"], json!("My Study"));
    }

    #[test]
    fn test_validate_twice_does_not_duplicate_errors() {
        let catalog = catalog();
        let config = EngineConfig::default();
        let mut row = valid_row();
        row[14] = "Maybe";

        let text = document(HEADERS, "prereg", &[row]);
        let mut upload = BulkUpload::parse(&text, "osf", &catalog, &config).unwrap();

        let before = upload.get_parsed();
        upload.validate();
        upload.validate();
        let after = upload.get_parsed();

        assert_eq!(upload.errors().len(), 1);
        assert_eq!(before, after);
    }

    #[test]
    fn test_raw_echo_is_comma_joined() {
        let catalog = catalog();
        let config = EngineConfig::default();
        let text = document(HEADERS, "prereg", &[valid_row()]);

        let upload = BulkUpload::parse(&text, "osf", &catalog, &config).unwrap();
        let raw = &upload.get_parsed().registrations[0].csv_raw;

        assert!(raw.starts_with("My Study,A description,Jane Doe<jane@example.com>,,,"));
        assert!(raw.ends_with(",An answer,Yes,a;b,Nested answer"));
    }

    #[test]
    fn test_missing_header_is_fatal() {
        let catalog = catalog();
        let config = EngineConfig::default();
        let headers: Vec<&str> = HEADERS.iter().copied().filter(|h| *h != "q2").collect();
        let mut row = valid_row();
        row.remove(14);

        let text = document(&headers, "prereg", &[row]);
        let err = BulkUpload::parse(&text, "osf", &catalog, &config).err().unwrap();

        match err {
            UploadError::InvalidHeaders { missing } => assert_eq!(missing, vec!["q2"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_header_is_fatal() {
        let catalog = catalog();
        let config = EngineConfig::default();
        let mut headers = HEADERS.to_vec();
        headers.push("Notes");
        let mut row = valid_row();
        row.push("extra");

        let text = document(&headers, "prereg", &[row]);
        let err = BulkUpload::parse(&text, "osf", &catalog, &config).err().unwrap();
        assert!(matches!(err, UploadError::UnknownHeaders { ref unknown } if unknown == &["notes"]));
    }

    #[test]
    fn test_repeated_header_is_fatal() {
        let catalog = catalog();
        let config = EngineConfig::default();
        let mut headers = HEADERS.to_vec();
        headers.push("Q1");
        let mut row = valid_row();
        row.push("second");

        let text = document(&headers, "prereg", &[row]);
        let err = BulkUpload::parse(&text, "osf", &catalog, &config).err().unwrap();

        match err {
            UploadError::DuplicateHeaders { duplicate } => assert_eq!(duplicate, vec!["q1"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_uppercase_question_ids_match_headers() {
        let mut catalog = catalog();
        catalog.insert_schema(
            "osf",
            "upper",
            json!({ "pages": [{ "questions": [
                { "qid": "Q1", "required": true, "properties": [{ "id": "Detail" }] }
            ] }] }),
        );
        let config = EngineConfig::default();

        let mut headers = HEADERS[..13].to_vec();
        headers.extend(["Q1", "Q1Detail"]);
        let mut row = valid_row()[..13].to_vec();
        row.extend(["An answer", "More"]);

        let text = document(&headers, "upper", &[row]);
        let mut upload = BulkUpload::parse(&text, "osf", &catalog, &config).unwrap();
        upload.validate();

        assert!(upload.is_valid(), "{:?}", upload.errors());
        let parsed = upload.get_parsed();
        let responses = &parsed.registrations[0].csv_parsed.registration_responses;
        assert_eq!(responses["q1"], json!("An answer"));
        assert_eq!(responses["q1detail"], json!("More"));
    }

    #[test]
    fn test_unknown_schema_is_fatal() {
        let catalog = catalog();
        let config = EngineConfig::default();

        let text = document(HEADERS, "nope", &[valid_row()]);
        let err = BulkUpload::parse(&text, "osf", &catalog, &config).err().unwrap();
        assert!(matches!(
            err,
            UploadError::SchemaLookup(SchemaLookupError::SchemaNotFound { .. })
        ));

        let text = document(HEADERS, "prereg", &[valid_row()]);
        let err = BulkUpload::parse(&text, "elsewhere", &catalog, &config).err().unwrap();
        assert!(matches!(
            err,
            UploadError::SchemaLookup(SchemaLookupError::ProviderNotFound(_))
        ));
    }

    #[test]
    fn test_malformed_schema_is_fatal() {
        let mut catalog = catalog();
        catalog.insert_schema("osf", "broken", json!({ "pages": [{ "title": "no questions" }] }));
        let config = EngineConfig::default();

        let text = document(HEADERS, "broken", &[valid_row()]);
        let err = BulkUpload::parse(&text, "osf", &catalog, &config).err().unwrap();
        assert!(matches!(err, UploadError::Schema(_)));
    }

    #[test]
    fn test_document_shape_errors() {
        let catalog = catalog();
        let config = EngineConfig::default();

        assert!(matches!(
            BulkUpload::parse("", "osf", &catalog, &config).err(),
            Some(UploadError::EmptyDocument)
        ));
        assert!(matches!(
            BulkUpload::parse("title,description\n", "osf", &catalog, &config).err(),
            Some(UploadError::MissingSchemaRow)
        ));
        assert!(matches!(
            BulkUpload::parse("title,description\n ,x\n", "osf", &catalog, &config).err(),
            Some(UploadError::MissingSchemaId)
        ));
    }

    #[test]
    fn test_schema_only_upload_has_no_rows() {
        let catalog = catalog();
        let config = EngineConfig::default();
        let text = document(HEADERS, "prereg", &[]);

        let mut upload = BulkUpload::from_bytes(text.as_bytes(), "osf", &catalog, &config).unwrap();
        upload.validate();

        assert!(upload.is_valid());
        assert!(upload.get_parsed().registrations.is_empty());
        assert_eq!(upload.encoding(), "utf-8");
    }

    #[test]
    fn test_template_headers() {
        let catalog = catalog();
        let headers = template_headers(&catalog, "osf", "prereg").unwrap();

        assert_eq!(headers.len(), HEADERS.len());
        assert_eq!(headers[0], "title");
        assert_eq!(&headers[13..], &["q1", "q2", "q3", "q3a"]);
    }
}
