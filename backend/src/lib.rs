//! # Regload - bulk registration upload validation
//!
//! Regload checks spreadsheet uploads of research registrations against a
//! provider's registration schema and a small set of fixed metadata columns,
//! then reports every problem cell by cell alongside a best-effort parse.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│ BulkUpload  │────▶│   Report    │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │ (rows/cells)│     │   (JSON)    │
//! └─────────────┘     └─────────────┘     └──────┬──────┘     └─────────────┘
//!                                                │
//!                          SchemaRegistry ◀──────┴──────▶ Catalog
//!                        (metadata + questions)     (schemas, licenses, ...)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use regload::{BulkUpload, EngineConfig, FileCatalog, UploadReport};
//!
//! let catalog = FileCatalog::from_path("catalog.json")?;
//! let config = EngineConfig::from_env()?;
//! let bytes = std::fs::read("upload.csv")?;
//!
//! let mut upload = BulkUpload::from_bytes(&bytes, "osf", &catalog, &config)?;
//! upload.validate();
//! println!("{}", serde_json::to_string_pretty(&UploadReport::from(&upload))?);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types
//! - [`parser`] - CSV decoding and splitting
//! - [`schema`] - Schema documents and the merged rule registry
//! - [`catalog`] - Lookups against external reference data
//! - [`fields`] - Field kinds and their validators
//! - [`upload`] - Rows, cells and the upload orchestrator
//! - [`report`] - JSON reports
//! - [`config`] - Environment configuration
//! - [`logs`] - Progress logging

// Core modules
pub mod config;
pub mod error;
pub mod logs;

// Parsing
pub mod parser;

// Schemas and reference data
pub mod catalog;
pub mod schema;

// Validation
pub mod fields;
pub mod upload;

// Output
pub mod report;

// =============================================================================
// Re-exports
// =============================================================================

pub use catalog::{Catalog, FileCatalog, LicenseRecord};
pub use config::{CategoryTable, EngineConfig};
pub use error::{
    CatalogError, ConfigError, CsvError, SchemaError, SchemaLookupError, UploadError,
};
pub use fields::{FieldContext, FieldKind, ParseOutcome, Problem};
pub use parser::{parse_bytes_auto, parse_csv_file_auto, parse_document, CsvDocument};
pub use report::{error_report, UploadReport};
pub use schema::{SchemaRegistry, ValidationRule, METADATA_FIELDS};
pub use upload::{
    template_headers, BulkUpload, Cell, ErrorRecord, ParsedRow, RegistrationDump, Row,
    UploadResult, UploadState,
};
