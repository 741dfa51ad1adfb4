//! Error types for the bulk registration upload engine.
//!
//! Only conditions that abort a whole upload live here:
//!
//! - [`CsvError`] - the document could not be read or split
//! - [`SchemaLookupError`] - provider or registration schema unknown
//! - [`SchemaError`] - the registration schema document is malformed
//! - [`CatalogError`] - the catalog file could not be loaded
//! - [`ConfigError`] - engine configuration problems
//! - [`UploadError`] - top-level fatal upload errors
//!
//! Per-cell problems (missing or invalid values) are never errors in this
//! sense. They are collected as [`crate::upload::ErrorRecord`]s and the
//! upload keeps going.

use thiserror::Error;

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors while decoding or splitting the uploaded document.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read the file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The CSV reader rejected a record.
    #[error("Invalid CSV on line {line}: {message}")]
    Malformed { line: usize, message: String },
}

impl From<csv::Error> for CsvError {
    fn from(err: csv::Error) -> Self {
        let line = err
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or_default();
        CsvError::Malformed {
            line,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Schema Errors
// =============================================================================

/// The provider/schema pair could not be resolved.
#[derive(Debug, Error)]
pub enum SchemaLookupError {
    #[error("Registration provider with id \"{0}\" was not found")]
    ProviderNotFound(String),

    #[error("Schema with id \"{schema_id}\" was not found for provider \"{provider_id}\"")]
    SchemaNotFound {
        provider_id: String,
        schema_id: String,
    },
}

/// The registration schema document does not have the expected shape.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Structural validation failed.
    #[error("Malformed registration schema: {}", .errors.join("; "))]
    Malformed { errors: Vec<String> },

    /// Deserialization failed after structural validation.
    #[error("Malformed registration schema: {0}")]
    JsonError(#[from] serde_json::Error),
}

// =============================================================================
// Catalog Errors
// =============================================================================

/// Errors from loading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Catalog JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors from building the engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid category table in {path}: {source}")]
    InvalidCategories {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No catalog configured (pass --catalog or set REGLOAD_CATALOG)")]
    MissingCatalog,

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

// =============================================================================
// Upload Errors (fatal, whole-document)
// =============================================================================

/// Whole-document failures. Any of these aborts the upload before a single
/// row is validated.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Document could not be decoded or split.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// No header line.
    #[error("Upload is empty")]
    EmptyDocument,

    /// Header line present but no schema id line below it.
    #[error("Upload has no schema id row")]
    MissingSchemaRow,

    /// Schema id line present but its first column is blank.
    #[error("Schema id is blank in the first column of line 2")]
    MissingSchemaId,

    /// Provider or schema unknown.
    #[error(transparent)]
    SchemaLookup(#[from] SchemaLookupError),

    /// Schema document is corrupt.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Expected headers are absent from the document.
    #[error("Invalid csv headers: {}", .missing.join(","))]
    InvalidHeaders { missing: Vec<String> },

    /// The document carries headers no rule exists for.
    #[error("Unknown csv headers: {}", .unknown.join(","))]
    UnknownHeaders { unknown: Vec<String> },

    /// The same header appears in more than one column.
    #[error("Duplicate csv headers: {}", .duplicate.join(","))]
    DuplicateHeaders { duplicate: Vec<String> },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
