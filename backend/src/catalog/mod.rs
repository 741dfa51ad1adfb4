//! Master data the engine reads but never writes.
//!
//! The [`Catalog`] trait is the seam to whatever stores providers, schemas,
//! licenses, subjects, institutions and projects. Lookups are blocking and the
//! engine does not cache them: a subject named on 500 rows is looked up 500
//! times unless the implementation caches.
//!
//! [`FileCatalog`] is a JSON-file implementation used by the CLI and tests.

pub mod file;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaLookupError;

pub use file::{FileCatalog, ProjectRecord, ProviderEntry};

/// A license as known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    pub name: String,
    /// Custom properties the license requires (e.g. `year`, `copyrightHolders`).
    #[serde(default)]
    pub properties: Vec<String>,
}

impl LicenseRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn with_properties(mut self, properties: &[&str]) -> Self {
        self.properties = properties.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn has_required_fields(&self) -> bool {
        !self.properties.is_empty()
    }
}

/// Read-only lookups against external master data.
pub trait Catalog {
    /// Raw registration schema document for a provider.
    fn registration_schema(&self, provider_id: &str, schema_id: &str)
        -> Result<Value, SchemaLookupError>;

    /// License by name, compared case-insensitively.
    fn license_by_name(&self, name: &str) -> Option<LicenseRecord>;

    /// The subset of `names` that are known subjects (exact text match).
    fn matching_subjects(&self, names: &[String]) -> HashSet<String>;

    /// The subset of `names` that are known institutions (exact name match).
    fn matching_institutions(&self, names: &[String]) -> HashSet<String>;

    /// Whether a non-deleted project exists with this guid.
    fn project_exists(&self, guid: &str) -> bool;
}
