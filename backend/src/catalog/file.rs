//! JSON-file catalog.
//!
//! ```json
//! {
//!   "providers": { "osf": { "schemas": { "<schema id>": { "pages": [] } } } },
//!   "licenses": [{ "name": "MIT License", "properties": [] }],
//!   "subjects": ["Psychology"],
//!   "institutions": ["Center for Open Science"],
//!   "projects": [{ "guid": "abc12", "deleted": false }]
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Catalog, LicenseRecord};
use crate::error::{CatalogResult, SchemaLookupError};

/// Registration schemas of one provider, keyed by schema id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderEntry {
    #[serde(default)]
    pub schemas: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub guid: String,
    #[serde(default)]
    pub deleted: bool,
}

/// Catalog held entirely in memory, usually loaded from one JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileCatalog {
    #[serde(default)]
    pub providers: HashMap<String, ProviderEntry>,
    #[serde(default)]
    pub licenses: Vec<LicenseRecord>,
    #[serde(default)]
    pub subjects: HashSet<String>,
    #[serde(default)]
    pub institutions: HashSet<String>,
    #[serde(default)]
    pub projects: Vec<ProjectRecord>,
}

impl FileCatalog {
    /// Load a catalog from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> CatalogResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_value(value: Value) -> CatalogResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Register a schema document under a provider, creating the provider.
    pub fn insert_schema(&mut self, provider_id: &str, schema_id: &str, document: Value) {
        self.providers
            .entry(provider_id.to_string())
            .or_default()
            .schemas
            .insert(schema_id.to_string(), document);
    }
}

fn matching(known: &HashSet<String>, names: &[String]) -> HashSet<String> {
    names
        .iter()
        .filter(|name| known.contains(name.as_str()))
        .cloned()
        .collect()
}

impl Catalog for FileCatalog {
    fn registration_schema(
        &self,
        provider_id: &str,
        schema_id: &str,
    ) -> Result<Value, SchemaLookupError> {
        let provider = self
            .providers
            .get(provider_id)
            .ok_or_else(|| SchemaLookupError::ProviderNotFound(provider_id.to_string()))?;

        provider
            .schemas
            .get(schema_id)
            .cloned()
            .ok_or_else(|| SchemaLookupError::SchemaNotFound {
                provider_id: provider_id.to_string(),
                schema_id: schema_id.to_string(),
            })
    }

    fn license_by_name(&self, name: &str) -> Option<LicenseRecord> {
        let wanted = name.to_lowercase();
        self.licenses
            .iter()
            .find(|license| license.name.to_lowercase() == wanted)
            .cloned()
    }

    fn matching_subjects(&self, names: &[String]) -> HashSet<String> {
        matching(&self.subjects, names)
    }

    fn matching_institutions(&self, names: &[String]) -> HashSet<String> {
        matching(&self.institutions, names)
    }

    fn project_exists(&self, guid: &str) -> bool {
        self.projects.iter().any(|p| p.guid == guid && !p.deleted)
    }
}
