//! Engine configuration.
//!
//! Values come from built-in defaults, overridden by environment variables
//! (a `.env` file is loaded by the CLI before this runs):
//!
//! | Variable             | Meaning                                      |
//! |----------------------|----------------------------------------------|
//! | `REGLOAD_CATALOG`    | Path to the catalog JSON file                |
//! | `REGLOAD_CATEGORIES` | Path to a JSON object replacing the category table |

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const CATALOG_ENV: &str = "REGLOAD_CATALOG";
pub const CATEGORIES_ENV: &str = "REGLOAD_CATEGORIES";

/// Registration category name → stored category label.
///
/// The empty name is a real key: a blank category cell is "Uncategorized".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTable(BTreeMap<String, String>);

impl CategoryTable {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self(entries)
    }

    /// Exact, case-sensitive lookup.
    pub fn code_for(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Load a table from a JSON object file.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let display = path.display().to_string();
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::IoError {
            path: display.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::InvalidCategories {
            path: display,
            source,
        })
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        let entries = [
            ("analysis", "Analysis"),
            ("communication", "Communication"),
            ("data", "Data"),
            ("hypothesis", "Hypothesis"),
            ("instrumentation", "Instrumentation"),
            ("methods and measures", "Methods and Measures"),
            ("procedure", "Procedure"),
            ("project", "Project"),
            ("software", "Software"),
            ("other", "Other"),
            ("", "Uncategorized"),
        ];
        Self(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// Settings shared by every upload in a process.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub categories: CategoryTable,
    pub catalog_path: Option<PathBuf>,
}

impl EngineConfig {
    /// Build from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(env::var(CATALOG_ENV).ok(), env::var(CATEGORIES_ENV).ok())
    }

    fn from_vars(catalog: Option<String>, categories: Option<String>) -> Result<Self, ConfigError> {
        let categories = match categories.filter(|p| !p.trim().is_empty()) {
            Some(path) => CategoryTable::from_path(path)?,
            None => CategoryTable::default(),
        };

        Ok(Self {
            categories,
            catalog_path: catalog.filter(|p| !p.trim().is_empty()).map(PathBuf::from),
        })
    }

    pub fn with_catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }
}
