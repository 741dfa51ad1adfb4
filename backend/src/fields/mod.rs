//! Field kinds and their validators.
//!
//! Every header resolves to exactly one [`FieldKind`]: the fixed metadata
//! names map through a static table, anything else is a questionnaire answer.
//! [`FieldKind::parse`] is the single dispatch site; each kind's grammar lives
//! in its own module.
//!
//! Validators never fail. They return a [`ParseOutcome`] and report problems
//! through a [`Problems`] sink, which the owning cell turns into error
//! records.

pub mod category;
pub mod contributor;
pub mod license;
pub mod metadata;
pub mod project;
pub mod response;
pub mod vocabulary;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::Catalog;
use crate::config::CategoryTable;
use crate::schema::ValidationRule;

// =============================================================================
// Field Kinds
// =============================================================================

/// Which validator handles a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    MetadataGeneric,
    ContributorList,
    License,
    Category,
    Subjects,
    Institutions,
    ProjectReference,
    QuestionnaireResponse,
}

static FIELD_KINDS: Lazy<HashMap<&'static str, FieldKind>> = Lazy::new(|| {
    HashMap::from([
        ("title", FieldKind::MetadataGeneric),
        ("description", FieldKind::MetadataGeneric),
        ("tags", FieldKind::MetadataGeneric),
        ("external id", FieldKind::MetadataGeneric),
        ("admin", FieldKind::ContributorList),
        ("read-write", FieldKind::ContributorList),
        ("read-only", FieldKind::ContributorList),
        ("bibliographic contributors", FieldKind::ContributorList),
        ("license", FieldKind::License),
        ("category", FieldKind::Category),
        ("subjects", FieldKind::Subjects),
        ("affiliated institutions", FieldKind::Institutions),
        ("project guid", FieldKind::ProjectReference),
    ])
});

impl FieldKind {
    /// Resolve a lowercase header to its kind.
    pub fn for_header(header: &str) -> Self {
        FIELD_KINDS
            .get(header)
            .copied()
            .unwrap_or(FieldKind::QuestionnaireResponse)
    }

    /// Metadata kinds land in `metadata`, the rest in `registration_responses`.
    pub fn is_metadata(self) -> bool {
        !matches!(self, FieldKind::QuestionnaireResponse)
    }

    /// Parse one raw cell value.
    ///
    /// A required cell that is blank short-circuits here with one missing
    /// problem, before any kind-specific grammar runs.
    pub fn parse(
        self,
        raw: &str,
        rule: &ValidationRule,
        ctx: &FieldContext<'_>,
        problems: &mut Problems,
    ) -> ParseOutcome {
        if rule.required && raw.trim().is_empty() {
            problems.missing();
            return ParseOutcome::Absent;
        }

        match self {
            FieldKind::MetadataGeneric => metadata::parse(raw, rule),
            FieldKind::ContributorList => contributor::parse(raw, problems),
            FieldKind::License => license::parse(raw, ctx.catalog, problems),
            FieldKind::Category => category::parse(raw, ctx.categories, problems),
            FieldKind::Subjects => vocabulary::parse_subjects(raw, ctx.catalog, problems),
            FieldKind::Institutions => vocabulary::parse_institutions(raw, ctx.catalog, problems),
            FieldKind::ProjectReference => project::parse(raw, ctx.catalog, problems),
            FieldKind::QuestionnaireResponse => response::parse(raw, rule, problems),
        }
    }
}

// =============================================================================
// Outcomes and Problems
// =============================================================================

/// Result of parsing one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Value(Value),
    /// Nothing could be produced.
    Absent,
}

impl ParseOutcome {
    pub fn value(&self) -> Option<&Value> {
        match self {
            ParseOutcome::Value(v) => Some(v),
            ParseOutcome::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, ParseOutcome::Absent)
    }

    /// Best-effort JSON echo; absent values render as `""`.
    pub fn to_json(&self) -> Value {
        match self {
            ParseOutcome::Value(v) => v.clone(),
            ParseOutcome::Absent => Value::String(String::new()),
        }
    }
}

impl From<Value> for ParseOutcome {
    fn from(value: Value) -> Self {
        ParseOutcome::Value(value)
    }
}

/// What went wrong with a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Problem {
    Missing,
    Invalid,
}

/// Sink validators log into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Problems(Vec<Problem>);

impl Problems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn missing(&mut self) {
        self.0.push(Problem::Missing);
    }

    pub fn invalid(&mut self) {
        self.0.push(Problem::Invalid);
    }

    pub fn iter(&self) -> impl Iterator<Item = Problem> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// Validator Context
// =============================================================================

/// External data a validator may consult.
#[derive(Clone, Copy)]
pub struct FieldContext<'a> {
    pub catalog: &'a dyn Catalog,
    pub categories: &'a CategoryTable,
}

impl<'a> FieldContext<'a> {
    pub fn new(catalog: &'a dyn Catalog, categories: &'a CategoryTable) -> Self {
        Self { catalog, categories }
    }
}

/// Split a `;`-separated cell, trimming every token. Empty tokens are kept.
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value.split(';').map(|token| token.trim().to_string()).collect()
}
