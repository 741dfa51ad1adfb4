//! Schema registry: one validation rule per upload header.
//!
//! Rules come from two places with different shapes:
//!
//! - the fixed metadata table ([`METADATA_FIELDS`]), identical for every upload
//! - the questions of the provider's registration schema ([`SchemaDocument`]),
//!   including nested sub-questions flattened to `qid + id`
//!
//! [`SchemaRegistry`] merges both into a single lowercase-header lookup. When a
//! question id collides with a metadata name, the metadata rule wins.

pub mod document;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;

pub use document::{NestedQuestion, Question, QuestionOption, QuestionSpec, SchemaDocument};

// =============================================================================
// Validation Rules
// =============================================================================

/// Shape of a field's parsed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    String,
    List,
    Object,
    Choice,
}

/// Question type as declared by the registration schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    String,
    Choose,
    /// Any other declared type; such answers resolve to nothing.
    Other(String),
}

impl QuestionType {
    pub fn parse(value: &str) -> Self {
        match value {
            "string" => QuestionType::String,
            "choose" => QuestionType::Choose,
            other => QuestionType::Other(other.to_string()),
        }
    }
}

/// Selection mode of a `choose` question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectFormat {
    Single,
    Multi,
    Unsupported,
}

impl SelectFormat {
    pub fn parse(format: &str) -> Self {
        match format {
            "singleselect" => SelectFormat::Single,
            "multiselect" => SelectFormat::Multi,
            _ => SelectFormat::Unsupported,
        }
    }
}

/// How one header's cells are checked. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    pub required: bool,
    pub kind: RuleKind,
    /// Ordered, duplicate-free option texts for choice questions.
    pub allowed_options: Vec<String>,
    pub question_type: QuestionType,
    /// Raw `format` string from the schema (`singleselect`, `multiselect`, ...).
    pub format: String,
}

impl ValidationRule {
    /// Rule for a fixed metadata field.
    pub fn metadata(kind: RuleKind, required: bool) -> Self {
        Self {
            required,
            kind,
            allowed_options: Vec::new(),
            question_type: QuestionType::String,
            format: String::new(),
        }
    }

    /// Rule for a questionnaire question.
    pub fn question(spec: &QuestionSpec) -> Self {
        let question_type = QuestionType::parse(&spec.question_type);
        let kind = match question_type {
            QuestionType::Choose => RuleKind::Choice,
            _ => RuleKind::String,
        };

        let mut allowed_options: Vec<String> = Vec::with_capacity(spec.options.len());
        for option in &spec.options {
            let text = option.text();
            if !allowed_options.iter().any(|o| o == text) {
                allowed_options.push(text.to_string());
            }
        }

        Self {
            required: spec.required,
            kind,
            allowed_options,
            question_type,
            format: spec.format.clone(),
        }
    }

    pub fn select_format(&self) -> SelectFormat {
        SelectFormat::parse(&self.format)
    }

    pub fn allows(&self, option: &str) -> bool {
        self.allowed_options.iter().any(|o| o == option)
    }
}

// =============================================================================
// Fixed Metadata Fields
// =============================================================================

/// A schema-independent column present in every upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataField {
    pub name: &'static str,
    pub kind: RuleKind,
    pub required: bool,
}

const fn field(name: &'static str, kind: RuleKind, required: bool) -> MetadataField {
    MetadataField { name, kind, required }
}

/// Every metadata column, in template order.
pub const METADATA_FIELDS: &[MetadataField] = &[
    field("title", RuleKind::String, true),
    field("description", RuleKind::String, true),
    field("admin", RuleKind::List, true),
    field("read-write", RuleKind::List, false),
    field("read-only", RuleKind::List, false),
    field("bibliographic contributors", RuleKind::List, false),
    field("category", RuleKind::String, false),
    field("affiliated institutions", RuleKind::List, false),
    field("license", RuleKind::Object, true),
    field("subjects", RuleKind::List, true),
    field("tags", RuleKind::List, false),
    field("project guid", RuleKind::String, false),
    field("external id", RuleKind::String, false),
];

/// Whether `header` names a fixed metadata column.
pub fn is_metadata_header(header: &str) -> bool {
    METADATA_FIELDS.iter().any(|f| f.name == header)
}

// =============================================================================
// Registry
// =============================================================================

/// Merged header → rule lookup for one upload.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    rules: HashMap<String, Arc<ValidationRule>>,
    question_ids: Vec<String>,
}

impl SchemaRegistry {
    /// Build the registry from a deserialized schema document.
    pub fn from_document(document: &SchemaDocument) -> Self {
        let mut rules = HashMap::new();
        let mut question_ids = Vec::new();

        let mut insert = |qid: String, rule: ValidationRule| {
            if rules.insert(qid.clone(), Arc::new(rule)).is_none() {
                question_ids.push(qid);
            }
        };

        // Document headers are lowercased, so keys must be too.
        for question in document.questions() {
            let qid = question.qid.to_lowercase();
            insert(qid.clone(), ValidationRule::question(&question.spec));
            for nested in &question.properties {
                insert(
                    format!("{}{}", qid, nested.id.to_lowercase()),
                    ValidationRule::question(&nested.spec),
                );
            }
        }

        question_ids.retain(|qid| !is_metadata_header(qid));
        for field in METADATA_FIELDS {
            rules.insert(
                field.name.to_string(),
                Arc::new(ValidationRule::metadata(field.kind, field.required)),
            );
        }

        Self { rules, question_ids }
    }

    /// Validate and deserialize a raw schema document, then build the registry.
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        let document = SchemaDocument::from_value(value)?;
        Ok(Self::from_document(&document))
    }

    pub fn rule(&self, header: &str) -> Option<&Arc<ValidationRule>> {
        self.rules.get(header)
    }

    pub fn contains(&self, header: &str) -> bool {
        self.rules.contains_key(header)
    }

    /// Questionnaire headers in schema order, metadata collisions excluded.
    pub fn question_ids(&self) -> &[String] {
        &self.question_ids
    }

    /// Every header an upload must carry: metadata columns, then questions.
    pub fn expected_headers(&self) -> Vec<String> {
        METADATA_FIELDS
            .iter()
            .map(|f| f.name.to_string())
            .chain(self.question_ids.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_schema() -> Value {
        json!({
            "pages": [
                { "questions": [
                    { "qid": "q1", "type": "string", "required": true },
                    { "qid": "q2", "type": "choose", "format": "singleselect",
                      "options": ["Yes", "No", "Yes"] }
                ] },
                { "questions": [
                    { "qid": "q3", "type": "object", "properties": [
                        { "id": "a", "type": "string" },
                        { "id": "b", "type": "choose", "format": "multiselect",
                          "options": ["x", "y"], "required": true }
                    ] }
                ] }
            ]
        })
    }

    #[test]
    fn test_question_rules_extracted() {
        let registry = SchemaRegistry::from_value(&sample_schema()).unwrap();

        let q1 = registry.rule("q1").unwrap();
        assert!(q1.required);
        assert_eq!(q1.kind, RuleKind::String);
        assert_eq!(q1.question_type, QuestionType::String);

        let q2 = registry.rule("q2").unwrap();
        assert_eq!(q2.kind, RuleKind::Choice);
        assert_eq!(q2.allowed_options, vec!["Yes", "No"]);
        assert_eq!(q2.select_format(), SelectFormat::Single);
    }

    #[test]
    fn test_nested_ids_concatenated_without_separator() {
        let registry = SchemaRegistry::from_value(&sample_schema()).unwrap();

        assert!(registry.contains("q3"));
        assert!(registry.contains("q3a"));
        let q3b = registry.rule("q3b").unwrap();
        assert!(q3b.required);
        assert_eq!(q3b.select_format(), SelectFormat::Multi);
        assert_eq!(registry.question_ids(), &["q1", "q2", "q3", "q3a", "q3b"]);
    }

    #[test]
    fn test_metadata_rules_overlayed() {
        let registry = SchemaRegistry::from_value(&sample_schema()).unwrap();

        assert_eq!(registry.len(), METADATA_FIELDS.len() + 5);
        let license = registry.rule("license").unwrap();
        assert_eq!(license.kind, RuleKind::Object);
        assert!(license.required);
        assert_eq!(registry.rule("tags").unwrap().kind, RuleKind::List);
    }

    #[test]
    fn test_metadata_wins_on_collision() {
        let registry = SchemaRegistry::from_value(&json!({
            "pages": [{ "questions": [
                { "qid": "title", "type": "choose", "format": "singleselect", "options": ["a"] }
            ] }]
        }))
        .unwrap();

        let title = registry.rule("title").unwrap();
        assert_eq!(title.kind, RuleKind::String);
        assert!(title.allowed_options.is_empty());
        assert!(registry.question_ids().is_empty());
        assert_eq!(registry.expected_headers().len(), METADATA_FIELDS.len());
    }

    #[test]
    fn test_expected_headers_order() {
        let registry = SchemaRegistry::from_value(&sample_schema()).unwrap();
        let expected = registry.expected_headers();

        assert_eq!(expected[0], "title");
        assert_eq!(expected[METADATA_FIELDS.len()], "q1");
        assert_eq!(expected.last().map(String::as_str), Some("q3b"));
    }

    #[test]
    fn test_question_ids_lowercased() {
        let registry = SchemaRegistry::from_value(&json!({
            "pages": [{ "questions": [
                { "qid": "Q1", "properties": [{ "id": "Sub" }] }
            ] }]
        }))
        .unwrap();

        assert!(registry.contains("q1"));
        assert!(registry.contains("q1sub"));
        assert!(!registry.contains("Q1"));
        assert_eq!(registry.question_ids(), &["q1", "q1sub"]);
    }

    #[test]
    fn test_unknown_question_type_kept() {
        assert_eq!(QuestionType::parse("date"), QuestionType::Other("date".into()));
        assert_eq!(SelectFormat::parse("dropdown"), SelectFormat::Unsupported);
    }
}
