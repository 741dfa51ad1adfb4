//! Registration schema documents as served by the catalog.
//!
//! A document is checked against the embedded JSON Schema
//! (`schemas/registration-schema.json`, draft 7) before it is deserialized,
//! so a corrupt provider configuration surfaces as one readable
//! [`SchemaError::Malformed`] instead of a serde error deep in a page.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;

static DOCUMENT_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/registration-schema.json"))
        .expect("Invalid embedded schema")
});

/// A provider's registration schema: pages of questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub pages: Vec<SchemaPage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaPage {
    pub questions: Vec<Question>,
}

/// A top-level question. Its header is the `qid`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub qid: String,
    #[serde(flatten)]
    pub spec: QuestionSpec,
    /// Nested sub-questions; each gets the header `qid + id`.
    #[serde(default)]
    pub properties: Vec<NestedQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestedQuestion {
    pub id: String,
    #[serde(flatten)]
    pub spec: QuestionSpec,
}

/// The validation-relevant part shared by questions and sub-questions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionSpec {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub format: String,
    #[serde(rename = "type", default = "default_question_type")]
    pub question_type: String,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
}

fn default_question_type() -> String {
    "string".to_string()
}

/// Options come either as bare strings or as objects with a `text` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionOption {
    Text(String),
    Labeled { text: String },
}

impl QuestionOption {
    pub fn text(&self) -> &str {
        match self {
            QuestionOption::Text(text) | QuestionOption::Labeled { text } => text,
        }
    }
}

/// Validate a JSON value against a JSON Schema (draft 7).
///
/// Returns every violation message, not only the first.
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

impl SchemaDocument {
    /// Check the document's shape, then deserialize it.
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        validate(&DOCUMENT_SCHEMA, value).map_err(|errors| SchemaError::Malformed { errors })?;
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Every question in page order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.pages.iter().flat_map(|page| page.questions.iter())
    }
}
