//! Category cells, resolved through the configured [`CategoryTable`].

use serde_json::Value;

use super::{ParseOutcome, Problems};
use crate::config::CategoryTable;

pub fn parse(raw: &str, categories: &CategoryTable, problems: &mut Problems) -> ParseOutcome {
    match categories.code_for(raw.trim()) {
        Some(code) => ParseOutcome::Value(Value::String(code.to_string())),
        None => {
            problems.invalid();
            ParseOutcome::Absent
        }
    }
}
