//! Plain metadata columns: title, description, tags, external id.

use serde_json::Value;

use super::{split_list, ParseOutcome};
use crate::schema::{RuleKind, ValidationRule};

/// List rules split on `;` keeping order, duplicates and empty tokens; every
/// other rule yields the trimmed text.
pub fn parse(raw: &str, rule: &ValidationRule) -> ParseOutcome {
    let value = raw.trim();
    match rule.kind {
        RuleKind::List => {
            let items = split_list(value).into_iter().map(Value::String).collect();
            ParseOutcome::Value(Value::Array(items))
        }
        _ => ParseOutcome::Value(Value::String(value.to_string())),
    }
}
