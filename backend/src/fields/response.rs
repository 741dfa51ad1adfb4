//! Questionnaire answers, checked against the question's own rule.
//!
//! - `string` questions take the trimmed text.
//! - `choose` + `singleselect` must be one allowed option.
//! - `choose` + `multiselect` splits on `;`; each unknown option logs its own
//!   invalid problem and the known ones are still collected.
//!
//! Other types and choice formats resolve to nothing.

use serde_json::Value;

use super::{split_list, ParseOutcome, Problems};
use crate::schema::{QuestionType, SelectFormat, ValidationRule};

pub fn parse(raw: &str, rule: &ValidationRule, problems: &mut Problems) -> ParseOutcome {
    let value = raw.trim();

    match rule.question_type {
        QuestionType::String => ParseOutcome::Value(Value::String(value.to_string())),
        QuestionType::Choose if value.is_empty() => ParseOutcome::Absent,
        QuestionType::Choose => match rule.select_format() {
            SelectFormat::Single => parse_single(value, rule, problems),
            SelectFormat::Multi => parse_multi(value, rule, problems),
            SelectFormat::Unsupported => ParseOutcome::Absent,
        },
        QuestionType::Other(_) => ParseOutcome::Absent,
    }
}

fn parse_single(value: &str, rule: &ValidationRule, problems: &mut Problems) -> ParseOutcome {
    if rule.allows(value) {
        ParseOutcome::Value(Value::String(value.to_string()))
    } else {
        problems.invalid();
        ParseOutcome::Absent
    }
}

fn parse_multi(value: &str, rule: &ValidationRule, problems: &mut Problems) -> ParseOutcome {
    let mut chosen = Vec::new();
    for choice in split_list(value) {
        if rule.allows(&choice) {
            chosen.push(Value::String(choice));
        } else {
            problems.invalid();
        }
    }
    ParseOutcome::Value(Value::Array(chosen))
}
