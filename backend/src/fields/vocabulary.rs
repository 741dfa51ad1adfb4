//! Controlled-vocabulary lists: subjects and affiliated institutions.
//!
//! Both split on `;` and require every token to be known. One unknown token
//! invalidates the whole cell: no partial list is returned.

use std::collections::HashSet;

use serde_json::Value;

use super::{split_list, ParseOutcome, Problems};
use crate::catalog::Catalog;

pub fn parse_subjects(raw: &str, catalog: &dyn Catalog, problems: &mut Problems) -> ParseOutcome {
    resolve(raw, problems, |names| catalog.matching_subjects(names))
}

pub fn parse_institutions(
    raw: &str,
    catalog: &dyn Catalog,
    problems: &mut Problems,
) -> ParseOutcome {
    resolve(raw, problems, |names| catalog.matching_institutions(names))
}

/// Resolve every token against `lookup`; the value keeps first-seen order
/// without duplicates.
fn resolve<F>(raw: &str, problems: &mut Problems, lookup: F) -> ParseOutcome
where
    F: FnOnce(&[String]) -> HashSet<String>,
{
    let value = raw.trim();
    if value.is_empty() {
        return ParseOutcome::Absent;
    }

    let names = split_list(value);
    let known = lookup(&names);
    if names.iter().any(|name| !known.contains(name)) {
        problems.invalid();
        return ParseOutcome::Absent;
    }

    let mut seen = HashSet::new();
    let resolved = names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .map(Value::String)
        .collect();
    ParseOutcome::Value(Value::Array(resolved))
}
