//! Project references: the guid of an existing, non-deleted project.

use serde_json::Value;

use super::{ParseOutcome, Problems};
use crate::catalog::Catalog;

pub fn parse(raw: &str, catalog: &dyn Catalog, problems: &mut Problems) -> ParseOutcome {
    let guid = raw.trim();
    if guid.is_empty() {
        return ParseOutcome::Absent;
    }

    if catalog.project_exists(guid) {
        ParseOutcome::Value(Value::String(guid.to_string()))
    } else {
        problems.invalid();
        ParseOutcome::Absent
    }
}
