//! License cells.
//!
//! Plain form: `<license name>`.
//! Licenses that declare required properties need the extended form
//! `<license name>; <four-digit year>; <holder>, <holder>, ...`.
//!
//! An unknown license name and an extended-form license written without its
//! year and holders are both invalid.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use super::{ParseOutcome, Problems};
use crate::catalog::Catalog;

static WITH_REQUIRED_FIELDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>[^;]+);\s*(?P<year>[1-3][0-9]{3})\s*;(?P<holders>.+)$")
        .expect("valid regex")
});

pub fn parse(raw: &str, catalog: &dyn Catalog, problems: &mut Problems) -> ParseOutcome {
    let value = raw.trim();
    if value.is_empty() {
        return ParseOutcome::Absent;
    }

    let name = value.split(';').next().unwrap_or_default().trim();
    let license = match catalog.license_by_name(name) {
        Some(license) if !name.is_empty() => license,
        _ => {
            problems.invalid();
            return ParseOutcome::Absent;
        }
    };

    if !license.has_required_fields() {
        return ParseOutcome::Value(json!({ "name": name }));
    }

    let Some(caps) = WITH_REQUIRED_FIELDS.captures(value) else {
        problems.invalid();
        return ParseOutcome::Absent;
    };

    let holders: Vec<&str> = caps["holders"]
        .split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .collect();
    if holders.is_empty() {
        problems.invalid();
        return ParseOutcome::Absent;
    }

    ParseOutcome::Value(json!({
        "name": caps["name"].trim(),
        "required_field": {
            "year": &caps["year"],
            "copyright_holders": holders,
        }
    }))
}
