//! Contributor lists: `Full Name<email>;Other Name<other@email>`.
//!
//! Tokens that match the grammar are kept in order. If any non-empty token
//! does not match, the cell logs exactly one invalid problem; the matched
//! contributors are still returned so the parse dump stays useful.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use super::{split_list, ParseOutcome, Problems};

static CONTRIBUTOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<full_name>[\w -]+)<(?P<email>[^>]*)>").expect("valid regex"));

pub fn parse(raw: &str, problems: &mut Problems) -> ParseOutcome {
    let mut contributors = Vec::new();
    let mut rejected = false;

    for token in split_list(raw.trim()) {
        if token.is_empty() {
            continue;
        }
        match CONTRIBUTOR.captures(&token) {
            Some(caps) => contributors.push(json!({
                "full_name": caps["full_name"].trim(),
                "email": &caps["email"],
            })),
            None => rejected = true,
        }
    }

    if rejected {
        problems.invalid();
    }
    ParseOutcome::Value(Value::Array(contributors))
}
