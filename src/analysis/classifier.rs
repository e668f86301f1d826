//! Language-agnostic prompt/resource detection by variable naming convention.

use once_cell::sync::Lazy;
use regex::Regex;

static ASSIGNMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\w+)\s*[=:]").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Prompt(String),
    Resource(String),
}

/// Classify an assignment-like line (`name = ...` or `name: T = ...`).
///
/// The identifier keeps its original casing in the result; matching is done on
/// the lower-cased form, by exact name or by `_prompt(s)`/`_resource(s)` suffix.
pub fn classify_assignment(line: &str) -> Option<Classification> {
    let ident = ASSIGNMENT.captures(line)?.get(1)?.as_str();
    let lower = ident.to_lowercase();

    if matches_convention(&lower, "prompt") {
        Some(Classification::Prompt(ident.to_string()))
    } else if matches_convention(&lower, "resource") {
        Some(Classification::Resource(ident.to_string()))
    } else {
        None
    }
}

fn matches_convention(lower: &str, stem: &str) -> bool {
    let plural = format!("{stem}s");
    lower == stem
        || lower == plural
        || lower.ends_with(&format!("_{stem}"))
        || lower.ends_with(&format!("_{plural}"))
}
