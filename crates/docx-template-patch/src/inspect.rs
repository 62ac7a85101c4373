//! Read-only inspection of a template body.
//!
//! Diagnostic helpers for the two questions that come up when a patch
//! misbehaves: which placeholders does this template actually contain, and
//! what does the markup look like around a given field.

use regex::Regex;
use serde::Serialize;

use crate::matcher::find_logical_token;
use crate::rows::{find_enclosing_row, RowSpan};

/// List every `{placeholder}` name in the body, deduplicated and sorted.
///
/// Markup tags are flattened to spaces first, so a placeholder fragmented
/// across runs still comes back as its logical name.
pub fn list_placeholders(text: &str) -> Vec<String> {
    let tag_re = Regex::new(r"<[^>]+>").expect("static pattern");
    let flat = tag_re.replace_all(text, " ");

    let token_re = Regex::new(r"\{([^{}]+)\}").expect("static pattern");
    let mut names: Vec<String> = token_re
        .captures_iter(&flat)
        .map(|cap| cap[1].split_whitespace().collect::<String>())
        .filter(|name| !name.is_empty())
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Where a field sits in the body and what surrounds it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldContext {
    pub name: String,
    pub offset: usize,
    /// Raw matched span, markup included.
    pub matched: String,
    /// Enclosing table row, when the field sits inside one.
    pub row: Option<RowSpan>,
    /// Raw markup immediately before the match.
    pub before: String,
    /// Raw markup immediately after the match.
    pub after: String,
}

const CONTEXT_CHARS: usize = 80;

/// Locate `name` with the fragment-tolerant matcher and report its raw
/// surroundings and enclosing row.
pub fn inspect_field(text: &str, name: &str) -> Option<FieldContext> {
    let m = find_logical_token(text, name)?;
    let before_start = floor_char_boundary(text, m.offset.saturating_sub(CONTEXT_CHARS));
    let after_end = ceil_char_boundary(text, (m.end() + CONTEXT_CHARS).min(text.len()));

    Some(FieldContext {
        name: m.name.clone(),
        offset: m.offset,
        matched: m.matched.clone(),
        row: find_enclosing_row(text, m.offset),
        before: text[before_start..m.offset].to_string(),
        after: text[m.end()..after_end].to_string(),
    })
}

fn floor_char_boundary(text: &str, mut i: usize) -> usize {
    while i > 0 && !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(text: &str, mut i: usize) -> usize {
    while i < text.len() && !text.is_char_boundary(i) {
        i += 1;
    }
    i
}
