//! Fragment-tolerant matching of logical field names.
//!
//! Word processors split a single logical placeholder across multiple text
//! runs while the document is edited, so `no_urut_yang_diubah` may appear in
//! the raw XML as `no</w:t></w:r><w:r><w:t>_urut_yang_diubah`. The splits
//! land on edit-history boundaries, which in practice means at the
//! underscores, never inside a tag.

use regex::RegexBuilder;
use serde::Serialize;
use tracing::debug;

/// A located occurrence of a logical field name.
#[derive(Debug, Clone, Serialize)]
pub struct PlaceholderMatch {
    /// Offset of the first matched character in the document text.
    pub offset: usize,
    /// Full matched span, including any interleaved markup.
    pub matched: String,
    /// The logical name that was searched for.
    pub name: String,
}

impl PlaceholderMatch {
    /// Offset one past the last matched character.
    pub fn end(&self) -> usize {
        self.offset + self.matched.len()
    }
}

/// Find the lowest-offset occurrence of `logical_name` in `text`,
/// tolerating complete markup tags between the name's underscore-delimited
/// segments. Returns `None` when no segment sequence matches.
///
/// Segment-internal splits (markup inside `urut` itself) are not matched;
/// the editor splits on underscores, and guessing looser boundaries is how
/// fields get mis-identified.
pub fn find_logical_token(text: &str, logical_name: &str) -> Option<PlaceholderMatch> {
    let pattern = fragment_pattern(logical_name);
    let re = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .ok()?;

    let m = re.find(text)?;
    debug!(
        "matched '{}' at offset {} ({} chars of span)",
        logical_name,
        m.start(),
        m.len()
    );
    Some(PlaceholderMatch {
        offset: m.start(),
        matched: m.as_str().to_string(),
        name: logical_name.to_string(),
    })
}

/// Build the fragment-tolerant pattern for a logical name:
/// `seg0(?:<[^>]*>)*_seg1(?:<[^>]*>)*_seg2...`, each segment escaped.
fn fragment_pattern(logical_name: &str) -> String {
    let mut pattern = String::new();
    for (i, segment) in logical_name.split('_').enumerate() {
        if i > 0 {
            pattern.push_str("(?:<[^>]*>)*_");
        }
        pattern.push_str(&regex::escape(segment));
    }
    pattern
}
