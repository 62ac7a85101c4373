//! Table-row boundary location by lightweight text scanning.
//!
//! The body markup has one well-known shape, so no DOM is built: rows are
//! found by scanning for the literal `<w:tr>` / `<w:tr ` / `</w:tr>`
//! delimiters around an offset. `<w:trPr>` (row properties) also starts
//! with `<w:tr`, which is why matching is against the two exact opening
//! serializations rather than the prefix.

use serde::Serialize;

const ROW_OPEN_BARE: &str = "<w:tr>";
const ROW_OPEN_ATTRS: &str = "<w:tr ";
const ROW_CLOSE: &str = "</w:tr>";

/// Character range `[start, end)` of a table-row element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowSpan {
    /// Index of the row's opening-tag first character.
    pub start: usize,
    /// Index one past the closing tag's last character.
    pub end: usize,
}

/// Find the innermost table row enclosing `offset`.
///
/// Scans backward for the nearest row-opening tag that is not already
/// closed before `offset`, and forward for the nearest closing tag.
/// Returns `None` when either scan runs off the end of the text or the
/// nearest preceding row tag is a close (offset sits between rows), both
/// of which signal a malformed or truncated document for our purposes.
pub fn find_enclosing_row(text: &str, offset: usize) -> Option<RowSpan> {
    let before = &text[..offset.min(text.len())];

    let open_bare = before.rfind(ROW_OPEN_BARE);
    let open_attrs = before.rfind(ROW_OPEN_ATTRS);
    let start = match (open_bare, open_attrs) {
        (Some(a), Some(b)) => a.max(b),
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };

    // A close between the candidate open and the offset means the offset is
    // not inside that row at all.
    if let Some(close) = before.rfind(ROW_CLOSE) {
        if close > start {
            return None;
        }
    }

    let close_rel = text[offset..].find(ROW_CLOSE)?;
    let end = offset + close_rel + ROW_CLOSE.len();

    Some(RowSpan { start, end })
}

/// Count row-opening and row-closing tags in `text`.
///
/// Used to check that the region between two rows contains only complete
/// rows (balanced open/close counts) before wrapping it in a loop.
pub fn count_row_tags(text: &str) -> (usize, usize) {
    let opens = occurrences(text, ROW_OPEN_BARE) + occurrences(text, ROW_OPEN_ATTRS);
    let closes = occurrences(text, ROW_CLOSE);
    (opens, closes)
}

fn occurrences(text: &str, needle: &str) -> usize {
    let mut count = 0;
    let mut at = 0;
    while let Some(rel) = text[at..].find(needle) {
        count += 1;
        at += rel + needle.len();
    }
    count
}
