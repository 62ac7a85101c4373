//! The idempotent patch driver.
//!
//! Orchestrates matcher, row locator, and marker inserter over a snapshot
//! of the body text: revert any previous patch attempt, match both fields,
//! validate their row relationship, insert close-then-open (descending
//! offset order, so the earlier offset stays valid), and check the result
//! still parses before anything touches disk. Every pass takes a text
//! snapshot and returns a new one; a failed run leaves the file exactly as
//! it was found.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::container::DocxContainer;
use crate::error::{PatchError, Result};
use crate::markers::{insert_close_marker, insert_open_marker, open_marker, revert_markers};
use crate::matcher::find_logical_token;
use crate::rows::{count_row_tags, find_enclosing_row, RowSpan};

/// Declarative description of one patch: which loop to create and which
/// logical fields delimit it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchSpec {
    /// Loop name, e.g. `list_ubah`.
    pub loop_name: String,
    /// Logical field whose placeholder opens the repeat region.
    pub start_field: String,
    /// Logical field whose placeholder closes the repeat region.
    pub end_field: String,
}

/// What a successful patch did, for diagnostics and dry runs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchReport {
    /// Offset of the start field match in the reverted text.
    pub start_offset: usize,
    /// Offset of the end field match in the reverted text.
    pub end_offset: usize,
    /// Row enclosing the start field.
    pub start_row: RowSpan,
    /// Row enclosing the end field.
    pub end_row: RowSpan,
    /// Final offset of the open marker in the patched text.
    pub open_marker_offset: usize,
    /// Final offset of the close marker in the patched text.
    pub close_marker_offset: usize,
    /// Whether a previous patch attempt was stripped first.
    pub reverted_previous: bool,
    /// Whether the patched body differs from the body as loaded.
    pub body_changed: bool,
}

/// Run the full revert-match-validate-insert pipeline on a body snapshot.
///
/// Pure with respect to the filesystem: returns the patched text and a
/// report, or the first error encountered.
pub fn patch_body(body: &str, spec: &PatchSpec) -> Result<(String, PatchReport)> {
    let reverted = revert_markers(body, &spec.loop_name);
    let reverted_previous = reverted != body;
    if reverted_previous {
        info!("stripped a previous '{}' patch attempt before reapplying", spec.loop_name);
    }

    let start = find_logical_token(&reverted, &spec.start_field).ok_or_else(|| {
        PatchError::TemplateFieldNotFound {
            name: spec.start_field.clone(),
        }
    })?;
    let end = find_logical_token(&reverted, &spec.end_field).ok_or_else(|| {
        PatchError::TemplateFieldNotFound {
            name: spec.end_field.clone(),
        }
    })?;
    info!(
        "matched start '{}' at {} and end '{}' at {}",
        start.name, start.offset, end.name, end.offset
    );

    // The open marker goes before the start placeholder's own opening
    // delimiter, the close marker after the end placeholder's closing one.
    let open_at = reverted[..start.offset].rfind('{').ok_or_else(|| {
        PatchError::StructuralMismatch {
            start_offset: start.offset,
            end_offset: end.offset,
            reason: format!("no opening delimiter before start field '{}'", start.name),
        }
    })?;
    if reverted[open_at + 1..start.offset].contains('}') {
        warn!(
            "found '}}' between the opening delimiter at {} and the start field at {}; \
             the start placeholder may not be the tag this brace opens",
            open_at, start.offset
        );
    }
    let close_at = end.end()
        + reverted[end.end()..]
            .find('}')
            .ok_or_else(|| PatchError::StructuralMismatch {
                start_offset: start.offset,
                end_offset: end.offset,
                reason: format!("no closing delimiter after end field '{}'", end.name),
            })?;

    let (start_row, end_row) = validate_rows(&reverted, &spec.loop_name, start.offset, end.offset)?;

    if close_at <= open_at {
        return Err(PatchError::StructuralMismatch {
            start_offset: start.offset,
            end_offset: end.offset,
            reason: "end delimiter does not follow start delimiter".to_string(),
        });
    }

    // Descending offset order: the close insertion cannot shift open_at.
    let patched = insert_close_marker(&reverted, close_at, &spec.loop_name);
    let patched = insert_open_marker(&patched, open_at, &spec.loop_name);

    // Safety net for everything the lightweight scans cannot see: the
    // patched body must still be parseable XML.
    roxmltree::Document::parse(&patched).map_err(|e| {
        PatchError::ContainerWrite(format!("patched body is not well-formed XML: {}", e))
    })?;

    let open_marker_offset = open_at;
    let close_marker_offset = close_at + 1 + open_marker(&spec.loop_name).len();
    debug_assert!(open_marker_offset < close_marker_offset);

    let report = PatchReport {
        start_offset: start.offset,
        end_offset: end.offset,
        start_row,
        end_row,
        open_marker_offset,
        close_marker_offset,
        reverted_previous,
        body_changed: patched != body,
    };
    Ok((patched, report))
}

/// Resolve both fields' rows and check they can delimit a repeat region:
/// the same row, or an earlier row followed by a later one with only
/// complete rows in between.
fn validate_rows(
    text: &str,
    loop_name: &str,
    start_offset: usize,
    end_offset: usize,
) -> Result<(RowSpan, RowSpan)> {
    let start_row =
        find_enclosing_row(text, start_offset).ok_or_else(|| PatchError::StructuralMismatch {
            start_offset,
            end_offset,
            reason: "start field is not inside a table row".to_string(),
        })?;
    let end_row =
        find_enclosing_row(text, end_offset).ok_or_else(|| PatchError::StructuralMismatch {
            start_offset,
            end_offset,
            reason: "end field is not inside a table row".to_string(),
        })?;

    if start_row == end_row {
        info!("loop '{}' wraps a single row [{}, {})", loop_name, start_row.start, start_row.end);
        return Ok((start_row, end_row));
    }
    if end_row.start < start_row.start {
        return Err(PatchError::StructuralMismatch {
            start_offset,
            end_offset,
            reason: "end field's row precedes start field's row".to_string(),
        });
    }
    if end_row.start < start_row.end {
        return Err(PatchError::StructuralMismatch {
            start_offset,
            end_offset,
            reason: "start and end fields resolve to overlapping rows".to_string(),
        });
    }
    let (opens, closes) = count_row_tags(&text[start_row.end..end_row.start]);
    if opens != closes {
        return Err(PatchError::StructuralMismatch {
            start_offset,
            end_offset,
            reason: format!(
                "unbalanced row boundaries between start and end rows ({} opens, {} closes)",
                opens, closes
            ),
        });
    }
    info!(
        "loop '{}' wraps rows [{}, {}) through [{}, {})",
        loop_name, start_row.start, start_row.end, end_row.start, end_row.end
    );
    Ok((start_row, end_row))
}

/// Patch the DOCX at `path` in place.
///
/// With `dry_run` the pipeline runs in full, including the well-formedness
/// check, but nothing is written. Errors before the save leave the file
/// byte-for-byte untouched.
pub fn patch_file(path: &Path, spec: &PatchSpec, dry_run: bool) -> Result<PatchReport> {
    let mut container = DocxContainer::open(path)?;
    let (patched, report) = patch_body(container.body(), spec)?;

    if dry_run {
        info!("dry run: {:?} left unmodified", path);
        return Ok(report);
    }

    container.set_body(patched);
    container.save(path)?;
    Ok(report)
}
