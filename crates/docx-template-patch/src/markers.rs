//! Loop-marker insertion and removal.
//!
//! A loop marker is a literal template tag: `{#name}` opens the repeat
//! region, `{/name}` closes it. The open marker goes immediately *before*
//! the start placeholder's own `{`, so the result is two back-to-back tags
//! (`{#name}{field}`), never a single fused `{{#name}field}` tag. That
//! fused form is exactly the malformed state [`remove_marker`] knows how
//! to undo.

use serde::Serialize;

/// Which half of a marker pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarkerDirection {
    Open,
    Close,
}

/// Render the open marker literal, e.g. `{#list_ubah}`.
pub fn open_marker(loop_name: &str) -> String {
    format!("{{#{}}}", loop_name)
}

/// Render the close marker literal, e.g. `{/list_ubah}`.
pub fn close_marker(loop_name: &str) -> String {
    format!("{{/{}}}", loop_name)
}

/// Insert `{#loop_name}` immediately before the character at `offset`.
pub fn insert_open_marker(text: &str, offset: usize, loop_name: &str) -> String {
    let mut out = String::with_capacity(text.len() + loop_name.len() + 3);
    out.push_str(&text[..offset]);
    out.push_str(&open_marker(loop_name));
    out.push_str(&text[offset..]);
    out
}

/// Insert `{/loop_name}` immediately after the character at `offset`.
pub fn insert_close_marker(text: &str, offset: usize, loop_name: &str) -> String {
    let at = offset + 1;
    let mut out = String::with_capacity(text.len() + loop_name.len() + 3);
    out.push_str(&text[..at]);
    out.push_str(&close_marker(loop_name));
    out.push_str(&text[at..]);
    out
}

/// Delete a previously inserted marker wherever it appears, returning the
/// text unchanged if absent.
///
/// Also undoes the known-malformed variants of earlier patch attempts: the
/// fused open tag `{{#name}` (collapsed back to the placeholder's own `{`)
/// and the stray-space close tag `{ /name}`.
pub fn remove_marker(text: &str, loop_name: &str, direction: MarkerDirection) -> String {
    match direction {
        MarkerDirection::Open => {
            let fused = format!("{{{{#{}}}", loop_name);
            text.replace(&fused, "{").replace(&open_marker(loop_name), "")
        }
        MarkerDirection::Close => {
            let spaced = format!("{{ /{}}}", loop_name);
            text.replace(&spaced, "").replace(&close_marker(loop_name), "")
        }
    }
}

/// Strip every trace of a previous patch attempt for `loop_name`.
pub fn revert_markers(text: &str, loop_name: &str) -> String {
    let reverted = remove_marker(text, loop_name, MarkerDirection::Open);
    remove_marker(&reverted, loop_name, MarkerDirection::Close)
}
