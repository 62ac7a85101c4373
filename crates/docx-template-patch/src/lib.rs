//! Structural patching of DOCX templates.
//!
//! Government letter templates carry placeholders like
//! `{no_urut_yang_diubah}` that a template engine fills at render time.
//! To repeat a whole table row per data item, the engine needs the row
//! wrapped in loop markers (`{#list_ubah}` ... `{/list_ubah}`). The
//! templates are authored in a word processor that fragments placeholder
//! text across runs, so the markers have to be spliced into the raw
//! `word/document.xml` with care.
//!
//! The pipeline, leaf first:
//! - [`container`]: read/write access to the body member of the zip
//!   container, with atomic saves.
//! - [`matcher`]: fragment-tolerant location of logical field names.
//! - [`rows`]: table-row boundary resolution around an offset.
//! - [`markers`]: marker literals, insertion, and revert of previous
//!   (possibly malformed) attempts.
//! - [`patch`]: the idempotent driver tying the above together.
//! - [`inspect`]: read-only diagnostics (placeholder inventory, field
//!   context).

pub mod container;
pub mod error;
pub mod inspect;
pub mod markers;
pub mod matcher;
pub mod patch;
pub mod rows;

pub use container::DocxContainer;
pub use error::{PatchError, Result};
pub use matcher::PlaceholderMatch;
pub use patch::{patch_body, patch_file, PatchReport, PatchSpec};
pub use rows::RowSpan;
