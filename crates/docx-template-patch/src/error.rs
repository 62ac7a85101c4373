//! Error types for the template patcher.

/// Everything that can go wrong while patching a template.
///
/// Each variant maps to a stable process exit code so shell callers can
/// distinguish "field missing from the template" from "file is broken".
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// The container cannot be opened, is not a zip, or lacks the body member.
    #[error("cannot read container: {0}")]
    ContainerRead(String),

    /// A logical field name could not be located, even with
    /// fragment-tolerant matching.
    #[error("template field not found: {name}")]
    TemplateFieldNotFound { name: String },

    /// Both fields were found but their row relationship is invalid.
    #[error("structural mismatch at offsets {start_offset}/{end_offset}: {reason}")]
    StructuralMismatch {
        start_offset: usize,
        end_offset: usize,
        reason: String,
    },

    /// The patched container cannot be written back, or the patched body
    /// failed the well-formedness check.
    #[error("cannot write container: {0}")]
    ContainerWrite(String),
}

impl PatchError {
    /// Process exit code for the CLI surface.
    pub fn exit_code(&self) -> i32 {
        match self {
            PatchError::TemplateFieldNotFound { .. } => 1,
            PatchError::StructuralMismatch { .. } => 2,
            PatchError::ContainerRead(_) | PatchError::ContainerWrite(_) => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, PatchError>;
