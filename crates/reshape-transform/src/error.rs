//! Synthesis-time errors.

/// Error raised while checking or generating a transform.
///
/// Every variant is produced before any code is handed back, so a caller
/// never sees partial output.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    /// Structural kind mismatch at a pair of locations.
    #[error("{source_path} is {source_kind} but {target_path} type is {target_type}")]
    IncompatibleShape {
        source_path: String,
        source_kind: String,
        target_path: String,
        target_type: String,
    },

    #[error(
        "cannot transform union {source_type} to {target_type}: source has {source_count} variants but target has {target_count}"
    )]
    UnionArityMismatch {
        source_type: String,
        target_type: String,
        source_count: usize,
        target_count: usize,
    },

    #[error("cannot transform union {source_type} to {target_type}: type at index {index}: {reason}")]
    UnionBranchIncompatible {
        source_type: String,
        target_type: String,
        index: usize,
        reason: Box<TransformError>,
    },

    #[error("invalid default value for {path}: {reason}")]
    InvalidDefault { path: String, reason: String },

    #[error("type {name} is declared but never defined")]
    Unbound { name: String },
}

impl TransformError {
    /// Builds a shape mismatch, phrasing the source kind with its article.
    pub(crate) fn incompatible(
        source_path: &str,
        source_kind: &str,
        target_path: &str,
        target_type: &str,
    ) -> Self {
        let article = match source_kind.chars().next() {
            Some('a' | 'e' | 'i' | 'o') => "an",
            _ => "a",
        };
        TransformError::IncompatibleShape {
            source_path: source_path.to_string(),
            source_kind: format!("{article} {source_kind}"),
            target_path: target_path.to_string(),
            target_type: target_type.to_string(),
        }
    }
}
