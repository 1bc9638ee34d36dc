//! Error types for the JSON mapper

use thiserror::Error;

/// Result type for mapping operations
pub type Result<T> = std::result::Result<T, MappingError>;

/// Mapping errors
#[derive(Error, Debug)]
pub enum MappingError {
    #[error("Invalid {kind} value {value:?}")]
    InvalidFormat { kind: &'static str, value: String },

    #[error("{method}() takes exactly one value ({given} given)")]
    InvalidArity { method: &'static str, given: usize },

    #[error("Type mismatch: expected {expected}, got {found}")]
    TypeMismatch { expected: &'static str, found: String },

    #[error("Index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Missing key: {0}")]
    MissingKey(String),

    #[error("Value not in sequence: {0}")]
    ValueNotFound(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Unknown schema: {0}")]
    UnknownSchema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MappingError {
    pub(crate) fn invalid_format(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidFormat {
            kind,
            value: value.into(),
        }
    }

    pub(crate) fn mismatch(expected: &'static str, found: impl std::fmt::Debug) -> Self {
        Self::TypeMismatch {
            expected,
            found: format!("{:?}", found),
        }
    }
}
