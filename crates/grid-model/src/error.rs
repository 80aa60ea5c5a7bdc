//! Error types for the dataset model.

use thiserror::Error;

/// Errors raised by schema and reader operations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The named variable does not exist in the schema.
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    /// The named dimension does not exist in the schema.
    #[error("unknown dimension: {0}")]
    UnknownDimension(String),

    /// The variable carries no in-memory data.
    #[error("variable '{0}' has no in-memory data")]
    NoData(String),

    /// A slice request does not fit the variable's shape.
    #[error("invalid slice of '{name}': {message}")]
    InvalidSlice { name: String, message: String },

    /// An element-type string could not be parsed.
    #[error("unknown element type: {0}")]
    UnknownElementType(String),

    /// A view layered on top of this reader failed while producing data.
    #[error("{0}")]
    Source(String),
}

impl ModelError {
    /// Create an InvalidSlice error.
    pub fn invalid_slice(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSlice {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Result type for dataset model operations.
pub type ModelResult<T> = std::result::Result<T, ModelError>;
