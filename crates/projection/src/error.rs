//! Error types for projection handling.

use thiserror::Error;

/// Errors raised while parsing or applying projections.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// The proj-string is missing its `+proj=` token.
    #[error("cannot find +proj=... in proj-string: {0}")]
    MissingProjToken(String),

    /// The projection family is not supported.
    #[error("unsupported projection: {0}")]
    Unsupported(String),

    /// A parameter value could not be parsed.
    #[error("invalid projection parameter '{param}': {value}")]
    InvalidParameter { param: String, value: String },
}

/// Result type for projection operations.
pub type ProjResult<T> = std::result::Result<T, ProjectionError>;
