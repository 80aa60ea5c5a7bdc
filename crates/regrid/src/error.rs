//! Error types for the reprojection engine.

use grid_model::ModelError;
use projection::ProjectionError;
use thiserror::Error;

/// Errors that can occur while configuring or reading a reprojected view.
#[derive(Debug, Error)]
pub enum RegridError {
    /// No usable horizontal coordinate system was found in the source.
    #[error("no coordinate systems found{0}")]
    NoCoordinateSystem(String),

    /// The projection library rejected a proj-string or a transform.
    #[error("projection failure: {0}")]
    Projection(String),

    /// The requested operation is not supported for this method or target.
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    /// An interpolation method tag was not recognised.
    #[error("unknown interpolation method: {0}")]
    UnknownMethod(String),

    /// Grid shapes or vector metadata do not line up.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// An axis specification string could not be parsed.
    #[error("invalid axis specification: {0}")]
    AxisSpec(String),

    /// The source reader failed.
    #[error("reader failure: {0}")]
    Reader(#[from] ModelError),
}

impl From<ProjectionError> for RegridError {
    fn from(err: ProjectionError) -> Self {
        Self::Projection(err.to_string())
    }
}

impl RegridError {
    /// A NoCoordinateSystem error with an empty qualifier.
    pub fn no_coordinate_system() -> Self {
        Self::NoCoordinateSystem(String::new())
    }
}

/// Result type for reprojection operations.
pub type Result<T> = std::result::Result<T, RegridError>;
