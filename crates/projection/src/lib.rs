//! Coordinate reference system transformations.
//!
//! Implements map projections from scratch without external dependencies:
//! proj-string parsing into a closed [`Projection`] type, forward/inverse
//! point math on the sphere, bulk axis/value transforms, and the per-cell
//! rotation matrices used to reproject vector fields.
//!
//! Angular projections (plain and rotated lat/lon) use radians as their
//! plane coordinates; metric projections use metres. Invalid points map to
//! NaN rather than erroring, so missing data flows through bulk transforms.

pub mod error;
pub mod lambert;
pub mod latlong;
pub mod proj;
pub mod rotated;
pub mod stereographic;
pub mod transform;

pub use error::{ProjResult, ProjectionError};
pub use lambert::LambertConformal;
pub use latlong::LatLong;
pub use proj::{Projection, LAT_LON_PROJ4};
pub use rotated::RotatedLatLong;
pub use stereographic::Stereographic;
pub use transform::{project_axes, project_values, vector_reproject_matrix};

/// Spherical earth radius shared by all projection math, in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
