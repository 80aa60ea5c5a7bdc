//! # Grid Reprojection Engine
//!
//! A reprojecting view over gridded geoscientific datasets: wraps a
//! [`grid_model::DatasetReader`] and serves the same variables resampled
//! onto a new horizontal grid, with vector fields rotated into the new
//! coordinate frame.
//!
//! Reconfiguring the view discovers the source's horizontal coordinate
//! systems, rewrites the schema for the output grid and precomputes the
//! mapping from every output cell to the source cells and weights that
//! fill it. Reads then run a fixed pipeline: fetch the source slice,
//! bridge fill values to NaN, apply registered preprocessors, resample
//! through the cached mapping, rotate vector pairs, bridge NaN back.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use grid_model::{DatasetReader, ElementType};
//! use regrid::{InterpolationMethod, Regridder};
//!
//! let mut view = Regridder::new(reader);
//! view.change_projection(
//!     InterpolationMethod::Bilinear,
//!     "+proj=stere +lat_0=90 +lon_0=0 +R=6371000",
//!     &x_axis,
//!     &y_axis,
//!     "m",
//!     "m",
//!     ElementType::F64,
//!     ElementType::F64,
//! )?;
//! let slice = view.get_data_slice("temperature", 0)?;
//! ```
//!
//! # Module Structure
//!
//! - [`method`] - The ten interpolation method tags
//! - [`geometry`] - Axis-position lookup, great-circle math, fill/NaN
//!   bridging
//! - [`locate`] - Nearest-source-cell search (latitude sweep and KD-tree)
//! - [`cached`] / [`forward`] - The cached backward/forward interpolation
//! - [`vector`] - Rotation of spatial vector pairs
//! - [`discover`] - Horizontal coordinate-system discovery
//! - [`schema_rewrite`] - Rewriting the schema onto the output grid
//! - [`interpolator`] - The public [`Regridder`] view

pub mod axis_spec;
pub mod cached;
pub mod discover;
pub mod error;
pub mod forward;
pub mod geometry;
pub mod interpolator;
pub mod locate;
pub mod method;
pub mod preprocess;
pub mod schema_rewrite;
#[cfg(test)]
pub mod testdata;
pub mod vector;

pub use axis_spec::AxisSpec;
pub use cached::{BackwardInterpolation, CachedInterpolation};
pub use discover::{find_horizontal_systems, HorizontalCs};
pub use error::{RegridError, Result};
pub use forward::{ForwardAggregation, ForwardInterpolation};
pub use interpolator::Regridder;
pub use method::{InterpolationMethod, Kernel};
pub use preprocess::Preprocess2d;
pub use vector::CachedVectorReprojection;
