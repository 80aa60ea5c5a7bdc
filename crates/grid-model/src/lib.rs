//! Dataset model for gridded geoscientific data.
//!
//! This crate holds the schema-level view of a dataset (dimensions,
//! variables, attributes, fill values, spatial-vector tagging), typed value
//! arrays, and the [`DatasetReader`] trait that data sources and
//! reprojecting views implement.
//!
//! # Module Structure
//!
//! - [`error`] - Error types and result alias
//! - [`data`] - Element types and flat value arrays
//! - [`schema`] - Dimensions, variables, attributes
//! - [`reader`] - The `DatasetReader` trait
//! - [`memory`] - In-memory reader over a populated schema

pub mod data;
pub mod error;
pub mod memory;
pub mod reader;
pub mod schema;

pub use data::{DataArray, ElementType};
pub use error::{ModelError, ModelResult};
pub use memory::MemoryReader;
pub use reader::DatasetReader;
pub use schema::{AttrValue, Dimension, Schema, SpatialVector, Variable, FILL_VALUE_ATTR};
