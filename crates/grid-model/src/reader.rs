//! Reader abstraction over one gridded dataset.

use crate::data::DataArray;
use crate::error::ModelResult;
use crate::schema::Schema;

/// Read access to a dataset: its schema, full variables, and 2D record
/// slices.
///
/// Implementations are expected to be thread-safe for concurrent reads of
/// distinct variables. A reprojecting view implements this trait itself, so
/// readers compose.
pub trait DatasetReader: Send + Sync {
    /// The dataset schema as seen through this reader.
    fn schema(&self) -> &Schema;

    /// Fetch the complete data of a variable.
    fn variable_data(&self, name: &str) -> ModelResult<DataArray>;

    /// Fetch one record slice of a variable at the given position of the
    /// unlimited dimension. Variables without an unlimited dimension yield
    /// their full data for every position.
    fn data_slice(&self, name: &str, unlim_pos: usize) -> ModelResult<DataArray>;

    /// Fetch a variable with `scale_factor`/`add_offset` applied and the
    /// fill sentinel replaced by NaN, as f64 values.
    fn scaled_data(&self, name: &str) -> ModelResult<DataArray> {
        let schema = self.schema();
        let fill = schema.fill_value(name);
        let scale = schema
            .attribute(name, "scale_factor")
            .and_then(|a| a.as_f64())
            .unwrap_or(1.0);
        let offset = schema
            .attribute(name, "add_offset")
            .and_then(|a| a.as_f64())
            .unwrap_or(0.0);
        let mut values = self.variable_data(name)?.to_f64();
        for v in values.iter_mut() {
            if *v == fill || (fill.is_nan() && v.is_nan()) {
                *v = f64::NAN;
            } else {
                *v = *v * scale + offset;
            }
        }
        Ok(DataArray::F64(values))
    }
}
