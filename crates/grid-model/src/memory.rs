//! In-memory dataset reader.

use crate::data::DataArray;
use crate::error::{ModelError, ModelResult};
use crate::reader::DatasetReader;
use crate::schema::Schema;

/// A reader serving a schema whose variables carry in-memory data.
///
/// Used as the carrier for template grids and as the source in tests.
#[derive(Debug, Clone)]
pub struct MemoryReader {
    schema: Schema,
}

impl MemoryReader {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }
}

impl DatasetReader for MemoryReader {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn variable_data(&self, name: &str) -> ModelResult<DataArray> {
        let var = self
            .schema
            .variable(name)
            .ok_or_else(|| ModelError::UnknownVariable(name.to_string()))?;
        var.data()
            .cloned()
            .ok_or_else(|| ModelError::NoData(name.to_string()))
    }

    fn data_slice(&self, name: &str, unlim_pos: usize) -> ModelResult<DataArray> {
        self.schema.memory_slice(name, unlim_pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ElementType;
    use crate::schema::{Dimension, Variable};

    #[test]
    fn test_memory_reader_scaled_data() {
        let mut schema = Schema::new();
        schema.add_dimension(Dimension::new("x", 3));
        schema.add_variable(
            Variable::new("t", ElementType::I16, vec!["x".into()])
                .with_data(DataArray::I16(vec![10, 20, -99]))
                .with_attribute("scale_factor", 0.5)
                .with_attribute("add_offset", 100.0)
                .with_attribute("_FillValue", -99.0),
        );
        let reader = MemoryReader::new(schema);
        let scaled = reader.scaled_data("t").unwrap().to_f64();
        assert_eq!(scaled[0], 105.0);
        assert_eq!(scaled[1], 110.0);
        assert!(scaled[2].is_nan());
    }
}
