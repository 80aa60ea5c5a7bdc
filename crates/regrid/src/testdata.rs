//! In-memory datasets for unit tests.

use grid_model::{DataArray, Dimension, ElementType, MemoryReader, Schema, Variable};

/// A regular lat/lon dataset with one `temperature` variable of shape
/// `(lat, lon)`.
pub fn latlong_schema(lons_deg: &[f64], lats_deg: &[f64], values: Vec<f32>) -> Schema {
    assert_eq!(values.len(), lons_deg.len() * lats_deg.len());
    let mut schema = Schema::new();
    schema.add_dimension(Dimension::new("lon", lons_deg.len()));
    schema.add_dimension(Dimension::new("lat", lats_deg.len()));
    schema.add_variable(
        Variable::new("lon", ElementType::F64, vec!["lon".into()])
            .with_attribute("units", "degrees_east")
            .with_attribute("standard_name", "longitude")
            .with_data(DataArray::F64(lons_deg.to_vec())),
    );
    schema.add_variable(
        Variable::new("lat", ElementType::F64, vec!["lat".into()])
            .with_attribute("units", "degrees_north")
            .with_attribute("standard_name", "latitude")
            .with_data(DataArray::F64(lats_deg.to_vec())),
    );
    schema.add_variable(
        Variable::new(
            "temperature",
            ElementType::F32,
            vec!["lat".into(), "lon".into()],
        )
        .with_attribute("units", "K")
        .with_data(DataArray::F32(values)),
    );
    schema
}

/// [`latlong_schema`] wrapped in a reader.
pub fn latlong_reader(lons_deg: &[f64], lats_deg: &[f64], values: Vec<f32>) -> MemoryReader {
    MemoryReader::new(latlong_schema(lons_deg, lats_deg, values))
}
