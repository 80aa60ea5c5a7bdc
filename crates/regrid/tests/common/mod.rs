//! Shared in-memory fixtures for the scenario tests.

use grid_model::{DataArray, Dimension, ElementType, MemoryReader, Schema, Variable};

/// A regular lat/lon dataset with one `temperature` variable of shape
/// `(lat, lon)`.
pub fn latlong_reader(lons_deg: &[f64], lats_deg: &[f64], values: Vec<f32>) -> MemoryReader {
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
    MemoryReader::new(schema)
}

/// A lat/lon dataset with an unlimited time dimension: `temperature` of
/// shape `(time, lat, lon)`.
pub fn latlong_time_reader(
    lons_deg: &[f64],
    lats_deg: &[f64],
    records: usize,
    values: Vec<f32>,
) -> MemoryReader {
    assert_eq!(values.len(), records * lons_deg.len() * lats_deg.len());
    let mut schema = Schema::new();
    schema.add_dimension(Dimension::unlimited("time", records));
    schema.add_dimension(Dimension::new("lon", lons_deg.len()));
    schema.add_dimension(Dimension::new("lat", lats_deg.len()));
    schema.add_variable(
        Variable::new("lon", ElementType::F64, vec!["lon".into()])
            .with_attribute("units", "degrees_east")
            .with_data(DataArray::F64(lons_deg.to_vec())),
    );
    schema.add_variable(
        Variable::new("lat", ElementType::F64, vec!["lat".into()])
            .with_attribute("units", "degrees_north")
            .with_data(DataArray::F64(lats_deg.to_vec())),
    );
    schema.add_variable(
        Variable::new(
            "temperature",
            ElementType::F32,
            vec!["time".into(), "lat".into(), "lon".into()],
        )
        .with_data(DataArray::F32(values)),
    );
    MemoryReader::new(schema)
}

/// A polar-stereographic dataset carrying a wind vector pair (`x_wind`,
/// `y_wind`) of shape `(y, x)`.
pub fn stereographic_wind_reader(
    x_metres: &[f64],
    y_metres: &[f64],
    proj4: &str,
    u: Vec<f32>,
    v: Vec<f32>,
) -> MemoryReader {
    let mut schema = Schema::new();
    schema.add_dimension(Dimension::new("x", x_metres.len()));
    schema.add_dimension(Dimension::new("y", y_metres.len()));
    schema.add_variable(
        Variable::new("x", ElementType::F64, vec!["x".into()])
            .with_attribute("standard_name", "projection_x_coordinate")
            .with_attribute("units", "m")
            .with_data(DataArray::F64(x_metres.to_vec())),
    );
    schema.add_variable(
        Variable::new("y", ElementType::F64, vec!["y".into()])
            .with_attribute("standard_name", "projection_y_coordinate")
            .with_attribute("units", "m")
            .with_data(DataArray::F64(y_metres.to_vec())),
    );
    schema.add_variable(
        Variable::new("projection_stere", ElementType::I32, vec![])
            .with_attribute("grid_mapping_name", "polar_stereographic")
            .with_attribute("proj4", proj4)
            .with_data(DataArray::I32(vec![0])),
    );
    schema.add_variable(
        Variable::new("x_wind", ElementType::F32, vec!["y".into(), "x".into()])
            .with_attribute("units", "m/s")
            .with_attribute("grid_mapping", "projection_stere")
            .with_spatial_vector("y_wind", "x")
            .with_data(DataArray::F32(u)),
    );
    schema.add_variable(
        Variable::new("y_wind", ElementType::F32, vec!["y".into(), "x".into()])
            .with_attribute("units", "m/s")
            .with_attribute("grid_mapping", "projection_stere")
            .with_spatial_vector("x_wind", "y")
            .with_data(DataArray::F32(v)),
    );
    MemoryReader::new(schema)
}

/// A template dataset: `referenceVariable` on an x/y grid with 2D lat/lon
/// coordinates, as used by template-driven reprojection.
pub fn template_reader(
    x_values: &[f64],
    y_values: &[f64],
    lats_deg: Vec<f32>,
    lons_deg: Vec<f32>,
) -> MemoryReader {
    assert_eq!(lats_deg.len(), x_values.len() * y_values.len());
    let mut schema = Schema::new();
    schema.add_dimension(Dimension::new("tx", x_values.len()));
    schema.add_dimension(Dimension::new("ty", y_values.len()));
    schema.add_variable(
        Variable::new("tx", ElementType::F64, vec!["tx".into()])
            .with_attribute("standard_name", "projection_x_coordinate")
            .with_attribute("units", "m")
            .with_data(DataArray::F64(x_values.to_vec())),
    );
    schema.add_variable(
        Variable::new("ty", ElementType::F64, vec!["ty".into()])
            .with_attribute("standard_name", "projection_y_coordinate")
            .with_attribute("units", "m")
            .with_data(DataArray::F64(y_values.to_vec())),
    );
    schema.add_variable(
        Variable::new("latitude", ElementType::F32, vec!["ty".into(), "tx".into()])
            .with_attribute("standard_name", "latitude")
            .with_attribute("units", "degree_north")
            .with_data(DataArray::F32(lats_deg)),
    );
    schema.add_variable(
        Variable::new("longitude", ElementType::F32, vec!["ty".into(), "tx".into()])
            .with_attribute("standard_name", "longitude")
            .with_attribute("units", "degree_east")
            .with_data(DataArray::F32(lons_deg)),
    );
    schema.add_variable(
        Variable::new(
            "referenceVariable",
            ElementType::F32,
            vec!["ty".into(), "tx".into()],
        )
        .with_attribute("coordinates", "longitude latitude")
        .with_data(DataArray::F32(vec![0.0; x_values.len() * y_values.len()])),
    );
    MemoryReader::new(schema)
}
