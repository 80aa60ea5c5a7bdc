//! Horizontal coordinate-system discovery.
//!
//! Scans a schema for the axis pairs, lat/lon coordinates and grid
//! mappings that together define a horizontal grid, binds each data
//! variable to the system covering it, and removes variables that share
//! grid dimensions without belonging to any system (they cannot survive a
//! reprojection).
//!
//! Systems hold variable *names* only; the schema stays the single owner
//! of variable state.

use std::collections::BTreeSet;

use grid_model::{Schema, Variable};
use projection::Projection;
use tracing::{debug, warn};

use crate::error::{RegridError, Result};

/// Variable name a template dataset must contain; its coordinate system
/// defines the template grid.
pub const REFERENCE_VARIABLE: &str = "referenceVariable";

/// A minimised horizontal coordinate system: axis and coordinate names
/// plus the variables bound to it.
#[derive(Debug, Clone)]
pub struct HorizontalCs {
    /// Identifier; the joined axis names.
    pub id: String,
    /// Name of the x axis (or of the 2D longitude field when no 1D axis
    /// exists).
    pub geo_x: String,
    /// Name of the y axis (or of the 2D latitude field).
    pub geo_y: String,
    /// The grid's projection, when declared or implied.
    pub projection: Option<Projection>,
    /// Latitude coordinate variable, when present.
    pub lat: Option<String>,
    /// Longitude coordinate variable, when present.
    pub lon: Option<String>,
    /// Data variables using this system.
    pub variables: Vec<String>,
    /// Whether x and y are plain 1D dimension variables.
    pub is_simple_grid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisType {
    GeoX,
    GeoY,
    Lon,
    Lat,
}

fn classify_axis(var: &Variable) -> Option<AxisType> {
    if let Some(name) = var.attribute("standard_name").and_then(|a| a.as_text()) {
        match name {
            "longitude" => return Some(AxisType::Lon),
            "latitude" => return Some(AxisType::Lat),
            "projection_x_coordinate" | "grid_longitude" => return Some(AxisType::GeoX),
            "projection_y_coordinate" | "grid_latitude" => return Some(AxisType::GeoY),
            _ => {}
        }
    }
    if let Some(units) = var.attribute("units").and_then(|a| a.as_text()) {
        if units.contains("degree_east") || units.contains("degrees_east") {
            return Some(AxisType::Lon);
        }
        if units.contains("degree_north") || units.contains("degrees_north") {
            return Some(AxisType::Lat);
        }
    }
    match var.attribute("axis").and_then(|a| a.as_text()) {
        Some("X") | Some("x") => Some(AxisType::GeoX),
        Some("Y") | Some("y") => Some(AxisType::GeoY),
        _ => None,
    }
}

/// A dimension variable in the NetCDF sense: 1D, named after its
/// dimension.
fn is_coordinate_var(var: &Variable) -> bool {
    var.dims().len() == 1 && var.dims()[0] == var.name()
}

struct CsCandidate {
    geo_x: String,
    geo_y: String,
    projection: Option<Projection>,
    lat: Option<String>,
    lon: Option<String>,
    is_simple_grid: bool,
}

/// Resolve the horizontal coordinate system a variable is gridded on, if
/// any.
fn horizontal_system_for(schema: &Schema, var: &Variable) -> Option<CsCandidate> {
    // 1D dimension variables along the variable's dims
    let mut x_axis: Option<(String, AxisType)> = None;
    let mut y_axis: Option<(String, AxisType)> = None;
    for dim in var.dims() {
        let Some(axis_var) = schema.variable(dim) else {
            continue;
        };
        if !is_coordinate_var(axis_var) {
            continue;
        }
        match classify_axis(axis_var) {
            Some(kind @ (AxisType::GeoX | AxisType::Lon)) => {
                // a projection axis wins over a longitude axis
                if x_axis.is_none() || kind == AxisType::GeoX {
                    x_axis = Some((dim.clone(), kind));
                }
            }
            Some(kind @ (AxisType::GeoY | AxisType::Lat)) => {
                if y_axis.is_none() || kind == AxisType::GeoY {
                    y_axis = Some((dim.clone(), kind));
                }
            }
            None => {}
        }
    }

    // lat/lon coordinates listed on the variable, possibly 2D
    let mut lat = None;
    let mut lon = None;
    if let Some(coords) = var.attribute("coordinates").and_then(|a| a.as_text()) {
        for name in coords.split_whitespace() {
            if let Some(coord_var) = schema.variable(name) {
                match classify_axis(coord_var) {
                    Some(AxisType::Lat) => lat = Some(name.to_string()),
                    Some(AxisType::Lon) => lon = Some(name.to_string()),
                    _ => {}
                }
            }
        }
    }
    if lat.is_none() || lon.is_none() {
        if let (Some((x, AxisType::Lon)), Some((y, AxisType::Lat))) = (&x_axis, &y_axis) {
            lon = Some(x.clone());
            lat = Some(y.clone());
        }
    }

    // declared grid mapping, or latitude/longitude implied by the axes
    let mut projection = None;
    if let Some(mapping) = var.attribute("grid_mapping").and_then(|a| a.as_text()) {
        if let Some(proj4) = schema.attribute(mapping, "proj4").and_then(|a| a.as_text()) {
            match Projection::from_proj_string(proj4) {
                Ok(proj) => projection = Some(proj),
                Err(err) => {
                    warn!(variable = var.name(), %err, "ignoring unparsable grid mapping")
                }
            }
        }
    }
    if projection.is_none() {
        if let (Some((_, AxisType::Lon)), Some((_, AxisType::Lat))) = (&x_axis, &y_axis) {
            projection = Some(Projection::latlong());
        }
    }

    match (x_axis, y_axis) {
        (Some((x, _)), Some((y, _))) => Some(CsCandidate {
            geo_x: x,
            geo_y: y,
            projection,
            lat,
            lon,
            is_simple_grid: true,
        }),
        _ => {
            // no axis pair: fall back to 2D lat/lon fields as the grid
            let (lat, lon) = (lat?, lon?);
            if schema.variable(&lon)?.dims().len() != 2 {
                return None;
            }
            Some(CsCandidate {
                geo_x: lon.clone(),
                geo_y: lat.clone(),
                projection,
                lat: Some(lat),
                lon: Some(lon),
                is_simple_grid: false,
            })
        }
    }
}

/// Discover the horizontal coordinate systems of a schema and bind data
/// variables to them.
///
/// With `with_projection` set, only simple spatial grids with a declared
/// (or implied) projection qualify; otherwise any system exposing lat and
/// lon coordinates does. Variables that belong to no system but share a
/// grid dimension with one are removed from the schema.
pub fn find_horizontal_systems(
    schema: &mut Schema,
    with_projection: bool,
) -> Result<Vec<HorizontalCs>> {
    let mut systems: Vec<HorizontalCs> = Vec::new();

    for var in schema.variables() {
        if var.dims().len() < 2 || is_coordinate_var(var) {
            continue;
        }
        if var.attribute("grid_mapping_name").is_some() {
            continue;
        }
        // 2D lat/lon fields describe a grid, they are not gridded data
        if matches!(classify_axis(var), Some(AxisType::Lat | AxisType::Lon)) {
            continue;
        }
        let Some(cs) = horizontal_system_for(schema, var) else {
            continue;
        };
        let usable = if with_projection {
            cs.is_simple_grid && cs.projection.is_some()
        } else {
            cs.lat.is_some() && cs.lon.is_some()
        };
        if !usable {
            debug!(
                variable = var.name(),
                simple = cs.is_simple_grid,
                has_projection = cs.projection.is_some(),
                "coordinate system dropped"
            );
            continue;
        }
        if cs.geo_x == var.name() || cs.geo_y == var.name() {
            continue;
        }
        let id = format!("{},{}", cs.geo_x, cs.geo_y);
        match systems.iter_mut().find(|s| s.id == id) {
            Some(existing) => existing.variables.push(var.name().to_string()),
            None => systems.push(HorizontalCs {
                id,
                geo_x: cs.geo_x,
                geo_y: cs.geo_y,
                projection: cs.projection,
                lat: cs.lat,
                lon: cs.lon,
                variables: vec![var.name().to_string()],
                is_simple_grid: cs.is_simple_grid,
            }),
        }
    }

    if systems.is_empty() {
        return Err(RegridError::NoCoordinateSystem(
            if with_projection {
                " with projection"
            } else {
                ""
            }
            .to_string(),
        ));
    }
    debug!(
        systems = systems.len(),
        variables = systems.iter().map(|s| s.variables.len()).sum::<usize>(),
        "horizontal coordinate systems discovered"
    );

    remove_incompatible_variables(schema, &systems);
    Ok(systems)
}

/// Remove variables that are neither bound to a kept system nor one of
/// its coordinates yet share a grid dimension: after the rewrite their
/// shapes would be meaningless.
fn remove_incompatible_variables(schema: &mut Schema, systems: &[HorizontalCs]) {
    let mut grid_dims: BTreeSet<String> = BTreeSet::new();
    let mut cs_names: BTreeSet<&str> = BTreeSet::new();
    for cs in systems {
        for axis in [&cs.geo_x, &cs.geo_y] {
            cs_names.insert(axis.as_str());
            if let Some(var) = schema.variable(axis) {
                grid_dims.extend(var.dims().iter().cloned());
            }
        }
        for coord in [&cs.lat, &cs.lon].into_iter().flatten() {
            cs_names.insert(coord.as_str());
        }
        cs_names.extend(cs.variables.iter().map(String::as_str));
    }

    let doomed: Vec<String> = schema
        .variables()
        .iter()
        .filter(|v| {
            !cs_names.contains(v.name())
                && v.attribute("grid_mapping_name").is_none()
                && v.dims().iter().any(|d| grid_dims.contains(d))
        })
        .map(|v| v.name().to_string())
        .collect();
    for name in doomed {
        warn!(
            variable = %name,
            "removing variable: not compatible with the reprojected coordinates"
        );
        schema.remove_variable(&name);
    }
}

/// The output grid of a template dataset: x/y axes plus lat/lon fields of
/// its reference variable.
#[derive(Debug, Clone)]
pub struct TemplateGrid {
    pub x: String,
    pub y: String,
    pub lat: String,
    pub lon: String,
}

/// Resolve the template grid convention: a variable named
/// [`REFERENCE_VARIABLE`] whose coordinate system supplies axes and
/// lat/lon fields.
pub fn reference_grid(schema: &Schema) -> Result<TemplateGrid> {
    let var = schema.variable(REFERENCE_VARIABLE).ok_or_else(|| {
        RegridError::ShapeMismatch(format!(
            "template dataset does not contain a '{}' variable",
            REFERENCE_VARIABLE
        ))
    })?;
    let cs = horizontal_system_for(schema, var).ok_or_else(|| {
        RegridError::ShapeMismatch("template reference variable has no horizontal grid".to_string())
    })?;
    let (Some(lat), Some(lon)) = (cs.lat, cs.lon) else {
        return Err(RegridError::ShapeMismatch(
            "template reference variable has no lat/lon coordinates".to_string(),
        ));
    };
    Ok(TemplateGrid {
        x: cs.geo_x,
        y: cs.geo_y,
        lat,
        lon,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_model::{DataArray, Dimension, ElementType, Variable};

    fn latlong_schema() -> Schema {
        let mut schema = Schema::new();
        schema.add_dimension(Dimension::new("lon", 3));
        schema.add_dimension(Dimension::new("lat", 2));
        schema.add_variable(
            Variable::new("lon", ElementType::F64, vec!["lon".into()])
                .with_attribute("units", "degrees_east")
                .with_data(DataArray::F64(vec![0.0, 10.0, 20.0])),
        );
        schema.add_variable(
            Variable::new("lat", ElementType::F64, vec!["lat".into()])
                .with_attribute("units", "degrees_north")
                .with_data(DataArray::F64(vec![0.0, 10.0])),
        );
        schema.add_variable(Variable::new(
            "temperature",
            ElementType::F32,
            vec!["lat".into(), "lon".into()],
        ));
        schema
    }

    #[test]
    fn test_discover_implicit_latlong() {
        let mut schema = latlong_schema();
        let systems = find_horizontal_systems(&mut schema, true).unwrap();
        assert_eq!(systems.len(), 1);
        let cs = &systems[0];
        assert_eq!(cs.geo_x, "lon");
        assert_eq!(cs.geo_y, "lat");
        assert!(cs.projection.as_ref().unwrap().is_latlong());
        assert_eq!(cs.variables, vec!["temperature".to_string()]);
        assert!(cs.is_simple_grid);
    }

    #[test]
    fn test_incompatible_variable_is_dropped() {
        let mut schema = latlong_schema();
        schema.add_dimension(Dimension::new("other", 4));
        // shares the lon dimension but is not gridded on lat/lon
        schema.add_variable(Variable::new(
            "weights",
            ElementType::F32,
            vec!["other".into(), "lon".into()],
        ));
        find_horizontal_systems(&mut schema, true).unwrap();
        assert!(!schema.has_variable("weights"));
    }

    #[test]
    fn test_no_system_errors() {
        let mut schema = Schema::new();
        schema.add_dimension(Dimension::new("n", 5));
        schema.add_variable(Variable::new(
            "samples",
            ElementType::F32,
            vec!["n".into()],
        ));
        assert!(matches!(
            find_horizontal_systems(&mut schema, true),
            Err(RegridError::NoCoordinateSystem(_))
        ));
    }

    #[test]
    fn test_projected_grid_with_mapping() {
        let mut schema = Schema::new();
        schema.add_dimension(Dimension::new("x", 2));
        schema.add_dimension(Dimension::new("y", 2));
        schema.add_variable(
            Variable::new("x", ElementType::F64, vec!["x".into()])
                .with_attribute("standard_name", "projection_x_coordinate")
                .with_data(DataArray::F64(vec![0.0, 1000.0])),
        );
        schema.add_variable(
            Variable::new("y", ElementType::F64, vec!["y".into()])
                .with_attribute("standard_name", "projection_y_coordinate")
                .with_data(DataArray::F64(vec![0.0, 1000.0])),
        );
        schema.add_variable(
            Variable::new("projection_stere", ElementType::I32, vec![])
                .with_attribute("grid_mapping_name", "polar_stereographic")
                .with_attribute("proj4", "+proj=stere +lat_0=90 +lon_0=0 +R=6371000"),
        );
        schema.add_variable(
            Variable::new("pressure", ElementType::F32, vec!["y".into(), "x".into()])
                .with_attribute("grid_mapping", "projection_stere"),
        );
        let systems = find_horizontal_systems(&mut schema, true).unwrap();
        assert_eq!(systems.len(), 1);
        assert_eq!(systems[0].projection.as_ref().unwrap().proj_keyword(), "stere");
        assert!(systems[0].lat.is_none());
    }
}
