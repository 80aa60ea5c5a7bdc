//! Schema rewriting: replace the horizontal grid of a dataset schema with
//! the output grid.

use grid_model::{DataArray, Dimension, ElementType, Schema, Variable};
use projection::Projection;
use tracing::{debug, warn};

use crate::discover::HorizontalCs;
use crate::error::Result;

/// The output grid a schema is rewritten onto.
#[derive(Debug, Clone)]
pub struct OutputGrid<'a> {
    pub projection: &'a Projection,
    pub x_values: &'a [f64],
    pub y_values: &'a [f64],
    pub x_unit: &'a str,
    pub y_unit: &'a str,
    pub x_type: ElementType,
    pub y_type: ElementType,
}

/// Rewrite a schema for the output grid.
///
/// Every system's axis pair is replaced by the output axes (all systems
/// converge on the first system's axis names), stale projection variables
/// and 2D coordinates are dropped, a new projection variable with CF
/// attributes is installed (except for a plain lat/lon target), new 2D
/// lat/lon coordinates are generated, and each reprojected variable's
/// `coordinates`/`grid_mapping` attributes are rewired.
pub fn rewrite_schema(
    schema: &mut Schema,
    systems: &[HorizontalCs],
    grid: &OutputGrid,
    longitude_name: &str,
    latitude_name: &str,
) -> Result<()> {
    let all_vars: Vec<String> = systems
        .iter()
        .flat_map(|s| s.variables.iter().cloned())
        .collect();

    let mut new_x: Option<String> = None;
    let mut new_y: Option<String> = None;
    for cs in systems {
        if cs.projection.is_some() {
            // stale grid mappings confuse downstream tools
            for name in schema.find_variables_with_attribute("grid_mapping_name") {
                debug!(variable = %name, "removing projection variable");
                schema.remove_variable(&name);
            }
        }

        let (org_x, org_y) = original_axes(schema, cs);
        match (&new_x, &new_y) {
            (None, None) => {
                new_x = Some(org_x.clone());
                new_y = Some(org_y.clone());
            }
            (Some(nx), Some(ny)) => {
                // realign later systems onto the first system's axes
                for var_name in &all_vars {
                    if let Some(var) = schema.variable_mut(var_name) {
                        let dims = var
                            .dims()
                            .iter()
                            .map(|d| {
                                if *d == org_x {
                                    nx.clone()
                                } else if *d == org_y {
                                    ny.clone()
                                } else {
                                    d.clone()
                                }
                            })
                            .collect();
                        var.set_dims(dims);
                    }
                }
                schema.remove_variable(&org_x);
                schema.remove_variable(&org_y);
            }
            _ => {}
        }

        if let (Some(lat), Some(lon)) = (&cs.lat, &cs.lon) {
            debug!(lat = %lat, lon = %lon, "removing old coordinate variables");
            schema.remove_variable(lat);
            schema.remove_variable(lon);
        }
        if new_x.as_ref() != Some(&org_x) {
            schema.remove_dimension(&org_x);
            schema.remove_dimension(&org_y);
        }
    }
    let (Some(new_x), Some(new_y)) = (new_x, new_y) else {
        return Ok(());
    };

    let proj_var = install_projection_variable(schema, grid.projection);

    let (x_standard, y_standard) = axis_standard_names(grid.projection);
    install_axis(schema, &new_x, grid.x_type, x_standard, grid.x_unit, grid.x_values);
    install_axis(schema, &new_y, grid.y_type, y_standard, grid.y_unit, grid.y_values);

    let mut coordinates = None;
    if !grid.projection.is_latlong() {
        let lon_name = unused_name(schema, longitude_name);
        let lat_name = unused_name(schema, latitude_name);
        generate_projection_coordinates(schema, grid, &new_x, &new_y, &lon_name, &lat_name);
        coordinates = Some(format!("{} {}", lon_name, lat_name));
    }

    for var_name in &all_vars {
        match (&coordinates, &proj_var) {
            (Some(coords), Some(proj_name)) => {
                schema.set_attribute(var_name, "coordinates", coords.clone())?;
                schema.set_attribute(var_name, "grid_mapping", proj_name.clone())?;
            }
            _ => {
                schema.remove_attribute(var_name, "coordinates");
                schema.remove_attribute(var_name, "grid_mapping");
            }
        }
    }
    Ok(())
}

/// Rewrite a schema onto a template grid: axes named `x`/`y`, 2D lat/lon
/// copied from the template, no grid mapping.
pub fn rewrite_schema_for_template(
    schema: &mut Schema,
    cs: &HorizontalCs,
    grid: &OutputGrid,
    template_lat: Vec<f32>,
    template_lon: Vec<f32>,
) -> Result<()> {
    if cs.projection.is_some() {
        for name in schema.find_variables_with_attribute("grid_mapping_name") {
            debug!(variable = %name, "removing projection variable");
            schema.remove_variable(&name);
        }
    }
    let (org_x, org_y) = original_axes(schema, cs);
    if let (Some(lat), Some(lon)) = (&cs.lat, &cs.lon) {
        schema.remove_variable(lat);
        schema.remove_variable(lon);
    }
    schema.remove_attribute(&org_x, "long_name");
    schema.remove_attribute(&org_y, "long_name");

    install_template_axis(
        schema,
        "x",
        &org_x,
        grid.x_type,
        "x-coordinate in Cartesian system",
        "projection_x_coordinate",
        grid.x_unit,
        grid.x_values,
    );
    install_template_axis(
        schema,
        "y",
        &org_y,
        grid.y_type,
        "y-coordinate in Cartesian system",
        "projection_y_coordinate",
        grid.y_unit,
        grid.y_values,
    );

    let shape = vec!["y".to_string(), "x".to_string()];
    for (name, standard, unit, values) in [
        ("latitude", "latitude", "degree_north", template_lat),
        ("longitude", "longitude", "degree_east", template_lon),
    ] {
        if !schema.has_variable(name) {
            schema.add_variable(Variable::new(name, ElementType::F32, shape.clone()));
        }
        schema.set_attribute(name, "standard_name", standard)?;
        schema.set_attribute(name, "long_name", standard)?;
        schema.set_attribute(name, "units", unit)?;
        if let Some(var) = schema.variable_mut(name) {
            var.set_data(DataArray::F32(values));
        }
    }

    for var_name in &cs.variables {
        if let Some(var) = schema.variable_mut(var_name) {
            let dims = var
                .dims()
                .iter()
                .map(|d| {
                    if *d == org_x {
                        "x".to_string()
                    } else if *d == org_y {
                        "y".to_string()
                    } else {
                        d.clone()
                    }
                })
                .collect();
            var.set_dims(dims);
        }
        schema.set_attribute(var_name, "coordinates", "longitude latitude")?;
        schema.remove_attribute(var_name, "grid_mapping");
    }

    if org_x != "x" {
        schema.remove_dimension(&org_x);
    }
    if org_y != "y" {
        schema.remove_dimension(&org_y);
    }
    Ok(())
}

/// The dimension names carrying the horizontal grid of a system. When the
/// longitude field doubles as the x axis the dimensions are inferred from
/// its 2D shape.
fn original_axes(schema: &Schema, cs: &HorizontalCs) -> (String, String) {
    if cs.lon.as_deref() == Some(cs.geo_x.as_str()) {
        if let Some(lon_var) = schema.variable(&cs.geo_x) {
            let dims = lon_var.dims();
            if dims.len() == 2 {
                warn!(x = %dims[1], y = %dims[0], "guessing x and y axis from longitude shape");
                return (dims[1].clone(), dims[0].clone());
            }
        }
    }
    (cs.geo_x.clone(), cs.geo_y.clone())
}

fn axis_standard_names(projection: &Projection) -> (&'static str, &'static str) {
    match projection {
        Projection::LatLong(_) => ("longitude", "latitude"),
        Projection::RotatedLatLong(_) => ("grid_longitude", "grid_latitude"),
        _ => ("projection_x_coordinate", "projection_y_coordinate"),
    }
}

/// Install the projection variable for a non-latlong target, suffixing the
/// name on collision. Returns its name.
fn install_projection_variable(schema: &mut Schema, projection: &Projection) -> Option<String> {
    if projection.is_latlong() {
        return None;
    }
    let name = unused_name(schema, &format!("projection_{}", projection.proj_keyword()));
    let mut var = Variable::new(&name, ElementType::I32, vec![]).with_data(DataArray::I32(vec![0]));
    for (attr, value) in projection.cf_attributes() {
        var.set_attribute(attr, value);
    }
    schema.add_variable(var);
    Some(name)
}

fn unused_name(schema: &Schema, base: &str) -> String {
    let mut name = base.to_string();
    let mut i = 0;
    while schema.has_variable(&name) {
        i += 1;
        name = format!("{}{}", base, i);
    }
    name
}

/// Create or retype an output axis variable and size its dimension.
fn install_axis(
    schema: &mut Schema,
    name: &str,
    ty: ElementType,
    standard_name: &str,
    unit: &str,
    values: &[f64],
) {
    schema.remove_attribute(name, "long_name");
    if !schema.has_variable(name) {
        schema.add_variable(Variable::new(name, ty, vec![name.to_string()]));
    }
    if let Some(var) = schema.variable_mut(name) {
        var.set_element_type(ty);
        var.set_attribute("standard_name", standard_name);
        var.set_attribute("units", unit);
        var.set_data(DataArray::from_f64s(ty, values));
    }
    schema.add_dimension(Dimension::new(name, values.len()));
}

/// The template flavour of [`install_axis`]: fixed `x`/`y` names with the
/// full CF attribute set.
#[allow(clippy::too_many_arguments)]
fn install_template_axis(
    schema: &mut Schema,
    axis_name: &str,
    org: &str,
    ty: ElementType,
    long_name: &str,
    standard_name: &str,
    unit: &str,
    values: &[f64],
) {
    let target = if schema.has_variable(axis_name) {
        org.to_string()
    } else {
        schema.add_variable(Variable::new(
            axis_name,
            ty,
            vec![axis_name.to_string()],
        ));
        axis_name.to_string()
    };
    if let Some(var) = schema.variable_mut(&target) {
        var.set_element_type(ty);
        var.set_attribute("axis", axis_name.to_string());
        var.set_attribute("long_name", long_name);
        var.set_attribute("standard_name", standard_name);
        var.set_attribute("units", unit);
        var.set_data(DataArray::from_f64s(ty, values));
    }
    schema.add_dimension(Dimension::new(&target, values.len()));
}

/// Generate 2D lat/lon coordinates of the output grid by inverse
/// projection of the axis cross product.
fn generate_projection_coordinates(
    schema: &mut Schema,
    grid: &OutputGrid,
    new_x: &str,
    new_y: &str,
    lon_name: &str,
    lat_name: &str,
) {
    let nx = grid.x_values.len();
    let ny = grid.y_values.len();
    let mut lon_field = vec![0f32; nx * ny];
    let mut lat_field = vec![0f32; nx * ny];
    let to_plane = |v: f64| {
        if grid.projection.is_degree() {
            v.to_radians()
        } else {
            v
        }
    };
    for (iy, &y) in grid.y_values.iter().enumerate() {
        for (ix, &x) in grid.x_values.iter().enumerate() {
            let (lon, lat) = grid.projection.inverse(to_plane(x), to_plane(y));
            lon_field[ix + iy * nx] = lon.to_degrees() as f32;
            lat_field[ix + iy * nx] = lat.to_degrees() as f32;
        }
    }
    let shape = vec![new_y.to_string(), new_x.to_string()];
    schema.add_variable(
        Variable::new(lon_name, ElementType::F32, shape.clone())
            .with_attribute("standard_name", "longitude")
            .with_attribute("long_name", "longitude")
            .with_attribute("units", "degree_east")
            .with_data(DataArray::F32(lon_field)),
    );
    schema.add_variable(
        Variable::new(lat_name, ElementType::F32, shape)
            .with_attribute("standard_name", "latitude")
            .with_attribute("long_name", "latitude")
            .with_attribute("units", "degree_north")
            .with_data(DataArray::F32(lat_field)),
    );
}
