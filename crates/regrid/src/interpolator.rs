//! The reprojecting view: grid planning at configure time, cached
//! resampling at read time.

use std::collections::HashMap;
use std::sync::Arc;

use grid_model::{DataArray, DatasetReader, ElementType, ModelError, ModelResult, Schema};
use projection::{project_axes, project_values, vector_reproject_matrix, Projection};
use tracing::{debug, info, warn};

use crate::axis_spec::AxisSpec;
use crate::cached::{BackwardInterpolation, CachedInterpolation};
use crate::discover::{find_horizontal_systems, reference_grid, HorizontalCs};
use crate::error::{RegridError, Result};
use crate::forward::ForwardInterpolation;
use crate::geometry::{self, points_to_position, AxisKind};
use crate::locate;
use crate::method::InterpolationMethod;
use crate::preprocess::{run_preprocessors, Preprocess2d};
use crate::schema_rewrite::{rewrite_schema, rewrite_schema_for_template, OutputGrid};
use crate::vector::CachedVectorReprojection;

/// A reprojecting view over a dataset reader.
///
/// `change_projection` discovers the source's horizontal coordinate
/// systems, rewrites the schema onto the requested output grid and
/// precomputes one cached interpolation (and, for the projection-kernel
/// methods, one vector reprojection) per system. Reads then pull source
/// slices, resample them and rotate vector pairs.
///
/// The view itself implements [`DatasetReader`], so reprojected data is
/// consumed through the same interface as the source.
pub struct Regridder {
    reader: Arc<dyn DatasetReader>,
    schema: Schema,
    /// variable name -> horizontal coordinate system id
    var_cs: HashMap<String, String>,
    /// coordinate system id -> cached interpolation
    cached: HashMap<String, CachedInterpolation>,
    /// coordinate system id -> cached vector rotation
    vectors: HashMap<String, CachedVectorReprojection>,
    preprocesses: Vec<Arc<dyn Preprocess2d>>,
    latitude_name: String,
    longitude_name: String,
    distance_of_interest: Option<f64>,
}

impl Regridder {
    /// Create a view over `reader`. Until the first `change_projection`
    /// the view is a transparent passthrough.
    pub fn new(reader: Arc<dyn DatasetReader>) -> Self {
        let schema = reader.schema().clone();
        Self {
            reader,
            schema,
            var_cs: HashMap::new(),
            cached: HashMap::new(),
            vectors: HashMap::new(),
            preprocesses: Vec::new(),
            latitude_name: "lat".to_string(),
            longitude_name: "lon".to_string(),
            distance_of_interest: None,
        }
    }

    /// Name given to generated 2D latitude coordinates (default `lat`).
    pub fn set_latitude_name(&mut self, name: impl Into<String>) {
        self.latitude_name = name.into();
    }

    pub fn latitude_name(&self) -> &str {
        &self.latitude_name
    }

    /// Name given to generated 2D longitude coordinates (default `lon`).
    pub fn set_longitude_name(&mut self, name: impl Into<String>) {
        self.longitude_name = name.into();
    }

    pub fn longitude_name(&self) -> &str {
        &self.longitude_name
    }

    /// Override the automatic search radius of KD-based nearest location,
    /// in metres.
    pub fn set_distance_of_interest(&mut self, metres: f64) {
        self.distance_of_interest = Some(metres);
    }

    /// Register a preprocessor applied to every source plane of all
    /// subsequent reads.
    pub fn add_preprocess(&mut self, process: Arc<dyn Preprocess2d>) {
        debug!("adding interpolation preprocess");
        self.preprocesses.push(process);
    }

    /// Reconfigure the view onto a new grid with explicit axis values.
    ///
    /// Axis units are unit strings (`m`, `km` or a `degree…` variant);
    /// the axis element types control how the new axis variables are
    /// persisted. A failed reconfigure leaves the view unusable until the
    /// next successful call.
    #[allow(clippy::too_many_arguments)]
    pub fn change_projection(
        &mut self,
        method: InterpolationMethod,
        proj_string: &str,
        out_x: &[f64],
        out_y: &[f64],
        x_unit: &str,
        y_unit: &str,
        x_type: ElementType,
        y_type: ElementType,
    ) -> Result<()> {
        let dst_proj = Projection::from_proj_string(proj_string)?;
        self.reset();
        if method.is_projection_kernel() {
            self.by_projection_parameters(method, dst_proj, out_x, out_y, x_unit, y_unit, x_type, y_type)
        } else if method.is_coordinate() {
            self.by_coordinates(method, dst_proj, out_x, out_y, x_unit, y_unit, x_type, y_type)
        } else {
            self.by_forward_interpolation(method, dst_proj, out_x, out_y, x_unit, y_unit, x_type, y_type)
        }
    }

    /// Reconfigure with textual axis specifications; open-ended specs get
    /// their bounds from the source's extent projected into the target
    /// plane (metric targets only).
    #[allow(clippy::too_many_arguments)]
    pub fn change_projection_axes(
        &mut self,
        method: InterpolationMethod,
        proj_string: &str,
        x_spec: &str,
        y_spec: &str,
        x_unit: &str,
        y_unit: &str,
        x_type: &str,
        y_type: &str,
    ) -> Result<()> {
        let mut x_spec = AxisSpec::parse(x_spec)?;
        let mut y_spec = AxisSpec::parse(y_spec)?;
        if x_spec.requires_bounds() || y_spec.requires_bounds() {
            let dst_proj = Projection::from_proj_string(proj_string)?;
            if dst_proj.is_degree() {
                return Err(RegridError::UnsupportedMethod(
                    "detecting axis bounds is only supported for metric target projections"
                        .to_string(),
                ));
            }
            let ((x_min, x_max), (y_min, y_max)) = self.projected_bounds(&dst_proj)?;
            info!(x_min, y_min, x_max, y_max, "detected bounding box in target plane");
            x_spec.set_bounds(x_min, x_max);
            y_spec.set_bounds(y_min, y_max);
        }
        let x_type = ElementType::parse(x_type)?;
        let y_type = ElementType::parse(y_type)?;
        self.change_projection(
            method,
            proj_string,
            &x_spec.values()?,
            &y_spec.values()?,
            x_unit,
            y_unit,
            x_type,
            y_type,
        )
    }

    /// Reconfigure onto the grid of a template dataset whose lat/lon
    /// fields give the output sampling locations. Only the backward
    /// kernel methods are supported.
    pub fn change_projection_to_template(
        &mut self,
        method: InterpolationMethod,
        template: &dyn DatasetReader,
    ) -> Result<()> {
        if !method.is_projection_kernel() {
            return Err(RegridError::UnsupportedMethod(format!(
                "template interpolation does not support '{}'",
                method
            )));
        }
        let template_schema = template.schema();
        let names = reference_grid(template_schema)?;
        let template_x = template.variable_data(&names.x)?.to_f64();
        let template_y = template.variable_data(&names.y)?.to_f64();
        let template_lat = template.variable_data(&names.lat)?;
        let template_lon = template.variable_data(&names.lon)?;
        if template_lat.len() != template_x.len() * template_y.len()
            || template_lon.len() != template_lat.len()
        {
            return Err(RegridError::ShapeMismatch(format!(
                "template lat/lon fields do not cover the {}x{} template grid",
                template_x.len(),
                template_y.len()
            )));
        }
        let x_unit = attr_text(template_schema, &names.x, "units").unwrap_or("m").to_string();
        let y_unit = attr_text(template_schema, &names.y, "units").unwrap_or("m").to_string();
        let x_type = template_schema
            .variable(&names.x)
            .map(|v| v.element_type())
            .unwrap_or(ElementType::F64);
        let y_type = template_schema
            .variable(&names.y)
            .map(|v| v.element_type())
            .unwrap_or(ElementType::F64);

        self.reset();
        let systems = find_horizontal_systems(&mut self.schema, true)?;
        if systems.len() > 1 {
            return Err(RegridError::UnsupportedMethod(
                "template interpolation supports only one input horizontal grid".to_string(),
            ));
        }
        let cs = &systems[0];
        self.var_cs = bind_variables(&systems);
        let src_proj = cs
            .projection
            .clone()
            .ok_or_else(RegridError::no_coordinate_system)?;
        // source axis values are needed past the schema rewrite
        let src_x = self.source_axis(&cs.geo_x, src_proj.is_degree())?;
        let src_y = self.source_axis(&cs.geo_y, src_proj.is_degree())?;

        let latlong = Projection::latlong();
        let grid = OutputGrid {
            projection: &latlong,
            x_values: &template_x,
            y_values: &template_y,
            x_unit: &x_unit,
            y_unit: &y_unit,
            x_type,
            y_type,
        };
        rewrite_schema_for_template(
            &mut self.schema,
            cs,
            &grid,
            template_lat.to_f32(),
            template_lon.to_f32(),
        )?;

        // template sampling locations expressed in the source plane
        let mut points_x: Vec<f64> = template_lon.to_f64().iter().map(|v| v.to_radians()).collect();
        let mut points_y: Vec<f64> = template_lat.to_f64().iter().map(|v| v.to_radians()).collect();
        project_values(&latlong, &src_proj, &mut points_x, &mut points_y);
        let (kind_x, kind_y) = axis_kinds(src_proj.is_degree());
        points_to_position(&mut points_x, &src_x, kind_x);
        points_to_position(&mut points_y, &src_y, kind_y);

        let Some(kernel) = method.kernel() else {
            return Err(RegridError::UnsupportedMethod(method.to_string()));
        };
        debug!(
            source = format!("{}x{}", src_x.len(), src_y.len()),
            output = format!("{}x{}", template_x.len(), template_y.len()),
            "creating cached template interpolation"
        );
        self.cached.insert(
            cs.id.clone(),
            CachedInterpolation::Backward(BackwardInterpolation::new(
                kernel,
                points_x,
                points_y,
                src_x.len(),
                src_y.len(),
                template_x.len(),
                template_y.len(),
            )),
        );
        if self.has_spatial_vectors() {
            warn!("spatial vectors not implemented for template interpolation");
        }
        Ok(())
    }

    /// Fetch one record slice of a variable through the view: in-memory
    /// variables come from the rewritten schema, unmapped variables pass
    /// through, mapped variables run the resampling pipeline.
    pub fn get_data_slice(&self, var_name: &str, unlim_pos: usize) -> Result<DataArray> {
        let var = self
            .schema
            .variable(var_name)
            .ok_or_else(|| ModelError::UnknownVariable(var_name.to_string()))?;
        if var.has_data() {
            return Ok(self.schema.memory_slice(var_name, unlim_pos)?);
        }
        let Some(cs_id) = self.var_cs.get(var_name) else {
            return Ok(self.reader.data_slice(var_name, unlim_pos)?);
        };
        let Some(ci) = self.cached.get(cs_id) else {
            return Ok(self.reader.data_slice(var_name, unlim_pos)?);
        };

        let fill = self.schema.fill_value(var_name);
        let mut array = self.reader.data_slice(var_name, unlim_pos)?.to_f32();
        geometry::fill_to_nan(&mut array, fill);
        let (in_nx, in_ny) = ci.in_shape();
        let in_plane = in_nx * in_ny;
        if in_plane == 0 || array.len() % in_plane != 0 {
            return Err(RegridError::ShapeMismatch(format!(
                "slice of '{}' holds {} values, not a stack of {}x{} planes",
                var_name,
                array.len(),
                in_nx,
                in_ny
            )));
        }
        run_preprocessors(&self.preprocesses, &mut array, in_nx, in_ny);
        let mut out = ci.interpolate(&array);

        if let Some(vector) = var.spatial_vector() {
            match self.vectors.get(cs_id) {
                Some(cvr) => {
                    let counterpart = vector.counterpart.clone();
                    let counterpart_fill = self.schema.fill_value(&counterpart);
                    let mut counterpart_array =
                        self.reader.data_slice(&counterpart, unlim_pos)?.to_f32();
                    geometry::fill_to_nan(&mut counterpart_array, counterpart_fill);
                    if counterpart_array.len() != array.len() {
                        return Err(RegridError::ShapeMismatch(format!(
                            "vector counterpart '{}' does not match the shape of '{}'",
                            counterpart, var_name
                        )));
                    }
                    let mut counterpart_out = ci.interpolate(&counterpart_array);
                    let direction = vector.direction.as_str();
                    if direction.contains('x') || direction.contains("longitude") {
                        cvr.reproject_values(&mut out, &mut counterpart_out);
                    } else if direction.contains('y') || direction.contains("latitude") {
                        cvr.reproject_values(&mut counterpart_out, &mut out);
                    } else {
                        return Err(RegridError::ShapeMismatch(format!(
                            "no x/longitude or y/latitude direction for vector '{}': '{}'",
                            var_name, direction
                        )));
                    }
                }
                None => warn!(variable = var_name, "cannot reproject vector"),
            }
        }
        geometry::nan_to_fill(&mut out, fill);
        Ok(DataArray::F32(out))
    }

    fn reset(&mut self) {
        self.schema = self.reader.schema().clone();
        self.var_cs.clear();
        self.cached.clear();
        self.vectors.clear();
    }

    #[allow(clippy::too_many_arguments)]
    fn by_projection_parameters(
        &mut self,
        method: InterpolationMethod,
        dst_proj: Projection,
        out_x: &[f64],
        out_y: &[f64],
        x_unit: &str,
        y_unit: &str,
        x_type: ElementType,
        y_type: ElementType,
    ) -> Result<()> {
        let systems = find_horizontal_systems(&mut self.schema, true)?;
        self.var_cs = bind_variables(&systems);
        self.rewrite(&systems, &dst_proj, out_x, out_y, x_unit, y_unit, x_type, y_type)?;

        let out_x_plane = plane_axis(out_x, x_unit);
        let out_y_plane = plane_axis(out_y, y_unit);
        for cs in &systems {
            let src_proj = cs
                .projection
                .clone()
                .ok_or_else(RegridError::no_coordinate_system)?;
            let src_x = self.source_axis(&cs.geo_x, src_proj.is_degree())?;
            let src_y = self.source_axis(&cs.geo_y, src_proj.is_degree())?;

            // where, in fractional source indices, each output cell samples
            let (mut points_x, mut points_y) =
                project_axes(&dst_proj, &src_proj, &out_x_plane, &out_y_plane);
            let (kind_x, kind_y) = axis_kinds(src_proj.is_degree());
            points_to_position(&mut points_x, &src_x, kind_x);
            points_to_position(&mut points_y, &src_y, kind_y);

            debug!(
                source = format!("{}x{}", src_x.len(), src_y.len()),
                output = format!("{}x{}", out_x.len(), out_y.len()),
                "creating cached projection interpolation"
            );
            let Some(kernel) = method.kernel() else {
                return Err(RegridError::UnsupportedMethod(method.to_string()));
            };
            self.cached.insert(
                cs.id.clone(),
                CachedInterpolation::Backward(BackwardInterpolation::new(
                    kernel,
                    points_x,
                    points_y,
                    src_x.len(),
                    src_y.len(),
                    out_x.len(),
                    out_y.len(),
                )),
            );

            if self.has_spatial_vectors() {
                debug!(system = %cs.id, "creating cached vector reprojection");
                let matrix =
                    vector_reproject_matrix(&src_proj, &dst_proj, &out_x_plane, &out_y_plane);
                self.vectors.insert(
                    cs.id.clone(),
                    CachedVectorReprojection::new(matrix, out_x.len(), out_y.len()),
                );
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn by_coordinates(
        &mut self,
        method: InterpolationMethod,
        dst_proj: Projection,
        out_x: &[f64],
        out_y: &[f64],
        x_unit: &str,
        y_unit: &str,
        x_type: ElementType,
        y_type: ElementType,
    ) -> Result<()> {
        let systems = find_horizontal_systems(&mut self.schema, false)?;
        self.var_cs = bind_variables(&systems);
        self.rewrite(&systems, &dst_proj, out_x, out_y, x_unit, y_unit, x_type, y_type)?;

        let out_x_plane = plane_axis(out_x, x_unit);
        let out_y_plane = plane_axis(out_y, y_unit);
        let is_metric = !is_degree_unit(x_unit);
        let latlong = Projection::latlong();
        for cs in &systems {
            let coords = self.source_coordinates(cs)?;
            // output cells expressed as lon/lat queries
            let (mut points_x, mut points_y) =
                project_axes(&dst_proj, &latlong, &out_x_plane, &out_y_plane);
            match method {
                InterpolationMethod::CoordNn => locate::nearest_by_latitude_sweep(
                    &mut points_x,
                    &mut points_y,
                    &coords.lon,
                    &coords.lat,
                    coords.nx,
                ),
                InterpolationMethod::CoordNnKd => {
                    let max_dist = locate::max_distance_of_interest(
                        &out_x_plane,
                        &out_y_plane,
                        is_metric,
                        self.distance_of_interest,
                    );
                    locate::nearest_by_kdtree(
                        &mut points_x,
                        &mut points_y,
                        max_dist,
                        &coords.lon,
                        &coords.lat,
                        coords.nx,
                    );
                }
                other => return Err(RegridError::UnsupportedMethod(other.to_string())),
            }
            debug!(
                source = format!("{}x{}", coords.nx, coords.ny),
                output = format!("{}x{}", out_x.len(), out_y.len()),
                "creating cached coordinate interpolation"
            );
            self.cached.insert(
                cs.id.clone(),
                CachedInterpolation::Backward(BackwardInterpolation::new(
                    crate::method::Kernel::Nearest,
                    points_x,
                    points_y,
                    coords.nx,
                    coords.ny,
                    out_x.len(),
                    out_y.len(),
                )),
            );
        }
        if self.has_spatial_vectors() {
            warn!("vector data found, cannot reproject vectors with coordinate interpolation");
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn by_forward_interpolation(
        &mut self,
        method: InterpolationMethod,
        dst_proj: Projection,
        out_x: &[f64],
        out_y: &[f64],
        x_unit: &str,
        y_unit: &str,
        x_type: ElementType,
        y_type: ElementType,
    ) -> Result<()> {
        let systems = find_horizontal_systems(&mut self.schema, false)?;
        self.var_cs = bind_variables(&systems);
        self.rewrite(&systems, &dst_proj, out_x, out_y, x_unit, y_unit, x_type, y_type)?;

        let out_x_plane = plane_axis(out_x, x_unit);
        let out_y_plane = plane_axis(out_y, y_unit);
        let kind_x = if is_degree_unit(x_unit) {
            AxisKind::Longitude
        } else {
            AxisKind::ProjectionAxis
        };
        let kind_y = if is_degree_unit(y_unit) {
            AxisKind::Latitude
        } else {
            AxisKind::ProjectionAxis
        };
        let latlong = Projection::latlong();
        for cs in &systems {
            let mut coords = self.source_coordinates(cs)?;
            // source cells expressed in the target plane, then as output
            // cell positions
            project_values(&latlong, &dst_proj, &mut coords.lon, &mut coords.lat);
            points_to_position(&mut coords.lon, &out_x_plane, kind_x);
            points_to_position(&mut coords.lat, &out_y_plane, kind_y);

            let Some(aggregation) = method.aggregation() else {
                return Err(RegridError::UnsupportedMethod(method.to_string()));
            };
            debug!(
                source = format!("{}x{}", coords.nx, coords.ny),
                output = format!("{}x{}", out_x.len(), out_y.len()),
                "creating cached forward interpolation"
            );
            self.cached.insert(
                cs.id.clone(),
                CachedInterpolation::Forward(ForwardInterpolation::new(
                    aggregation,
                    &coords.lon,
                    &coords.lat,
                    coords.nx,
                    coords.ny,
                    out_x.len(),
                    out_y.len(),
                )),
            );
        }
        if self.has_spatial_vectors() {
            warn!("vector data found, cannot aggregate vectors with forward interpolation");
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn rewrite(
        &mut self,
        systems: &[HorizontalCs],
        dst_proj: &Projection,
        out_x: &[f64],
        out_y: &[f64],
        x_unit: &str,
        y_unit: &str,
        x_type: ElementType,
        y_type: ElementType,
    ) -> Result<()> {
        let grid = OutputGrid {
            projection: dst_proj,
            x_values: out_x,
            y_values: out_y,
            x_unit,
            y_unit,
            x_type,
            y_type,
        };
        rewrite_schema(
            &mut self.schema,
            systems,
            &grid,
            &self.longitude_name,
            &self.latitude_name,
        )
    }

    /// Bounding box of the source's lat/lon extent projected into the
    /// target plane.
    fn projected_bounds(&self, dst_proj: &Projection) -> Result<((f64, f64), (f64, f64))> {
        let mut probe = self.reader.schema().clone();
        let systems = find_horizontal_systems(&mut probe, false)?;
        let coords = self.source_coordinates(&systems[0])?;
        let mut xs = coords.lon;
        let mut ys = coords.lat;
        project_values(&Projection::latlong(), dst_proj, &mut xs, &mut ys);
        let range = |values: &[f64]| {
            values
                .iter()
                .filter(|v| v.is_finite())
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                })
        };
        let (x_min, x_max) = range(&xs);
        let (y_min, y_max) = range(&ys);
        if !(x_min.is_finite() && y_min.is_finite()) {
            return Err(RegridError::Projection(
                "could not project source coordinates into the target plane".to_string(),
            ));
        }
        Ok(((x_min, x_max), (y_min, y_max)))
    }

    /// Source lon/lat fields in radians, promoted to full 2D fields, plus
    /// the source grid dimensions.
    fn source_coordinates(&self, cs: &HorizontalCs) -> Result<SourceCoordinates> {
        let lat_name = cs.lat.as_ref().ok_or_else(RegridError::no_coordinate_system)?;
        let lon_name = cs.lon.as_ref().ok_or_else(RegridError::no_coordinate_system)?;
        let mut lat: Vec<f64> = self
            .reader
            .scaled_data(lat_name)?
            .to_f64()
            .iter()
            .map(|v| v.to_radians())
            .collect();
        let mut lon: Vec<f64> = self
            .reader
            .scaled_data(lon_name)?
            .to_f64()
            .iter()
            .map(|v| v.to_radians())
            .collect();

        let source_schema = self.reader.schema();
        let dim_len = |name: &str| -> Result<usize> {
            source_schema
                .dimension(name)
                .map(|d| d.length)
                .ok_or_else(|| ModelError::UnknownDimension(name.to_string()).into())
        };
        let (nx, ny) = if cs.geo_y == *lat_name && !cs.is_simple_grid {
            // axes guessed from the 2D coordinate fields
            let lat_var = source_schema
                .variable(lat_name)
                .ok_or_else(|| ModelError::UnknownVariable(lat_name.to_string()))?;
            if lat_var.dims().len() != 2 {
                return Err(RegridError::ShapeMismatch(format!(
                    "latitude '{}' must be 2-dimensional to define the grid",
                    lat_name
                )));
            }
            (dim_len(&lat_var.dims()[1])?, dim_len(&lat_var.dims()[0])?)
        } else {
            (dim_len(&cs.geo_x)?, dim_len(&cs.geo_y)?)
        };
        if lon.len() == nx && lat.len() == ny {
            // regular grid: promote the 1D axes to full fields
            let (lon2, lat2) = lon_lat_matrix(&lon, &lat);
            lon = lon2;
            lat = lat2;
        }
        if lon.len() != nx * ny || lat.len() != nx * ny {
            return Err(RegridError::ShapeMismatch(format!(
                "lon/lat fields of size {}/{} do not cover the {}x{} source grid",
                lon.len(),
                lat.len(),
                nx,
                ny
            )));
        }
        Ok(SourceCoordinates { lon, lat, nx, ny })
    }

    /// Source axis values in the units the source projection expects:
    /// radians for angular projections, metres otherwise.
    fn source_axis(&self, name: &str, angular: bool) -> Result<Vec<f64>> {
        let mut values = self.reader.scaled_data(name)?.to_f64();
        let units = attr_text(self.reader.schema(), name, "units").unwrap_or("");
        if angular {
            if !units.contains("rad") {
                values.iter_mut().for_each(|v| *v = v.to_radians());
            }
        } else if units == "km" {
            values.iter_mut().for_each(|v| *v *= 1000.0);
        }
        Ok(values)
    }

    fn has_spatial_vectors(&self) -> bool {
        self.var_cs.keys().any(|name| {
            self.schema
                .variable(name)
                .and_then(|v| v.spatial_vector())
                .is_some()
        })
    }
}

impl DatasetReader for Regridder {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn variable_data(&self, name: &str) -> ModelResult<DataArray> {
        let var = self
            .schema
            .variable(name)
            .ok_or_else(|| ModelError::UnknownVariable(name.to_string()))?;
        if let Some(data) = var.data() {
            return Ok(data.clone());
        }
        if !self.var_cs.contains_key(name) {
            return self.reader.variable_data(name);
        }
        let uses_unlimited = var
            .dims()
            .iter()
            .any(|d| self.schema.dimension(d).is_some_and(|dim| dim.unlimited));
        if !uses_unlimited {
            return self.get_data_slice(name, 0).map_err(to_model_error);
        }
        let records = self.schema.unlimited_dimension().map(|d| d.length).unwrap_or(0);
        let mut all = Vec::new();
        for pos in 0..records {
            all.extend(
                self.get_data_slice(name, pos)
                    .map_err(to_model_error)?
                    .to_f32(),
            );
        }
        Ok(DataArray::F32(all))
    }

    fn data_slice(&self, name: &str, unlim_pos: usize) -> ModelResult<DataArray> {
        self.get_data_slice(name, unlim_pos).map_err(to_model_error)
    }
}

struct SourceCoordinates {
    lon: Vec<f64>,
    lat: Vec<f64>,
    nx: usize,
    ny: usize,
}

fn to_model_error(err: RegridError) -> ModelError {
    match err {
        RegridError::Reader(inner) => inner,
        other => ModelError::Source(other.to_string()),
    }
}

fn bind_variables(systems: &[HorizontalCs]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for cs in systems {
        for var in &cs.variables {
            map.insert(var.clone(), cs.id.clone());
        }
    }
    map
}

fn attr_text<'a>(schema: &'a Schema, var: &str, attr: &str) -> Option<&'a str> {
    schema.attribute(var, attr).and_then(|a| a.as_text())
}

fn is_degree_unit(unit: &str) -> bool {
    unit.contains("degree")
}

/// Output axis values converted to plane units: radians for degree axes.
fn plane_axis(values: &[f64], unit: &str) -> Vec<f64> {
    if is_degree_unit(unit) {
        values.iter().map(|v| v.to_radians()).collect()
    } else {
        values.to_vec()
    }
}

fn axis_kinds(angular: bool) -> (AxisKind, AxisKind) {
    if angular {
        (AxisKind::Longitude, AxisKind::Latitude)
    } else {
        (AxisKind::ProjectionAxis, AxisKind::ProjectionAxis)
    }
}

/// Promote 1D lon/lat axes to full fields of the grid's size.
fn lon_lat_matrix(lon: &[f64], lat: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let nx = lon.len();
    let ny = lat.len();
    let mut lon_field = vec![0.0; nx * ny];
    let mut lat_field = vec![0.0; nx * ny];
    for (iy, &lat_value) in lat.iter().enumerate() {
        for (ix, &lon_value) in lon.iter().enumerate() {
            lon_field[ix + iy * nx] = lon_value;
            lat_field[ix + iy * nx] = lat_value;
        }
    }
    (lon_field, lat_field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdata;

    #[test]
    fn test_view_is_passthrough_before_configure() {
        let reader =
            testdata::latlong_reader(&[0.0, 10.0], &[0.0, 10.0], vec![1.0, 2.0, 3.0, 4.0]);
        let view = Regridder::new(Arc::new(reader));
        let out = view.get_data_slice("temperature", 0).unwrap().to_f32();
        assert_eq!(out, vec![1.0, 2.0, 3.0, 4.0]);
        assert!(view.schema().has_variable("lon"));
    }

    #[test]
    fn test_axis_values_come_from_memory() {
        let reader = testdata::latlong_reader(&[0.0, 10.0], &[0.0], vec![1.0, 2.0]);
        let view = Regridder::new(Arc::new(reader));
        let lons = view.get_data_slice("lon", 0).unwrap().to_f64();
        assert_eq!(lons, vec![0.0, 10.0]);
    }

    #[test]
    fn test_unknown_variable_errors() {
        let reader = testdata::latlong_reader(&[0.0], &[0.0], vec![1.0]);
        let view = Regridder::new(Arc::new(reader));
        assert!(view.get_data_slice("missing", 0).is_err());
    }

    #[test]
    fn test_lon_lat_matrix_layout() {
        let (lon, lat) = lon_lat_matrix(&[0.0, 1.0], &[10.0, 20.0, 30.0]);
        assert_eq!(lon, vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
        assert_eq!(lat, vec![10.0, 10.0, 20.0, 20.0, 30.0, 30.0]);
    }
}
