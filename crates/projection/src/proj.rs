//! Proj-string parsing and projection dispatch.

use std::collections::HashMap;

use grid_model::AttrValue;

use crate::error::{ProjResult, ProjectionError};
use crate::lambert::LambertConformal;
use crate::latlong::LatLong;
use crate::rotated::RotatedLatLong;
use crate::stereographic::Stereographic;
use crate::EARTH_RADIUS_M;

/// Proj-string of the plain geographic coordinate system.
pub const LAT_LON_PROJ4: &str = "+proj=latlong +R=6371000 +no_defs";

/// A horizontal map projection, parsed from a proj-string.
///
/// A closed set of spherical families: each knows its forward/inverse
/// point math, whether its plane coordinates are angular, and the CF
/// attributes describing it.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    LatLong(LatLong),
    RotatedLatLong(RotatedLatLong),
    Stereographic(Stereographic),
    LambertConformal(LambertConformal),
}

impl Projection {
    /// The plain geographic projection.
    pub fn latlong() -> Self {
        Self::LatLong(LatLong)
    }

    /// Parse a `+proj=… +key=value …` string.
    pub fn from_proj_string(input: &str) -> ProjResult<Self> {
        let params = parse_params(input);
        let name = params
            .get("proj")
            .and_then(|v| v.as_deref())
            .ok_or_else(|| ProjectionError::MissingProjToken(input.to_string()))?;

        match name {
            "latlong" | "longlat" | "latlon" => Ok(Self::LatLong(LatLong)),
            "ob_tran" => {
                let o_proj = params.get("o_proj").and_then(|v| v.as_deref()).unwrap_or("");
                if !matches!(o_proj, "latlong" | "longlat" | "latlon") {
                    return Err(ProjectionError::Unsupported(format!(
                        "ob_tran with o_proj={}",
                        o_proj
                    )));
                }
                Ok(Self::RotatedLatLong(RotatedLatLong::new(
                    angle(&params, "o_lat_p", 90.0)?,
                    angle(&params, "lon_0", 0.0)?,
                    angle(&params, "o_lon_p", 0.0)?,
                )))
            }
            "stere" => {
                let lat0 = angle(&params, "lat_0", 90.0)?;
                let lon0 = angle(&params, "lon_0", 0.0)?;
                let k0 = if params.contains_key("lat_ts") {
                    Stereographic::scale_from_standard_parallel(angle(&params, "lat_ts", 90.0)?)
                } else {
                    number(&params, "k_0", 1.0)?
                };
                let mut proj = Stereographic::new(lat0, lon0, k0);
                proj.earth_radius = radius(&params)?;
                Ok(Self::Stereographic(proj))
            }
            "lcc" => {
                let lat1 = angle(&params, "lat_1", 0.0)?;
                let lat2 = if params.contains_key("lat_2") {
                    angle(&params, "lat_2", 0.0)?
                } else {
                    lat1
                };
                Ok(Self::LambertConformal(LambertConformal::with_earth_radius(
                    angle(&params, "lat_0", 0.0)?,
                    angle(&params, "lon_0", 0.0)?,
                    lat1,
                    lat2,
                    radius(&params)?,
                )))
            }
            other => Err(ProjectionError::Unsupported(other.to_string())),
        }
    }

    /// The `+proj=` keyword of this family.
    pub fn proj_keyword(&self) -> &'static str {
        match self {
            Self::LatLong(_) => "latlong",
            Self::RotatedLatLong(_) => "ob_tran",
            Self::Stereographic(_) => "stere",
            Self::LambertConformal(_) => "lcc",
        }
    }

    /// Whether plane coordinates are angular (degrees on persisted axes,
    /// radians internally) rather than metres.
    pub fn is_degree(&self) -> bool {
        matches!(self, Self::LatLong(_) | Self::RotatedLatLong(_))
    }

    /// Whether this is the plain geographic projection.
    pub fn is_latlong(&self) -> bool {
        matches!(self, Self::LatLong(_))
    }

    /// Geographic (radians) to plane coordinates. Unmappable points yield
    /// NaN.
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        if lon.is_nan() || lat.is_nan() {
            return (f64::NAN, f64::NAN);
        }
        match self {
            Self::LatLong(p) => p.forward(lon, lat),
            Self::RotatedLatLong(p) => p.forward(lon, lat),
            Self::Stereographic(p) => p.forward(lon, lat),
            Self::LambertConformal(p) => p.forward(lon, lat),
        }
    }

    /// Plane coordinates to geographic (radians). Unmappable points yield
    /// NaN.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        if x.is_nan() || y.is_nan() {
            return (f64::NAN, f64::NAN);
        }
        match self {
            Self::LatLong(p) => p.inverse(x, y),
            Self::RotatedLatLong(p) => p.inverse(x, y),
            Self::Stereographic(p) => p.inverse(x, y),
            Self::LambertConformal(p) => p.inverse(x, y),
        }
    }

    /// Canonical proj-string for this projection.
    pub fn to_proj_string(&self) -> String {
        match self {
            Self::LatLong(_) => LAT_LON_PROJ4.to_string(),
            Self::RotatedLatLong(p) => format!(
                "+proj=ob_tran +o_proj=latlong +o_lat_p={} +lon_0={} +o_lon_p={} +R={} +no_defs",
                p.o_lat_p.to_degrees(),
                p.lon_0.to_degrees(),
                p.o_lon_p.to_degrees(),
                EARTH_RADIUS_M
            ),
            Self::Stereographic(p) => format!(
                "+proj=stere +lat_0={} +lon_0={} +k_0={} +R={} +no_defs",
                p.lat0.to_degrees(),
                p.lon0.to_degrees(),
                p.k0,
                p.earth_radius
            ),
            Self::LambertConformal(p) => format!(
                "+proj=lcc +lat_0={} +lon_0={} +lat_1={} +lat_2={} +R={} +no_defs",
                p.lat0.to_degrees(),
                p.lon0.to_degrees(),
                p.lat1.to_degrees(),
                p.lat2.to_degrees(),
                p.earth_radius
            ),
        }
    }

    /// CF grid-mapping attributes describing this projection, including a
    /// `proj4` attribute carrying the canonical proj-string.
    pub fn cf_attributes(&self) -> Vec<(String, AttrValue)> {
        let mut attrs: Vec<(String, AttrValue)> = Vec::new();
        match self {
            Self::LatLong(_) => {
                attrs.push(("grid_mapping_name".into(), "latitude_longitude".into()));
            }
            Self::RotatedLatLong(p) => {
                attrs.push((
                    "grid_mapping_name".into(),
                    "rotated_latitude_longitude".into(),
                ));
                attrs.push((
                    "grid_north_pole_latitude".into(),
                    p.o_lat_p.to_degrees().into(),
                ));
                attrs.push((
                    "grid_north_pole_longitude".into(),
                    p.pole_lon().to_degrees().into(),
                ));
                attrs.push((
                    "north_pole_grid_longitude".into(),
                    p.o_lon_p.to_degrees().into(),
                ));
            }
            Self::Stereographic(p) => {
                if p.is_polar() {
                    attrs.push(("grid_mapping_name".into(), "polar_stereographic".into()));
                    attrs.push((
                        "straight_vertical_longitude_from_pole".into(),
                        p.lon0.to_degrees().into(),
                    ));
                } else {
                    attrs.push(("grid_mapping_name".into(), "stereographic".into()));
                    attrs.push((
                        "longitude_of_projection_origin".into(),
                        p.lon0.to_degrees().into(),
                    ));
                }
                attrs.push((
                    "latitude_of_projection_origin".into(),
                    p.lat0.to_degrees().into(),
                ));
                attrs.push(("scale_factor_at_projection_origin".into(), p.k0.into()));
                attrs.push(("earth_radius".into(), p.earth_radius.into()));
            }
            Self::LambertConformal(p) => {
                attrs.push(("grid_mapping_name".into(), "lambert_conformal_conic".into()));
                attrs.push((
                    "standard_parallel".into(),
                    AttrValue::Doubles(vec![p.lat1.to_degrees(), p.lat2.to_degrees()]),
                ));
                attrs.push((
                    "longitude_of_central_meridian".into(),
                    p.lon0.to_degrees().into(),
                ));
                attrs.push((
                    "latitude_of_projection_origin".into(),
                    p.lat0.to_degrees().into(),
                ));
                attrs.push(("earth_radius".into(), p.earth_radius.into()));
            }
        }
        attrs.push(("proj4".into(), self.to_proj_string().into()));
        attrs
    }
}

type Params = HashMap<String, Option<String>>;

fn parse_params(input: &str) -> Params {
    let mut params = Params::new();
    for token in input.split_whitespace() {
        let Some(token) = token.strip_prefix('+') else {
            continue;
        };
        match token.split_once('=') {
            Some((key, value)) => params.insert(key.to_string(), Some(value.to_string())),
            None => params.insert(token.to_string(), None),
        };
    }
    params
}

fn number(params: &Params, key: &str, default: f64) -> ProjResult<f64> {
    match params.get(key).and_then(|v| v.as_deref()) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ProjectionError::InvalidParameter {
                param: key.to_string(),
                value: value.to_string(),
            }),
    }
}

fn angle(params: &Params, key: &str, default_deg: f64) -> ProjResult<f64> {
    Ok(number(params, key, default_deg)?.to_radians())
}

fn radius(params: &Params) -> ProjResult<f64> {
    if params.contains_key("R") {
        number(params, "R", EARTH_RADIUS_M)
    } else {
        number(params, "a", EARTH_RADIUS_M)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_latlong() {
        let proj = Projection::from_proj_string(LAT_LON_PROJ4).unwrap();
        assert!(proj.is_latlong());
        assert!(proj.is_degree());
    }

    #[test]
    fn test_parse_polar_stereographic() {
        let proj =
            Projection::from_proj_string("+proj=stere +lat_0=90 +lon_0=-32 +lat_ts=60 +R=6371000")
                .unwrap();
        assert_eq!(proj.proj_keyword(), "stere");
        assert!(!proj.is_degree());
        match &proj {
            Projection::Stereographic(p) => {
                assert!((p.k0 - (1.0 + 60f64.to_radians().sin()) / 2.0).abs() < 1e-12);
            }
            other => panic!("unexpected projection: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rotated() {
        let proj = Projection::from_proj_string(
            "+proj=ob_tran +o_proj=longlat +o_lat_p=37.5 +lon_0=-153.6 +R=6371000",
        )
        .unwrap();
        assert!(proj.is_degree());
        assert!(!proj.is_latlong());
    }

    #[test]
    fn test_missing_proj_token() {
        assert!(matches!(
            Projection::from_proj_string("+lat_0=90"),
            Err(ProjectionError::MissingProjToken(_))
        ));
    }

    #[test]
    fn test_unsupported_family() {
        assert!(matches!(
            Projection::from_proj_string("+proj=tmerc +lon_0=9"),
            Err(ProjectionError::Unsupported(_))
        ));
    }

    #[test]
    fn test_proj_string_roundtrip() {
        let input = "+proj=lcc +lat_0=63 +lon_0=15 +lat_1=63.3 +lat_2=63.3 +R=6371000 +no_defs";
        let proj = Projection::from_proj_string(input).unwrap();
        let regenerated = Projection::from_proj_string(&proj.to_proj_string()).unwrap();
        assert_eq!(proj, regenerated);
    }

    #[test]
    fn test_cf_attributes_carry_proj4() {
        let proj = Projection::from_proj_string("+proj=stere +lat_0=90 +lon_0=0").unwrap();
        let attrs = proj.cf_attributes();
        assert!(attrs.iter().any(|(k, _)| k == "grid_mapping_name"));
        let proj4 = attrs.iter().find(|(k, _)| k == "proj4").unwrap();
        assert!(proj4.1.as_text().unwrap().contains("+proj=stere"));
    }
}
