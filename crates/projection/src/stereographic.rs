//! Oblique and polar stereographic projection (spherical form).

use std::f64::consts::PI;

use crate::EARTH_RADIUS_M;

/// Stereographic projection parameters.
///
/// Covers the polar variants common in meteorology as well as the general
/// oblique case. All angles are stored in radians; plane coordinates are
/// metres.
#[derive(Debug, Clone, PartialEq)]
pub struct Stereographic {
    /// Latitude of projection origin in radians.
    pub lat0: f64,
    /// Central meridian in radians.
    pub lon0: f64,
    /// Scale factor at the projection origin.
    pub k0: f64,
    /// Earth radius in metres.
    pub earth_radius: f64,
}

impl Stereographic {
    /// Create from origin and scale, defaulting the earth radius.
    pub fn new(lat0: f64, lon0: f64, k0: f64) -> Self {
        Self {
            lat0,
            lon0,
            k0,
            earth_radius: EARTH_RADIUS_M,
        }
    }

    /// Scale factor equivalent to a standard parallel (`lat_ts`) on the
    /// polar variants.
    pub fn scale_from_standard_parallel(lat_ts: f64) -> f64 {
        (1.0 + lat_ts.abs().sin()) / 2.0
    }

    /// Geographic (radians) to plane metres. The antipode of the origin
    /// maps to NaN.
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let dlon = normalize_lon(lon - self.lon0);
        let denom = 1.0 + self.lat0.sin() * lat.sin() + self.lat0.cos() * lat.cos() * dlon.cos();
        if denom.abs() < 1e-12 {
            return (f64::NAN, f64::NAN);
        }
        let k = 2.0 * self.k0 / denom;
        let x = self.earth_radius * k * lat.cos() * dlon.sin();
        let y = self.earth_radius
            * k
            * (self.lat0.cos() * lat.sin() - self.lat0.sin() * lat.cos() * dlon.cos());
        (x, y)
    }

    /// Plane metres to geographic (radians).
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let rho = x.hypot(y);
        if rho < 1e-12 {
            return (self.lon0, self.lat0);
        }
        let c = 2.0 * (rho / (2.0 * self.earth_radius * self.k0)).atan();
        let lat = (c.cos() * self.lat0.sin() + y * c.sin() * self.lat0.cos() / rho).asin();
        let lon = self.lon0
            + (x * c.sin()).atan2(rho * self.lat0.cos() * c.cos() - y * self.lat0.sin() * c.sin());
        (normalize_lon(lon), lat)
    }

    /// Whether the origin sits on a pole.
    pub fn is_polar(&self) -> bool {
        (self.lat0.abs() - PI / 2.0).abs() < 1e-9
    }
}

/// Wrap a longitude into [-pi, pi].
pub(crate) fn normalize_lon(mut lon: f64) -> f64 {
    while lon > PI {
        lon -= 2.0 * PI;
    }
    while lon < -PI {
        lon += 2.0 * PI;
    }
    lon
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polar_roundtrip() {
        let proj = Stereographic::new(PI / 2.0, 0.0, Stereographic::scale_from_standard_parallel(60f64.to_radians()));
        let (lon, lat) = (10f64.to_radians(), 70f64.to_radians());
        let (x, y) = proj.forward(lon, lat);
        let (lon2, lat2) = proj.inverse(x, y);
        assert!((lon - lon2).abs() < 1e-10, "lon roundtrip: {} vs {}", lon, lon2);
        assert!((lat - lat2).abs() < 1e-10, "lat roundtrip: {} vs {}", lat, lat2);
    }

    #[test]
    fn test_origin_maps_to_zero() {
        let proj = Stereographic::new(PI / 2.0, 0.0, 1.0);
        let (x, y) = proj.forward(0.0, PI / 2.0);
        assert!(x.abs() < 1e-6);
        assert!(y.abs() < 1e-6);
    }

    #[test]
    fn test_antipode_is_nan() {
        let proj = Stereographic::new(PI / 2.0, 0.0, 1.0);
        let (x, y) = proj.forward(0.0, -PI / 2.0);
        assert!(x.is_nan());
        assert!(y.is_nan());
    }

    #[test]
    fn test_central_meridian_rotation() {
        // rotating the central meridian by 90 degrees rotates the polar
        // plane by 90 degrees
        let a = Stereographic::new(PI / 2.0, 0.0, 1.0);
        let b = Stereographic::new(PI / 2.0, PI / 2.0, 1.0);
        let (lon, lat) = (20f64.to_radians(), 75f64.to_radians());
        let (xa, ya) = a.forward(lon, lat);
        let (xb, yb) = b.forward(lon, lat);
        let ra = xa.hypot(ya);
        let rb = xb.hypot(yb);
        assert!((ra - rb).abs() < 1e-6);
        // the b-plane x axis is the a-plane y axis
        assert!((xb - ya).abs() < 1e-6, "xb {} vs ya {}", xb, ya);
        assert!((yb + xa).abs() < 1e-6, "yb {} vs -xa {}", yb, -xa);
    }
}
