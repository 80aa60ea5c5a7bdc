//! Lambert Conformal Conic projection (spherical form).
//!
//! Commonly used for mid-latitude weather grids. It maps a cone tangent or
//! secant to the Earth's surface onto a flat plane.
//!
//! The projection parameters are:
//! - Reference latitude (lat0): the latitude of the origin
//! - Reference longitude (lon0): the central meridian
//! - Standard parallel(s): lat1 and lat2 (equal for a tangent cone)

use std::f64::consts::PI;

use crate::stereographic::normalize_lon;
use crate::EARTH_RADIUS_M;

/// Lambert Conformal Conic projection parameters.
///
/// All angles are stored in radians; plane coordinates are metres relative
/// to the projection origin (lat0, lon0).
#[derive(Debug, Clone, PartialEq)]
pub struct LambertConformal {
    /// Central meridian in radians.
    pub lon0: f64,
    /// Latitude of projection origin in radians.
    pub lat0: f64,
    /// First standard parallel in radians.
    pub lat1: f64,
    /// Second standard parallel in radians.
    pub lat2: f64,
    /// Earth radius in metres.
    pub earth_radius: f64,
    /// Cone constant (n).
    n: f64,
    /// F constant.
    f: f64,
    /// Rho at the projection origin.
    rho0: f64,
}

impl LambertConformal {
    /// Create a projection from origin and standard parallels (radians).
    pub fn new(lat0: f64, lon0: f64, lat1: f64, lat2: f64) -> Self {
        Self::with_earth_radius(lat0, lon0, lat1, lat2, EARTH_RADIUS_M)
    }

    /// Create a projection with an explicit earth radius in metres.
    pub fn with_earth_radius(lat0: f64, lon0: f64, lat1: f64, lat2: f64, earth_radius: f64) -> Self {
        // cone constant n: tangent cone for a single standard parallel,
        // secant cone otherwise
        let n = if (lat1 - lat2).abs() < 1e-10 {
            lat1.sin()
        } else {
            let ln_ratio = (lat1.cos() / lat2.cos()).ln();
            let tan_ratio = ((PI / 4.0 + lat2 / 2.0).tan() / (PI / 4.0 + lat1 / 2.0).tan()).ln();
            ln_ratio / tan_ratio
        };

        let f = (lat1.cos() * (PI / 4.0 + lat1 / 2.0).tan().powf(n)) / n;
        let rho0 = earth_radius * f / (PI / 4.0 + lat0 / 2.0).tan().powf(n);

        Self {
            lon0,
            lat0,
            lat1,
            lat2,
            earth_radius,
            n,
            f,
            rho0,
        }
    }

    /// Geographic (radians) to plane metres. The pole opposite the cone
    /// apex maps to NaN.
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let half = PI / 4.0 + lat / 2.0;
        if half.tan() <= 0.0 {
            return (f64::NAN, f64::NAN);
        }
        let rho = self.earth_radius * self.f / half.tan().powf(self.n);
        let theta = self.n * normalize_lon(lon - self.lon0);
        let x = rho * theta.sin();
        let y = self.rho0 - rho * theta.cos();
        (x, y)
    }

    /// Plane metres to geographic (radians).
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let mut rho = x.hypot(self.rho0 - y);
        if self.n < 0.0 {
            rho = -rho;
        }
        if rho == 0.0 {
            let pole = if self.n > 0.0 { PI / 2.0 } else { -PI / 2.0 };
            return (self.lon0, pole);
        }
        let theta = if self.n > 0.0 {
            x.atan2(self.rho0 - y)
        } else {
            (-x).atan2(y - self.rho0)
        };
        let lat = 2.0 * (self.earth_radius * self.f / rho).powf(1.0 / self.n).atan() - PI / 2.0;
        let lon = normalize_lon(self.lon0 + theta / self.n);
        (lon, lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conus() -> LambertConformal {
        LambertConformal::new(
            38.5f64.to_radians(),
            (-97.5f64).to_radians(),
            38.5f64.to_radians(),
            38.5f64.to_radians(),
        )
    }

    #[test]
    fn test_origin_maps_to_zero() {
        let proj = conus();
        let (x, y) = proj.forward((-97.5f64).to_radians(), 38.5f64.to_radians());
        assert!(x.abs() < 1e-6, "x should be ~0, got {}", x);
        assert!(y.abs() < 1e-6, "y should be ~0, got {}", y);
    }

    #[test]
    fn test_roundtrip() {
        let proj = conus();
        let (lon, lat) = ((-94.5f64).to_radians(), 39.0f64.to_radians());
        let (x, y) = proj.forward(lon, lat);
        let (lon2, lat2) = proj.inverse(x, y);
        assert!((lon - lon2).abs() < 1e-10, "lon roundtrip: {} vs {}", lon, lon2);
        assert!((lat - lat2).abs() < 1e-10, "lat roundtrip: {} vs {}", lat, lat2);
    }

    #[test]
    fn test_secant_cone_roundtrip() {
        let proj = LambertConformal::new(
            63.0f64.to_radians(),
            15.0f64.to_radians(),
            63.3f64.to_radians(),
            63.3f64.to_radians(),
        );
        let (lon, lat) = (10.0f64.to_radians(), 60.0f64.to_radians());
        let (x, y) = proj.forward(lon, lat);
        let (lon2, lat2) = proj.inverse(x, y);
        assert!((lon - lon2).abs() < 1e-10);
        assert!((lat - lat2).abs() < 1e-10);
    }
}
