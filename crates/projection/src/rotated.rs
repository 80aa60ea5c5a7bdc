//! Rotated lat/lon projection (rotated-pole grids).
//!
//! Used by limited-area forecast models: the coordinate pole is moved so
//! the model domain sits near the rotated equator where grid cells are
//! nearly uniform. Plane coordinates are rotated longitude/latitude in
//! radians.

use std::f64::consts::PI;

use crate::stereographic::normalize_lon;

/// Rotated lat/lon parameters, matching the proj-string form
/// `+proj=ob_tran +o_proj=latlong +o_lat_p=… +lon_0=… [+o_lon_p=…]`.
///
/// The grid north pole sits at geographic latitude `o_lat_p` and longitude
/// `lon_0 + 180°`; `o_lon_p` rotates the grid meridians about the new pole.
/// All angles are stored in radians.
#[derive(Debug, Clone, PartialEq)]
pub struct RotatedLatLong {
    pub o_lat_p: f64,
    pub lon_0: f64,
    pub o_lon_p: f64,
}

impl RotatedLatLong {
    pub fn new(o_lat_p: f64, lon_0: f64, o_lon_p: f64) -> Self {
        Self {
            o_lat_p,
            lon_0,
            o_lon_p,
        }
    }

    /// Geographic longitude of the grid north pole in radians.
    pub fn pole_lon(&self) -> f64 {
        normalize_lon(self.lon_0 + PI)
    }

    /// Geographic (radians) to rotated lon/lat (radians).
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (x, y, z) = unit_vector(lon, lat);
        // bring the pole meridian to lon 0, then tilt the pole onto the z-axis
        let lam_p = self.pole_lon();
        let (x1, y1, z1) = (
            lam_p.cos() * x + lam_p.sin() * y,
            -lam_p.sin() * x + lam_p.cos() * y,
            z,
        );
        let theta = self.o_lat_p - PI / 2.0;
        let (x2, y2, z2) = (
            theta.cos() * x1 + theta.sin() * z1,
            y1,
            -theta.sin() * x1 + theta.cos() * z1,
        );
        let rlat = z2.clamp(-1.0, 1.0).asin();
        let rlon = normalize_lon(y2.atan2(x2) - self.o_lon_p);
        (rlon, rlat)
    }

    /// Rotated lon/lat (radians) to geographic (radians).
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let rlon = x + self.o_lon_p;
        let (vx, vy, vz) = unit_vector(rlon, y);
        let theta = self.o_lat_p - PI / 2.0;
        let (x1, y1, z1) = (
            theta.cos() * vx - theta.sin() * vz,
            vy,
            theta.sin() * vx + theta.cos() * vz,
        );
        let lam_p = self.pole_lon();
        let (x2, y2, z2) = (
            lam_p.cos() * x1 - lam_p.sin() * y1,
            lam_p.sin() * x1 + lam_p.cos() * y1,
            z1,
        );
        let lat = z2.clamp(-1.0, 1.0).asin();
        let lon = normalize_lon(y2.atan2(x2));
        (lon, lat)
    }
}

fn unit_vector(lon: f64, lat: f64) -> (f64, f64, f64) {
    (lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_pole() {
        // pole kept at true north: rotation is the identity
        let proj = RotatedLatLong::new(PI / 2.0, -PI, 0.0);
        let (lon, lat) = (0.3, 0.7);
        let (x, y) = proj.forward(lon, lat);
        assert!((x - lon).abs() < 1e-12);
        assert!((y - lat).abs() < 1e-12);
    }

    #[test]
    fn test_roundtrip() {
        let proj = RotatedLatLong::new(0.6, -0.4, 0.1);
        let (lon, lat) = (0.9, -0.2);
        let (x, y) = proj.forward(lon, lat);
        let (lon2, lat2) = proj.inverse(x, y);
        assert!((lon - lon2).abs() < 1e-12, "lon {} vs {}", lon, lon2);
        assert!((lat - lat2).abs() < 1e-12, "lat {} vs {}", lat, lat2);
    }

    #[test]
    fn test_pole_maps_to_rotated_north() {
        let proj = RotatedLatLong::new(0.5, 0.2, 0.0);
        let (_, rlat) = proj.forward(proj.pole_lon(), proj.o_lat_p);
        assert!((rlat - PI / 2.0).abs() < 1e-9);
    }
}
