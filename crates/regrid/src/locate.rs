//! Nearest-source-cell location on irregular lon/lat grids.
//!
//! Both locators answer the same question: given the lon/lat field of the
//! source cells and a list of query points (radians), which source cell is
//! closest to each query, if any is close enough? The latitude-sweep
//! variant prunes a latitude-sorted list; the KD variant searches a 3D
//! index of unit-sphere points.

use std::f64::consts::PI;

use kiddo::{KdTree, SquaredEuclidean};
use rayon::prelude::*;
use tracing::debug;

use projection::EARTH_RADIUS_M;

use crate::geometry::{great_circle_cos, unit_sphere_point};

/// Number of source cells sampled when estimating the grid's region of
/// influence.
const ROI_SAMPLES: usize = 53;
/// Slack on the sampled nearest-neighbour distance, covering the cell
/// diagonal.
const ROI_DIAGONAL_SLACK: f64 = std::f64::consts::SQRT_2;
/// Grids at most this large are measured exhaustively instead of sampled.
const ROI_EXHAUSTIVE_LIMIT: usize = 1000;

/// Position written for queries without a match; outside any axis range.
const NO_MATCH_SWEEP: f64 = -1.0;
const NO_MATCH_KD: f64 = -1000.0;

/// Estimate the region of influence of a source grid, in radians of arc.
///
/// Samples up to [`ROI_SAMPLES`] cells, measures each sample's distance to
/// its nearest neighbour, takes the worst case and widens it by
/// [`ROI_DIAGONAL_SLACK`], capped at π.
pub fn grid_search_radius(lon_vals: &[f64], lat_vals: &[f64]) -> f64 {
    let n = lon_vals.len();
    let (steps, stride) = if n > ROI_EXHAUSTIVE_LIMIT {
        (ROI_SAMPLES, n / ROI_SAMPLES)
    } else {
        (n, 1)
    };
    let samples: Vec<f64> = (0..steps)
        .into_par_iter()
        .filter_map(|k| {
            let sample_pos = k * stride;
            let lon0 = lon_vals[sample_pos];
            let lat0 = lat_vals[sample_pos];
            if lon0.is_nan() || lat0.is_nan() {
                return None;
            }
            let mut min_cos_d = -2.0;
            for pos in 0..n {
                if pos == sample_pos {
                    continue;
                }
                let lon1 = lon_vals[pos];
                let lat1 = lat_vals[pos];
                if lon1.is_nan() || lat1.is_nan() {
                    continue;
                }
                let cos_d = great_circle_cos(lat0, lon0, lat1, lon1);
                if cos_d > min_cos_d {
                    min_cos_d = cos_d;
                }
            }
            Some(min_cos_d)
        })
        .collect();
    let Some(min_cos) = samples.into_iter().reduce(f64::min) else {
        return PI;
    };
    let max_grid_d = min_cos.clamp(-1.0, 1.0).acos() * ROI_DIAGONAL_SLACK;
    max_grid_d.min(PI)
}

struct LatLonCell {
    lat: f64,
    lon: f64,
    x: f64,
    y: f64,
}

/// Replace query lon/lat (radians) in `points_x`/`points_y` by the integer
/// (ix, iy) of the nearest source cell, or a sentinel outside the grid
/// when nothing lies within the grid's region of influence.
///
/// The source lon/lat fields are laid out at `ix + iy * nx`; cells with a
/// missing coordinate never match.
pub fn nearest_by_latitude_sweep(
    points_x: &mut [f64],
    points_y: &mut [f64],
    lon_vals: &[f64],
    lat_vals: &[f64],
    nx: usize,
) {
    debug!("estimating region of influence of input grid");
    let max_grid_d = grid_search_radius(lon_vals, lat_vals);
    debug!(roi_deg = max_grid_d.to_degrees(), "input grid region of influence");
    let min_grid_cos_d = max_grid_d.cos();

    let mut cells = Vec::with_capacity(lon_vals.len());
    for (pos, (&lon, &lat)) in lon_vals.iter().zip(lat_vals.iter()).enumerate() {
        if !(lon.is_nan() || lat.is_nan()) {
            cells.push(LatLonCell {
                lat,
                lon,
                x: (pos % nx) as f64,
                y: (pos / nx) as f64,
            });
        }
    }
    cells.sort_unstable_by(|a, b| a.lat.total_cmp(&b.lat));

    let results: Vec<(f64, f64)> = points_x
        .par_iter()
        .zip(points_y.par_iter())
        .map(|(&qlon, &qlat)| sweep_one(&cells, qlon, qlat, min_grid_cos_d, max_grid_d))
        .collect();
    for (i, (x, y)) in results.into_iter().enumerate() {
        points_x[i] = x;
        points_y[i] = y;
    }
}

fn sweep_one(
    cells: &[LatLonCell],
    qlon: f64,
    qlat: f64,
    min_grid_cos_d: f64,
    max_grid_d: f64,
) -> (f64, f64) {
    if qlon.is_nan() || qlat.is_nan() {
        return (NO_MATCH_SWEEP, NO_MATCH_SWEEP);
    }
    let mut best = (NO_MATCH_SWEEP, NO_MATCH_SWEEP);
    let mut min_cos_d = min_grid_cos_d;
    // |dlat| bounds the great-circle distance, so the sweep can stop as
    // soon as the latitude gap alone exceeds the current best
    let mut min_d = max_grid_d;
    let start = cells.partition_point(|c| c.lat < qlat);
    for c in &cells[start..] {
        if (c.lat - qlat).abs() > min_d {
            break;
        }
        let cos_d = great_circle_cos(c.lat, c.lon, qlat, qlon);
        if cos_d > min_cos_d {
            min_cos_d = cos_d;
            min_d = min_cos_d.clamp(-1.0, 1.0).acos();
            best = (c.x, c.y);
        }
    }
    for c in cells[..start].iter().rev() {
        if (c.lat - qlat).abs() > min_d {
            break;
        }
        let cos_d = great_circle_cos(c.lat, c.lon, qlat, qlon);
        if cos_d > min_cos_d {
            min_cos_d = cos_d;
            min_d = min_cos_d.clamp(-1.0, 1.0).acos();
            best = (c.x, c.y);
        }
    }
    best
}

/// KD-tree variant of [`nearest_by_latitude_sweep`] with an explicit
/// search radius in metres.
///
/// Source cells become 3D unit-sphere points; a radius query returns
/// candidates sorted nearest-first, so the first hit is the match.
pub fn nearest_by_kdtree(
    points_x: &mut [f64],
    points_y: &mut [f64],
    max_dist_m: f64,
    lon_vals: &[f64],
    lat_vals: &[f64],
    nx: usize,
) {
    debug!(max_dist_m, "maximum allowed distance from cell-center");
    debug_assert!(max_dist_m > 0.0);
    // all geometry on the unit sphere
    let max_dist = max_dist_m / EARTH_RADIUS_M;
    let radius_sq = max_dist * max_dist;

    let mut tree: KdTree<f64, 3> = KdTree::with_capacity(lon_vals.len());
    for (pos, (&lon, &lat)) in lon_vals.iter().zip(lat_vals.iter()).enumerate() {
        if !(lon.is_nan() || lat.is_nan()) {
            tree.add(&unit_sphere_point(lon, lat), pos as u64);
        }
    }
    debug!(cells = tree.size(), "kd-tree over source cells built");

    let results: Vec<(f64, f64)> = points_x
        .par_iter()
        .zip(points_y.par_iter())
        .map(|(&qlon, &qlat)| {
            if qlon.is_nan() || qlat.is_nan() {
                return (NO_MATCH_KD, NO_MATCH_KD);
            }
            let query = unit_sphere_point(qlon, qlat);
            let matches = tree.within::<SquaredEuclidean>(&query, radius_sq);
            match matches.first() {
                Some(m) => {
                    let pos = m.item as usize;
                    ((pos % nx) as f64, (pos / nx) as f64)
                }
                None => (NO_MATCH_KD, NO_MATCH_KD),
            }
        })
        .collect();
    for (i, (x, y)) in results.into_iter().enumerate() {
        points_x[i] = x;
        points_y[i] = y;
    }
}

/// The search radius for KD-based location: the configured distance of
/// interest when set, otherwise the largest step between neighbouring
/// output samples, scaled by the earth radius for angular axes (given in
/// radians).
pub fn max_distance_of_interest(
    out_x: &[f64],
    out_y: &[f64],
    is_metric: bool,
    override_m: Option<f64>,
) -> f64 {
    if let Some(d) = override_m {
        if d > 0.0 {
            return d;
        }
    }
    let factor = if is_metric { 1.0 } else { EARTH_RADIUS_M };
    let max_step = |axis: &[f64]| {
        axis.windows(2)
            .map(|w| (w[1] - w[0]).abs())
            .fold(0.0, f64::max)
    };
    factor * max_step(out_x).max(max_step(out_y))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Regular 3x3 lon/lat grid in radians, 10 degree spacing.
    fn grid() -> (Vec<f64>, Vec<f64>) {
        let mut lon = Vec::new();
        let mut lat = Vec::new();
        for iy in 0..3 {
            for ix in 0..3 {
                lon.push((10.0 * ix as f64).to_radians());
                lat.push((10.0 * iy as f64).to_radians());
            }
        }
        (lon, lat)
    }

    #[test]
    fn test_grid_search_radius_covers_spacing() {
        let (lon, lat) = grid();
        let radius = grid_search_radius(&lon, &lat);
        // neighbour spacing is ~10 degrees; radius must cover it with slack
        assert!(radius >= 10f64.to_radians());
        assert!(radius <= PI);
    }

    #[test]
    fn test_sweep_finds_exact_cells() {
        let (lon, lat) = grid();
        let mut px = vec![10f64.to_radians(), 21f64.to_radians()];
        let mut py = vec![20f64.to_radians(), 1f64.to_radians()];
        nearest_by_latitude_sweep(&mut px, &mut py, &lon, &lat, 3);
        assert_eq!((px[0], py[0]), (1.0, 2.0));
        assert_eq!((px[1], py[1]), (2.0, 0.0));
    }

    #[test]
    fn test_sweep_rejects_far_query() {
        let (lon, lat) = grid();
        let mut px = vec![120f64.to_radians()];
        let mut py = vec![(-60f64).to_radians()];
        nearest_by_latitude_sweep(&mut px, &mut py, &lon, &lat, 3);
        assert_eq!((px[0], py[0]), (NO_MATCH_SWEEP, NO_MATCH_SWEEP));
    }

    #[test]
    fn test_kdtree_matches_sweep() {
        let (lon, lat) = grid();
        let queries_lon: Vec<f64> = vec![0.0, 9.0, 14.9, 21.0]
            .into_iter()
            .map(|d: f64| d.to_radians())
            .collect();
        let queries_lat: Vec<f64> = vec![0.0, 11.0, 4.9, 19.0]
            .into_iter()
            .map(|d: f64| d.to_radians())
            .collect();

        let mut sweep_x = queries_lon.clone();
        let mut sweep_y = queries_lat.clone();
        nearest_by_latitude_sweep(&mut sweep_x, &mut sweep_y, &lon, &lat, 3);

        let mut kd_x = queries_lon;
        let mut kd_y = queries_lat;
        // effectively unlimited radius
        nearest_by_kdtree(&mut kd_x, &mut kd_y, 2.0e7, &lon, &lat, 3);

        assert_eq!(sweep_x, kd_x);
        assert_eq!(sweep_y, kd_y);
    }

    #[test]
    fn test_kdtree_beyond_radius() {
        let lon = vec![0.0];
        let lat = vec![0.0];
        let mut px = vec![0.0];
        let mut py = vec![10f64.to_radians()];
        // 10 degrees is ~1100 km; a 1 km radius finds nothing
        nearest_by_kdtree(&mut px, &mut py, 1000.0, &lon, &lat, 1);
        assert_eq!((px[0], py[0]), (NO_MATCH_KD, NO_MATCH_KD));
    }

    #[test]
    fn test_missing_coordinates_never_match(){
        let lon = vec![f64::NAN, 0.0];
        let lat = vec![f64::NAN, 0.0];
        let mut px = vec![0.0];
        let mut py = vec![0.0];
        nearest_by_kdtree(&mut px, &mut py, 1000.0, &lon, &lat, 2);
        assert_eq!((px[0], py[0]), (1.0, 0.0));
    }

    #[test]
    fn test_max_distance_of_interest() {
        assert_eq!(
            max_distance_of_interest(&[0.0, 1000.0], &[0.0, 500.0], true, None),
            1000.0
        );
        assert_eq!(
            max_distance_of_interest(&[0.0, 1000.0], &[0.0], true, Some(42.0)),
            42.0
        );
        let angular = max_distance_of_interest(&[0.0, 0.01], &[0.0], false, None);
        assert!((angular - 0.01 * EARTH_RADIUS_M).abs() < 1e-6);
    }
}
