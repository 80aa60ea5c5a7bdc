//! Bulk coordinate transforms and vector reprojection matrices.

use crate::proj::Projection;
use crate::stereographic::normalize_lon;

/// Reproject point coordinates in place from one projection's plane to
/// another's. Unmappable points become NaN.
pub fn project_values(from: &Projection, to: &Projection, xs: &mut [f64], ys: &mut [f64]) {
    debug_assert_eq!(xs.len(), ys.len());
    for i in 0..xs.len() {
        let (lon, lat) = from.inverse(xs[i], ys[i]);
        let (x, y) = to.forward(lon, lat);
        xs[i] = x;
        ys[i] = y;
    }
}

/// Project the cross product of two axes into another projection.
///
/// Returns the projected coordinates of every (x, y) grid point, stored
/// row-major with x varying fastest (position `ix + iy * nx`).
pub fn project_axes(
    from: &Projection,
    to: &Projection,
    x_axis: &[f64],
    y_axis: &[f64],
) -> (Vec<f64>, Vec<f64>) {
    let nx = x_axis.len();
    let ny = y_axis.len();
    let mut out_x = vec![f64::NAN; nx * ny];
    let mut out_y = vec![f64::NAN; nx * ny];
    for (iy, &ya) in y_axis.iter().enumerate() {
        for (ix, &xa) in x_axis.iter().enumerate() {
            let (lon, lat) = from.inverse(xa, ya);
            let (x, y) = to.forward(lon, lat);
            out_x[ix + iy * nx] = x;
            out_y[ix + iy * nx] = y;
        }
    }
    (out_x, out_y)
}

/// Coordinate step used for the numeric Jacobian on angular planes
/// (radians).
const ANGULAR_DELTA: f64 = 1e-5;
/// Coordinate step used for the numeric Jacobian on metric planes
/// (metres).
const METRIC_DELTA: f64 = 10.0;

/// Per-cell rotation matrices turning vector components expressed in the
/// source plane into components in the destination plane.
///
/// `out_x`/`out_y` are the destination axes in destination plane units
/// (radians for angular projections, metres otherwise). The result holds
/// four values `(a, b, c, d)` per output cell, laid out at
/// `4 * (ix + iy * nx)`, mapping `(u, v)` to `(a·u + b·v, c·u + d·v)`.
///
/// Matrix columns are normalised to unit length ("keep size"): for the
/// conformal projections provided the columns are orthogonal, so the
/// rotation preserves vector magnitude. Cells that cannot be mapped stay
/// NaN.
pub fn vector_reproject_matrix(
    src: &Projection,
    dst: &Projection,
    out_x: &[f64],
    out_y: &[f64],
) -> Vec<f64> {
    let nx = out_x.len();
    let ny = out_y.len();
    let mut matrix = vec![f64::NAN; 4 * nx * ny];
    let delta = if src.is_degree() {
        ANGULAR_DELTA
    } else {
        METRIC_DELTA
    };
    for (iy, &yo) in out_y.iter().enumerate() {
        for (ix, &xo) in out_x.iter().enumerate() {
            let (lon, lat) = dst.inverse(xo, yo);
            let (xs, ys) = src.forward(lon, lat);
            if xs.is_nan() || ys.is_nan() {
                continue;
            }
            let col_u = plane_direction(src, dst, xs, ys, delta, 0.0, yo);
            let col_v = plane_direction(src, dst, xs, ys, 0.0, delta, yo);
            if let (Some((a, c)), Some((b, d))) = (col_u, col_v) {
                let pos = 4 * (ix + iy * nx);
                matrix[pos] = a;
                matrix[pos + 1] = b;
                matrix[pos + 2] = c;
                matrix[pos + 3] = d;
            }
        }
    }
    matrix
}

/// Unit direction, in the destination plane's local physical frame, of a
/// small source-plane step `(dx, dy)` taken at `(xs, ys)`.
fn plane_direction(
    src: &Projection,
    dst: &Projection,
    xs: f64,
    ys: f64,
    dx: f64,
    dy: f64,
    dst_y: f64,
) -> Option<(f64, f64)> {
    let fwd = |x: f64, y: f64| {
        let (lon, lat) = src.inverse(x, y);
        dst.forward(lon, lat)
    };
    let (xp, yp) = fwd(xs + dx, ys + dy);
    let (xm, ym) = fwd(xs - dx, ys - dy);
    let mut du = xp - xm;
    let dv = yp - ym;
    if du.is_nan() || dv.is_nan() {
        return None;
    }
    if dst.is_degree() {
        // angular plane: guard the dateline and weight the longitudinal
        // delta by the local parallel circumference
        du = normalize_lon(du) * dst_y.cos();
    }
    let norm = du.hypot(dv);
    if norm < 1e-12 {
        return None;
    }
    Some((du / norm, dv / norm))
}
