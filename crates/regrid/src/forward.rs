//! Cached forward interpolation: every source cell contributes to one
//! output cell, reduced by an aggregation.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Reduction applied to the source values landing in one output cell.
///
/// All reductions ignore NaN contributions; a cell receiving no finite
/// value becomes NaN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForwardAggregation {
    Sum,
    Mean,
    Median,
    Max,
    Min,
}

/// A precomputed mapping from output cells to the source positions that
/// fall into them.
#[derive(Debug, Clone)]
pub struct ForwardInterpolation {
    aggregation: ForwardAggregation,
    cell_sources: Vec<Vec<u32>>,
    in_nx: usize,
    in_ny: usize,
    out_nx: usize,
    out_ny: usize,
}

impl ForwardInterpolation {
    /// `points_x`/`points_y` hold, per source position, the fractional
    /// output cell the source cell falls into. Positions rounding outside
    /// the output grid (or NaN) contribute nowhere.
    pub fn new(
        aggregation: ForwardAggregation,
        points_x: &[f64],
        points_y: &[f64],
        in_nx: usize,
        in_ny: usize,
        out_nx: usize,
        out_ny: usize,
    ) -> Self {
        assert_eq!(points_x.len(), in_nx * in_ny);
        assert_eq!(points_y.len(), in_nx * in_ny);
        let mut cell_sources = vec![Vec::new(); out_nx * out_ny];
        for (pos, (&fx, &fy)) in points_x.iter().zip(points_y.iter()).enumerate() {
            if fx.is_nan() || fy.is_nan() {
                continue;
            }
            let ix = fx.round();
            let iy = fy.round();
            if ix < 0.0 || iy < 0.0 || ix > (out_nx - 1) as f64 || iy > (out_ny - 1) as f64 {
                continue;
            }
            cell_sources[ix as usize + iy as usize * out_nx].push(pos as u32);
        }
        Self {
            aggregation,
            cell_sources,
            in_nx,
            in_ny,
            out_nx,
            out_ny,
        }
    }

    pub fn in_shape(&self) -> (usize, usize) {
        (self.in_nx, self.in_ny)
    }

    pub fn out_shape(&self) -> (usize, usize) {
        (self.out_nx, self.out_ny)
    }

    /// Aggregate a stack of source planes into output planes. Planes are
    /// independent and processed in parallel.
    pub fn interpolate(&self, data: &[f32]) -> Vec<f32> {
        let in_plane = self.in_nx * self.in_ny;
        let out_plane = self.out_nx * self.out_ny;
        let nz = data.len() / in_plane;
        debug_assert_eq!(nz * in_plane, data.len());

        let mut out = vec![f32::NAN; nz * out_plane];
        out.par_chunks_mut(out_plane)
            .enumerate()
            .for_each(|(z, out_plane_data)| {
                let src = &data[z * in_plane..(z + 1) * in_plane];
                for (cell, out_value) in out_plane_data.iter_mut().enumerate() {
                    *out_value = reduce(self.aggregation, &self.cell_sources[cell], src);
                }
            });
        out
    }
}

fn reduce(aggregation: ForwardAggregation, sources: &[u32], src: &[f32]) -> f32 {
    let finite = sources
        .iter()
        .map(|&pos| src[pos as usize])
        .filter(|v| !v.is_nan());
    match aggregation {
        ForwardAggregation::Sum => {
            let (count, sum) = finite.fold((0usize, 0.0f32), |(c, s), v| (c + 1, s + v));
            if count == 0 {
                f32::NAN
            } else {
                sum
            }
        }
        ForwardAggregation::Mean => {
            let (count, sum) = finite.fold((0usize, 0.0f32), |(c, s), v| (c + 1, s + v));
            if count == 0 {
                f32::NAN
            } else {
                sum / count as f32
            }
        }
        ForwardAggregation::Max => finite.fold(f32::NAN, |acc, v| if acc.is_nan() || v > acc { v } else { acc }),
        ForwardAggregation::Min => finite.fold(f32::NAN, |acc, v| if acc.is_nan() || v < acc { v } else { acc }),
        ForwardAggregation::Median => {
            let mut values: Vec<f32> = finite.collect();
            if values.is_empty() {
                return f32::NAN;
            }
            let mid = values.len() / 2;
            let (_, nth, _) = values.select_nth_unstable_by(mid, f32::total_cmp);
            *nth
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_into_one(aggregation: ForwardAggregation) -> ForwardInterpolation {
        // 2x2 source, every cell lands in the single output cell
        ForwardInterpolation::new(
            aggregation,
            &[0.1, -0.2, 0.3, 0.0],
            &[0.0, 0.2, -0.3, 0.1],
            2,
            2,
            1,
            1,
        )
    }

    #[test]
    fn test_mean_of_four() {
        let ci = four_into_one(ForwardAggregation::Mean);
        let out = ci.interpolate(&[1.0, 3.0, 5.0, 7.0]);
        assert_eq!(out, vec![4.0]);
    }

    #[test]
    fn test_sum_ignores_nan() {
        let ci = four_into_one(ForwardAggregation::Sum);
        let out = ci.interpolate(&[1.0, f32::NAN, 5.0, 7.0]);
        assert_eq!(out, vec![13.0]);
    }

    #[test]
    fn test_all_nan_bucket_is_nan() {
        let ci = four_into_one(ForwardAggregation::Sum);
        let out = ci.interpolate(&[f32::NAN; 4]);
        assert!(out[0].is_nan());
    }

    #[test]
    fn test_median_upper_of_even() {
        let ci = four_into_one(ForwardAggregation::Median);
        let out = ci.interpolate(&[9.0, 1.0, 3.0, 5.0]);
        assert_eq!(out, vec![5.0]);
    }

    #[test]
    fn test_min_max() {
        let data = [9.0, 1.0, 3.0, 5.0];
        assert_eq!(
            four_into_one(ForwardAggregation::Max).interpolate(&data),
            vec![9.0]
        );
        assert_eq!(
            four_into_one(ForwardAggregation::Min).interpolate(&data),
            vec![1.0]
        );
    }

    #[test]
    fn test_out_of_grid_sources_are_dropped() {
        // second source cell falls outside the output grid
        let ci = ForwardInterpolation::new(
            ForwardAggregation::Sum,
            &[0.0, 5.0],
            &[0.0, 0.0],
            2,
            1,
            2,
            1,
        );
        let out = ci.interpolate(&[2.0, 100.0]);
        assert_eq!(out[0], 2.0);
        assert!(out[1].is_nan());
    }

    #[test]
    fn test_sum_conservation_with_disjoint_cells() {
        // 2x2 source mapping one-to-one onto a 2x2 output
        let ci = ForwardInterpolation::new(
            ForwardAggregation::Sum,
            &[0.0, 1.0, 0.0, 1.0],
            &[0.0, 0.0, 1.0, 1.0],
            2,
            2,
            2,
            2,
        );
        let data = [1.5, 2.5, 3.5, 4.5];
        let out = ci.interpolate(&data);
        let total_in: f32 = data.iter().sum();
        let total_out: f32 = out.iter().sum();
        assert!((total_in - total_out).abs() < 1e-6);
    }
}
