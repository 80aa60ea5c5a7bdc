//! Preprocessors applied to source planes before interpolation.

use rayon::prelude::*;

/// Minimum number of planes before the preprocessor loop runs in
/// parallel.
const PARALLEL_PLANE_THRESHOLD: usize = 4;

/// An in-place operation on one horizontal plane of a slice.
///
/// Preprocessors run on the source grid shape, after fill values became
/// NaN and before interpolation. They must not assume anything about plane
/// order and may be called concurrently on distinct planes.
pub trait Preprocess2d: Send + Sync {
    fn apply(&self, plane: &mut [f32], nx: usize, ny: usize);
}

impl<F> Preprocess2d for F
where
    F: Fn(&mut [f32], usize, usize) + Send + Sync,
{
    fn apply(&self, plane: &mut [f32], nx: usize, ny: usize) {
        self(plane, nx, ny)
    }
}

/// Run all preprocessors plane by plane over a stack of planes.
pub fn run_preprocessors(
    processes: &[std::sync::Arc<dyn Preprocess2d>],
    data: &mut [f32],
    nx: usize,
    ny: usize,
) {
    if processes.is_empty() {
        return;
    }
    let plane = nx * ny;
    let nz = data.len() / plane;
    debug_assert_eq!(nz * plane, data.len());

    let apply_all = |plane_data: &mut [f32]| {
        for p in processes {
            p.apply(plane_data, nx, ny);
        }
    };
    if nz >= PARALLEL_PLANE_THRESHOLD {
        data.par_chunks_mut(plane).for_each(apply_all);
    } else {
        data.chunks_mut(plane).for_each(apply_all);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_preprocessors_apply_in_order() {
        let processes: Vec<Arc<dyn Preprocess2d>> = vec![
            Arc::new(|plane: &mut [f32], _nx: usize, _ny: usize| {
                plane.iter_mut().for_each(|v| *v += 1.0)
            }),
            Arc::new(|plane: &mut [f32], _nx: usize, _ny: usize| {
                plane.iter_mut().for_each(|v| *v *= 2.0)
            }),
        ];
        let mut data = vec![1.0f32, 2.0];
        run_preprocessors(&processes, &mut data, 2, 1);
        assert_eq!(data, vec![4.0, 6.0]);
    }

    #[test]
    fn test_parallel_plane_loop() {
        let processes: Vec<Arc<dyn Preprocess2d>> =
            vec![Arc::new(|plane: &mut [f32], _nx: usize, _ny: usize| {
                plane.iter_mut().for_each(|v| *v = -*v)
            })];
        // 6 planes of 2x2 triggers the parallel path
        let mut data: Vec<f32> = (0..24).map(|i| i as f32).collect();
        run_preprocessors(&processes, &mut data, 2, 2);
        assert!(data.iter().enumerate().all(|(i, &v)| v == -(i as f32)));
    }
}
