//! Integer `(y, x)` token positions on a patch grid.
use ndarray::{Array2, Array3, Axis};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Produces `[h*w, 2]` grids of `(y, x)` pairs in raster order, cached per
/// grid size.
#[derive(Debug, Default)]
pub struct PositionGetter {
    cache: Mutex<HashMap<(usize, usize), Array2<i64>>>,
}

impl PositionGetter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positions(&self, h: usize, w: usize) -> Array2<i64> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache
            .entry((h, w))
            .or_insert_with(|| {
                Array2::from_shape_fn((h * w, 2), |(t, k)| {
                    if k == 0 {
                        (t / w) as i64
                    } else {
                        (t % w) as i64
                    }
                })
            })
            .clone()
    }

    /// Same grid repeated for `b` samples: `[b, h*w, 2]`.
    pub fn batch(&self, b: usize, h: usize, w: usize) -> Array3<i64> {
        let grid = self.positions(h, w);
        let mut out = Array3::<i64>::zeros((b, h * w, 2));
        for mut sample in out.axis_iter_mut(Axis(0)) {
            sample.assign(&grid);
        }
        out
    }

    pub fn cached_grids(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
