//! Nearest-neighbour resampling for depth maps and masks.
//!
//! Depth values must never be blended across discontinuities, so the only
//! resampler offered here picks the source pixel whose top-left corner is at
//! or before the scaled destination coordinate (OpenCV `INTER_NEAREST`).
use super::traits::{ImageView, ImageViewMut};
use super::ImageF32;

/// Source index for destination index `d` when mapping `src` pixels onto `dst`.
#[inline]
fn nearest_index(d: usize, src: usize, dst: usize) -> usize {
    let scale = src as f64 / dst as f64;
    ((d as f64 * scale).floor() as usize).min(src - 1)
}

/// Resize `src` to `width x height` with nearest-neighbour sampling.
///
/// An empty source or destination yields an empty (zero-sized) raster.
pub fn resize_nearest(src: &ImageF32, width: usize, height: usize) -> ImageF32 {
    let mut out = ImageF32::new(width, height);
    if src.width() == 0 || src.height() == 0 || width == 0 || height == 0 {
        return out;
    }
    let xs: Vec<usize> = (0..width)
        .map(|x| nearest_index(x, src.width(), width))
        .collect();
    for y in 0..height {
        let src_row = src.row(nearest_index(y, src.height(), height));
        for (dst, &sx) in out.row_mut(y).iter_mut().zip(&xs) {
            *dst = src_row[sx];
        }
    }
    out
}
