//! Owned single-channel f32 raster in row-major layout (stride == width).
//!
//! Used for depth maps and validity masks that travel alongside colour
//! images through the crop/rescale stages.
use crate::camera::CropBox;
use crate::error::{Error, Result};
use crate::image::traits::{ImageView, ImageViewMut};

#[derive(Clone, Debug, PartialEq)]
pub struct ImageF32 {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Number of f32 elements between consecutive rows (equals `w`)
    pub stride: usize,
    /// Backing storage in row-major order
    pub data: Vec<f32>,
}

impl ImageF32 {
    /// Construct a zero-initialized buffer of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            stride: w,
            data: vec![0.0; w * h],
        }
    }

    /// Wrap an existing row-major buffer. `data.len()` must equal `w * h`.
    pub fn from_vec(w: usize, h: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != w * h {
            return Err(Error::RowCountMismatch {
                indices: w * h,
                rows: data.len(),
            });
        }
        Ok(Self {
            w,
            h,
            stride: w,
            data,
        })
    }

    /// Build from a per-pixel closure `f(x, y)`.
    pub fn from_fn(w: usize, h: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut out = Self::new(w, h);
        for y in 0..h {
            for x in 0..w {
                out.set(x, y, f(x, y));
            }
        }
        out
    }

    #[inline]
    /// Convert (x, y) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.stride + x
    }
    #[inline]
    /// Get the pixel value at (x, y).
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }
    #[inline]
    /// Set the pixel value at (x, y).
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    /// Swap the x and y axes.
    pub fn transpose(&self) -> Self {
        Self::from_fn(self.h, self.w, |x, y| self.get(y, x))
    }

    /// Cut `bbox` out of the raster; samples outside the source are 0.
    pub fn crop_padded(&self, bbox: CropBox) -> Result<Self> {
        bbox.validate()?;
        let (ow, oh) = (bbox.width() as usize, bbox.height() as usize);
        let mut out = Self::new(ow, oh);
        for oy in 0..oh {
            let sy = bbox.top as i64 + oy as i64;
            if sy < 0 || sy >= self.h as i64 {
                continue;
            }
            for ox in 0..ow {
                let sx = bbox.left as i64 + ox as i64;
                if sx < 0 || sx >= self.w as i64 {
                    continue;
                }
                out.set(ox, oy, self.get(sx as usize, sy as usize));
            }
        }
        Ok(out)
    }
}

impl ImageView for ImageF32 {
    type Pixel = f32;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn row(&self, y: usize) -> &[f32] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
}

impl ImageViewMut for ImageF32 {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.stride;
        &mut self.data[start..start + self.w]
    }
}
