//! Camera matrices and their co-transform under image rescaling and cropping.
//!
//! Intrinsics are stored in the OpenCV convention, where pixel centres sit
//! at integer coordinates. Scaling is only a linear operation in the COLMAP
//! convention (pixel centres at half-integers), so every rescale goes through
//! [`opencv_to_colmap`] / [`colmap_to_opencv`].
use crate::error::{Error, Result};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

const EPS: f64 = 1e-12;

/// Image resolution in pixels, `(width, height)` order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Same resolution with the axes swapped.
    pub fn transposed(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    fn as_vec(self) -> [f64; 2] {
        [self.width as f64, self.height as f64]
    }
}

impl From<(u32, u32)> for Resolution {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Pinhole camera matrix in the OpenCV pixel convention.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[[f64; 3]; 3]", into = "[[f64; 3]; 3]")]
pub struct Intrinsics(pub Matrix3<f64>);

impl Intrinsics {
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self(Matrix3::new(fx, 0.0, cx, 0.0, fy, cy, 0.0, 0.0, 1.0))
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    pub fn focal(&self) -> [f64; 2] {
        [self.0[(0, 0)], self.0[(1, 1)]]
    }

    pub fn principal_point(&self) -> [f64; 2] {
        [self.0[(0, 2)], self.0[(1, 2)]]
    }

    /// Copy with the principal point moved by `(dx, dy)`.
    pub fn shifted(&self, dx: f64, dy: f64) -> Self {
        let mut k = self.0;
        k[(0, 2)] += dx;
        k[(1, 2)] += dy;
        Self(k)
    }

    /// Project a camera-frame point. Returns `None` behind or on the image plane.
    pub fn project(&self, p: [f64; 3]) -> Option<[f64; 2]> {
        let v = self.0 * Vector3::new(p[0], p[1], p[2]);
        let w = v[2];
        if !w.is_finite() || w <= EPS || !v[0].is_finite() || !v[1].is_finite() {
            return None;
        }
        Some([v[0] / w, v[1] / w])
    }
}

impl From<[[f64; 3]; 3]> for Intrinsics {
    fn from(rows: [[f64; 3]; 3]) -> Self {
        Self(Matrix3::from_fn(|r, c| rows[r][c]))
    }
}

impl From<Intrinsics> for [[f64; 3]; 3] {
    fn from(k: Intrinsics) -> Self {
        let mut rows = [[0.0; 3]; 3];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = k.0[(r, c)];
            }
        }
        rows
    }
}

/// Where the output window sits inside the scaled input.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropOffset {
    /// Fraction of the available margin on each axis (0.5 centres the crop).
    Factor(f64),
    /// Explicit offset in scaled-input pixels.
    Pixels([f64; 2]),
}

impl Default for CropOffset {
    fn default() -> Self {
        CropOffset::Factor(0.5)
    }
}

/// Integer crop window `[left, right) x [top, bottom)`; may extend past the image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl CropBox {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> u32 {
        (self.right - self.left).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.bottom - self.top).max(0) as u32
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.right <= self.left || self.bottom <= self.top {
            return Err(Error::InvalidCropBox {
                left: self.left,
                top: self.top,
                right: self.right,
                bottom: self.bottom,
            });
        }
        Ok(())
    }

    /// True when the window lies fully inside a `width x height` image.
    pub fn is_inside(&self, width: u32, height: u32) -> bool {
        self.left >= 0
            && self.top >= 0
            && self.right as i64 <= width as i64
            && self.bottom as i64 <= height as i64
    }
}

/// Shift the principal point by +0.5 px (integer -> half-integer pixel centres).
pub fn opencv_to_colmap(k: &Intrinsics) -> Intrinsics {
    k.shifted(0.5, 0.5)
}

/// Shift the principal point by -0.5 px (half-integer -> integer pixel centres).
pub fn colmap_to_opencv(k: &Intrinsics) -> Intrinsics {
    k.shifted(-0.5, -0.5)
}

/// Camera matrix after scaling the input by `scaling` and cutting an
/// `output` window out of it.
///
/// The margin `input * scaling - output` must be non-negative on both axes.
/// The top-left corner of the window sits at the given offset inside the
/// scaled image.
pub fn camera_matrix_of_crop(
    k: &Intrinsics,
    input: Resolution,
    output: Resolution,
    scaling: f64,
    offset: CropOffset,
) -> Result<Intrinsics> {
    let inp = input.as_vec();
    let out = output.as_vec();
    let margins = [inp[0] * scaling - out[0], inp[1] * scaling - out[1]];
    if margins[0] < 0.0 || margins[1] < 0.0 {
        return Err(Error::NegativeMargin(margins[0], margins[1]));
    }
    let offset = match offset {
        CropOffset::Factor(f) => [f * margins[0], f * margins[1]],
        CropOffset::Pixels(px) => px,
    };

    let mut colmap = opencv_to_colmap(k).0;
    for r in 0..2 {
        for c in 0..3 {
            colmap[(r, c)] *= scaling;
        }
    }
    colmap[(0, 2)] -= offset[0];
    colmap[(1, 2)] -= offset[1];
    Ok(colmap_to_opencv(&Intrinsics(colmap)))
}

/// Crop window that turns `k_in` into `k_out` for an `output` sized image.
///
/// The shift is rounded half-to-even so that exact `.5` offsets resolve the
/// same way on both axes.
pub fn bbox_from_intrinsics_in_out(
    k_in: &Intrinsics,
    k_out: &Intrinsics,
    output: Resolution,
) -> CropBox {
    let pin = k_in.principal_point();
    let pout = k_out.principal_point();
    let l = (pin[0] - pout[0]).round_ties_even() as i32;
    let t = (pin[1] - pout[1]).round_ties_even() as i32;
    CropBox::new(l, t, l + output.width as i32, t + output.height as i32)
}
