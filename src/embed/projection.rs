//! Patch projection: a convolution whose kernel size equals its stride,
//! evaluated as one matrix product over the unfolded patches.
use crate::error::{Error, Result};
use ndarray::{s, Array1, Array2, Array3, Array4, ArrayView3, ArrayView4, Axis};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Clone, Debug)]
pub struct PatchProjection {
    patch: usize,
    in_chans: usize,
    /// `[embed_dim, in_chans * patch * patch]`, i.e. the conv kernel flattened
    /// in `(channel, ky, kx)` order.
    weight: Array2<f32>,
    bias: Array1<f32>,
}

impl PatchProjection {
    /// Build from a `[embed_dim, in_chans, patch, patch]` conv kernel and bias.
    pub fn from_conv(weight: Array4<f32>, bias: Array1<f32>) -> Result<Self> {
        let (d, c, ph, pw) = weight.dim();
        if ph != pw || ph == 0 {
            return Err(Error::InvalidWeights {
                found: weight.shape().to_vec(),
                reason: "kernel must be square and non-empty",
            });
        }
        if bias.len() != d {
            return Err(Error::InvalidWeights {
                found: weight.shape().to_vec(),
                reason: "bias length must equal embed_dim",
            });
        }
        let weight = weight
            .as_standard_layout()
            .into_owned()
            .into_shape_with_order((d, c * ph * pw))?;
        Ok(Self {
            patch: ph,
            in_chans: c,
            weight,
            bias,
        })
    }

    /// Build from `f(out_channel, in_channel, ky, kx)` with zero bias.
    pub fn from_fn(
        in_chans: usize,
        embed_dim: usize,
        patch: usize,
        mut f: impl FnMut(usize, usize, usize, usize) -> f32,
    ) -> Result<Self> {
        let weight = Array4::from_shape_fn((embed_dim, in_chans, patch, patch), |(d, c, y, x)| {
            f(d, c, y, x)
        });
        Self::from_conv(weight, Array1::zeros(embed_dim))
    }

    pub fn patch_size(&self) -> usize {
        self.patch
    }

    pub fn in_chans(&self) -> usize {
        self.in_chans
    }

    pub fn embed_dim(&self) -> usize {
        self.weight.nrows()
    }

    /// Project one `[C, H, W]` image to `[(H/p)*(W/p), D]` tokens in raster
    /// order over the patch grid.
    pub fn project(&self, img: ArrayView3<f32>) -> Result<Array2<f32>> {
        let (c, h, w) = img.dim();
        let p = self.patch;
        if c != self.in_chans {
            return Err(Error::ChannelMismatch {
                expected: self.in_chans,
                found: c,
            });
        }
        if h % p != 0 {
            return Err(Error::NotPatchAligned {
                axis: "height",
                size: h,
                patch: p,
            });
        }
        if w % p != 0 {
            return Err(Error::NotPatchAligned {
                axis: "width",
                size: w,
                patch: p,
            });
        }
        let gw = w / p;
        let n = (h / p) * gw;
        let mut patches = Array2::<f32>::zeros((n, c * p * p));
        for (t, mut row) in patches.axis_iter_mut(Axis(0)).enumerate() {
            let (gy, gx) = (t / gw, t % gw);
            let window = img.slice(s![.., gy * p..(gy + 1) * p, gx * p..(gx + 1) * p]);
            for (dst, &v) in row.iter_mut().zip(window.iter()) {
                *dst = v;
            }
        }
        let mut tokens = patches.dot(&self.weight.t());
        tokens += &self.bias;
        Ok(tokens)
    }

    /// Project every sample of a `[B, C, H, W]` batch to `[B, N, D]`.
    pub fn project_batch(&self, imgs: ArrayView4<f32>) -> Result<Array3<f32>> {
        let (b, _, h, w) = imgs.dim();
        let p = self.patch;
        let n = (h / p) * (w / p);
        let samples: Vec<ArrayView3<f32>> = imgs.outer_iter().collect();

        #[cfg(feature = "parallel")]
        let projected: Vec<Result<Array2<f32>>> =
            samples.par_iter().map(|img| self.project(img.view())).collect();
        #[cfg(not(feature = "parallel"))]
        let projected: Vec<Result<Array2<f32>>> =
            samples.iter().map(|img| self.project(img.view())).collect();

        let mut out = Array3::<f32>::zeros((b, n, self.embed_dim()));
        for (i, tokens) in projected.into_iter().enumerate() {
            out.index_axis_mut(Axis(0), i).assign(&tokens?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn sum_kernel_adds_up_each_patch() {
        let proj = PatchProjection::from_fn(1, 1, 2, |_, _, _, _| 1.0).unwrap();
        let img = Array3::from_shape_fn((1, 2, 4), |(_, y, x)| (y * 4 + x) as f32);
        let tokens = proj.project(img.view()).unwrap();
        assert_eq!(tokens.dim(), (2, 1));
        assert_eq!(tokens[[0, 0]], 0.0 + 1.0 + 4.0 + 5.0);
        assert_eq!(tokens[[1, 0]], 2.0 + 3.0 + 6.0 + 7.0);
    }

    #[test]
    fn kernel_order_is_channel_then_row_then_column() {
        // pick the top-right pixel of channel 1
        let proj = PatchProjection::from_fn(2, 1, 2, |_, c, y, x| {
            if c == 1 && y == 0 && x == 1 {
                1.0
            } else {
                0.0
            }
        })
        .unwrap();
        let img = Array3::from_shape_fn((2, 2, 2), |(c, y, x)| (c * 100 + y * 10 + x) as f32);
        let tokens = proj.project(img.view()).unwrap();
        assert_eq!(tokens[[0, 0]], 101.0);
    }

    #[test]
    fn bias_is_added_to_every_token() {
        let weight = Array4::<f32>::zeros((3, 1, 2, 2));
        let bias = Array1::from(vec![1.0, 2.0, 3.0]);
        let proj = PatchProjection::from_conv(weight, bias).unwrap();
        let img = Array3::<f32>::zeros((1, 4, 4));
        let tokens = proj.project(img.view()).unwrap();
        assert_eq!(tokens.dim(), (4, 3));
        assert_eq!(tokens.row(3).to_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn misaligned_input_is_rejected() {
        let proj = PatchProjection::from_fn(1, 1, 4, |_, _, _, _| 1.0).unwrap();
        let img = Array3::<f32>::zeros((1, 6, 8));
        assert!(matches!(
            proj.project(img.view()),
            Err(Error::NotPatchAligned { axis: "height", .. })
        ));
    }
}
