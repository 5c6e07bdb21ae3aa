//! Patch embedding for fixed-size and mixed-aspect image batches.
use super::norm::{LayerNorm, DEFAULT_LAYER_NORM_EPS};
use super::position::PositionGetter;
use super::projection::PatchProjection;
use crate::error::{Error, Result};
use crate::orientation::{ImageShape, OrientationSplit};
use crate::tensor::{gather_rows, scatter_rows};
use log::debug;
use ndarray::{Array3, ArrayView4};
use serde::{Deserialize, Serialize};

/// Shape parameters of a patch embedding layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchEmbedConfig {
    /// Model input size `[H, W]` used by the fixed-size layer.
    pub img_size: [usize; 2],
    /// Square patch edge in pixels.
    pub patch_size: usize,
    pub in_chans: usize,
    pub embed_dim: usize,
    /// Layer-norm epsilon; `None` leaves tokens unnormalised.
    pub norm_eps: Option<f32>,
}

impl Default for PatchEmbedConfig {
    fn default() -> Self {
        Self {
            img_size: [224, 224],
            patch_size: 16,
            in_chans: 3,
            embed_dim: 768,
            norm_eps: None,
        }
    }
}

impl PatchEmbedConfig {
    pub fn with_layer_norm(mut self) -> Self {
        self.norm_eps = Some(DEFAULT_LAYER_NORM_EPS);
        self
    }

    pub fn grid_size(&self) -> (usize, usize) {
        (
            self.img_size[0] / self.patch_size.max(1),
            self.img_size[1] / self.patch_size.max(1),
        )
    }

    pub fn num_patches(&self) -> usize {
        let (gh, gw) = self.grid_size();
        gh * gw
    }
}

/// Fixed-size patch embedding: conv projection, optional norm and grid positions.
#[derive(Debug)]
pub struct PatchEmbed {
    config: PatchEmbedConfig,
    proj: PatchProjection,
    norm: Option<LayerNorm>,
    positions: PositionGetter,
}

impl PatchEmbed {
    pub fn new(config: PatchEmbedConfig, proj: PatchProjection) -> Result<Self> {
        if proj.patch_size() != config.patch_size
            || proj.in_chans() != config.in_chans
            || proj.embed_dim() != config.embed_dim
        {
            return Err(Error::InvalidWeights {
                found: vec![proj.embed_dim(), proj.in_chans(), proj.patch_size()],
                reason: "projection does not match embed_dim/in_chans/patch_size",
            });
        }
        let norm = config
            .norm_eps
            .map(|eps| LayerNorm::new(config.embed_dim, eps));
        Ok(Self {
            config,
            proj,
            norm,
            positions: PositionGetter::new(),
        })
    }

    /// Install a layer norm with learned parameters. Enables normalisation
    /// even when the config had none; `norm_eps` is updated to match.
    pub fn with_norm(mut self, norm: LayerNorm) -> Result<Self> {
        if norm.dim() != self.config.embed_dim {
            return Err(Error::InvalidWeights {
                found: vec![norm.dim()],
                reason: "layer norm width must equal embed_dim",
            });
        }
        self.config.norm_eps = Some(norm.eps());
        self.norm = Some(norm);
        Ok(self)
    }

    pub fn config(&self) -> &PatchEmbedConfig {
        &self.config
    }

    pub fn projection(&self) -> &PatchProjection {
        &self.proj
    }

    /// Embed a `[B, C, H, W]` batch whose `(H, W)` equals `img_size`.
    ///
    /// Returns `[B, N, D]` tokens and `[B, N, 2]` `(y, x)` positions.
    pub fn forward(&self, img: ArrayView4<f32>) -> Result<(Array3<f32>, Array3<i64>)> {
        let (b, _, h, w) = img.dim();
        let [eh, ew] = self.config.img_size;
        if (h, w) != (eh, ew) {
            return Err(Error::ImageSizeMismatch {
                expected: (eh, ew),
                found: (h, w),
            });
        }
        let mut x = self.proj.project_batch(img)?;
        let p = self.config.patch_size;
        let pos = self.positions.batch(b, h / p, w / p);
        self.normalize(&mut x);
        Ok((x, pos))
    }

    fn normalize(&self, x: &mut Array3<f32>) {
        if let Some(norm) = &self.norm {
            norm.apply(x);
        }
    }
}

/// Patch embedding for batches that mix landscape and portrait images.
///
/// The batch tensor is always landscape (`W >= H`). Samples whose true
/// shape is portrait are stored transposed inside it; they are transposed
/// back before projection so the network sees them in their real
/// orientation, and their positions come from the `(W/p, H/p)` grid.
#[derive(Debug)]
pub struct ManyArPatchEmbed {
    inner: PatchEmbed,
}

impl ManyArPatchEmbed {
    pub fn new(config: PatchEmbedConfig, proj: PatchProjection) -> Result<Self> {
        Ok(Self {
            inner: PatchEmbed::new(config, proj)?,
        })
    }

    pub fn from_embed(inner: PatchEmbed) -> Self {
        Self { inner }
    }

    pub fn config(&self) -> &PatchEmbedConfig {
        self.inner.config()
    }

    pub fn embed_dim(&self) -> usize {
        self.inner.config.embed_dim
    }

    /// Embed `img[B, C, H, W]` given each sample's true `(height, width)`.
    pub fn forward(
        &self,
        img: ArrayView4<f32>,
        true_shape: &[ImageShape],
    ) -> Result<(Array3<f32>, Array3<i64>)> {
        let (b, c, h, w) = img.dim();
        let p = self.inner.config.patch_size;
        if w < h {
            return Err(Error::NotLandscape {
                width: w,
                height: h,
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
        if true_shape.len() != b {
            return Err(Error::TrueShapeMismatch {
                batch: b,
                found: true_shape.len(),
            });
        }
        if c != self.inner.config.in_chans {
            return Err(Error::ChannelMismatch {
                expected: self.inner.config.in_chans,
                found: c,
            });
        }

        // size expressed in tokens
        let (gh, gw) = (h / p, w / p);
        let split = OrientationSplit::new(true_shape);
        debug!(
            "ManyArPatchEmbed: {}x{} grid, {} landscape / {} portrait",
            gh,
            gw,
            split.landscape.len(),
            split.portrait.len()
        );

        let mut x = Array3::<f32>::zeros((b, gh * gw, self.embed_dim()));
        let mut pos = Array3::<i64>::zeros((b, gh * gw, 2));

        if !split.landscape.is_empty() {
            let subset = gather_rows(&img, &split.landscape)?;
            let tokens = self.inner.proj.project_batch(subset.view())?;
            scatter_rows(&mut x, &split.landscape, &tokens)?;
            let grid = self.inner.positions.batch(split.landscape.len(), gh, gw);
            scatter_rows(&mut pos, &split.landscape, &grid)?;
        }
        if !split.portrait.is_empty() {
            let mut subset = gather_rows(&img, &split.portrait)?;
            subset.swap_axes(2, 3);
            let tokens = self.inner.proj.project_batch(subset.view())?;
            scatter_rows(&mut x, &split.portrait, &tokens)?;
            let grid = self.inner.positions.batch(split.portrait.len(), gw, gh);
            scatter_rows(&mut pos, &split.portrait, &grid)?;
        }

        self.inner.normalize(&mut x);
        Ok((x, pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    fn identity_config() -> PatchEmbedConfig {
        PatchEmbedConfig {
            img_size: [4, 8],
            patch_size: 2,
            in_chans: 1,
            embed_dim: 4,
            norm_eps: None,
        }
    }

    // token component k = pixel k of the 2x2 patch
    fn identity_projection() -> PatchProjection {
        PatchProjection::from_fn(1, 4, 2, |d, _, y, x| if d == y * 2 + x { 1.0 } else { 0.0 })
            .unwrap()
    }

    #[test]
    fn fixed_embed_rejects_other_sizes() {
        let embed = PatchEmbed::new(identity_config(), identity_projection()).unwrap();
        let img = Array4::<f32>::zeros((1, 1, 4, 6));
        assert!(matches!(
            embed.forward(img.view()),
            Err(Error::ImageSizeMismatch { .. })
        ));
        let img = Array4::<f32>::zeros((2, 1, 4, 8));
        let (x, pos) = embed.forward(img.view()).unwrap();
        assert_eq!(x.dim(), (2, 8, 4));
        assert_eq!(pos.dim(), (2, 8, 2));
        assert_eq!(pos[[0, 7, 0]], 1);
        assert_eq!(pos[[0, 7, 1]], 3);
    }

    #[test]
    fn portrait_batch_is_rejected_up_front() {
        let embed = ManyArPatchEmbed::new(identity_config(), identity_projection()).unwrap();
        let img = Array4::<f32>::zeros((1, 1, 8, 4));
        let err = embed.forward(img.view(), &[ImageShape::new(8, 4)]);
        assert!(matches!(err, Err(Error::NotLandscape { .. })));
    }

    #[test]
    fn true_shape_length_must_match_batch() {
        let embed = ManyArPatchEmbed::new(identity_config(), identity_projection()).unwrap();
        let img = Array4::<f32>::zeros((2, 1, 4, 8));
        let err = embed.forward(img.view(), &[ImageShape::new(4, 8)]);
        assert!(matches!(
            err,
            Err(Error::TrueShapeMismatch { batch: 2, found: 1 })
        ));
    }

    #[test]
    fn portrait_positions_use_transposed_grid() {
        let embed = ManyArPatchEmbed::new(identity_config(), identity_projection()).unwrap();
        let img = Array4::<f32>::zeros((2, 1, 4, 8));
        let shapes = [ImageShape::new(4, 8), ImageShape::new(8, 4)];
        let (_, pos) = embed.forward(img.view(), &shapes).unwrap();
        // landscape: 2x4 grid, last token at (1, 3)
        assert_eq!((pos[[0, 7, 0]], pos[[0, 7, 1]]), (1, 3));
        // portrait: 4x2 grid, last token at (3, 1)
        assert_eq!((pos[[1, 7, 0]], pos[[1, 7, 1]]), (3, 1));
        assert_eq!((pos[[1, 2, 0]], pos[[1, 2, 1]]), (1, 0));
    }

    #[test]
    fn with_norm_checks_width_and_records_eps() {
        let embed = PatchEmbed::new(identity_config(), identity_projection()).unwrap();
        assert!(matches!(
            embed.with_norm(LayerNorm::new(3, 1e-5)),
            Err(Error::InvalidWeights { .. })
        ));

        let embed = PatchEmbed::new(identity_config(), identity_projection())
            .unwrap()
            .with_norm(LayerNorm::new(4, 1e-5))
            .unwrap();
        assert_eq!(embed.config().norm_eps, Some(1e-5));
    }

    #[test]
    fn mismatched_projection_is_rejected() {
        let mut config = identity_config();
        config.embed_dim = 8;
        assert!(PatchEmbed::new(config, identity_projection()).is_err());
    }
}
