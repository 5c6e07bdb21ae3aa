#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod camera;
pub mod cropping;
pub mod embed;
pub mod error;
pub mod image;
pub mod orientation;

// Building blocks and tool configuration.
pub mod config;
pub mod tensor;

// --- High-level re-exports -------------------------------------------------

pub use crate::camera::{
    bbox_from_intrinsics_in_out, camera_matrix_of_crop, CropBox, CropOffset, Intrinsics,
    Resolution,
};
pub use crate::cropping::{
    crop_image, crop_image_depthmap, prepare_view, rescale_image, rescale_image_depthmap,
    ImageList, PrepareOptions, PreparedView, View,
};
pub use crate::embed::{ManyArPatchEmbed, PatchEmbed, PatchEmbedConfig, PatchProjection};
pub use crate::error::{Error, Result};
pub use crate::orientation::{
    transposed, HeadOutput, ImageShape, LandscapeRouter, Orientation, PredictionHead,
};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use landscape_vit_prep::prelude::*;
/// use ndarray::Array4;
///
/// # fn main() -> landscape_vit_prep::Result<()> {
/// let config = PatchEmbedConfig {
///     patch_size: 16,
///     in_chans: 3,
///     embed_dim: 8,
///     ..Default::default()
/// };
/// let proj = PatchProjection::from_fn(3, 8, 16, |d, c, _, _| (d + c) as f32 * 1e-3)?;
/// let embed = ManyArPatchEmbed::new(config, proj)?;
///
/// let batch = Array4::<f32>::zeros((2, 3, 224, 320));
/// let shapes = [ImageShape::new(224, 320), ImageShape::new(320, 224)];
/// let (tokens, pos) = embed.forward(batch.view(), &shapes)?;
/// println!("tokens={:?} pos={:?}", tokens.dim(), pos.dim());
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::camera::{CropBox, Intrinsics, Resolution};
    pub use crate::cropping::{prepare_view, ImageList, PrepareOptions, View};
    pub use crate::embed::{ManyArPatchEmbed, PatchEmbedConfig, PatchProjection};
    pub use crate::orientation::{HeadOutput, ImageShape, LandscapeRouter, PredictionHead};
}
